//! Command line and configuration model
//!
//! - `crate::model::config::Cli`
//! - `crate::model::config::Configuration`
//! - `crate::model::constants`

pub mod config;
pub mod constants;
