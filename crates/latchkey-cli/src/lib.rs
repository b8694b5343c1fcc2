//! Latchkey CLI - command line front end for the latchkey lock protocol
//!
//! - `command`: subcommands and their execution against a `LockManager`
//! - `model`: command line arguments and layered configuration
//! - `startup`: logging setup, store connection and dispatch

pub mod command;
pub mod model;
pub mod startup;
