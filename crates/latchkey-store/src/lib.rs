//! Latchkey Store - key-value arbiters for the latchkey lock protocol
//!
//! This crate provides:
//! - The `KeyValueStore` trait: atomic set-if-absent with TTL, get, and
//!   atomic compare-and-delete
//! - `RedisStore`: the networked adapter (SET NX PX + server-side Lua release)
//! - `MemoryStore`: an in-process store with lease expiry
//! - Store configuration and error types

pub mod config;
pub mod error;
pub mod memory;
pub mod redis_store;
pub mod traits;

pub use config::{StoreBackend, StoreConfig};
pub use error::StoreError;
pub use memory::MemoryStore;
pub use redis_store::RedisStore;
pub use traits::KeyValueStore;
