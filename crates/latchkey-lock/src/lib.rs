//! Latchkey Lock - lease-based distributed mutual exclusion
//!
//! A `LockManager` coordinates exclusive, time-bounded ownership of named
//! resources through a shared `KeyValueStore`:
//! - `try_acquire`: one atomic set-if-absent attempt
//! - `acquire`: bounded-wait polling over `try_acquire`
//! - `release`: ownership-gated compare-and-delete
//! - `peek`: diagnostic read of the current holder
//!
//! Mutual exclusion is delegated entirely to the store's atomic operations;
//! the manager keeps no lock state of its own and is shared freely between
//! tasks. Holder tokens are supplied by the caller and must be unique per
//! acquisition attempt.

mod manager;
pub mod metrics;

pub use manager::{DEFAULT_POLL_INTERVAL, LockManager};

pub use latchkey_store::{KeyValueStore, MemoryStore, RedisStore, StoreConfig, StoreError};
