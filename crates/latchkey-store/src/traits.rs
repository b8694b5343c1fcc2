//! The key-value contract the lock protocol is built on

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

/// Minimal atomic primitives a store must offer to arbitrate locks.
///
/// Implementations catch and log their own failures: every method reports a
/// connectivity problem, timeout or server error as `false` (or `None`), so
/// callers can branch on plain booleans.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Create `key = value` expiring after `ttl`, only if `key` is absent.
    ///
    /// Returns `true` iff this call created the record.
    async fn try_set(&self, key: &str, value: &str, ttl: Duration) -> bool;

    /// Best-effort read of the current value under `key`.
    async fn get(&self, key: &str) -> Option<String>;

    /// Delete `key` iff its current value equals `expected`, as one
    /// indivisible store-side operation.
    async fn compare_and_delete(&self, key: &str, expected: &str) -> bool;
}

#[async_trait]
impl<T> KeyValueStore for Arc<T>
where
    T: KeyValueStore + ?Sized,
{
    async fn try_set(&self, key: &str, value: &str, ttl: Duration) -> bool {
        (**self).try_set(key, value, ttl).await
    }

    async fn get(&self, key: &str) -> Option<String> {
        (**self).get(key).await
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> bool {
        (**self).compare_and_delete(key, expected).await
    }
}
