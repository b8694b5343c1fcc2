//! Lock acquire/release over a shared key-value store

use std::borrow::Cow;
use std::time::Duration;

use latchkey_store::KeyValueStore;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::metrics::{self, AcquireOutcome};

/// Delay between unsuccessful attempts inside `acquire`
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Stateless lock orchestrator bound to one store.
///
/// Holds no per-lock state: every decision is made by the store's atomic
/// set-if-absent and compare-and-delete, so one instance can be shared by
/// any number of concurrent callers.
#[derive(Clone)]
pub struct LockManager<S> {
    store: S,
    poll_interval: Duration,
    key_prefix: Option<String>,
}

impl<S: KeyValueStore> LockManager<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            poll_interval: DEFAULT_POLL_INTERVAL,
            key_prefix: None,
        }
    }

    /// Override the delay between attempts in `acquire` (at least 1ms)
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval.max(MIN_POLL_INTERVAL);
        self
    }

    /// Namespace every lock key as `<prefix>:<key>`
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.key_prefix = if prefix.is_empty() { None } else { Some(prefix) };
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn key_prefix(&self) -> Option<&str> {
        self.key_prefix.as_deref()
    }

    fn store_key<'a>(&self, key: &'a str) -> Cow<'a, str> {
        match &self.key_prefix {
            Some(prefix) => Cow::Owned(format!("{}:{}", prefix, key)),
            None => Cow::Borrowed(key),
        }
    }

    /// Make one non-blocking attempt to take `key` for `token`.
    ///
    /// Returns `true` iff the lock record was created by this call. A zero
    /// `lease` is rejected without contacting the store.
    pub async fn try_acquire(&self, key: &str, token: &str, lease: Duration) -> bool {
        if lease.is_zero() {
            warn!(key = %key, token = %token, "Rejected lock attempt with zero lease");
            metrics::record_acquire(AcquireOutcome::Rejected);
            return false;
        }

        let acquired = self.attempt(key, &self.store_key(key), token, lease).await;
        metrics::record_acquire(if acquired {
            AcquireOutcome::Acquired
        } else {
            AcquireOutcome::Contended
        });
        acquired
    }

    /// Poll `try_acquire` until it succeeds or `wait_budget` is spent.
    ///
    /// Elapsed time is measured on a monotonic clock around every attempt, so
    /// slow store round trips count against the budget. The sleep before the
    /// next attempt is clamped to the remaining budget, making the last
    /// attempt land on the deadline. A zero budget means a single attempt.
    /// Waiters are not queued: every poll races equally.
    pub async fn acquire(
        &self,
        key: &str,
        token: &str,
        wait_budget: Duration,
        lease: Duration,
    ) -> bool {
        if lease.is_zero() {
            warn!(key = %key, token = %token, "Rejected lock attempt with zero lease");
            metrics::record_acquire(AcquireOutcome::Rejected);
            return false;
        }

        let store_key = self.store_key(key);
        let started = Instant::now();
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            if self.attempt(key, &store_key, token, lease).await {
                let waited = started.elapsed();
                metrics::record_acquire(AcquireOutcome::Acquired);
                metrics::record_acquire_wait(waited);
                debug!(
                    key = %key,
                    token = %token,
                    attempts,
                    waited_ms = waited.as_millis() as u64,
                    "Lock acquired after waiting"
                );
                return true;
            }

            let elapsed = started.elapsed();
            if elapsed >= wait_budget {
                metrics::record_acquire(AcquireOutcome::TimedOut);
                metrics::record_acquire_wait(elapsed);
                info!(
                    key = %key,
                    token = %token,
                    attempts,
                    waited_ms = elapsed.as_millis() as u64,
                    budget_ms = wait_budget.as_millis() as u64,
                    "Gave up waiting for lock"
                );
                return false;
            }

            tokio::time::sleep(self.poll_interval.min(wait_budget - elapsed)).await;
        }
    }

    /// Release `key` if, and only if, it is still held by `token`.
    ///
    /// `false` means the caller is not (or no longer) the owner: the lease
    /// expired, someone else holds the lock, or the store could not be
    /// reached. It is never a signal to retry.
    pub async fn release(&self, key: &str, token: &str) -> bool {
        let released = self
            .store
            .compare_and_delete(&self.store_key(key), token)
            .await;
        metrics::record_release(released);

        if released {
            debug!(key = %key, token = %token, "Lock released");
        } else {
            warn!(
                key = %key,
                token = %token,
                "Lock not released: not held by this token"
            );
        }
        released
    }

    /// Current holder of `key`, for diagnostics only.
    ///
    /// The answer may be stale as soon as it is returned; never base a
    /// correctness decision on it.
    pub async fn peek(&self, key: &str) -> Option<String> {
        self.store.get(&self.store_key(key)).await
    }

    // Logs use the caller's key; `store_key` only goes to the store
    async fn attempt(&self, key: &str, store_key: &str, token: &str, lease: Duration) -> bool {
        let acquired = self.store.try_set(store_key, token, lease).await;
        if acquired {
            debug!(key = %key, token = %token, lease_ms = lease.as_millis() as u64, "Lock acquired");
        } else {
            debug!(key = %key, token = %token, "Lock is held by another owner");
        }
        acquired
    }
}
