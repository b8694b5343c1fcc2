//! Lock subcommands
//!
//! Each invocation runs exactly one protocol operation and reports whether it
//! succeeded; the binary maps that to its exit status.

use std::time::Duration;

use clap::Subcommand;
use latchkey_lock::{KeyValueStore, LockManager};
use tracing::warn;

const DEFAULT_LEASE_MS: u64 = 30_000;
const DEFAULT_WAIT_MS: u64 = 3_000;

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Make a single attempt to take the lock
    TryAcquire {
        key: String,
        /// Unique holder token for this attempt
        token: String,
        #[arg(long = "lease-ms", default_value_t = DEFAULT_LEASE_MS)]
        lease_ms: u64,
    },
    /// Wait up to `wait-ms` for the lock
    Acquire {
        key: String,
        token: String,
        #[arg(long = "wait-ms", default_value_t = DEFAULT_WAIT_MS)]
        wait_ms: u64,
        #[arg(long = "lease-ms", default_value_t = DEFAULT_LEASE_MS)]
        lease_ms: u64,
    },
    /// Release the lock if it is still held by `token`
    Release { key: String, token: String },
    /// Print the current holder
    Peek { key: String },
    /// Acquire, keep the lock for `hold-ms`, then release it
    Hold {
        key: String,
        token: String,
        #[arg(long = "wait-ms", default_value_t = DEFAULT_WAIT_MS)]
        wait_ms: u64,
        #[arg(long = "lease-ms", default_value_t = DEFAULT_LEASE_MS)]
        lease_ms: u64,
        #[arg(long = "hold-ms")]
        hold_ms: u64,
    },
}

/// Run `command` against `manager`, printing the result to stdout
pub async fn execute<S: KeyValueStore>(manager: &LockManager<S>, command: &Command) -> bool {
    match command {
        Command::TryAcquire {
            key,
            token,
            lease_ms,
        } => {
            let acquired = manager
                .try_acquire(key, token, Duration::from_millis(*lease_ms))
                .await;
            println!("{}", if acquired { "acquired" } else { "not acquired" });
            acquired
        }
        Command::Acquire {
            key,
            token,
            wait_ms,
            lease_ms,
        } => {
            let acquired = manager
                .acquire(
                    key,
                    token,
                    Duration::from_millis(*wait_ms),
                    Duration::from_millis(*lease_ms),
                )
                .await;
            println!("{}", if acquired { "acquired" } else { "not acquired" });
            acquired
        }
        Command::Release { key, token } => {
            let released = manager.release(key, token).await;
            println!("{}", if released { "released" } else { "not owner" });
            released
        }
        Command::Peek { key } => match manager.peek(key).await {
            Some(holder) => {
                println!("{}", holder);
                true
            }
            None => {
                println!("unlocked");
                false
            }
        },
        Command::Hold {
            key,
            token,
            wait_ms,
            lease_ms,
            hold_ms,
        } => {
            if hold_ms >= lease_ms {
                warn!(
                    key = %key,
                    hold_ms,
                    lease_ms,
                    "Hold time reaches the lease; the lock will expire before release"
                );
            }

            let acquired = manager
                .acquire(
                    key,
                    token,
                    Duration::from_millis(*wait_ms),
                    Duration::from_millis(*lease_ms),
                )
                .await;
            if !acquired {
                println!("not acquired");
                return false;
            }
            println!("acquired");

            tokio::time::sleep(Duration::from_millis(*hold_ms)).await;

            let released = manager.release(key, token).await;
            println!("{}", if released { "released" } else { "lease lost" });
            released
        }
    }
}
