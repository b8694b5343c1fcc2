//! Redis adapter for the lock protocol
//!
//! Acquisition is a single `SET key token NX PX lease`. Release is a
//! server-evaluated Lua script, so the ownership check and the delete happen
//! as one operation on the server.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{RedisResult, Script};
use tracing::{error, info, warn};

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::traits::KeyValueStore;

/// Deletes KEYS[1] only while it still holds ARGV[1]
pub const RELEASE_SCRIPT: &str = r#"
if redis.call("get", KEYS[1]) == ARGV[1] then
    return redis.call("del", KEYS[1])
else
    return 0
end
"#;

/// `KeyValueStore` over a multiplexed, auto-reconnecting Redis connection
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    release_script: Script,
    command_timeout: Duration,
}

impl RedisStore {
    /// Connect using `config`.
    ///
    /// Failing here means the store is misconfigured or unreachable at
    /// startup; the error is returned to the caller instead of being folded
    /// into the lock protocol's boolean results.
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let url = config.redis_url()?;
        let client = redis::Client::open(url.as_str())?;

        let conn = match tokio::time::timeout(
            config.connect_timeout(),
            client.get_connection_manager(),
        )
        .await
        {
            Ok(conn) => conn?,
            Err(_) => return Err(StoreError::Timeout(config.connect_timeout())),
        };

        info!(
            host = %config.host,
            port = config.port,
            database = config.database,
            "Connected to redis lock store"
        );

        Ok(Self::from_connection(conn, config.command_timeout()))
    }

    /// Wrap an existing connection
    pub fn from_connection(conn: ConnectionManager, command_timeout: Duration) -> Self {
        Self {
            conn,
            release_script: Script::new(RELEASE_SCRIPT),
            command_timeout,
        }
    }

    pub fn command_timeout(&self) -> Duration {
        self.command_timeout
    }

    async fn bounded<T>(&self, call: impl Future<Output = RedisResult<T>>) -> Result<T> {
        match tokio::time::timeout(self.command_timeout, call).await {
            Ok(result) => result.map_err(StoreError::from),
            Err(_) => Err(StoreError::Timeout(self.command_timeout)),
        }
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("SET");
        cmd.arg(key)
            .arg(value)
            .arg("NX")
            .arg("PX")
            .arg(lease_millis(ttl));

        // Nil reply: the key already exists
        let reply: Option<String> = self.bounded(cmd.query_async(&mut conn)).await?;
        Ok(reply.is_some())
    }

    async fn read(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("GET");
        cmd.arg(key);

        self.bounded(cmd.query_async(&mut conn)).await
    }

    async fn delete_if_equal(&self, key: &str, expected: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let mut invocation = self.release_script.prepare_invoke();
        invocation.key(key).arg(expected);

        let deleted: i64 = self.bounded(invocation.invoke_async(&mut conn)).await?;
        Ok(deleted == 1)
    }

    /// Best-effort removal of a record whose creation was never confirmed
    async fn discard_unconfirmed(&self, key: &str, value: &str) {
        match self.delete_if_equal(key, value).await {
            Ok(true) => warn!(key = %key, token = %value, "Removed lock record left by a timed-out SET"),
            Ok(false) => {}
            Err(e) => warn!(
                key = %key,
                token = %value,
                kind = e.kind(),
                error = %e,
                "Could not clean up after a timed-out SET; the record expires with its lease"
            ),
        }
    }
}

/// PX takes whole milliseconds; round up so a lease is never shortened to zero
pub(crate) fn lease_millis(ttl: Duration) -> u64 {
    let millis = ttl.as_millis();
    let rounded = if ttl.subsec_nanos() % 1_000_000 == 0 {
        millis
    } else {
        millis + 1
    };
    u64::try_from(rounded).unwrap_or(u64::MAX)
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn try_set(&self, key: &str, value: &str, ttl: Duration) -> bool {
        match self.set_if_absent(key, value, ttl).await {
            Ok(created) => created,
            Err(e) => {
                error!(
                    key = %key,
                    token = %value,
                    kind = e.kind(),
                    transient = e.is_transient(),
                    error = %e,
                    "Failed to acquire lock record"
                );
                // The SET may have been applied even though the reply never
                // arrived; drop any record carrying this token
                if matches!(e, StoreError::Timeout(_)) {
                    self.discard_unconfirmed(key, value).await;
                }
                false
            }
        }
    }

    async fn get(&self, key: &str) -> Option<String> {
        match self.read(key).await {
            Ok(value) => value,
            Err(e) => {
                error!(
                    key = %key,
                    kind = e.kind(),
                    transient = e.is_transient(),
                    error = %e,
                    "Failed to read lock record"
                );
                None
            }
        }
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> bool {
        match self.delete_if_equal(key, expected).await {
            Ok(deleted) => deleted,
            Err(e) => {
                error!(
                    key = %key,
                    token = %expected,
                    kind = e.kind(),
                    transient = e.is_transient(),
                    error = %e,
                    "Failed to release lock record"
                );
                false
            }
        }
    }
}
