//! Application startup: configuration, logging, store connection, dispatch.

pub mod logging;

pub use logging::{LogRotation, LoggingConfig, LoggingGuard, init_logging};

use std::sync::Arc;

use anyhow::Context;
use latchkey_lock::LockManager;
use latchkey_store::{KeyValueStore, MemoryStore, RedisStore, StoreBackend, StoreConfig};
use tracing::{debug, warn};

use crate::command;
use crate::model::config::{Cli, Configuration};

/// Run one CLI invocation end to end.
///
/// Returns `Ok(true)` when the operation succeeded, `Ok(false)` when the lock
/// protocol said no, and `Err` when the tool could not be set up.
pub async fn run(args: Cli) -> anyhow::Result<bool> {
    let configuration = Configuration::new(&args)?;

    let _logging_guard = init_logging(&configuration.logging_config())
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    latchkey_lock::metrics::describe_metrics();

    let store_config = configuration.store_config();
    debug!(
        backend = %store_config.backend,
        poll_interval_ms = configuration.poll_interval().as_millis() as u64,
        "Configuration loaded"
    );
    let store = connect_store(&store_config).await?;

    let mut manager =
        LockManager::new(store).with_poll_interval(configuration.poll_interval());
    if let Some(prefix) = configuration.key_prefix() {
        manager = manager.with_key_prefix(prefix);
    }

    Ok(command::execute(&manager, &args.command).await)
}

/// Open the configured store backend.
pub async fn connect_store(config: &StoreConfig) -> anyhow::Result<Arc<dyn KeyValueStore>> {
    match config.backend {
        StoreBackend::Redis => {
            let store = RedisStore::connect(config)
                .await
                .with_context(|| format!("failed to connect to {}:{}", config.host, config.port))?;
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            warn!("Using in-process memory store; locks are not shared with other processes");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
