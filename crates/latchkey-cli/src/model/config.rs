//! Configuration management for the latchkey CLI
//!
//! Values are layered, lowest precedence first: the YAML config file,
//! `LATCHKEY_*` environment variables, then command line flags.

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use config::{Config, Environment};
use latchkey_lock::DEFAULT_POLL_INTERVAL;
use latchkey_store::config::{
    DEFAULT_COMMAND_TIMEOUT_MS, DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_HOST, DEFAULT_PORT,
};
use latchkey_store::{StoreBackend, StoreConfig};

use crate::command::Command;
use crate::startup::logging::LoggingConfig;

use super::constants::{
    DEFAULT_CONFIG_FILE, DEFAULT_LOGGING_LEVEL, ENV_PREFIX, ENV_PREFIX_SEPARATOR, ENV_SEPARATOR,
    LOCK_KEY_PREFIX, LOCK_POLL_INTERVAL_MS, LOGGING_CONSOLE, LOGGING_DIR, LOGGING_FILE,
    LOGGING_LEVEL, LOGGING_ROTATION, STORE_BACKEND, STORE_COMMAND_TIMEOUT_MS, STORE_CONNECT_TIMEOUT_MS,
    STORE_DATABASE, STORE_HOST, STORE_PASSWORD, STORE_PORT, STORE_USERNAME,
};

/// Command line arguments
#[derive(Debug, Parser)]
#[command(name = "latchkey", version, about = "Lease-based distributed locks over a shared key-value store")]
pub struct Cli {
    /// Configuration file (YAML); missing files are ignored
    #[arg(short = 'c', long = "config", env = "LATCHKEY_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    pub config: String,
    /// Store backend: redis or memory
    #[arg(short = 'b', long = "backend")]
    pub backend: Option<StoreBackend>,
    #[arg(long = "host")]
    pub host: Option<String>,
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,
    #[arg(short = 'd', long = "database")]
    pub database: Option<i64>,
    /// Namespace for lock keys (`<prefix>:<key>`)
    #[arg(long = "key-prefix")]
    pub key_prefix: Option<String>,
    /// Delay between attempts while waiting for a lock
    #[arg(long = "poll-ms")]
    pub poll_ms: Option<u64>,
    #[command(subcommand)]
    pub command: Command,
}

// Values stay strings until an accessor asks for a number or bool, so a
// password such as `007` is not turned into `7`.
fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator(ENV_PREFIX_SEPARATOR)
        .separator(ENV_SEPARATOR)
}

/// Application configuration loaded from config files and environment
#[derive(Clone, Debug, Default)]
pub struct Configuration {
    pub config: Config,
}

impl Configuration {
    pub fn new(args: &Cli) -> anyhow::Result<Self> {
        Self::with_environment(args, environment())
    }

    fn with_environment(args: &Cli, environment: Environment) -> anyhow::Result<Self> {
        let mut config_builder = Config::builder()
            .add_source(config::File::with_name(&args.config).required(false))
            .add_source(environment);

        if let Some(v) = args.backend {
            config_builder = config_builder.set_override(STORE_BACKEND, v.as_str())?;
        }
        if let Some(v) = &args.host {
            config_builder = config_builder.set_override(STORE_HOST, v.as_str())?;
        }
        if let Some(v) = args.port {
            config_builder = config_builder.set_override(STORE_PORT, i64::from(v))?;
        }
        if let Some(v) = args.database {
            config_builder = config_builder.set_override(STORE_DATABASE, v)?;
        }
        if let Some(v) = &args.key_prefix {
            config_builder = config_builder.set_override(LOCK_KEY_PREFIX, v.as_str())?;
        }
        if let Some(v) = args.poll_ms {
            let v = i64::try_from(v).context("poll interval is too large")?;
            config_builder = config_builder.set_override(LOCK_POLL_INTERVAL_MS, v)?;
        }

        let app_config = config_builder
            .build()
            .with_context(|| format!("failed to build configuration from {}", args.config))?;

        Ok(Configuration { config: app_config })
    }

    // ========================================================================
    // Store Configuration
    // ========================================================================

    pub fn store_backend(&self) -> StoreBackend {
        self.config
            .get_string(STORE_BACKEND)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }

    pub fn store_host(&self) -> String {
        self.config
            .get_string(STORE_HOST)
            .unwrap_or(DEFAULT_HOST.to_string())
    }

    pub fn store_port(&self) -> u16 {
        self.config
            .get_int(STORE_PORT)
            .ok()
            .and_then(|v| u16::try_from(v).ok())
            .unwrap_or(DEFAULT_PORT)
    }

    pub fn store_username(&self) -> Option<String> {
        self.config
            .get_string(STORE_USERNAME)
            .ok()
            .filter(|v| !v.is_empty())
    }

    pub fn store_password(&self) -> Option<String> {
        self.config
            .get_string(STORE_PASSWORD)
            .ok()
            .filter(|v| !v.is_empty())
    }

    pub fn store_database(&self) -> i64 {
        self.config.get_int(STORE_DATABASE).unwrap_or(0)
    }

    pub fn store_connect_timeout_ms(&self) -> u64 {
        self.get_millis(STORE_CONNECT_TIMEOUT_MS)
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT_MS)
    }

    pub fn store_command_timeout_ms(&self) -> u64 {
        self.get_millis(STORE_COMMAND_TIMEOUT_MS)
            .unwrap_or(DEFAULT_COMMAND_TIMEOUT_MS)
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            backend: self.store_backend(),
            host: self.store_host(),
            port: self.store_port(),
            username: self.store_username(),
            password: self.store_password(),
            database: self.store_database(),
            connect_timeout_ms: self.store_connect_timeout_ms(),
            command_timeout_ms: self.store_command_timeout_ms(),
        }
    }

    // ========================================================================
    // Lock Configuration
    // ========================================================================

    pub fn poll_interval(&self) -> Duration {
        self.get_millis(LOCK_POLL_INTERVAL_MS)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_POLL_INTERVAL)
    }

    pub fn key_prefix(&self) -> Option<String> {
        self.config
            .get_string(LOCK_KEY_PREFIX)
            .ok()
            .filter(|v| !v.is_empty())
    }

    // ========================================================================
    // Logging Configuration
    // ========================================================================

    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig::from_config(
            self.config.get_string(LOGGING_DIR).ok(),
            self.config.get_bool(LOGGING_CONSOLE).unwrap_or(true),
            self.config.get_bool(LOGGING_FILE).unwrap_or(false),
            self.config
                .get_string(LOGGING_LEVEL)
                .unwrap_or(DEFAULT_LOGGING_LEVEL.to_string()),
            self.config
                .get_string(LOGGING_ROTATION)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
        )
    }

    fn get_millis(&self, key: &str) -> Option<u64> {
        self.config
            .get_int(key)
            .ok()
            .and_then(|v| u64::try_from(v).ok())
    }
}
