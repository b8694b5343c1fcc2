//! Store connection settings

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, StoreError};

/// Default Redis host
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Default Redis port
pub const DEFAULT_PORT: u16 = 6379;
/// Default connect timeout in milliseconds
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5000;
/// Default per-command timeout in milliseconds
pub const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 2000;

/// Which store arbitrates the locks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Networked Redis-compatible server
    #[default]
    Redis,
    /// In-process map, only meaningful inside a single process
    Memory,
}

impl StoreBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            StoreBackend::Redis => "redis",
            StoreBackend::Memory => "memory",
        }
    }
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "redis" => Ok(StoreBackend::Redis),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(format!("Invalid store backend: {}", s)),
        }
    }
}

/// Connection settings for the backing store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Logical database index
    #[serde(default)]
    pub database: i64,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

fn default_command_timeout_ms() -> u64 {
    DEFAULT_COMMAND_TIMEOUT_MS
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Redis,
            host: default_host(),
            port: DEFAULT_PORT,
            username: None,
            password: None,
            database: 0,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            command_timeout_ms: DEFAULT_COMMAND_TIMEOUT_MS,
        }
    }
}

impl StoreConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    pub fn memory() -> Self {
        Self {
            backend: StoreBackend::Memory,
            ..Default::default()
        }
    }

    pub fn with_auth(mut self, username: Option<String>, password: impl Into<String>) -> Self {
        self.username = username;
        self.password = Some(password.into());
        self
    }

    pub fn with_database(mut self, database: i64) -> Self {
        self.database = database;
        self
    }

    pub fn with_timeouts(mut self, connect_timeout_ms: u64, command_timeout_ms: u64) -> Self {
        self.connect_timeout_ms = connect_timeout_ms;
        self.command_timeout_ms = command_timeout_ms;
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    /// Render the `redis://` connection URL, escaping credentials.
    pub fn redis_url(&self) -> Result<Url> {
        if self.host.trim().is_empty() {
            return Err(StoreError::InvalidConfig("store host is empty".to_string()));
        }
        if self.database < 0 {
            return Err(StoreError::InvalidConfig(format!(
                "database index must not be negative: {}",
                self.database
            )));
        }

        let mut url = Url::parse(&format!(
            "redis://{}:{}/{}",
            self.host, self.port, self.database
        ))
        .map_err(|e| {
            StoreError::InvalidConfig(format!(
                "invalid store address {}:{}: {}",
                self.host, self.port, e
            ))
        })?;

        if let Some(username) = self.username.as_deref().filter(|u| !u.is_empty()) {
            url.set_username(username).map_err(|_| {
                StoreError::InvalidConfig(format!("cannot set username on {}", self.host))
            })?;
        }
        if let Some(password) = self.password.as_deref().filter(|p| !p.is_empty()) {
            url.set_password(Some(password)).map_err(|_| {
                StoreError::InvalidConfig(format!("cannot set password on {}", self.host))
            })?;
        }

        Ok(url)
    }
}
