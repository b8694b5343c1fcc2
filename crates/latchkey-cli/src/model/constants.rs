// Configuration property names and defaults

pub const DEFAULT_CONFIG_FILE: &str = "conf/application.yml";

/// Environment variables are read as `LATCHKEY_<SECTION>__<KEY>`
pub const ENV_PREFIX: &str = "LATCHKEY";
pub const ENV_PREFIX_SEPARATOR: &str = "_";
pub const ENV_SEPARATOR: &str = "__";

// Store
pub const STORE_BACKEND: &str = "store.backend";
pub const STORE_HOST: &str = "store.host";
pub const STORE_PORT: &str = "store.port";
pub const STORE_USERNAME: &str = "store.username";
pub const STORE_PASSWORD: &str = "store.password";
pub const STORE_DATABASE: &str = "store.database";
pub const STORE_CONNECT_TIMEOUT_MS: &str = "store.connect_timeout_ms";
pub const STORE_COMMAND_TIMEOUT_MS: &str = "store.command_timeout_ms";

// Lock
pub const LOCK_POLL_INTERVAL_MS: &str = "lock.poll_interval_ms";
pub const LOCK_KEY_PREFIX: &str = "lock.key_prefix";

// Logging
pub const LOGGING_LEVEL: &str = "logging.level";
pub const LOGGING_DIR: &str = "logging.dir";
pub const LOGGING_CONSOLE: &str = "logging.console";
pub const LOGGING_FILE: &str = "logging.file";
pub const LOGGING_ROTATION: &str = "logging.rotation";

pub const DEFAULT_LOGGING_LEVEL: &str = "info";
