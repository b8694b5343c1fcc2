//! Store error types for latchkey
//!
//! These errors never cross the `KeyValueStore` boundary: adapters log them
//! and report `false`/`None` to the lock protocol. They surface directly only
//! from bootstrap calls such as `RedisStore::connect`.

use std::time::Duration;

/// Error type for key-value store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store call timed out after {0:?}")]
    Timeout(Duration),

    #[error("store command failed: {0}")]
    Command(String),

    #[error("invalid store configuration: {0}")]
    InvalidConfig(String),
}

impl StoreError {
    /// Short label used in log fields and metric labels
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::Unavailable(_) => "unavailable",
            StoreError::Timeout(_) => "timeout",
            StoreError::Command(_) => "command",
            StoreError::InvalidConfig(_) => "invalid_config",
        }
    }

    /// Whether a later call may succeed without operator intervention
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Timeout(_))
    }
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        if err.kind() == redis::ErrorKind::InvalidClientConfig {
            StoreError::InvalidConfig(err.to_string())
        } else if err.is_timeout()
            || err.is_io_error()
            || err.is_connection_refusal()
            || err.is_connection_dropped()
        {
            StoreError::Unavailable(err.to_string())
        } else {
            StoreError::Command(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::Unavailable("connection refused".to_string());
        assert_eq!(err.to_string(), "store unavailable: connection refused");

        let err = StoreError::Timeout(Duration::from_millis(250));
        assert_eq!(err.to_string(), "store call timed out after 250ms");

        let err = StoreError::InvalidConfig("empty host".to_string());
        assert_eq!(err.to_string(), "invalid store configuration: empty host");
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(StoreError::Unavailable(String::new()).kind(), "unavailable");
        assert_eq!(StoreError::Timeout(Duration::ZERO).kind(), "timeout");
        assert_eq!(StoreError::Command(String::new()).kind(), "command");
        assert_eq!(
            StoreError::InvalidConfig(String::new()).kind(),
            "invalid_config"
        );
    }

    #[test]
    fn test_transient_classification() {
        assert!(StoreError::Timeout(Duration::from_secs(1)).is_transient());
        assert!(StoreError::Unavailable("reset".to_string()).is_transient());
        assert!(!StoreError::Command("WRONGTYPE".to_string()).is_transient());
        assert!(!StoreError::InvalidConfig("port".to_string()).is_transient());
    }

    #[test]
    fn test_from_redis_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err: StoreError = redis::RedisError::from(io).into();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[test]
    fn test_from_redis_client_config_error() {
        let err: StoreError =
            redis::RedisError::from((redis::ErrorKind::InvalidClientConfig, "bad url")).into();
        assert!(matches!(err, StoreError::InvalidConfig(_)));
    }

    #[test]
    fn test_from_redis_response_error() {
        let err: StoreError =
            redis::RedisError::from((redis::ErrorKind::ResponseError, "NOSCRIPT")).into();
        assert!(matches!(err, StoreError::Command(_)));
    }
}
