//! Error types for the broker client, document-store client, and config layer.

use thiserror::Error;

/// Errors from the broker (Redis-backed stream + key/value facets).
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("broker config error: {0}")]
    Config(String),

    #[error("broker connection error: {0}")]
    Connection(String),

    #[error("broker serialization error: {0}")]
    Serialization(String),

    #[error("broker operation failed: {0}")]
    Operation(String),

    #[error("redis error: {0}")]
    Redis(#[from] deadpool_redis::redis::RedisError),

    #[error("redis pool error: {0}")]
    Pool(#[from] deadpool_redis::PoolError),
}

/// Errors from the document-store client (MongoDB).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store config error: {0}")]
    Config(String),

    #[error("store connection error: {0}")]
    Connection(String),

    #[error("store operation failed: {0}")]
    Operation(String),

    #[error("mongo error: {0}")]
    Mongo(#[from] mongodb::error::Error),
}

/// Errors from configuration parsing.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broker_error_display() {
        let e = BrokerError::Connection("refused".to_string());
        assert_eq!(e.to_string(), "broker connection error: refused");
    }

    #[test]
    fn store_error_display() {
        let e = StoreError::Operation("bulk insert failed".to_string());
        assert_eq!(e.to_string(), "store operation failed: bulk insert failed");
    }

    #[test]
    fn config_error_display() {
        let e = ConfigError::InvalidValue {
            field: "REDIS_PORT",
            reason: "not numeric".to_string(),
        };
        assert_eq!(e.to_string(), "invalid value for REDIS_PORT: not numeric");
    }
}
