//! Shared library for the write-shedding ingestion pipeline: broker client
//! (Redis stream + key/value facets), document-store client (MongoDB),
//! configuration, error types, and the shutdown/cancellation-token
//! service used by both the ingress and consumer binaries.

pub mod broker;
pub mod config;
pub mod constants;
pub mod error;
pub mod model;
pub mod shutdown;
pub mod store;

pub use broker::{Broker, RedisBroker};
pub use config::Config;
pub use error::{BrokerError, ConfigError, StoreError};
pub use model::{BrokerStats, PendingEntry, StreamEntry, WriteDoc};
pub use shutdown::ShutdownService;
pub use store::DocumentStore;

/// Initializes structured logging the way the upstream application entry
/// point does: an app-specific env var takes precedence over `RUST_LOG`,
/// which takes precedence over a computed default.
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = std::env::var(constants::ENV_LOG_FILTER)
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info,writeshed=info".to_string());

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(EnvFilter::new(filter))
        .compact()
        .init();
}
