//! Application bootstrap: connects the broker and document store, builds
//! the axum router, and serves with graceful shutdown. Grounded on the
//! upstream `ApiServer`/`CoreApp` startup sequence (`api/server.rs`),
//! pared down to the six routes this system exposes.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;

use writeshed_core::{constants, Config, DocumentStore, RedisBroker, ShutdownService};

use crate::routes;

pub struct AppState {
    pub broker: Arc<RedisBroker>,
    pub store: Arc<DocumentStore>,
    pub config: Config,
}

pub struct App {
    config: Config,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let broker = Arc::new(
            RedisBroker::new(&self.config.redis_url(), constants::INGRESS_BROKER_POOL_SIZE).await?,
        );
        let store = Arc::new(
            DocumentStore::connect(&self.config.mongo_uri, constants::INGRESS_STORE_POOL_SIZE).await?,
        );

        let state = Arc::new(AppState {
            broker,
            store,
            config: self.config.clone(),
        });

        let shutdown = ShutdownService::new();
        shutdown.install_signal_handlers();

        let router = Router::new()
            .route("/healthz", get(routes::healthz))
            .route("/readyz", get(routes::readyz))
            .route("/api/data", get(routes::api_data))
            .route("/api/stats", get(routes::api_stats))
            .route("/api/cache/stats", get(routes::cache_stats))
            .route("/api/cache/clear", post(routes::cache_clear))
            .fallback(routes::handle_404)
            .layer(CompressionLayer::new())
            .layer(CorsLayer::permissive())
            .with_state(state);

        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.app_port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(%addr, "ingress listening");

        axum::serve(listener, router.into_make_service())
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        shutdown.shutdown().await;
        Ok(())
    }
}
