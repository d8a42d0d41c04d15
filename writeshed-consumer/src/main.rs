mod pipeline;

use std::sync::Arc;

use writeshed_core::constants::{CONSUMER_BROKER_POOL_SIZE, CONSUMER_STORE_POOL_SIZE};
use writeshed_core::{Config, DocumentStore, RedisBroker, ShutdownService};

use pipeline::Consumer;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    writeshed_core::init_logging();

    let config = Config::parse();

    let broker = match RedisBroker::new(&config.redis_url(), CONSUMER_BROKER_POOL_SIZE).await {
        Ok(broker) => Arc::new(broker),
        Err(e) => {
            tracing::error!(error = %e, "failed to connect to broker");
            std::process::exit(1);
        }
    };

    let store = match DocumentStore::connect(&config.mongo_uri, CONSUMER_STORE_POOL_SIZE).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::error!(error = %e, "failed to connect to document store");
            std::process::exit(1);
        }
    };

    let shutdown = ShutdownService::new();
    shutdown.install_signal_handlers();

    let consumer = Consumer::new(broker, store, config);
    let shutdown_rx = shutdown.subscribe();

    consumer.run(shutdown_rx).await;

    tracing::info!("consumer exiting cleanly");
}
