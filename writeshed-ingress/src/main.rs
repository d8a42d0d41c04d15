mod app;
mod routes;

use writeshed_core::Config;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    writeshed_core::init_logging();

    let config = Config::parse();
    if let Err(e) = app::App::new(config).run().await {
        tracing::error!(error = %e, "ingress exited with error");
        eprintln!("\nError: {e}\n");
        std::process::exit(1);
    }
}
