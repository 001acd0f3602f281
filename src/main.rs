use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use ringsight::api::{create_router, ApiState};
use ringsight::Config;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("ringsight=info".parse().unwrap()),
        )
        .init();

    tracing::info!("RingSight starting...");

    // Load configuration
    let config = match Config::load("config.toml") {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("{e}, running on defaults");
            Config::default()
        }
    };
    tracing::info!("Config: {:?}", config);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = ApiState {
        config: Arc::new(config),
    };
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind server address");
    tracing::info!("Listening on http://{addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.ok();
    tracing::info!("Shutdown signal received, stopping server");
}
