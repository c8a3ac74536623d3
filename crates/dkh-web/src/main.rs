//! Web server for the DKH admin dashboard
#![forbid(unsafe_code)]

use dkh_backend::Backend;
use dkh_core::{Config, init_logging};
use dkh_web::{AppState, build_app};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if it exists (for development convenience)
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Note: .env file not loaded: {e}");
    }

    let (config, load_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };

    init_logging(&config.logging)?;
    if let Some(e) = load_error {
        warn!("Failed to load config: {}, using defaults", e);
    }
    config.validate()?;

    info!(
        "Starting DKH admin dashboard v{}",
        env!("CARGO_PKG_VERSION")
    );

    let backend = Backend::from_config(&config)?;
    let state = Arc::new(AppState::new(config.clone(), &backend)?);
    let app = build_app(Arc::clone(&state));

    let host: IpAddr = config
        .server
        .host
        .parse()
        .map_err(|e| format!("Invalid server host '{}': {}", config.server.host, e))?;
    let addr = SocketAddr::new(host, config.server.port);

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await?;

    state.dashboard.shutdown();
    info!("Server stopped");

    Ok(())
}
