//! wsscreen server entry point.
//!
//! Loads the YAML configuration named on the command line and starts the
//! Axum server with the single WebSocket endpoint.

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use wsscreen::app_state::AppState;
use wsscreen::config::ScreenConfig;
use wsscreen::domain::RunnerRegistry;
use wsscreen::ws;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let Some(config_path) = std::env::args().nth(1) else {
        return Err("A configuration file is required.".into());
    };
    let config = ScreenConfig::from_file(&config_path)?;

    // Build application state
    let app_state = AppState {
        registry: Arc::new(RunnerRegistry::new(config.event_capacity)),
        commands: Arc::new(config.scripts),
    };

    // Build router
    let app = ws::build_router()
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "wsscreen listening");

    axum::serve(listener, app).await?;

    Ok(())
}
