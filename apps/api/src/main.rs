mod config;
mod errors;
mod llm_client;
mod routes;
mod state;
mod transform;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::AnthropicTransport;
use crate::routes::build_router;
use crate::state::AppState;
use crate::transform::client::TransformationClient;
use crate::transform::session::ModelSession;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting tailor API v{}", env!("CARGO_PKG_VERSION"));

    let session = initial_session(&config);

    let transport = AnthropicTransport::new(config.anthropic_api_url.clone());
    let transformer = TransformationClient::new(Arc::new(transport));
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let state = AppState {
        session: Arc::new(RwLock::new(session)),
        transformer,
    };

    // The popup calls from a browser extension origin.
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds the startup session from a saved key, if any. A key that cannot be
/// used is dropped and the service starts uninitialized.
fn initial_session(config: &Config) -> ModelSession {
    let mut session = ModelSession::new();

    match config.anthropic_api_key.as_deref() {
        Some(key) => match session.initialize(key) {
            Ok(()) => info!("Model session initialized from saved key"),
            Err(e) => warn!("Ignoring saved API key: {e}"),
        },
        None => info!("No saved API key; waiting for PUT /api/v1/session"),
    }

    session
}
