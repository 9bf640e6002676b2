//! Text2Quiz · Document-to-Quiz Backend
//!
//! - Axum HTTP API: upload relay, quiz generation, session state machine,
//!   PDF export
//! - OpenAI-compatible generation provider (via environment variables)
//!
//! Important env variables:
//!   PORT             : u16 (default 5000)
//!   OPENAI_API_KEY   : enables the generation provider if present
//!   OPENAI_BASE_URL  : default "https://api.openai.com/v1"
//!   OPENAI_MODEL     : default "gpt-4o-mini"
//!   ALLOWED_ORIGINS  : comma-separated CORS origin allow-list
//!   QUIZ_CONFIG_PATH : path to TOML config (prompt overrides)
//!   LOG_LEVEL        : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT       : "pretty" (default) or "json"

use std::{net::SocketAddr, sync::Arc};

use tokio::net::TcpListener;
use tracing::{info, instrument};

use text2quiz_backend::routes::build_router;
use text2quiz_backend::state::AppState;
use text2quiz_backend::telemetry;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    telemetry::init_tracing();

    // Build shared application state (session store, provider client, config).
    let state = Arc::new(AppState::new());

    // Build the HTTP router with routes, CORS and tracing layers.
    let app = build_router(state.clone());

    // Read port from env or default to 5000.
    let addr: SocketAddr = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
        .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 5000)));

    let listener = TcpListener::bind(addr).await?;
    info!(target: "text2quiz_backend", %addr, "HTTP server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
