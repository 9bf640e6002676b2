//! Router assembly: HTTP endpoints, CORS allow-list, and HTTP tracing.

use std::sync::Arc;

use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{warn, Level};

use crate::state::AppState;

pub mod http;

/// Build the application router with:
/// - upload + generate relay endpoints under `/api/...`
/// - quiz session endpoints under `/api/session/...`
/// - CORS restricted to the configured origin allow-list, credentials on,
///   GET/POST only
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .allowed_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(target: "text2quiz_backend", origin = %o, "Skipping invalid CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true);

    Router::new()
        .route("/api/health", get(http::http_health))
        .route("/api/upload", post(http::http_upload))
        .route("/api/generate", post(http::http_generate))
        .route("/api/session/:id", get(http::http_get_session))
        .route("/api/session/:id/answer", post(http::http_post_answer))
        .route("/api/session/:id/submit", post(http::http_post_submit))
        .route("/api/session/:id/retake", post(http::http_post_retake))
        .route("/api/session/:id/export", get(http::http_get_export))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}
