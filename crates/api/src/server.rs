//! HTTP server assembly
//!
//! Layers the route table with CORS, request tracing and a body limit,
//! then serves it on the configured port.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::routes::build_router;
use crate::state::AppState;

/// Request bodies are short text posts; anything bigger is noise
const MAX_BODY_BYTES: usize = 16 * 1024;

/// Build the full application with middleware applied
pub fn build_app(config: &ServerConfig, state: AppState) -> Router {
    build_router(state)
        .layer(cors_layer(&config.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}

/// Bind and serve until the task is cancelled
pub async fn serve(config: &ServerConfig, state: AppState) -> anyhow::Result<()> {
    let app = build_app(config, state);
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Credentialed CORS for the configured origins
///
/// With no origins configured the layer falls back to a permissive,
/// credential-less policy; browsers will not send the refresh cookie
/// cross-site in that mode.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let parsed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    if parsed.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    CorsLayer::new()
        .allow_origin(parsed)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::PUT,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
