//! Router setup with all API routes and middleware.
//!
//! Configures the axum Router with CORS, tracing, compression,
//! and all endpoint handlers.

use std::future::Future;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use ragchat_core::error::RagChatError;

use crate::handlers;
use crate::state::AppState;

/// Create the axum Router with all routes and middleware.
///
/// CORS origins and the request body limit come from `[server]` in the
/// config held by `state`.
pub fn create_router(state: AppState) -> Router {
    let server = &state.config.server;

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins(&server.cors_origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);
    let body_limit = server.body_limit_bytes;

    Router::new()
        .route("/health", get(handlers::health))
        .route("/documents", get(handlers::list_documents))
        .route("/conversations", post(handlers::create_conversation))
        .route(
            "/conversations/{conversation_id}/messages",
            post(handlers::send_message),
        )
        .route(
            "/conversations/{conversation_id}/history",
            get(handlers::get_history),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// `"*"` anywhere in the list allows every origin; tower-http rejects a
/// wildcard inside an explicit list.
fn allowed_origins(configured: &[String]) -> AllowOrigin {
    if configured.iter().any(|origin| origin.trim() == "*") {
        return AllowOrigin::any();
    }

    let origins: Vec<HeaderValue> = configured
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    AllowOrigin::list(origins)
}

/// Serve the API on `[server] host:port` until `shutdown` resolves.
pub async fn start_server<F>(state: AppState, shutdown: F) -> Result<(), RagChatError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| RagChatError::Api(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("Starting API server on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| RagChatError::Api(format!("Server error: {}", e)))?;

    tracing::info!("API server stopped");
    Ok(())
}
