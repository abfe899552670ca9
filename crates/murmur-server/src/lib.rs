//! Murmur server library logic.
//!
//! A small HTTP backend that fronts three concerns for a browser client:
//! a chat-with-voice responder (LLM completion plus best-effort speech
//! synthesis), a community gallery of generated models, and a generic
//! reverse proxy that injects the generation provider's credential
//! server-side.

pub mod api_chat;
pub mod api_gallery;
pub mod api_proxy;
pub mod config;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::IntoResponse,
    routing::{any, get, post},
    Extension, Json, Router,
};
use murmur_chat::CompletionClient;
use murmur_db::DbPool;
use murmur_voice::TtsClient;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool. Created once at startup and reused for
    /// the life of the process.
    pub pool: DbPool,
    /// Completion provider client.
    pub completion: Arc<CompletionClient>,
    /// Synthesis provider client.
    pub tts: Arc<TtsClient>,
    /// Reverse proxy context (outbound client plus credential mapping).
    pub proxy: api_proxy::ProxyContext,
}

/// Maximum request body size (2 MiB). Protects against OOM from oversized
/// payloads.
const MAX_REQUEST_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Fallback for a matched path hit with an unsupported method. Keeps the
/// 405 body parseable JSON like every other failure path.
async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({"error": "method not allowed"})),
    )
}

/// Router-level fallback for unmatched paths.
async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({"error": "not found"})))
}

/// Builds the application router with all routes.
///
/// CORS is permissive by design: the handlers serve a static browser
/// client from arbitrary origins. Preflight OPTIONS requests are answered
/// by the CORS layer; other unsupported methods fall through to the 405
/// handler.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/chat",
            post(api_chat::chat_handler).fallback(method_not_allowed),
        )
        .route(
            "/api/community",
            post(api_gallery::insert_model_handler).fallback(method_not_allowed),
        )
        .route(
            "/api/community/models",
            get(api_gallery::list_models_handler).fallback(method_not_allowed),
        )
        .route("/api/proxy", any(api_proxy::proxy_handler))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
