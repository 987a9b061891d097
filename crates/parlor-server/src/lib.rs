//! Parlor token service library logic.

pub mod api;
pub mod config;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Json, Router,
};
use parlor_voice::{bootstrap_room, RoomBootstrap, VoiceService, DEFAULT_ROOM};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Debug)]
pub struct AppState {
    /// LiveKit token signing and room management.
    pub voice_service: Arc<VoiceService>,
}

impl AppState {
    pub fn new(voice_service: Arc<VoiceService>) -> Self {
        Self { voice_service }
    }
}

/// Maximum request body size (64 KiB).
const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(api::index_handler))
        .route("/token", post(api::token_handler))
        .route("/health", get(health))
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

/// Provisions the default room, logs the outcome and builds the router.
///
/// The room bootstrap never prevents the router from being returned.
pub async fn startup(state: AppState) -> (Router, RoomBootstrap) {
    let outcome = bootstrap_room(state.voice_service.as_ref(), DEFAULT_ROOM).await;
    outcome.log();
    (app(state), outcome)
}
