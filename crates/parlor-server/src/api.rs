//! HTTP handlers for the index page and token issuance.

use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Extension, Json},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use parlor_voice::DEFAULT_ROOM;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tera::{Context, Tera};
use thiserror::Error;

const INDEX_TEMPLATE: &str = include_str!("../templates/index.html");

/// The `.html` suffix turns on Tera's autoescaping.
const INDEX_TEMPLATE_NAME: &str = "index.html";

/// Fields accepted by `POST /token`. Both are optional.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TokenRequest {
    pub room: Option<String>,
    pub identity: Option<String>,
}

impl TokenRequest {
    /// Reads `room` and `identity` from a JSON object body.
    ///
    /// Anything unusable (empty body, invalid JSON, a non-object, non-string
    /// or blank fields) is treated as absent instead of rejected. Values are
    /// otherwise kept exactly as sent.
    pub fn from_body(body: &[u8]) -> Self {
        let value: Value = match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(_) => return Self::default(),
        };

        let field = |name: &str| {
            value
                .get(name)
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
        };

        Self {
            room: field("room"),
            identity: field("identity"),
        }
    }
}

/// Response body for `POST /token`.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

/// Identity assigned when a request names none: `user-HHMMSS` in UTC.
pub fn default_identity(now: DateTime<Utc>) -> String {
    now.format("user-%H%M%S").to_string()
}

/// Renders the index page with `lk_url` in its context.
pub fn render_index(lk_url: &str) -> Result<String, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_template(INDEX_TEMPLATE_NAME, INDEX_TEMPLATE)?;

    let mut context = Context::new();
    context.insert("lk_url", lk_url);
    tera.render(INDEX_TEMPLATE_NAME, &context)
}

/// Handler for `GET /`.
pub async fn index_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Html<String>, ApiError> {
    render_index(state.voice_service.get_url())
        .map(Html)
        .map_err(|e| {
            tracing::error!("failed to render index page: {:?}", e);
            ApiError::InternalServerError("failed to render page".to_string())
        })
}

/// Handler for `POST /token`.
///
/// Mints a join token for any room and identity; callers are not
/// authenticated.
pub async fn token_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<TokenResponse>, ApiError> {
    let request = TokenRequest::from_body(&body);
    let room = request.room.unwrap_or_else(|| DEFAULT_ROOM.to_string());
    let identity = request
        .identity
        .unwrap_or_else(|| default_identity(Utc::now()));

    let token = state
        .voice_service
        .generate_join_token(&room, &identity)
        .map_err(|e| {
            tracing::error!(
                room = %room,
                identity = %identity,
                "failed to generate LiveKit token: {}",
                e
            );
            ApiError::InternalServerError("failed to generate token".to_string())
        })?;

    tracing::info!(room = %room, identity = %identity, "issued access token");
    Ok(Json(TokenResponse { token }))
}
