//! Community gallery handlers: share a generated model, list recent ones.

use crate::AppState;
use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use murmur_db::{gallery, ModelRecord, NewModel};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;

/// Request body for gallery insertion. Both `modelUrl` and `prompt` are
/// required; they are optional here so a missing field surfaces as a 400
/// with a JSON body rather than a deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct InsertModelRequest {
    #[serde(rename = "modelUrl")]
    pub model_url: Option<String>,
    pub prompt: Option<String>,
    pub timestamp: Option<String>,
}

/// Gallery API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum GalleryApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("store failure: {0}")]
    StoreFailure(String),
}

impl IntoResponse for GalleryApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            GalleryApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            GalleryApiError::StoreFailure(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(json!({"error": message}))).into_response()
    }
}

fn require_field(value: Option<String>, name: &str) -> Result<String, GalleryApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| GalleryApiError::BadRequest(format!("missing required field: {name}")))
}

/// Handler for `POST /api/community`.
pub async fn insert_model_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<InsertModelRequest>,
) -> Result<Json<Value>, GalleryApiError> {
    let record = NewModel {
        model_url: require_field(payload.model_url, "modelUrl")?,
        prompt: require_field(payload.prompt, "prompt")?,
        timestamp: payload.timestamp,
    };

    let id = tokio::task::spawn_blocking(move || {
        let conn = state
            .pool
            .get()
            .map_err(|e| GalleryApiError::StoreFailure(format!("db connection failed: {e}")))?;

        gallery::insert_model(&conn, &record)
            .map_err(|e| GalleryApiError::StoreFailure(e.to_string()))
    })
    .await
    .map_err(|e| GalleryApiError::StoreFailure(format!("task join error: {e}")))??;

    Ok(Json(json!({"success": true, "id": id})))
}

/// Handler for `GET /api/community/models`.
pub async fn list_models_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Vec<ModelRecord>>, GalleryApiError> {
    let records = tokio::task::spawn_blocking(move || {
        let conn = state
            .pool
            .get()
            .map_err(|e| GalleryApiError::StoreFailure(format!("db connection failed: {e}")))?;

        gallery::list_models(&conn).map_err(|e| GalleryApiError::StoreFailure(e.to_string()))
    })
    .await
    .map_err(|e| GalleryApiError::StoreFailure(format!("task join error: {e}")))??;

    Ok(Json(records))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_field_is_treated_as_missing() {
        let err = require_field(Some("   ".to_string()), "prompt")
            .expect_err("blank field should be rejected");
        assert!(matches!(err, GalleryApiError::BadRequest(_)));
    }

    #[test]
    fn present_field_passes_through() {
        let value = require_field(Some("a fox".to_string()), "prompt")
            .expect("present field should pass");
        assert_eq!(value, "a fox");
    }
}
