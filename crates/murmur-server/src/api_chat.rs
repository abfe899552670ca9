//! Chat-with-voice responder.
//!
//! `POST /api/chat` obtains a completion from the LLM provider, then
//! best-effort synthesizes speech for the non-code portion of the reply.
//! The completion call is fatal on failure; the synthesis call never is —
//! any synthesis failure degrades the response to text-only.

use crate::AppState;
use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use murmur_chat::ChatError;
use murmur_voice::spoken_text;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;

/// Request body for the chat endpoint.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// The user's message. Required; a blank message is rejected before
    /// any provider call.
    pub message: Option<String>,
    /// Optional system instruction, passed through unmodified.
    #[serde(rename = "systemPrompt")]
    pub system_prompt: Option<String>,
}

/// Chat API error type mapping to HTTP status codes.
///
/// The wire body distinguishes a timed-out primary call (`"timeout"`)
/// from every other primary-call failure (`"server_error"`), so the
/// client can tell a slow provider from a broken one.
#[derive(Debug, Error)]
pub enum ChatApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("completion timed out: {0}")]
    UpstreamTimeout(String),
    #[error("completion failed: {0}")]
    UpstreamFailure(String),
}

impl From<ChatError> for ChatApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Timeout(_) => ChatApiError::UpstreamTimeout(err.to_string()),
            _ => ChatApiError::UpstreamFailure(err.to_string()),
        }
    }
}

impl IntoResponse for ChatApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ChatApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, json!({"error": msg}))
            }
            ChatApiError::UpstreamTimeout(msg) => (
                StatusCode::GATEWAY_TIMEOUT,
                json!({"error": msg, "type": "timeout"}),
            ),
            ChatApiError::UpstreamFailure(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({"error": msg, "type": "server_error"}),
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Handler for `POST /api/chat`.
pub async fn chat_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<Value>, ChatApiError> {
    let message = payload
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| ChatApiError::BadRequest("message is required".to_string()))?;

    let completion = state
        .completion
        .complete(message, payload.system_prompt.as_deref())
        .await?;

    let spoken = spoken_text(&completion.text);
    if spoken.is_empty() {
        return Ok(Json(completion.payload));
    }

    match state.tts.synthesize(&spoken).await {
        Ok(audio) => Ok(Json(attach_audio(completion.payload, &audio))),
        Err(e) => {
            tracing::warn!(error = %e, "synthesis failed, returning text-only response");
            Ok(Json(completion.payload))
        }
    }
}

/// Extends the completion payload with a base64 `audio` field.
fn attach_audio(mut payload: Value, audio: &[u8]) -> Value {
    if let Some(object) = payload.as_object_mut() {
        object.insert("audio".to_string(), Value::String(BASE64.encode(audio)));
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attach_audio_extends_payload_in_place() {
        let payload = json!({"content": [{"text": "hi"}], "model": "m"});
        let extended = attach_audio(payload, &[1, 2, 3]);

        assert_eq!(extended["audio"], BASE64.encode([1, 2, 3]));
        assert_eq!(extended["model"], "m");
    }

    #[test]
    fn timeout_maps_to_gateway_timeout() {
        let err: ChatApiError =
            ChatError::Timeout(std::time::Duration::from_secs(45)).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn upstream_failure_maps_to_internal_error() {
        let err: ChatApiError = ChatError::Upstream {
            status: 400,
            body: "bad prompt".to_string(),
        }
        .into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
