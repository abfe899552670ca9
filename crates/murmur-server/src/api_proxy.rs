//! Generic reverse proxy for the generation provider.
//!
//! `ANY /api/proxy?url=<target>` forwards the request to the named
//! upstream and mirrors its response (status, content type, raw body —
//! which covers both JSON and binary model files). When the target host
//! matches the configured generation provider, the provider's bearer
//! credential is injected server-side so it never appears in
//! client-supplied input. The credential is write-only: it is never
//! logged and never echoed in an error body.

use crate::AppState;
use axum::{
    body::{Body, Bytes},
    extract::{Extension, Query},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Request headers never forwarded upstream. `host` and `content-length`
/// are recomputed for the outbound request; `authorization` is stripped so
/// the injected credential is the only one that can reach the provider;
/// `accept-encoding` and `connection` are transport-level and would
/// mismatch the mirrored response.
const SKIPPED_REQUEST_HEADERS: [&str; 5] = [
    "host",
    "authorization",
    "content-length",
    "accept-encoding",
    "connection",
];

/// Outbound client plus the credential mapping for the known upstream.
#[derive(Clone)]
pub struct ProxyContext {
    http: reqwest::Client,
    upstream_host: String,
    api_key: String,
}

impl fmt::Debug for ProxyContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyContext")
            .field("upstream_host", &self.upstream_host)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl ProxyContext {
    pub fn new(upstream_host: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .unwrap_or_default();

        Self {
            http,
            upstream_host: upstream_host.into(),
            api_key: api_key.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    url: Option<String>,
}

/// Proxy API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ProxyApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("proxy request failed: {0}")]
    Failed(String),
}

impl IntoResponse for ProxyApiError {
    fn into_response(self) -> Response {
        match self {
            ProxyApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({"error": msg}))).into_response()
            }
            ProxyApiError::Failed(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "proxy request failed", "message": msg})),
            )
                .into_response(),
        }
    }
}

/// Handler for `ANY /api/proxy?url=<target>`.
pub async fn proxy_handler(
    Extension(state): Extension<Arc<AppState>>,
    method: Method,
    Query(params): Query<ProxyQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ProxyApiError> {
    let url = params
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ProxyApiError::BadRequest("url parameter is required".to_string()))?;

    let target = Url::parse(&url)
        .map_err(|_| ProxyApiError::BadRequest("url parameter is not a valid URL".to_string()))?;
    if !matches!(target.scheme(), "http" | "https") {
        return Err(ProxyApiError::BadRequest(
            "url parameter must be http or https".to_string(),
        ));
    }

    let mut outbound_headers = HeaderMap::new();
    for (name, value) in headers.iter() {
        if SKIPPED_REQUEST_HEADERS.contains(&name.as_str()) {
            continue;
        }
        outbound_headers.append(name.clone(), value.clone());
    }

    // Credential injection: only for the configured generation provider,
    // and only server-side.
    if target.host_str() == Some(state.proxy.upstream_host.as_str()) {
        let bearer = format!("Bearer {}", state.proxy.api_key);
        let value = HeaderValue::from_str(&bearer)
            .map_err(|_| ProxyApiError::Failed("credential is not a valid header value".to_string()))?;
        outbound_headers.insert(header::AUTHORIZATION, value);
    }

    tracing::debug!(method = %method, host = target.host_str().unwrap_or(""), "forwarding proxy request");

    let mut request = state
        .proxy
        .http
        .request(method, target)
        .headers(outbound_headers);
    if !body.is_empty() {
        request = request.body(body);
    }

    let resp = request.send().await.map_err(|e| {
        tracing::debug!(error = %e, "proxy upstream call failed");
        ProxyApiError::Failed(e.to_string())
    })?;

    let status =
        StatusCode::from_u16(resp.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);

    if !status.is_success() {
        let message = resp.text().await.unwrap_or_default();
        tracing::debug!(status = %status, "proxy upstream returned error");
        return Ok((
            status,
            Json(json!({
                "error": "upstream request failed",
                "status": status.as_u16(),
                "message": message,
            })),
        )
            .into_response());
    }

    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let bytes = resp
        .bytes()
        .await
        .map_err(|e| ProxyApiError::Failed(e.to_string()))?;

    Ok(build_mirrored_response(status, content_type, bytes.to_vec()))
}

fn build_mirrored_response(
    status: StatusCode,
    content_type: Option<String>,
    body: Vec<u8>,
) -> Response {
    let mut builder = Response::builder().status(status);
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    builder.body(Body::from(body)).unwrap_or_else(|_| {
        Response::builder()
            .status(StatusCode::INTERNAL_SERVER_ERROR)
            .body(Body::empty())
            .unwrap()
    })
}
