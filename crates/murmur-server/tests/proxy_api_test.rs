use axum::{
    body::{Body, Bytes},
    extract::Query,
    http::{header, HeaderMap, Method, Request, StatusCode},
    routing::{any, get},
    Json, Router,
};
use murmur_chat::{CompletionClient, CompletionConfig};
use murmur_server::{api_proxy::ProxyContext, app, AppState};
use murmur_voice::{TtsClient, TtsConfig};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

/// Binds a mock upstream on an ephemeral port and serves it for the rest
/// of the test.
async fn spawn_upstream(router: Router) -> (String, String) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("should bind mock upstream");
    let addr = listener.local_addr().expect("should read local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("mock upstream failed");
    });
    (format!("http://{addr}"), addr.ip().to_string())
}

/// Echoes back what the upstream actually received.
fn echo_upstream() -> Router {
    Router::new().route(
        "/echo",
        any(
            |method: Method, Query(params): Query<HashMap<String, String>>, headers: HeaderMap, body: Bytes| async move {
                Json(json!({
                    "method": method.as_str(),
                    "authorization": headers
                        .get(header::AUTHORIZATION)
                        .and_then(|v| v.to_str().ok()),
                    "query": params,
                    "body": String::from_utf8_lossy(&body),
                }))
            },
        ),
    )
}

fn build_test_app(upstream_host: &str, api_key: &str) -> Router {
    let pool =
        murmur_db::create_pool(":memory:", murmur_db::DbRuntimeSettings::default()).unwrap();
    {
        let conn = pool.get().unwrap();
        murmur_db::run_migrations(&conn).unwrap();
    }

    app(AppState {
        pool,
        completion: Arc::new(CompletionClient::new(CompletionConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            ..CompletionConfig::default()
        })),
        tts: Arc::new(TtsClient::new(TtsConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            ..TtsConfig::default()
        })),
        proxy: ProxyContext::new(upstream_host, api_key, Duration::from_secs(5)),
    })
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("should read response body");
    serde_json::from_slice(&bytes).expect("response body should be JSON")
}

#[tokio::test]
async fn missing_url_parameter_is_rejected() {
    let app = build_test_app("api.example.invalid", "");

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/api/proxy")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()));
}

#[tokio::test]
async fn non_http_scheme_is_rejected() {
    let app = build_test_app("api.example.invalid", "");

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/api/proxy?url=ftp://example.com/file")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn bearer_credential_is_injected_for_configured_host() {
    let (base, host) = spawn_upstream(echo_upstream()).await;
    let app = build_test_app(&host, "server-side-key");

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri(format!("/api/proxy?url={base}/echo"))
                .header(header::AUTHORIZATION, "Bearer client-token")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"mode":"preview"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["method"], "POST");
    assert_eq!(
        body["authorization"], "Bearer server-side-key",
        "the server credential must replace the client one"
    );
    assert_eq!(body["body"], r#"{"mode":"preview"}"#);
}

#[tokio::test]
async fn client_authorization_is_stripped_for_unknown_hosts() {
    let (base, _host) = spawn_upstream(echo_upstream()).await;
    // Configured for a different provider: nothing should be injected.
    let app = build_test_app("api.example.invalid", "server-side-key");

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri(format!("/api/proxy?url={base}/echo"))
                .header(header::AUTHORIZATION, "Bearer client-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(
        body["authorization"],
        Value::Null,
        "client credentials must never be forwarded"
    );
}

#[tokio::test]
async fn upstream_error_status_is_mirrored() {
    let failing = Router::new().route(
        "/task",
        get(|| async { (StatusCode::IM_A_TEAPOT, "generation backend offline") }),
    );
    let (base, host) = spawn_upstream(failing).await;
    let app = build_test_app(&host, "k");

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri(format!("/api/proxy?url={base}/task"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    let body = read_json(response).await;
    assert_eq!(body["error"], "upstream request failed");
    assert_eq!(body["status"], 418);
    assert_eq!(body["message"], "generation backend offline");
}

#[tokio::test]
async fn binary_response_passes_through_with_content_type() {
    const MODEL_BYTES: &[u8] = &[0x67, 0x6c, 0x54, 0x46, 0x02, 0x00, 0x00, 0x00];
    let binary = Router::new().route(
        "/model.glb",
        get(|| async {
            (
                [(header::CONTENT_TYPE, "model/gltf-binary")],
                MODEL_BYTES.to_vec(),
            )
        }),
    );
    let (base, host) = spawn_upstream(binary).await;
    let app = build_test_app(&host, "k");

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri(format!("/api/proxy?url={base}/model.glb"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "model/gltf-binary"
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], MODEL_BYTES);
}
