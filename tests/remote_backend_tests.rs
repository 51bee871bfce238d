use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use gengate_rust::{
    Error,
    backend::{Backend, GenerationRequest, RemoteBackend},
    config::{BackendMode, RemoteConfig},
    server::{handlers::AppState, router},
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn remote_backend(url: String) -> RemoteBackend {
    RemoteBackend::new(&RemoteConfig {
        url,
        timeout_secs: None,
    })
    .unwrap()
}

fn request(prompt: &str, model: &str) -> GenerationRequest {
    GenerationRequest {
        prompt: prompt.to_string(),
        model: Some(model.to_string()),
        max_length: None,
    }
}

#[tokio::test]
async fn forwards_prompt_and_relays_response_verbatim() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_json(json!({
            "model": "llama2",
            "prompt": "Hello",
            "stream": false,
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"response": "Hello, world"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let backend = remote_backend(format!("{}/api/generate", server.uri()));
    let text = backend.generate(&request("Hello", "llama2")).await.unwrap();

    assert_eq!(text, "Hello, world");
}

#[tokio::test]
async fn upstream_error_status_becomes_backend_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
        .mount(&server)
        .await;

    let backend = remote_backend(format!("{}/api/generate", server.uri()));
    let result = backend.generate(&request("Hello", "llama2")).await;

    match result {
        Err(Error::Backend { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "model not loaded");
        }
        other => panic!("expected backend error, got {other:?}"),
    }
}

#[tokio::test]
async fn non_json_payload_is_a_backend_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let backend = remote_backend(format!("{}/api/generate", server.uri()));
    let result = backend.generate(&request("Hello", "llama2")).await;

    assert!(matches!(result, Err(Error::Backend { .. })));
}

#[tokio::test]
async fn missing_response_field_is_a_backend_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"done": true})))
        .mount(&server)
        .await;

    let backend = remote_backend(format!("{}/api/generate", server.uri()));
    let result = backend.generate(&request("Hello", "llama2")).await;

    assert!(matches!(result, Err(Error::Backend { .. })));
}

#[tokio::test]
async fn unreachable_upstream_is_backend_unavailable() {
    // Grab a port nothing is listening on.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let backend = remote_backend(format!("http://{}/api/generate", addr));
    let result = backend.generate(&request("Hello", "llama2")).await;

    assert!(matches!(result, Err(Error::BackendUnavailable(_))));
}

#[tokio::test]
async fn gateway_end_to_end_against_stub_upstream() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"response": "Hello, world"})),
        )
        .mount(&server)
        .await;

    let backend = remote_backend(format!("{}/api/generate", server.uri()));
    let app = router(AppState {
        backend: Arc::new(backend),
        mode: BackendMode::Remote,
    });

    let http_request = Request::builder()
        .method("POST")
        .uri("/generate")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"prompt": "Hello", "model": "llama2"}).to_string(),
        ))
        .unwrap();

    let response = app.oneshot(http_request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let envelope: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(envelope, json!({"response": "Hello, world"}));
}

#[tokio::test]
async fn gateway_end_to_end_upstream_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let backend = remote_backend(format!("{}/api/generate", server.uri()));
    let app = router(AppState {
        backend: Arc::new(backend),
        mode: BackendMode::Remote,
    });

    let http_request = Request::builder()
        .method("POST")
        .uri("/generate")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"prompt": "Hello", "model": "llama2"}).to_string(),
        ))
        .unwrap();

    let response = app.oneshot(http_request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let envelope: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert!(envelope.get("response").is_none());
    assert!(!envelope["error"].as_str().unwrap().is_empty());
}
