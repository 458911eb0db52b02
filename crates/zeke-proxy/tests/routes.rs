//! Router tests against a scripted upstream.

use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, Request, StatusCode};
use bytes::Bytes;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use zeke_core::{GatewayConfig, RetryPolicy};
use zeke_http::testing::FakeTransport;
use zeke_http::{ResilientClient, TransportError};
use zeke_proxy::{AppState, router, serve};

const CHAT_URL: &str = "http://upstream.test/chat/completions";

fn state(fake: &Arc<FakeTransport>) -> AppState {
    let retry = RetryPolicy::new()
        .with_max_attempts(2)
        .with_base_delay(Duration::from_millis(10));
    let config = GatewayConfig::new("test-key")
        .with_chat_url(CHAT_URL)
        .with_search_url("http://upstream.test/search")
        .with_reader_url("http://upstream.test/reader")
        .with_retry(retry);
    let client = Arc::new(ResilientClient::new(fake.clone(), retry));
    AppState::new(&config, client)
}

fn post(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

async fn body_json(response: axum::response::Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

#[tokio::test]
async fn healthz_returns_ok() {
    let fake = Arc::new(FakeTransport::new());
    let response = router(state(&fake)).oneshot(get("/healthz")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(&body_bytes(response).await[..], b"OK");
}

#[tokio::test]
async fn invalid_json_is_rejected_without_upstream_call() {
    let fake = Arc::new(FakeTransport::new());
    let response = router(state(&fake))
        .oneshot(post("/v1/chat/completions", "{not json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["type"], "invalid_request_error");
    assert!(
        body["error"]["message"]
            .as_str()
            .unwrap()
            .starts_with("invalid JSON")
    );
    assert_eq!(fake.calls(), 0);
}

#[tokio::test]
async fn non_object_body_is_rejected() {
    let fake = Arc::new(FakeTransport::new());
    let response = router(state(&fake))
        .oneshot(post("/v1/chat/completions", "[1, 2]"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(fake.calls(), 0);
}

#[tokio::test]
async fn model_is_normalized_and_other_fields_pass_through() {
    let fake = Arc::new(FakeTransport::new().respond(200, r#"{"id":"c1"}"#));
    let request = json!({
        "model": "GLM-4.6",
        "messages": [{"role": "user", "content": "hi"}],
        "temperature": 0.2
    });
    let response = router(state(&fake))
        .oneshot(post("/v1/chat/completions", request.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"id": "c1"}));

    let sent = &fake.requests()[0];
    assert_eq!(sent.url.as_str(), CHAT_URL);
    assert_eq!(sent.headers["authorization"], "Bearer test-key");
    assert_eq!(sent.headers["content-type"], "application/json");

    let forwarded: Value = serde_json::from_slice(sent.body.as_ref().unwrap()).unwrap();
    assert_eq!(forwarded["model"], "glm-4.6");
    assert_eq!(forwarded["messages"], request["messages"]);
    assert_eq!(forwarded["temperature"], request["temperature"]);
}

#[tokio::test]
async fn upstream_status_and_headers_are_passed_through() {
    let mut headers = HeaderMap::new();
    headers.insert("content-type", HeaderValue::from_static("application/json"));
    headers.insert("x-request-id", HeaderValue::from_static("abc"));
    headers.insert("connection", HeaderValue::from_static("keep-alive"));
    let fake = Arc::new(FakeTransport::new().respond_with_headers(
        401,
        headers,
        r#"{"error":"bad key"}"#,
    ));

    let response = router(state(&fake))
        .oneshot(post("/v1/chat/completions", r#"{"model":"glm-4.6"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()["x-request-id"], "abc");
    assert_eq!(response.headers()["content-type"], "application/json");
    assert!(response.headers().get("connection").is_none());
    assert_eq!(&body_bytes(response).await[..], br#"{"error":"bad key"}"#);
    assert_eq!(fake.calls(), 1);
}

#[tokio::test]
async fn streamed_body_is_forwarded_chunk_by_chunk() {
    let fake = Arc::new(FakeTransport::new().respond_chunks(
        200,
        vec![
            Ok(Bytes::from("data: one\n\n")),
            Ok(Bytes::from("data: two\n\n")),
            Ok(Bytes::from("data: [DONE]\n\n")),
        ],
    ));

    let response = router(state(&fake))
        .oneshot(post("/v1/chat/completions", r#"{"model":"glm-4.6","stream":true}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        &body_bytes(response).await[..],
        b"data: one\n\ndata: two\n\ndata: [DONE]\n\n"
    );
}

#[tokio::test]
async fn mid_stream_error_ends_body_quietly() {
    let fake = Arc::new(FakeTransport::new().respond_chunks(
        200,
        vec![
            Ok(Bytes::from("data: one\n\n")),
            Err(TransportError::Body("connection reset".into())),
            Ok(Bytes::from("data: never\n\n")),
        ],
    ));

    let response = router(state(&fake))
        .oneshot(post("/v1/chat/completions", r#"{"model":"glm-4.6"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(&body_bytes(response).await[..], b"data: one\n\n");
}

#[tokio::test(start_paused = true)]
async fn transport_failure_is_bad_gateway_and_recorded() {
    let fake = Arc::new(FakeTransport::new().fail(TransportError::Connect("refused".into())));
    let app = router(state(&fake));

    let response = app
        .clone()
        .oneshot(post("/v1/chat/completions", r#"{"model":"glm-4.6"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(response).await;
    assert_eq!(
        body["error"]["message"],
        "upstream GLM error: connection failed: refused"
    );
    assert_eq!(fake.calls(), 2);

    let response = app.oneshot(get("/debug/last-errors")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let entries = body_json(response).await;
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["source"], "chat_completions");
    assert_eq!(entries[0]["endpoint"], CHAT_URL);
    assert_eq!(entries[0]["error"], "connection failed: refused");
}

#[tokio::test]
async fn shutdown_drains_in_flight_chat_requests() {
    let fake = Arc::new(FakeTransport::new().respond_after(
        Duration::from_millis(300),
        200,
        "drained",
    ));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!(
        "http://{}/v1/chat/completions",
        listener.local_addr().unwrap()
    );
    let shutdown = CancellationToken::new();
    let server = tokio::spawn(serve(listener, state(&fake), shutdown.clone()));

    let request = tokio::spawn(async move {
        let response = reqwest::Client::new()
            .post(url)
            .header("content-type", "application/json")
            .body(r#"{"model":"glm-4.6"}"#)
            .send()
            .await
            .unwrap();
        (response.status().as_u16(), response.text().await.unwrap())
    });

    // Signal shutdown only once the upstream call is in flight
    tokio::time::timeout(Duration::from_secs(5), async {
        while fake.calls() == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("upstream was never called");
    shutdown.cancel();

    let (status, body) = request.await.unwrap();
    assert_eq!(status, 200);
    assert_eq!(body, "drained");
    assert_eq!(fake.calls(), 1);

    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server did not stop")
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn last_errors_starts_empty() {
    let fake = Arc::new(FakeTransport::new());
    let response = router(state(&fake))
        .oneshot(get("/debug/last-errors"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn mcp_tools_call_goes_through_the_adapter() {
    let fake = Arc::new(FakeTransport::new().respond(200, r#"{"hits":[]}"#));
    let request = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "tools/call",
        "params": {"name": "zai_search", "arguments": {"query": "rust"}}
    });

    let response = router(state(&fake))
        .oneshot(post("/mcp", request.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["id"], 1);
    assert_eq!(body["result"]["isError"], false);
    assert_eq!(
        body["result"]["content"][0]["text"],
        "Search results:\n{\n  \"hits\": []\n}"
    );
    assert_eq!(fake.requests()[0].url.as_str(), "http://upstream.test/search");
}

#[tokio::test]
async fn mcp_notification_is_accepted_without_body() {
    let fake = Arc::new(FakeTransport::new());
    let response = router(state(&fake))
        .oneshot(post(
            "/mcp",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn mcp_tool_failures_land_in_last_errors() {
    let fake = Arc::new(FakeTransport::new().respond(404, "gone"));
    let app = router(state(&fake));
    let request = json!({
        "jsonrpc": "2.0",
        "id": 9,
        "method": "tools/call",
        "params": {"name": "zai_reader", "arguments": {"url": "https://example.com"}}
    });

    let response = app
        .clone()
        .oneshot(post("/mcp", request.to_string()))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["result"]["isError"], true);
    assert_eq!(
        body["result"]["content"][0]["text"],
        "upstream returned status 404"
    );

    let entries = body_json(app.oneshot(get("/debug/last-errors")).await.unwrap()).await;
    assert_eq!(entries[0]["source"], "zai_reader");
    assert_eq!(entries[0]["status"], 404);
    assert_eq!(entries[0]["bodySnippet"], "gone");
}
