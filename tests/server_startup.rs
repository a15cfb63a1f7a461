//! Server Startup Tests
//!
//! Router wiring, health check, and shared state behavior. Requests are
//! driven through the router in-process with `tower::ServiceExt::oneshot`.

use std::net::TcpListener;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use serde_json::Value;
use tokio::time::timeout;
use tower::util::ServiceExt;

use call_bridge::{ServerConfig, routes, state::AppState};

/// Helper function to create a minimal test configuration
fn create_minimal_config(port: u16) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port,
        tls: None,
        openai_api_key: "sk-test".to_string(),
        realtime_url: "wss://realtime.invalid/v1/realtime".to_string(),
        realtime_model: "gpt-4o-realtime-preview-2024-10-01".to_string(),
        voice: "alloy".to_string(),
        instructions: "You are a test assistant.".to_string(),
        temperature: 0.8,
        idle_timeout_seconds: None,
        shutdown_grace_ms: 2000,
    }
}

/// Find an available port for testing
fn find_available_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind to random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

#[tokio::test]
async fn test_health_check() {
    let app = routes::create_app(AppState::new(create_minimal_config(find_available_port())));

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["message"], "Twilio Media Stream Server is running!");
}

#[tokio::test]
async fn test_media_stream_requires_websocket_upgrade() {
    let app = routes::create_app(AppState::new(create_minimal_config(find_available_port())));

    let request = Request::builder()
        .uri("/media-stream")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_media_stream_rejects_post() {
    let app = routes::create_app(AppState::new(create_minimal_config(find_available_port())));

    let request = Request::builder()
        .method(Method::POST)
        .uri("/media-stream")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = routes::create_app(AppState::new(create_minimal_config(find_available_port())));

    let request = Request::builder()
        .uri("/incoming-call")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_server_serves_health_over_tcp() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = routes::create_app(AppState::new(create_minimal_config(addr.port())));

    let server = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let result = timeout(Duration::from_secs(2), async {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    })
    .await
    .expect("Server did not respond in time");

    assert!(result.starts_with("HTTP/1.1 200"));
    assert!(result.contains("Twilio Media Stream Server is running!"));

    server.abort();
}

#[test]
fn test_active_call_tracking() {
    let state = AppState::new(create_minimal_config(5050));
    assert_eq!(state.active_calls(), 0);

    let first = state.track_call();
    let second = state.track_call();
    assert_eq!(state.active_calls(), 2);

    drop(first);
    assert_eq!(state.active_calls(), 1);
    drop(second);
    assert_eq!(state.active_calls(), 0);
}

#[test]
fn test_config_address_and_tls() {
    let config = create_minimal_config(8443);
    assert_eq!(config.address(), "127.0.0.1:8443");
    assert!(!config.is_tls_enabled());
    assert_eq!(config.idle_timeout(), None);
    assert_eq!(config.shutdown_grace(), Duration::from_millis(2000));
}
