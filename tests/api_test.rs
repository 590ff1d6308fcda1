//! HTTP gateway tests
//!
//! Drive the router in-process with `tower::ServiceExt::oneshot`. No
//! analyzer is configured, so every analysis answers from the fallback path.

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use threatscope::api::{create_router, AppState, RateLimitConfig, RateLimiter};
use threatscope::models::EngineConfig;
use tower::ServiceExt;

fn offline_config() -> Arc<EngineConfig> {
    Arc::new(EngineConfig {
        url_analyzer: None,
        network_analyzer: None,
        ..EngineConfig::default()
    })
}

fn app() -> Router {
    create_router(Arc::new(AppState::new(offline_config())))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_health() {
    for uri in ["/health", "/v1/health"] {
        let (status, body) = send(app(), get(uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "healthy");
    }
}

#[tokio::test]
async fn test_analyze_url_fallback() {
    let (status, body) = send(app(), post_json("/v1/analyze/url", json!({"url": "https://example.com"}))).await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["source"], "Fallback");
    assert_eq!(data["note"], "external analysis unavailable");
    assert_eq!(data["kind"], "url");
    assert_eq!(data["result"]["threat_score"], 100);
    assert_eq!(data["result"]["risk_level"], "Low Risk");
}

#[tokio::test]
async fn test_analyze_url_requires_url() {
    let (status, body) = send(app(), post_json("/v1/analyze/url", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["message"], "URL is required");
}

#[tokio::test]
async fn test_analyze_url_rejects_garbage() {
    let (status, body) = send(app(), post_json("/v1/analyze/url", json!({"url": "definitely not a url"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Invalid URL format");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let request = Request::builder()
        .method("POST")
        .uri("/v1/analyze/url")
        .header("content-type", "application/json")
        .body(Body::from("{\"url\": "))
        .unwrap();

    let (status, body) = send(app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "API_BAD_REQUEST");
}

#[tokio::test]
async fn test_analyze_network_defaults_range() {
    let (status, body) = send(app(), post_json("/v1/analyze/network", json!({}))).await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["subject"], "192.168.1.0/24");
    assert_eq!(data["result"]["statistics"]["total_devices"], 2);
    assert!(data["result"]["limitation"].is_string());
    assert_eq!(data["result"]["threats"], json!([]));
    assert!(data["id"].is_string());
}

#[tokio::test]
async fn test_analyze_network_custom_range() {
    let (_, body) = send(
        app(),
        post_json("/v1/analyze/network", json!({"networkRange": "10.0.0.0/24"})),
    )
    .await;
    assert_eq!(body["data"]["result"]["network_range"], "10.0.0.0/24");
}

#[tokio::test]
async fn test_check_breach() {
    let (status, body) = send(app(), post_json("/v1/check-breach", json!({"email": "test@example.com"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_compromised"], true);
    assert_eq!(body["data"]["breach_count"], 2);
    assert_eq!(body["data"]["risk_assessment"]["level"], "Medium");

    let (status, body) = send(app(), post_json("/v1/check-breach", json!({"email": " "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Email is required");
}

#[tokio::test]
async fn test_stats_count_fallbacks() {
    let state = Arc::new(AppState::new(offline_config()));
    let app = create_router(state.clone());

    send(app.clone(), post_json("/v1/analyze/url", json!({"url": "http://example.com"}))).await;
    let (status, body) = send(app, get("/v1/stats")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_analyzed"], 1);
    assert_eq!(body["data"]["fallback_results"], 1);
    assert_eq!(body["data"]["failures_by_reason"]["spawn_error"], 1);
    assert_eq!(body["data"]["tiers"]["Low"], 1);
}

#[tokio::test]
async fn test_rate_limit() {
    let limiter = Arc::new(RateLimiter::new(RateLimitConfig {
        requests_per_window: 1,
        window_duration: Duration::from_secs(60),
    }));
    let state = AppState::new(offline_config()).with_rate_limiter(limiter);
    let app = create_router(Arc::new(state));

    let request = || {
        Request::builder()
            .uri("/v1/stats")
            .header("x-forwarded-for", "198.51.100.7")
            .body(Body::empty())
            .unwrap()
    };

    let first = app.clone().oneshot(request()).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(first.headers()["x-ratelimit-remaining"], "0");

    let (status, body) = send(app.clone(), request()).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "API_RATE_LIMITED");

    // health checks are never limited
    let health = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-forwarded-for", "198.51.100.7")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);
}
