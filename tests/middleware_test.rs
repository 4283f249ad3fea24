mod test_utils;

use portico_cache::MemoryStore;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use test_utils::{spawn_app, spawn_app_configured};

#[tokio::test]
async fn requests_over_the_limit_get_429() {
    let app = spawn_app_configured(Arc::new(MemoryStore::new()), 3).await;

    let mut statuses = Vec::new();
    for _ in 0..4 {
        let response = app
            .client
            .post(app.url("/api/auth/register"))
            .json(&json!({"email": "limited@example.com", "password": "secret123"}))
            .send()
            .await
            .unwrap();
        statuses.push(response.status().as_u16());
    }

    assert_eq!(statuses[3], 429);
    // Only the requests under the limit reached the backend.
    assert_eq!(app.auth.register_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn health_and_metrics_are_not_rate_limited() {
    let app = spawn_app_configured(Arc::new(MemoryStore::new()), 1).await;

    for _ in 0..5 {
        let response = app.client.get(app.url("/health")).send().await.unwrap();
        assert_eq!(response.status().as_u16(), 200);
    }
}

#[tokio::test]
async fn inbound_request_id_is_echoed() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/api/auth/register"))
        .header("x-request-id", "trace-me-123")
        .json(&json!({"email": "traced@example.com", "password": "secret123"}))
        .send()
        .await
        .unwrap();

    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "trace-me-123"
    );
}

#[tokio::test]
async fn missing_request_id_is_generated() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&json!({"email": "untraced@example.com", "password": "secret123"}))
        .send()
        .await
        .unwrap();

    let id = response.headers().get("x-request-id").unwrap();
    assert!(!id.to_str().unwrap().is_empty());
}

#[tokio::test]
async fn health_reports_per_service_status() {
    let app = spawn_app().await;

    let response = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["services"]["geo"], "OK");
    assert_eq!(body["services"]["auth"], "OK");
    assert_eq!(body["services"]["user"], "OK");
}

#[tokio::test]
async fn health_degrades_when_a_backend_is_down() {
    let app = spawn_app().await;
    app.auth.fail_validate.store(true, Ordering::SeqCst);

    let response = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 500);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["services"]["auth"], "FAIL");
    assert_eq!(body["services"]["geo"], "OK");
}

#[tokio::test]
async fn metrics_endpoint_serves_prometheus_text() {
    let app = spawn_app().await;

    // Generate at least one request so counters exist.
    app.client
        .post(app.url("/api/auth/register"))
        .json(&json!({"email": "metrics@example.com", "password": "secret123"}))
        .send()
        .await
        .unwrap();

    let response = app.client.get(app.url("/metrics")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let text = response.text().await.unwrap();
    assert!(text.contains("gateway_http_requests_total"));
}

#[tokio::test]
async fn pagination_query_parameters_reach_the_backend() {
    let app = spawn_app().await;
    let token = app.register_and_login("paged@example.com").await;

    let response = app
        .client
        .get(app.url("/api/user/list?limit=7&offset=21"))
        .header("authorization", format!("Bearer {token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    assert_eq!(*app.user.last_page.lock().unwrap(), Some((7, 21)));
}
