mod test_utils;

use serde_json::{Value, json};
use std::sync::atomic::Ordering;
use test_utils::spawn_app;

#[tokio::test]
async fn register_returns_created_with_user_id() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&json!({"email": "new@example.com", "password": "secret123"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    assert!(!body["user_id"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = spawn_app().await;
    let payload = json!({"email": "dup@example.com", "password": "secret123"});

    let first = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(first.status().as_u16(), 201);

    let second = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status().as_u16(), 409);

    let body: Value = second.json().await.unwrap();
    assert_eq!(body["code"], 409);
    assert!(body["error"].as_str().unwrap().contains("already exists"));
}

#[tokio::test]
async fn malformed_body_is_rejected_before_the_backend() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/api/auth/register"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(app.auth.register_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn login_returns_a_usable_token() {
    let app = spawn_app().await;
    let token = app.register_and_login("login@example.com").await;
    assert!(!token.is_empty());

    // The token works against a protected route.
    let response = app
        .client
        .get(app.url("/api/user/profile"))
        .header("authorization", format!("Bearer {token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let app = spawn_app().await;
    app.register_and_login("victim@example.com").await;

    let response = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&json!({"email": "victim@example.com", "password": "wrong-password"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 401);
}
