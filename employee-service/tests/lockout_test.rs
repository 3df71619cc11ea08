//! Login lockout behavior through the public routes.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{assert_status, TestApp};

async fn register_confirmed(app: &TestApp, email: &str, password: &str) {
    use employee_service::services::IdentityStore;

    let response = app
        .request(
            "POST",
            "/auth/register",
            None,
            Some(json!({
                "user_name": email.split('@').next().unwrap(),
                "email": email,
                "password": password
            })),
        )
        .await;
    assert_status(response, StatusCode::CREATED).await;

    let mut user = app
        .identity
        .find_user_by_email(email)
        .await
        .unwrap()
        .unwrap();
    user.email_confirmed = true;
    app.identity.update_user(&user).await.unwrap();
}

#[tokio::test]
async fn test_third_failure_locks_the_account() {
    let app = TestApp::new();
    register_confirmed(&app, "jo@example.com", "password123").await;

    let bad = json!({"email": "jo@example.com", "password": "wrong"});

    for _ in 0..2 {
        let response = app.request("POST", "/auth/login", None, Some(bad.clone())).await;
        assert_status(response, StatusCode::UNAUTHORIZED).await;
    }

    let response = app.request("POST", "/auth/login", None, Some(bad)).await;
    assert_status(response, StatusCode::LOCKED).await;

    // Correct credentials inside the window still get the locked response.
    let response = app
        .request(
            "POST",
            "/auth/login",
            None,
            Some(json!({"email": "jo@example.com", "password": "password123"})),
        )
        .await;
    assert_status(response, StatusCode::LOCKED).await;
}

#[tokio::test]
async fn test_two_failures_then_success_resets_the_counter() {
    let app = TestApp::new();
    register_confirmed(&app, "jo@example.com", "password123").await;

    let bad = json!({"email": "jo@example.com", "password": "wrong"});
    let good = json!({"email": "jo@example.com", "password": "password123"});

    for _ in 0..2 {
        let response = app.request("POST", "/auth/login", None, Some(bad.clone())).await;
        assert_status(response, StatusCode::UNAUTHORIZED).await;
    }

    let response = app.request("POST", "/auth/login", None, Some(good)).await;
    assert_status(response, StatusCode::OK).await;

    // The counter restarted: two more failures do not lock.
    for _ in 0..2 {
        let response = app.request("POST", "/auth/login", None, Some(bad.clone())).await;
        assert_status(response, StatusCode::UNAUTHORIZED).await;
    }
}

#[tokio::test]
async fn test_unknown_email_reads_like_bad_password() {
    let app = TestApp::new();
    register_confirmed(&app, "jo@example.com", "password123").await;

    let unknown = app
        .request(
            "POST",
            "/auth/login",
            None,
            Some(json!({"email": "ghost@example.com", "password": "password123"})),
        )
        .await;
    let wrong = app
        .request(
            "POST",
            "/auth/login",
            None,
            Some(json!({"email": "jo@example.com", "password": "wrong"})),
        )
        .await;

    let unknown_body = assert_status(unknown, StatusCode::UNAUTHORIZED).await;
    let wrong_body = assert_status(wrong, StatusCode::UNAUTHORIZED).await;
    assert_eq!(unknown_body, wrong_body);
}
