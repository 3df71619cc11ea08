//! Registration, confirmation and login through the public routes.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use common::{assert_status, TestApp};
use employee_service::models::{TokenPurpose, VerificationToken};
use employee_service::services::IdentityStore;

#[tokio::test]
async fn test_register_confirm_login_flow() {
    let app = TestApp::new();

    // Register
    let response = app
        .request(
            "POST",
            "/auth/register",
            None,
            Some(json!({
                "user_name": "jo",
                "email": "jo@example.com",
                "password": "password123"
            })),
        )
        .await;
    let body = assert_status(response, StatusCode::CREATED).await;
    let user_id: Uuid = body["user_id"].as_str().unwrap().parse().unwrap();

    // Login before confirmation is rejected
    let response = app
        .request(
            "POST",
            "/auth/login",
            None,
            Some(json!({"email": "jo@example.com", "password": "password123"})),
        )
        .await;
    assert_status(response, StatusCode::UNAUTHORIZED).await;

    // Confirm with a planted token (the mock mailer drops the real one)
    let token = VerificationToken::new(user_id, "raw-confirm", TokenPurpose::EmailConfirmation);
    app.identity.insert_verification_token(&token).await.unwrap();

    let response = app
        .request(
            "GET",
            &format!("/auth/confirm-email?userId={user_id}&token=raw-confirm"),
            None,
            None,
        )
        .await;
    assert_status(response, StatusCode::OK).await;

    // Login now succeeds and returns a bearer token
    let response = app
        .request(
            "POST",
            "/auth/login",
            None,
            Some(json!({"email": "jo@example.com", "password": "password123"})),
        )
        .await;
    let body = assert_status(response, StatusCode::OK).await;
    assert_eq!(body["token_type"], "Bearer");
    assert!(body["access_token"].as_str().unwrap().contains('.'));
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let app = TestApp::new();

    let req = json!({
        "user_name": "jo",
        "email": "jo@example.com",
        "password": "password123"
    });
    let response = app.request("POST", "/auth/register", None, Some(req.clone())).await;
    assert_status(response, StatusCode::CREATED).await;

    let response = app.request("POST", "/auth/register", None, Some(req)).await;
    assert_status(response, StatusCode::CONFLICT).await;
}

#[tokio::test]
async fn test_register_validates_input() {
    let app = TestApp::new();

    let response = app
        .request(
            "POST",
            "/auth/register",
            None,
            Some(json!({
                "user_name": "jo",
                "email": "not-an-email",
                "password": "password123"
            })),
        )
        .await;
    assert_status(response, StatusCode::UNPROCESSABLE_ENTITY).await;

    let response = app
        .request(
            "POST",
            "/auth/register",
            None,
            Some(json!({
                "user_name": "jo",
                "email": "jo@example.com",
                "password": "short"
            })),
        )
        .await;
    assert_status(response, StatusCode::UNPROCESSABLE_ENTITY).await;
}

#[tokio::test]
async fn test_password_reset_is_enumeration_safe() {
    let app = TestApp::new();

    // Same response whether or not the address exists.
    let response = app
        .request(
            "POST",
            "/auth/password-reset/request",
            None,
            Some(json!({"email": "ghost@example.com"})),
        )
        .await;
    let ghost_body = assert_status(response, StatusCode::OK).await;

    app.request(
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "user_name": "jo",
            "email": "jo@example.com",
            "password": "password123"
        })),
    )
    .await;

    let response = app
        .request(
            "POST",
            "/auth/password-reset/request",
            None,
            Some(json!({"email": "jo@example.com"})),
        )
        .await;
    let real_body = assert_status(response, StatusCode::OK).await;

    assert_eq!(ghost_body, real_body);
}

#[tokio::test]
async fn test_external_callback_requires_confirmation() {
    let app = TestApp::new();

    let callback = json!({
        "provider": "google",
        "provider_key": "g-123",
        "email": "jo@example.com"
    });

    // First callback auto-creates the account but refuses to sign in.
    let response = app
        .request("POST", "/auth/external/callback", None, Some(callback.clone()))
        .await;
    assert_status(response, StatusCode::UNAUTHORIZED).await;

    let mut user = app
        .identity
        .find_user_by_email("jo@example.com")
        .await
        .unwrap()
        .expect("auto-created user");
    assert_eq!(user.user_name, "jo");

    user.email_confirmed = true;
    app.identity.update_user(&user).await.unwrap();

    let response = app
        .request("POST", "/auth/external/callback", None, Some(callback))
        .await;
    let body = assert_status(response, StatusCode::OK).await;
    assert_eq!(body["token_type"], "Bearer");
}
