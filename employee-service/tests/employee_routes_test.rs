//! Employee CRUD through the routes, with protected id tokens.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{assert_status, TestApp};
use employee_service::authz::Permission;

fn employee_json(name: &str) -> serde_json::Value {
    json!({
        "name": name,
        "email": format!("{}@corp.example", name.to_lowercase()),
        "department": "it",
        "gender": "female",
        "photo_path": null
    })
}

#[tokio::test]
async fn test_employee_crud_roundtrip() {
    let app = TestApp::new();

    let (_, clerk) = app
        .seed_user(
            "clerk",
            &[],
            &[
                Permission::CreateUser,
                Permission::EditUser,
                Permission::DeleteUser,
                Permission::UserView,
            ],
        )
        .await;

    let response = app
        .request("POST", "/employees", Some(&clerk), Some(employee_json("Asha")))
        .await;
    let body = assert_status(response, StatusCode::CREATED).await;
    let id = body["id"].as_str().unwrap().to_string();

    // The exposed id is an opaque token, not the row number.
    assert!(id.parse::<i64>().is_err());

    let response = app
        .request("GET", &format!("/employees/{id}"), Some(&clerk), None)
        .await;
    let body = assert_status(response, StatusCode::OK).await;
    assert_eq!(body["name"], "Asha");
    assert_eq!(body["department"], "it");

    let mut updated = employee_json("Asha");
    updated["department"] = json!("payroll");
    let response = app
        .request(
            "PUT",
            &format!("/employees/{id}"),
            Some(&clerk),
            Some(updated),
        )
        .await;
    let body = assert_status(response, StatusCode::OK).await;
    assert_eq!(body["department"], "payroll");
    assert_eq!(body["id"].as_str().unwrap(), id);

    let response = app
        .request("DELETE", &format!("/employees/{id}"), Some(&clerk), None)
        .await;
    assert_status(response, StatusCode::OK).await;

    let response = app
        .request("GET", &format!("/employees/{id}"), Some(&clerk), None)
        .await;
    assert_status(response, StatusCode::NOT_FOUND).await;
}

#[tokio::test]
async fn test_forged_id_token_reads_as_not_found() {
    let app = TestApp::new();

    let (_, viewer) = app.seed_user("viewer", &[], &[Permission::UserView]).await;

    let response = app
        .request("GET", "/employees/AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA", Some(&viewer), None)
        .await;
    assert_status(response, StatusCode::NOT_FOUND).await;

    let response = app.request("GET", "/employees/42", Some(&viewer), None).await;
    assert_status(response, StatusCode::NOT_FOUND).await;
}

#[tokio::test]
async fn test_employee_routes_enforce_claims() {
    let app = TestApp::new();

    let (_, viewer) = app.seed_user("viewer", &[], &[Permission::UserView]).await;

    let response = app
        .request("POST", "/employees", Some(&viewer), Some(employee_json("Asha")))
        .await;
    assert_status(response, StatusCode::FORBIDDEN).await;

    let response = app.request("GET", "/employees", Some(&viewer), None).await;
    assert_status(response, StatusCode::OK).await;
}

#[tokio::test]
async fn test_listing_uses_protected_ids() {
    let app = TestApp::new();

    let (_, clerk) = app
        .seed_user(
            "clerk",
            &[],
            &[Permission::CreateUser, Permission::UserView],
        )
        .await;

    for name in ["Asha", "Bilal"] {
        let response = app
            .request("POST", "/employees", Some(&clerk), Some(employee_json(name)))
            .await;
        assert_status(response, StatusCode::CREATED).await;
    }

    let response = app.request("GET", "/employees", Some(&clerk), None).await;
    let body = assert_status(response, StatusCode::OK).await;
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 2);

    // Distinct rows yield distinct opaque ids.
    let first = rows[0]["id"].as_str().unwrap();
    let second = rows[1]["id"].as_str().unwrap();
    assert_ne!(first, second);
    assert!(first.parse::<i64>().is_err());
}
