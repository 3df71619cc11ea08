use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    dtos::{
        employee::{CreateEmployeeRequest, UpdateEmployeeRequest},
        MessageResponse,
    },
    error::AppError,
    handlers::authorize,
    middleware::CurrentUser,
    utils::validation::ValidatedJson,
    AppState,
};

pub async fn list_employees(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    authorize("CanViewUserPolicy", &principal, None)?;

    let employees = state.employee_service.list().await?;
    Ok(Json(employees))
}

pub async fn create_employee(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    ValidatedJson(req): ValidatedJson<CreateEmployeeRequest>,
) -> Result<impl IntoResponse, AppError> {
    authorize("CanCreateUserPolicy", &principal, None)?;

    let employee = state.employee_service.create(req).await?;
    Ok((StatusCode::CREATED, Json(employee)))
}

/// Fetch one employee by protected id token. A forged or foreign token
/// reads as 404.
pub async fn get_employee(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    authorize("CanViewUserPolicy", &principal, None)?;

    let employee = state.employee_service.get(&id).await?;
    Ok(Json(employee))
}

pub async fn update_employee(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateEmployeeRequest>,
) -> Result<impl IntoResponse, AppError> {
    authorize("CanEditUserPolicy", &principal, None)?;

    let employee = state.employee_service.update(&id, req).await?;
    Ok(Json(employee))
}

pub async fn delete_employee(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    authorize("CanDeleteUserPolicy", &principal, None)?;

    state.employee_service.delete(&id).await?;
    Ok(Json(MessageResponse::new("Employee deleted")))
}
