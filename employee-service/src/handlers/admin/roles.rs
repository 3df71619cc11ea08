use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    dtos::{
        admin::{CreateRoleRequest, EditUsersInRoleRequest, UpdateRoleRequest},
        MessageResponse,
    },
    error::AppError,
    handlers::authorize,
    middleware::CurrentUser,
    utils::validation::ValidatedJson,
    AppState,
};

pub async fn create_role(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    ValidatedJson(req): ValidatedJson<CreateRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    authorize("CanCreateRolePolicy", &principal, None)?;

    let role = state.admin_service.create_role(req).await?;
    Ok((StatusCode::CREATED, Json(role)))
}

pub async fn list_roles(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    authorize("CanEditRolePolicy", &principal, None)?;

    let roles = state.admin_service.list_roles().await?;
    Ok(Json(roles))
}

pub async fn get_role(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(role_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    authorize("CanEditRolePolicy", &principal, None)?;

    let role = state.admin_service.get_role(role_id).await?;
    Ok(Json(role))
}

pub async fn update_role(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(role_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    authorize("CanEditRolePolicy", &principal, None)?;

    let role = state.admin_service.update_role(role_id, req).await?;
    Ok(Json(role))
}

pub async fn delete_role(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(role_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    authorize("CanDeleteRolePolicy", &principal, None)?;

    state.admin_service.delete_role(role_id).await?;
    Ok(Json(MessageResponse::new("Role deleted")))
}

pub async fn edit_users_in_role(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(role_id): Path<Uuid>,
    Json(req): Json<EditUsersInRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    authorize("CanEditRolePolicy", &principal, None)?;

    state.admin_service.edit_users_in_role(role_id, req).await?;
    Ok(Json(MessageResponse::new("Role membership updated")))
}
