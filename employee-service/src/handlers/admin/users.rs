use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    authz::resolve_target_user_id,
    dtos::{
        admin::{
            EditUserRequest, ManageUserClaimsRequest, ManageUserRolesRequest, TargetUserQuery,
        },
        MessageResponse,
    },
    error::AppError,
    handlers::authorize,
    middleware::CurrentUser,
    utils::validation::ValidatedJson,
    AppState,
};

pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    authorize("CanViewUserPolicy", &principal, None)?;

    let users = state.admin_service.list_users().await?;
    Ok(Json(users))
}

pub async fn get_user(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    authorize("CanViewUserPolicy", &principal, None)?;

    let user = state.admin_service.get_user(user_id).await?;
    Ok(Json(user))
}

pub async fn edit_user(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(user_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<EditUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    authorize("CanEditUserPolicy", &principal, None)?;

    let user = state.admin_service.edit_user(user_id, req).await?;
    Ok(Json(user))
}

pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    authorize("CanDeleteUserPolicy", &principal, None)?;

    state.admin_service.delete_user(user_id).await?;
    Ok(Json(MessageResponse::new("User deleted")))
}

pub async fn get_user_roles(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(user_id): Path<Uuid>,
    Query(query): Query<TargetUserQuery>,
) -> Result<impl IntoResponse, AppError> {
    let path_id = user_id.to_string();
    let target = resolve_target_user_id(query.user_id.as_deref(), Some(&path_id));
    authorize("CannotSelfEditRolePolicy", &principal, target)?;

    let roles = state.admin_service.user_role_selections(user_id).await?;
    Ok(Json(roles))
}

/// Replace a user's role set, remove-all-then-add.
pub async fn manage_user_roles(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(user_id): Path<Uuid>,
    Query(query): Query<TargetUserQuery>,
    Json(req): Json<ManageUserRolesRequest>,
) -> Result<impl IntoResponse, AppError> {
    let path_id = user_id.to_string();
    let target = resolve_target_user_id(query.user_id.as_deref(), Some(&path_id));
    authorize("CannotSelfEditRolePolicy", &principal, target)?;

    state.admin_service.manage_user_roles(user_id, req).await?;
    Ok(Json(MessageResponse::new("User roles updated")))
}

pub async fn get_user_claims(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(user_id): Path<Uuid>,
    Query(query): Query<TargetUserQuery>,
) -> Result<impl IntoResponse, AppError> {
    let path_id = user_id.to_string();
    let target = resolve_target_user_id(query.user_id.as_deref(), Some(&path_id));
    authorize("CannotSelfEditRolePolicy", &principal, target)?;

    let claims = state.admin_service.user_claim_selections(user_id).await?;
    Ok(Json(claims))
}

/// Replace a user's claim set, remove-all-then-add, validated against
/// the claim catalog.
pub async fn manage_user_claims(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(user_id): Path<Uuid>,
    Query(query): Query<TargetUserQuery>,
    Json(req): Json<ManageUserClaimsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let path_id = user_id.to_string();
    let target = resolve_target_user_id(query.user_id.as_deref(), Some(&path_id));
    authorize("CannotSelfEditRolePolicy", &principal, target)?;

    state.admin_service.manage_user_claims(user_id, req).await?;
    Ok(Json(MessageResponse::new("User claims updated")))
}
