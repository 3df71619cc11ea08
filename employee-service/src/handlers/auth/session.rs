use axum::{extract::State, response::IntoResponse, Json};

use crate::{
    dtos::auth::LoginRequest, error::AppError, utils::validation::ValidatedJson, AppState,
};

/// Local password sign-in.
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let res = state.auth_service.login(req).await?;
    Ok(Json(res))
}
