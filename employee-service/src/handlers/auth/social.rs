use axum::{extract::State, response::IntoResponse, Json};

use crate::{
    dtos::auth::ExternalCallbackRequest, error::AppError, utils::validation::ValidatedJson,
    AppState,
};

/// Complete a sign-in asserted by an external identity provider.
///
/// Links or creates the local account, but the email confirmation gate
/// still applies before any token is issued.
pub async fn external_callback(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ExternalCallbackRequest>,
) -> Result<impl IntoResponse, AppError> {
    let res = state.auth_service.external_login_callback(req).await?;
    Ok(Json(res))
}
