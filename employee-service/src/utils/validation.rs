//! JSON extraction with request-body validation.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::dtos::ErrorResponse;

/// Json extractor that runs the DTO's `validator` rules after
/// deserializing. Malformed JSON is a 400; a well-formed body that fails
/// its rules is a 422.
pub struct ValidatedJson<T>(pub T);

pub enum ValidationRejection {
    Parse(JsonRejection),
    Rules(validator::ValidationErrors),
}

impl IntoResponse for ValidationRejection {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ValidationRejection::Parse(e) => {
                (StatusCode::BAD_REQUEST, format!("Json parse error: {e}"))
            }
            ValidationRejection::Rules(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("Validation error: {e}"),
            ),
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = ValidationRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(ValidationRejection::Parse)?;

        value.validate().map_err(ValidationRejection::Rules)?;

        Ok(ValidatedJson(value))
    }
}
