use thiserror::Error;

use crate::authz::AuthzError;
use crate::error::AppError;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    InternalString(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account locked out")]
    LockedOut,

    #[error("Email not confirmed")]
    EmailNotConfirmed,

    #[error("User already exists")]
    UserAlreadyExists,

    #[error("Email already registered")]
    EmailAlreadyRegistered,

    #[error("Role already exists")]
    RoleAlreadyExists,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("User not found")]
    UserNotFound,

    #[error("Role not found")]
    RoleNotFound,

    #[error("Employee not found")]
    EmployeeNotFound,

    #[error("Unknown claim: {0}")]
    UnknownClaim(String),

    #[error("Access denied")]
    AccessDenied,

    #[error("Email error: {0}")]
    EmailError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<AuthzError> for ServiceError {
    fn from(err: AuthzError) -> Self {
        // An unknown policy name is a wiring defect, not a caller error.
        ServiceError::InternalString(err.to_string())
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Database(e) => AppError::DatabaseError(anyhow::Error::new(e)),
            ServiceError::Internal(e) => AppError::InternalError(e),
            ServiceError::InternalString(e) => AppError::InternalError(anyhow::anyhow!(e)),
            ServiceError::InvalidCredentials => {
                AppError::AuthError(anyhow::anyhow!("Invalid login attempt"))
            }
            ServiceError::LockedOut => AppError::LockedOut,
            ServiceError::EmailNotConfirmed => {
                AppError::AuthError(anyhow::anyhow!("Email not confirmed yet"))
            }
            ServiceError::UserAlreadyExists => {
                AppError::Conflict(anyhow::anyhow!("User already exists"))
            }
            ServiceError::EmailAlreadyRegistered => {
                AppError::Conflict(anyhow::anyhow!("Email already registered"))
            }
            ServiceError::RoleAlreadyExists => {
                AppError::Conflict(anyhow::anyhow!("Role already exists"))
            }
            ServiceError::InvalidToken => AppError::BadRequest(anyhow::anyhow!("Invalid token")),
            ServiceError::TokenExpired => AppError::BadRequest(anyhow::anyhow!("Token expired")),
            ServiceError::UserNotFound => AppError::NotFound(anyhow::anyhow!("User not found")),
            ServiceError::RoleNotFound => AppError::NotFound(anyhow::anyhow!("Role not found")),
            ServiceError::EmployeeNotFound => {
                AppError::NotFound(anyhow::anyhow!("Employee not found"))
            }
            ServiceError::UnknownClaim(c) => {
                AppError::BadRequest(anyhow::anyhow!("Unknown claim: {c}"))
            }
            ServiceError::AccessDenied => AppError::Forbidden(anyhow::anyhow!("Access denied")),
            ServiceError::EmailError(e) => AppError::EmailError(e),
            ServiceError::ValidationError(e) => AppError::BadRequest(anyhow::anyhow!(e)),
        }
    }
}
