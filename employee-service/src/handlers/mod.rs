//! HTTP handlers.

pub mod admin;
pub mod auth;
pub mod employees;

use crate::authz::{self, Decision, Principal};
use crate::error::AppError;

/// Evaluate a named policy for the caller, turning Deny into a generic
/// 403 and an unknown policy name into a configuration error.
pub(crate) fn authorize(
    policy_name: &str,
    principal: &Principal,
    target_user_id: Option<&str>,
) -> Result<(), AppError> {
    match authz::evaluate(policy_name, principal, target_user_id) {
        Ok(Decision::Allow) => Ok(()),
        Ok(Decision::Deny) => Err(AppError::Forbidden(anyhow::anyhow!("Access denied"))),
        Err(e) => Err(AppError::ConfigError(anyhow::anyhow!(e))),
    }
}
