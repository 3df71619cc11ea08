//! Named authorization policies.
//!
//! Policies are immutable configuration: the eight names below are the whole
//! set, resolved by exact string match. An unknown name is a deployment
//! mistake and fails the request as a configuration error rather than a
//! deny.

use thiserror::Error;

use super::self_edit;
use super::{Permission, Principal};

/// Outcome of a policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("unknown authorization policy '{0}'")]
    UnknownPolicy(String),
}

/// The recognized policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    CanCreateUser,
    CanEditUser,
    CanDeleteUser,
    CanViewUser,
    CanCreateRole,
    CanEditRole,
    CanDeleteRole,
    CannotSelfEditRole,
}

impl Policy {
    pub fn from_name(name: &str) -> Option<Policy> {
        match name {
            "CanCreateUserPolicy" => Some(Policy::CanCreateUser),
            "CanEditUserPolicy" => Some(Policy::CanEditUser),
            "CanDeleteUserPolicy" => Some(Policy::CanDeleteUser),
            "CanViewUserPolicy" => Some(Policy::CanViewUser),
            "CanCreateRolePolicy" => Some(Policy::CanCreateRole),
            "CanEditRolePolicy" => Some(Policy::CanEditRole),
            "CanDeleteRolePolicy" => Some(Policy::CanDeleteRole),
            "CannotSelfEditRolePolicy" => Some(Policy::CannotSelfEditRole),
            _ => None,
        }
    }

    /// The single permission a claim-based policy requires. The self-edit
    /// policy has no single claim; it delegates to the guard.
    fn required_permission(&self) -> Option<Permission> {
        match self {
            Policy::CanCreateUser => Some(Permission::CreateUser),
            Policy::CanEditUser => Some(Permission::EditUser),
            Policy::CanDeleteUser => Some(Permission::DeleteUser),
            Policy::CanViewUser => Some(Permission::UserView),
            Policy::CanCreateRole => Some(Permission::CreateRole),
            Policy::CanEditRole => Some(Permission::EditRole),
            Policy::CanDeleteRole => Some(Permission::DeleteRole),
            Policy::CannotSelfEditRole => None,
        }
    }
}

/// Evaluate a named policy for a principal.
///
/// `target_user_id` is the request context consumed by the self-edit
/// policy; claim-based policies ignore it.
///
/// - No IO
/// - No side effects (pure check of principal state + request context)
pub fn evaluate(
    policy_name: &str,
    principal: &Principal,
    target_user_id: Option<&str>,
) -> Result<Decision, AuthzError> {
    let policy = Policy::from_name(policy_name)
        .ok_or_else(|| AuthzError::UnknownPolicy(policy_name.to_string()))?;

    let decision = match policy.required_permission() {
        Some(permission) => {
            if principal.has_permission(permission) {
                Decision::Allow
            } else {
                Decision::Deny
            }
        }
        None => self_edit::check(principal, target_user_id),
    };

    Ok(decision)
}
