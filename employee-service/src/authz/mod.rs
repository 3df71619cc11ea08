//! Authorization layer: claim catalog, named policies, and the self-edit guard.

pub mod claims;
pub mod policy;
pub mod self_edit;

pub use claims::Permission;
pub use policy::{evaluate, AuthzError, Decision, Policy};
pub use self_edit::resolve_target_user_id;

use std::collections::HashSet;

/// Role name that gates the self-edit guard.
pub const ADMIN_ROLE: &str = "Admin";

/// A fully resolved principal for authorization decisions.
///
/// Built by the auth middleware from the identity store at request time, so
/// every evaluation sees the principal's roles and claims as of that moment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    pub roles: Vec<String>,
    pub permissions: HashSet<Permission>,
}

impl Principal {
    pub fn new(user_id: String, roles: Vec<String>, permissions: HashSet<Permission>) -> Self {
        Self {
            user_id,
            roles,
            permissions,
        }
    }

    pub fn is_in_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }
}
