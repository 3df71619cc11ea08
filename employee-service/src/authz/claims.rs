//! Claim catalog - the fixed set of permission claims the service recognizes.

use serde::{Deserialize, Serialize};

/// A permission claim a user can hold.
///
/// The catalog is closed: assignment requests naming anything outside this
/// enum are rejected before any store mutation happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    CreateUser,
    EditUser,
    DeleteUser,
    UserView,
    CreateRole,
    EditRole,
    DeleteRole,
}

impl Permission {
    /// Every recognized permission, in catalog order.
    pub const ALL: [Permission; 7] = [
        Permission::CreateUser,
        Permission::EditUser,
        Permission::DeleteUser,
        Permission::UserView,
        Permission::CreateRole,
        Permission::EditRole,
        Permission::DeleteRole,
    ];

    /// Canonical claim name as stored and displayed.
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::CreateUser => "Create User",
            Permission::EditUser => "Edit User",
            Permission::DeleteUser => "Delete User",
            Permission::UserView => "User View",
            Permission::CreateRole => "Create Role",
            Permission::EditRole => "Edit Role",
            Permission::DeleteRole => "Delete Role",
        }
    }

    /// Parse a claim name against the catalog. Returns None for anything
    /// not in the catalog.
    pub fn parse(name: &str) -> Option<Permission> {
        Permission::ALL.iter().copied().find(|p| p.as_str() == name)
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
