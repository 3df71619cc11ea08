//! Role model - named permission groups.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Role entity. Deleting a role removes memberships, never users.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Role {
    pub role_id: Uuid,
    pub name: String,
    pub created_utc: DateTime<Utc>,
}

impl Role {
    pub fn new(name: String) -> Self {
        Self {
            role_id: Uuid::new_v4(),
            name,
            created_utc: Utc::now(),
        }
    }
}

/// Role with its member user names, for the role detail view.
#[derive(Debug, Serialize)]
pub struct RoleWithMembers {
    #[serde(flatten)]
    pub role: Role,
    pub members: Vec<String>,
}
