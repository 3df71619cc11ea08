//! User model - account records owned by the identity store.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// User account entity.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub user_id: Uuid,
    pub user_name: String,
    pub email: String,
    pub email_confirmed: bool,
    /// None for accounts created through an external provider that never
    /// added a local password.
    pub password_hash: Option<String>,
    pub failed_login_attempts: i32,
    pub lockout_end: Option<DateTime<Utc>>,
    pub created_utc: DateTime<Utc>,
}

impl User {
    /// Create a new unconfirmed user with a local password hash.
    pub fn new(user_name: String, email: String, password_hash: Option<String>) -> Self {
        Self {
            user_id: Uuid::new_v4(),
            user_name,
            email,
            email_confirmed: false,
            password_hash,
            failed_login_attempts: 0,
            lockout_end: None,
            created_utc: Utc::now(),
        }
    }

    /// Whether the account is currently locked out.
    pub fn is_locked_out(&self, now: DateTime<Utc>) -> bool {
        self.lockout_end.is_some_and(|end| end > now)
    }

    /// Convert to a response without credential or lockout internals.
    pub fn sanitized(&self) -> UserResponse {
        UserResponse {
            user_id: self.user_id,
            user_name: self.user_name.clone(),
            email: self.email.clone(),
            email_confirmed: self.email_confirmed,
            created_utc: self.created_utc,
        }
    }
}

/// External login link: one provider identity pointing at a local account.
#[derive(Debug, Clone, FromRow)]
pub struct ExternalLogin {
    pub provider: String,
    pub provider_key: String,
    pub user_id: Uuid,
}

/// User response for API (no sensitive fields).
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub user_id: Uuid,
    pub user_name: String,
    pub email: String,
    pub email_confirmed: bool,
    pub created_utc: DateTime<Utc>,
}
