//! Verification token model - single-use email confirmation and password
//! reset tokens.
//!
//! Only the SHA-256 digest of a token is stored; the raw value exists in
//! the email link alone.

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use sqlx::FromRow;
use uuid::Uuid;

/// Token purpose. Lifespans mirror the original provider configuration:
/// a day for email confirmation, five hours for password reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurpose {
    EmailConfirmation,
    PasswordReset,
}

impl TokenPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenPurpose::EmailConfirmation => "email_confirmation",
            TokenPurpose::PasswordReset => "password_reset",
        }
    }

    fn lifespan(&self) -> Duration {
        match self {
            TokenPurpose::EmailConfirmation => Duration::hours(24),
            TokenPurpose::PasswordReset => Duration::hours(5),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct VerificationToken {
    pub token_id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub purpose: String,
    pub expires_utc: DateTime<Utc>,
    pub created_utc: DateTime<Utc>,
}

impl VerificationToken {
    pub fn new(user_id: Uuid, raw_token: &str, purpose: TokenPurpose) -> Self {
        let now = Utc::now();
        Self {
            token_id: Uuid::new_v4(),
            user_id,
            token_hash: Self::hash_token(raw_token),
            purpose: purpose.as_str().to_string(),
            expires_utc: now + purpose.lifespan(),
            created_utc: now,
        }
    }

    pub fn hash_token(raw_token: &str) -> String {
        hex::encode(Sha256::digest(raw_token.as_bytes()))
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_utc <= now
    }
}
