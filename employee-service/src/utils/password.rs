//! Argon2id password hashing.
//!
//! Plaintext passwords only travel inside the [`Password`] newtype, whose
//! Debug output is redacted so they cannot leak through logging.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("stored password hash is malformed: {0}")]
    MalformedHash(String),
    #[error("password mismatch")]
    Mismatch,
}

/// A plaintext password in transit.
#[derive(Clone)]
pub struct Password(String);

impl Password {
    pub fn new(password: String) -> Self {
        Self(password)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(***)")
    }
}

/// A PHC-format Argon2 hash string as stored.
#[derive(Debug, Clone)]
pub struct PasswordHashString(String);

impl PasswordHashString {
    pub fn new(hash: String) -> Self {
        Self(hash)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Hash with Argon2id under default parameters. The fresh random salt
/// travels inside the PHC string.
pub fn hash_password(password: &Password) -> Result<PasswordHashString, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_str().as_bytes(), &salt)
        .map_err(|e| PasswordError::Hash(e.to_string()))?;

    Ok(PasswordHashString::new(hash.to_string()))
}

/// Verify a candidate password against a stored hash. The comparison
/// happens inside argon2 in constant time.
pub fn verify_password(
    password: &Password,
    stored: &PasswordHashString,
) -> Result<(), PasswordError> {
    let parsed = PasswordHash::new(stored.as_str())
        .map_err(|e| PasswordError::MalformedHash(e.to_string()))?;

    Argon2::default()
        .verify_password(password.as_str().as_bytes(), &parsed)
        .map_err(|_| PasswordError::Mismatch)
}
