use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::JwtConfig;

/// JWT service for access token generation and validation
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expiry_minutes: i64,
}

/// Claims for access tokens (short-lived)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Email
    pub email: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// JWT ID
    pub jti: String,
}

impl JwtService {
    /// Create a new JWT service from the shared HS256 secret.
    pub fn new(config: &JwtConfig) -> Result<Self, anyhow::Error> {
        if config.secret.is_empty() {
            return Err(anyhow::anyhow!("JWT secret must not be empty"));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            access_token_expiry_minutes: config.access_token_expiry_minutes,
        })
    }

    pub fn access_token_expiry_minutes(&self) -> i64 {
        self.access_token_expiry_minutes
    }

    /// Generate an access token for a user
    pub fn generate_access_token(
        &self,
        user_id: &str,
        email: &str,
    ) -> Result<String, anyhow::Error> {
        let now = Utc::now();
        let exp = now + Duration::minutes(self.access_token_expiry_minutes);

        let claims = AccessTokenClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let header = Header::new(Algorithm::HS256);
        let token = encode(&header, &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode access token: {}", e))?;

        Ok(token)
    }

    /// Verify an access token and return its claims
    pub fn verify_access_token(&self, token: &str) -> Result<AccessTokenClaims, anyhow::Error> {
        let validation = Validation::new(Algorithm::HS256);
        let token_data = decode::<AccessTokenClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| anyhow::anyhow!("Invalid access token: {}", e))?;

        Ok(token_data.claims)
    }
}
