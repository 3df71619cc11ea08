use std::env;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub port: u16,
    pub base_url: String,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub security: SecurityConfig,
    pub smtp: SmtpConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expiry_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// 64 hex characters; keys the id protector.
    pub protection_master_key: String,
    pub lockout_max_failed_attempts: i32,
    pub lockout_duration_minutes: i64,
    /// When set, registration only accepts addresses in this domain.
    pub allowed_email_domain: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub from_address: String,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let config = ServiceConfig {
            environment,
            service_name: get_env("SERVICE_NAME", Some("employee-service"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            port: get_env("PORT", Some("8080"), is_prod)?
                .parse()
                .map_err(|e: std::num::ParseIntError| {
                    AppError::ConfigError(anyhow::anyhow!(e.to_string()))
                })?,
            base_url: get_env("BASE_URL", Some("http://localhost:8080"), is_prod)?,
            database: DatabaseConfig {
                url: get_env(
                    "DATABASE_URL",
                    Some("postgres://localhost/employee_service"),
                    is_prod,
                )?,
                max_connections: get_env("DATABASE_MAX_CONNECTIONS", Some("10"), is_prod)?
                    .parse()
                    .unwrap_or(10),
                min_connections: get_env("DATABASE_MIN_CONNECTIONS", Some("1"), is_prod)?
                    .parse()
                    .unwrap_or(1),
            },
            jwt: JwtConfig {
                secret: get_env("JWT_SECRET", Some("dev-only-secret-change-me"), is_prod)?,
                access_token_expiry_minutes: get_env(
                    "JWT_ACCESS_TOKEN_EXPIRY_MINUTES",
                    Some("60"),
                    is_prod,
                )?
                .parse()
                .map_err(|e: std::num::ParseIntError| {
                    AppError::ConfigError(anyhow::anyhow!(e.to_string()))
                })?,
            },
            security: SecurityConfig {
                protection_master_key: get_env(
                    "PROTECTION_MASTER_KEY",
                    Some("6f6c3d8a1b2c4e5f00112233445566778899aabbccddeeff0011223344556677"),
                    is_prod,
                )?,
                lockout_max_failed_attempts: get_env(
                    "LOCKOUT_MAX_FAILED_ATTEMPTS",
                    Some("3"),
                    is_prod,
                )?
                .parse()
                .unwrap_or(3),
                lockout_duration_minutes: get_env("LOCKOUT_DURATION_MINUTES", Some("15"), is_prod)?
                    .parse()
                    .unwrap_or(15),
                allowed_email_domain: env::var("ALLOWED_EMAIL_DOMAIN").ok().filter(|d| {
                    !d.trim().is_empty()
                }),
            },
            smtp: SmtpConfig {
                host: get_env("SMTP_HOST", Some("localhost"), is_prod)?,
                port: get_env("SMTP_PORT", Some("587"), is_prod)?
                    .parse()
                    .unwrap_or(587),
                user: get_env("SMTP_USER", Some(""), is_prod)?,
                password: get_env("SMTP_PASSWORD", Some(""), is_prod)?,
                from_address: get_env(
                    "SMTP_FROM_ADDRESS",
                    Some("no-reply@localhost"),
                    is_prod,
                )?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        if self.jwt.access_token_expiry_minutes <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_ACCESS_TOKEN_EXPIRY_MINUTES must be positive"
            )));
        }

        if self.security.protection_master_key.len() != 64
            || !self
                .security
                .protection_master_key
                .chars()
                .all(|c| c.is_ascii_hexdigit())
        {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PROTECTION_MASTER_KEY must be 64 hex characters"
            )));
        }

        if self.security.lockout_max_failed_attempts <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "LOCKOUT_MAX_FAILED_ATTEMPTS must be positive"
            )));
        }

        if self.environment == Environment::Prod
            && self.jwt.secret == "dev-only-secret-change-me"
        {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_SECRET must be set explicitly in production"
            )));
        }

        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}
