use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::Rng;
use uuid::Uuid;

use crate::{
    dtos::auth::{
        AddPasswordRequest, ChangePasswordRequest, ConfirmEmailRequest, ExternalCallbackRequest,
        LoginRequest, LoginResponse, PasswordResetConfirm, PasswordResetRequest, RegisterRequest,
        RegisterResponse,
    },
    models::{ExternalLogin, TokenPurpose, User, VerificationToken},
    services::{EmailProvider, IdentityStore, JwtService, ServiceError},
    utils::{
        email_domain::is_allowed_domain,
        password::{hash_password, verify_password, Password, PasswordHashString},
    },
};

/// Lockout policy applied to local password sign-in.
#[derive(Debug, Clone)]
pub struct LockoutPolicy {
    pub max_failed_attempts: i32,
    pub duration_minutes: i64,
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn IdentityStore>,
    email: Arc<dyn EmailProvider>,
    jwt: JwtService,
    base_url: String,
    lockout: LockoutPolicy,
    allowed_email_domain: Option<String>,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn IdentityStore>,
        email: Arc<dyn EmailProvider>,
        jwt: JwtService,
        base_url: String,
        lockout: LockoutPolicy,
        allowed_email_domain: Option<String>,
    ) -> Self {
        Self {
            store,
            email,
            jwt,
            base_url,
            lockout,
            allowed_email_domain,
        }
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<RegisterResponse, ServiceError> {
        if !is_allowed_domain(&req.email, self.allowed_email_domain.as_deref()) {
            return Err(ServiceError::ValidationError(
                "Email domain is not allowed".to_string(),
            ));
        }

        if self
            .store
            .find_user_by_email(&req.email)
            .await?
            .is_some()
        {
            return Err(ServiceError::EmailAlreadyRegistered);
        }
        if self
            .store
            .find_user_by_name(&req.user_name)
            .await?
            .is_some()
        {
            return Err(ServiceError::UserAlreadyExists);
        }

        let password_hash = hash_password(&Password::new(req.password.clone())).map_err(|e| {
            ServiceError::Internal(anyhow::anyhow!("Password hashing error: {}", e))
        })?;

        let user = User::new(
            req.user_name.clone(),
            req.email.clone(),
            Some(password_hash.into_string()),
        );
        self.store.insert_user(&user).await?;

        tracing::info!(user_id = %user.user_id, "User registered");

        self.issue_confirmation_email(&user).await?;

        Ok(RegisterResponse {
            user_id: user.user_id.to_string(),
            message: "Registration successful. Please check your email to confirm your account."
                .to_string(),
        })
    }

    pub async fn confirm_email(&self, req: ConfirmEmailRequest) -> Result<(), ServiceError> {
        let user_id: Uuid = req
            .user_id
            .parse()
            .map_err(|_| ServiceError::InvalidToken)?;

        let mut user = self
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or(ServiceError::InvalidToken)?;

        let token = self
            .store
            .find_verification_token(
                user_id,
                &VerificationToken::hash_token(&req.token),
                TokenPurpose::EmailConfirmation.as_str(),
            )
            .await?
            .ok_or(ServiceError::InvalidToken)?;

        if token.is_expired(Utc::now()) {
            return Err(ServiceError::TokenExpired);
        }

        user.email_confirmed = true;
        self.store.update_user(&user).await?;
        self.store
            .delete_verification_tokens(user_id, TokenPurpose::EmailConfirmation.as_str())
            .await?;

        tracing::info!(user_id = %user.user_id, "Email confirmed");
        Ok(())
    }

    /// Local password sign-in.
    ///
    /// Order of checks: active lockout wins over everything, then the
    /// unconfirmed-email check (only for a matching password, so the
    /// response cannot be used to probe addresses), then credential
    /// verification with failure counting.
    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse, ServiceError> {
        let mut user = self
            .store
            .find_user_by_email(&req.email)
            .await?
            .ok_or(ServiceError::InvalidCredentials)?;

        let now = Utc::now();
        if user.is_locked_out(now) {
            tracing::warn!(user_id = %user.user_id, "Login attempt on locked account");
            return Err(ServiceError::LockedOut);
        }

        let password = Password::new(req.password.clone());
        let password_matches = match &user.password_hash {
            Some(hash) => {
                verify_password(&password, &PasswordHashString::new(hash.clone())).is_ok()
            }
            None => false,
        };

        if !user.email_confirmed && password_matches {
            return Err(ServiceError::EmailNotConfirmed);
        }

        if !password_matches {
            user.failed_login_attempts += 1;
            if user.failed_login_attempts >= self.lockout.max_failed_attempts {
                user.lockout_end = Some(now + Duration::minutes(self.lockout.duration_minutes));
                user.failed_login_attempts = 0;
                self.store.update_user(&user).await?;
                tracing::warn!(user_id = %user.user_id, "Account locked out");
                return Err(ServiceError::LockedOut);
            }
            self.store.update_user(&user).await?;
            return Err(ServiceError::InvalidCredentials);
        }

        user.failed_login_attempts = 0;
        user.lockout_end = None;
        self.store.update_user(&user).await?;

        self.issue_tokens(&user)
    }

    /// Complete a sign-in asserted by an external provider.
    ///
    /// Links or auto-creates the local account, but never skips the email
    /// confirmation gate.
    pub async fn external_login_callback(
        &self,
        req: ExternalCallbackRequest,
    ) -> Result<LoginResponse, ServiceError> {
        let user = match self
            .store
            .find_external_login(&req.provider, &req.provider_key)
            .await?
        {
            Some(link) => self
                .store
                .find_user_by_id(link.user_id)
                .await?
                .ok_or(ServiceError::UserNotFound)?,
            None => {
                let user = match self.store.find_user_by_email(&req.email).await? {
                    Some(user) => user,
                    None => {
                        // First sign-in through this provider: create the
                        // local account without a password.
                        let user_name = req
                            .email
                            .split('@')
                            .next()
                            .unwrap_or(&req.email)
                            .to_string();
                        let user = User::new(user_name, req.email.clone(), None);
                        self.store.insert_user(&user).await?;
                        self.issue_confirmation_email(&user).await?;
                        tracing::info!(
                            user_id = %user.user_id,
                            provider = %req.provider,
                            "User auto-created from external login"
                        );
                        user
                    }
                };
                self.store
                    .insert_external_login(&ExternalLogin {
                        provider: req.provider.clone(),
                        provider_key: req.provider_key.clone(),
                        user_id: user.user_id,
                    })
                    .await?;
                user
            }
        };

        if user.is_locked_out(Utc::now()) {
            return Err(ServiceError::LockedOut);
        }
        if !user.email_confirmed {
            return Err(ServiceError::EmailNotConfirmed);
        }

        self.issue_tokens(&user)
    }

    /// Start the password reset flow. The outcome is identical whether or
    /// not the address belongs to a confirmed account.
    pub async fn request_password_reset(
        &self,
        req: PasswordResetRequest,
    ) -> Result<(), ServiceError> {
        if let Some(user) = self.store.find_user_by_email(&req.email).await? {
            if user.email_confirmed {
                let raw_token = generate_random_token();
                let token = VerificationToken::new(
                    user.user_id,
                    &raw_token,
                    TokenPurpose::PasswordReset,
                );
                self.store
                    .delete_verification_tokens(user.user_id, TokenPurpose::PasswordReset.as_str())
                    .await?;
                self.store.insert_verification_token(&token).await?;

                self.email
                    .send_password_reset_email(&user.email, &raw_token, &self.base_url)
                    .await
                    .map_err(|e| ServiceError::EmailError(e.to_string()))?;

                tracing::info!(user_id = %user.user_id, "Password reset email sent");
            }
        }
        Ok(())
    }

    /// Complete the password reset flow.
    ///
    /// An unknown address succeeds silently to stay enumeration-safe; a
    /// bad or expired token on a real account is reported so the holder
    /// of a stale link can request a fresh one.
    pub async fn confirm_password_reset(
        &self,
        req: PasswordResetConfirm,
    ) -> Result<(), ServiceError> {
        let Some(mut user) = self.store.find_user_by_email(&req.email).await? else {
            return Ok(());
        };

        let token = self
            .store
            .find_verification_token(
                user.user_id,
                &VerificationToken::hash_token(&req.token),
                TokenPurpose::PasswordReset.as_str(),
            )
            .await?
            .ok_or(ServiceError::InvalidToken)?;

        if token.is_expired(Utc::now()) {
            return Err(ServiceError::TokenExpired);
        }

        let password_hash =
            hash_password(&Password::new(req.new_password.clone())).map_err(|e| {
                ServiceError::Internal(anyhow::anyhow!("Password hashing error: {}", e))
            })?;

        user.password_hash = Some(password_hash.into_string());
        // A completed reset proves account ownership, so the lockout
        // state resets with the password.
        user.failed_login_attempts = 0;
        user.lockout_end = None;
        self.store.update_user(&user).await?;
        self.store
            .delete_verification_tokens(user.user_id, TokenPurpose::PasswordReset.as_str())
            .await?;

        tracing::info!(user_id = %user.user_id, "Password reset completed");
        Ok(())
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        req: ChangePasswordRequest,
    ) -> Result<(), ServiceError> {
        let mut user = self
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        let current_hash = user
            .password_hash
            .clone()
            .ok_or(ServiceError::InvalidCredentials)?;

        verify_password(
            &Password::new(req.current_password.clone()),
            &PasswordHashString::new(current_hash),
        )
        .map_err(|_| ServiceError::InvalidCredentials)?;

        let password_hash =
            hash_password(&Password::new(req.new_password.clone())).map_err(|e| {
                ServiceError::Internal(anyhow::anyhow!("Password hashing error: {}", e))
            })?;
        user.password_hash = Some(password_hash.into_string());
        self.store.update_user(&user).await?;

        tracing::info!(user_id = %user.user_id, "Password changed");
        Ok(())
    }

    /// Add a local password to an external-login-only account.
    pub async fn add_password(
        &self,
        user_id: Uuid,
        req: AddPasswordRequest,
    ) -> Result<(), ServiceError> {
        let mut user = self
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        if user.password_hash.is_some() {
            return Err(ServiceError::ValidationError(
                "Account already has a password".to_string(),
            ));
        }

        let password_hash =
            hash_password(&Password::new(req.new_password.clone())).map_err(|e| {
                ServiceError::Internal(anyhow::anyhow!("Password hashing error: {}", e))
            })?;
        user.password_hash = Some(password_hash.into_string());
        self.store.update_user(&user).await?;

        tracing::info!(user_id = %user.user_id, "Password added");
        Ok(())
    }

    async fn issue_confirmation_email(&self, user: &User) -> Result<(), ServiceError> {
        let raw_token = generate_random_token();
        let token =
            VerificationToken::new(user.user_id, &raw_token, TokenPurpose::EmailConfirmation);
        self.store
            .delete_verification_tokens(user.user_id, TokenPurpose::EmailConfirmation.as_str())
            .await?;
        self.store.insert_verification_token(&token).await?;

        self.email
            .send_confirmation_email(
                &user.email,
                &user.user_id.to_string(),
                &raw_token,
                &self.base_url,
            )
            .await
            .map_err(|e| ServiceError::EmailError(e.to_string()))
    }

    fn issue_tokens(&self, user: &User) -> Result<LoginResponse, ServiceError> {
        let access_token = self
            .jwt
            .generate_access_token(&user.user_id.to_string(), &user.email)
            .map_err(ServiceError::Internal)?;

        Ok(LoginResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt.access_token_expiry_minutes() * 60,
        })
    }
}

fn generate_random_token() -> String {
    let mut rng = rand::thread_rng();
    let token_bytes: [u8; 32] = rng.gen();
    hex::encode(token_bytes)
}
