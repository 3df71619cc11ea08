//! Test helpers for router-level integration tests.
//!
//! Everything runs against the in-memory stores, so no Postgres or SMTP
//! relay is needed.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::Value;
use tower::util::ServiceExt;
use uuid::Uuid;

use employee_service::{
    authz::Permission,
    build_router,
    config::{
        DatabaseConfig, Environment, JwtConfig, SecurityConfig, ServiceConfig, SmtpConfig,
    },
    models::{Role, User},
    services::{
        AdminService, AuthService, EmployeeService, IdProtector, IdentityStore, JwtService,
        LockoutPolicy, MemoryEmployeeStore, MemoryIdentityStore, MockEmailService,
        EMPLOYEE_ID_PURPOSE,
    },
    AppState,
};

pub const TEST_MASTER_KEY: &str =
    "6f6c3d8a1b2c4e5f00112233445566778899aabbccddeeff0011223344556677";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub identity: Arc<MemoryIdentityStore>,
}

impl TestApp {
    pub fn new() -> Self {
        let config = test_config();
        let identity = Arc::new(MemoryIdentityStore::new());
        let employees = Arc::new(MemoryEmployeeStore::new());

        let jwt = JwtService::new(&config.jwt).expect("jwt service");
        let master_key = IdProtector::parse_master_key(TEST_MASTER_KEY).expect("master key");
        let protector = IdProtector::new(&master_key, EMPLOYEE_ID_PURPOSE);

        let auth_service = AuthService::new(
            identity.clone(),
            Arc::new(MockEmailService),
            jwt.clone(),
            config.base_url.clone(),
            LockoutPolicy {
                max_failed_attempts: config.security.lockout_max_failed_attempts,
                duration_minutes: config.security.lockout_duration_minutes,
            },
            config.security.allowed_email_domain.clone(),
        );
        let admin_service = AdminService::new(identity.clone());
        let employee_service = EmployeeService::new(employees, protector);

        let state = AppState {
            config,
            identity: identity.clone(),
            jwt,
            auth_service,
            admin_service,
            employee_service,
        };

        TestApp {
            router: build_router(state.clone()),
            state,
            identity,
        }
    }

    /// Insert a confirmed user with the given roles and claims, returning
    /// (user id, bearer token).
    pub async fn seed_user(
        &self,
        user_name: &str,
        roles: &[&str],
        claims: &[Permission],
    ) -> (Uuid, String) {
        let mut user = User::new(
            user_name.to_string(),
            format!("{user_name}@example.com"),
            None,
        );
        user.email_confirmed = true;
        self.identity.insert_user(&user).await.unwrap();

        for role_name in roles {
            let role = match self
                .identity
                .find_role_by_name(role_name)
                .await
                .unwrap()
            {
                Some(role) => role,
                None => {
                    let role = Role::new(role_name.to_string());
                    self.identity.insert_role(&role).await.unwrap();
                    role
                }
            };
            self.identity
                .add_user_to_role(user.user_id, role.role_id)
                .await
                .unwrap();
        }

        self.identity
            .add_user_claims(user.user_id, claims)
            .await
            .unwrap();

        let token = self
            .state
            .jwt
            .generate_access_token(&user.user_id.to_string(), &user.email)
            .unwrap();

        (user.user_id, token)
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        bearer: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.router.clone().oneshot(request).await.unwrap()
    }
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn assert_status(response: Response, expected: StatusCode) -> Value {
    let status = response.status();
    let body = body_json(response).await;
    assert_eq!(status, expected, "unexpected status, body: {body}");
    body
}

fn test_config() -> ServiceConfig {
    ServiceConfig {
        environment: Environment::Dev,
        service_name: "employee-service".to_string(),
        service_version: "test".to_string(),
        log_level: "debug".to_string(),
        port: 0,
        base_url: "http://localhost:8080".to_string(),
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        jwt: JwtConfig {
            secret: "test-secret".to_string(),
            access_token_expiry_minutes: 60,
        },
        security: SecurityConfig {
            protection_master_key: TEST_MASTER_KEY.to_string(),
            lockout_max_failed_attempts: 3,
            lockout_duration_minutes: 15,
            allowed_email_domain: None,
        },
        smtp: SmtpConfig {
            host: "localhost".to_string(),
            port: 587,
            user: String::new(),
            password: String::new(),
            from_address: "no-reply@localhost".to_string(),
        },
    }
}
