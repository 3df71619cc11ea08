pub mod authz;
pub mod config;
pub mod db;
pub mod dtos;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::ServiceConfig;
use crate::error::AppError;
use crate::services::{
    AdminService, AuthService, EmployeeService, IdentityStore, JwtService,
};

#[derive(Clone)]
pub struct AppState {
    pub config: ServiceConfig,
    pub identity: Arc<dyn IdentityStore>,
    pub jwt: JwtService,
    pub auth_service: AuthService,
    pub admin_service: AdminService,
    pub employee_service: EmployeeService,
}

pub fn build_router(state: AppState) -> Router {
    // Public authentication routes
    let public_routes = Router::new()
        .route("/auth/register", post(handlers::auth::registration::register))
        .route(
            "/auth/confirm-email",
            get(handlers::auth::registration::confirm_email),
        )
        .route("/auth/login", post(handlers::auth::session::login))
        .route(
            "/auth/external/callback",
            post(handlers::auth::social::external_callback),
        )
        .route(
            "/auth/password-reset/request",
            post(handlers::auth::password::request_password_reset),
        )
        .route(
            "/auth/password-reset/confirm",
            post(handlers::auth::password::confirm_password_reset),
        );

    // Routes behind bearer authentication
    let authed_routes = Router::new()
        .route(
            "/auth/change-password",
            post(handlers::auth::password::change_password),
        )
        .route(
            "/auth/add-password",
            post(handlers::auth::password::add_password),
        )
        .route(
            "/admin/roles",
            get(handlers::admin::roles::list_roles).post(handlers::admin::roles::create_role),
        )
        .route(
            "/admin/roles/:roleId",
            get(handlers::admin::roles::get_role)
                .put(handlers::admin::roles::update_role)
                .delete(handlers::admin::roles::delete_role),
        )
        .route(
            "/admin/roles/:roleId/users",
            axum::routing::put(handlers::admin::roles::edit_users_in_role),
        )
        .route("/admin/users", get(handlers::admin::users::list_users))
        .route(
            "/admin/users/:userId",
            get(handlers::admin::users::get_user)
                .put(handlers::admin::users::edit_user)
                .delete(handlers::admin::users::delete_user),
        )
        .route(
            "/admin/users/:userId/roles",
            get(handlers::admin::users::get_user_roles)
                .put(handlers::admin::users::manage_user_roles),
        )
        .route(
            "/admin/users/:userId/claims",
            get(handlers::admin::users::get_user_claims)
                .put(handlers::admin::users::manage_user_claims),
        )
        .route(
            "/employees",
            get(handlers::employees::list_employees).post(handlers::employees::create_employee),
        )
        .route(
            "/employees/:id",
            get(handlers::employees::get_employee)
                .put(handlers::employees::update_employee)
                .delete(handlers::employees::delete_employee),
        )
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(public_routes)
        .merge(authed_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin("*".parse::<HeaderValue>().expect("valid header value"))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        )
}

/// Service health check
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
    })))
}
