use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use employee_service::{
    build_router,
    config::ServiceConfig,
    db,
    error::AppError,
    services::{
        AdminService, AuthService, Database, EmailService, EmployeeService, IdProtector,
        JwtService, LockoutPolicy, EMPLOYEE_ID_PURPOSE,
    },
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    // Load configuration - fail fast if invalid
    let config = ServiceConfig::from_env()?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting employee service"
    );

    // Database
    let pool = db::create_pool(&config.database).await?;
    db::run_migrations(&pool).await.map_err(|e| {
        AppError::DatabaseError(anyhow::anyhow!("Migrations failed: {}", e))
    })?;
    db::ping(&pool).await?;
    let database = Arc::new(Database::new(pool));
    tracing::info!("Database initialized");

    // Email
    let email = Arc::new(EmailService::new(&config.smtp)?);
    tracing::info!("Email service initialized");

    // JWT
    let jwt = JwtService::new(&config.jwt).map_err(AppError::InternalError)?;
    tracing::info!("JWT service initialized");

    // Id protection
    let master_key = IdProtector::parse_master_key(&config.security.protection_master_key)
        .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;
    let protector = IdProtector::new(&master_key, EMPLOYEE_ID_PURPOSE);

    let auth_service = AuthService::new(
        database.clone(),
        email,
        jwt.clone(),
        config.base_url.clone(),
        LockoutPolicy {
            max_failed_attempts: config.security.lockout_max_failed_attempts,
            duration_minutes: config.security.lockout_duration_minutes,
        },
        config.security.allowed_email_domain.clone(),
    );
    let admin_service = AdminService::new(database.clone());
    let employee_service = EmployeeService::new(database.clone(), protector);

    let state = AppState {
        config: config.clone(),
        identity: database,
        jwt,
        auth_service,
        admin_service,
        employee_service,
    };

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
