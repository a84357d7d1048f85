use invoice_service::{
    build_router,
    config::ServiceConfig,
    services::{Database, JwtService, UserStore},
    utils::{hash_password, Password},
    AppState,
};
use service_core::error::AppError;
use service_core::observability::logging::init_tracing;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load configuration - fail fast if invalid
    let config = ServiceConfig::from_env()?;

    init_tracing(&config.service_name, &config.log_level);

    // Initialize metrics
    invoice_service::services::metrics::init_metrics();

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting invoice service"
    );

    // Initialize the database connection pool and bring the schema current
    let db = Database::connect(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await?;
    db.run_migrations().await?;
    tracing::info!("Database initialized successfully");

    // Initialize JWT service
    let jwt = JwtService::new(&config.jwt)?;
    tracing::info!("JWT service initialized");

    bootstrap_admin(&db, &config).await?;

    // Create application state
    let state = AppState {
        config: config.clone(),
        store: Arc::new(db.clone()),
        users: Arc::new(db),
        jwt,
    };

    // Build application router
    let app = build_router(state)?;

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

/// Create the first admin account when the users table is empty, so a fresh
/// deployment can log in immediately.
async fn bootstrap_admin(db: &Database, config: &ServiceConfig) -> Result<(), AppError> {
    let (Some(email), Some(password)) = (
        config.bootstrap.admin_email.as_deref(),
        config.bootstrap.admin_password.as_deref(),
    ) else {
        return Ok(());
    };

    if db.count_users().await? > 0 {
        return Ok(());
    }

    let hash = hash_password(&Password::new(password.to_string()))?;
    let user = db.create_user(email, hash.as_str(), Some("Admin User")).await?;
    tracing::info!(user_id = user.id, email = %user.email, "Bootstrap admin user created");

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
