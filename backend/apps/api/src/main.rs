//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

mod config;

use std::sync::Arc;

use auth::{admin_users_router, auth_router_generic};
use axum::{
    Router, http,
    http::{HeaderName, Method, header},
};
use exam::{ExamConfig, ExamSecurityManager};
use payment::{ExpireStalePaymentsUseCase, StaticExchangeRates};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use workflow::presentation::EXAM_SESSION_HEADER;
use workflow::{PgBackend, Services, WorkflowAppState, WorkflowConfig, workflow_router};

use crate::config::ServerConfig;

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "api=info,auth=info,payment=info,exam=info,workflow=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    // Database connection
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    let services = Services::<PgBackend>::postgres(
        pool.clone(),
        Arc::new(StaticExchangeRates::development()),
    );
    let exam_config = Arc::new(ExamConfig::default());

    // Startup cleanup
    // Errors here should not prevent server startup
    match ExpireStalePaymentsUseCase::new(services.payments.clone())
        .execute()
        .await
    {
        Ok(expired) => {
            tracing::info!(payments_expired = expired, "Stale payment cleanup completed");
        }
        Err(e) => {
            tracing::warn!(error = %e, "Stale payment cleanup failed, continuing anyway");
        }
    }

    if let Err(e) = ExamSecurityManager::new(services.sessions.clone(), exam_config.clone())
        .purge_expired()
        .await
    {
        tracing::warn!(error = %e, "Exam session cleanup failed, continuing anyway");
    }

    // CORS configuration
    let allowed_origins: Vec<http::HeaderValue> = config
        .frontend_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            HeaderName::from_static(EXAM_SESSION_HEADER),
        ]))
        .allow_credentials(true);

    // Build router
    let auth_config = Arc::new(config.auth.clone());
    let state = WorkflowAppState::new(
        services.clone(),
        Arc::new(WorkflowConfig::default()),
        Arc::new(config.payment.clone()),
        exam_config,
    );

    let api = Router::new()
        .merge(auth_router_generic(services.users.clone(), auth_config.clone()))
        .merge(admin_users_router(services.users.clone(), auth_config.clone()))
        .merge(workflow_router(state, auth_config));

    let app = Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = config.addr();
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
