//! Auth Router

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, patch},
};
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::repository::UserRepository;
use crate::infra::postgres::PgUserRepository;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::{AuthMiddlewareState, require_user};

/// Create the Auth router with PostgreSQL repository
pub fn auth_router(repo: PgUserRepository, config: AuthConfig) -> Router {
    auth_router_generic(Arc::new(repo), Arc::new(config))
}

/// `/auth/profile` for any repository implementation
pub fn auth_router_generic<R>(repo: Arc<R>, config: Arc<AuthConfig>) -> Router
where
    R: UserRepository + Send + Sync + 'static,
{
    let guard = AuthMiddlewareState {
        repo: repo.clone(),
        config: config.clone(),
    };
    let state = AuthAppState { repo, config };

    Router::new()
        .route(
            "/auth/profile",
            get(handlers::get_profile).patch(handlers::update_profile::<R>),
        )
        .route_layer(from_fn_with_state(guard, require_user::<R>))
        .with_state(state)
}

/// `/admin/users` routes (admin role checked per handler)
pub fn admin_users_router<R>(repo: Arc<R>, config: Arc<AuthConfig>) -> Router
where
    R: UserRepository + Send + Sync + 'static,
{
    let guard = AuthMiddlewareState {
        repo: repo.clone(),
        config: config.clone(),
    };
    let state = AuthAppState { repo, config };

    Router::new()
        .route("/admin/users", get(handlers::list_users::<R>))
        .route(
            "/admin/users/{id}/status",
            patch(handlers::set_user_status::<R>),
        )
        .route_layer(from_fn_with_state(guard, require_user::<R>))
        .with_state(state)
}
