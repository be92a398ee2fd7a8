//! HTTP Handlers

use axum::Json;
use axum::extract::{Path, Query, State};
use kernel::ApiResponse;
use kernel::id::UserId;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::config::AuthConfig;
use crate::application::{
    ListUsersUseCase, SetUserStatusUseCase, UpdateProfileInput, UpdateProfileUseCase,
};
use crate::domain::repository::UserRepository;
use crate::error::AuthResult;
use crate::presentation::dto::{
    ListUsersQuery, SetStatusRequest, UpdateProfileRequest, UserResponse,
};
use crate::presentation::middleware::CurrentUser;

/// Shared state for auth handlers
pub struct AuthAppState<R>
where
    R: UserRepository + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub config: Arc<AuthConfig>,
}

impl<R> Clone for AuthAppState<R>
where
    R: UserRepository + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            config: Arc::clone(&self.config),
        }
    }
}

// ============================================================================
// Profile
// ============================================================================

/// GET /auth/profile
pub async fn get_profile(current: CurrentUser) -> ApiResponse<UserResponse> {
    ApiResponse::ok(UserResponse::from(current.0))
}

/// PATCH /auth/profile
pub async fn update_profile<R>(
    State(state): State<AuthAppState<R>>,
    current: CurrentUser,
    Json(req): Json<UpdateProfileRequest>,
) -> AuthResult<ApiResponse<UserResponse>>
where
    R: UserRepository + Send + Sync + 'static,
{
    let use_case = UpdateProfileUseCase::new(state.repo.clone());
    let user = use_case
        .execute(
            &current.0.user_id,
            UpdateProfileInput {
                display_name: req.display_name,
                skills: req.skills,
                company_name: req.company_name,
            },
        )
        .await?;

    Ok(ApiResponse::ok(UserResponse::from(user)).with_message("Profile updated"))
}

// ============================================================================
// Admin
// ============================================================================

/// GET /admin/users
pub async fn list_users<R>(
    State(state): State<AuthAppState<R>>,
    current: CurrentUser,
    Query(query): Query<ListUsersQuery>,
) -> AuthResult<ApiResponse<Vec<UserResponse>>>
where
    R: UserRepository + Send + Sync + 'static,
{
    current.require_admin()?;

    let use_case = ListUsersUseCase::new(state.repo.clone(), state.config.clone());
    let users = use_case
        .execute(query.role, query.limit, query.offset)
        .await?;

    Ok(ApiResponse::ok(
        users.into_iter().map(UserResponse::from).collect(),
    ))
}

/// PATCH /admin/users/{id}/status
pub async fn set_user_status<R>(
    State(state): State<AuthAppState<R>>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
    Json(req): Json<SetStatusRequest>,
) -> AuthResult<ApiResponse<UserResponse>>
where
    R: UserRepository + Send + Sync + 'static,
{
    let admin = current.require_admin()?;

    let use_case = SetUserStatusUseCase::new(state.repo.clone());
    let user = use_case
        .execute(admin, &UserId::from_uuid(user_id), req.status)
        .await?;

    Ok(ApiResponse::ok(UserResponse::from(user)).with_message("User status updated"))
}
