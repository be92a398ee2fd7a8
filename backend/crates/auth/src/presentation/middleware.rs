//! Auth Middleware
//!
//! `require_user` resolves the bearer token against the user store and
//! stores the result in request extensions; handlers read it back with the
//! `CurrentUser` extractor.

use axum::body::Body;
use axum::extract::{FromRequestParts, State};
use axum::http::Request;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use platform::token::extract_bearer;
use std::sync::Arc;

use crate::application::AuthenticateUseCase;
use crate::application::config::AuthConfig;
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::user_role::UserRole;
use crate::error::{AuthError, AuthResult};

/// Middleware state
pub struct AuthMiddlewareState<R>
where
    R: UserRepository + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub config: Arc<AuthConfig>,
}

impl<R> Clone for AuthMiddlewareState<R>
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

/// Middleware that requires an authenticated, active user
pub async fn require_user<R>(
    State(state): State<AuthMiddlewareState<R>>,
    mut req: Request<Body>,
    next: Next,
) -> Response
where
    R: UserRepository + Send + Sync + 'static,
{
    let Some(token) = extract_bearer(req.headers()).map(str::to_owned) else {
        return AuthError::Unauthenticated.into_response();
    };

    let use_case = AuthenticateUseCase::new(state.repo.clone(), state.config.clone());
    match use_case.execute(&token).await {
        Ok(user) => {
            req.extensions_mut().insert(CurrentUser(user));
            next.run(req).await
        }
        Err(e) => e.into_response(),
    }
}

/// The authenticated user for this request
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn user(&self) -> &User {
        &self.0
    }

    pub fn require_role(&self, roles: &[UserRole]) -> AuthResult<&User> {
        if roles.contains(&self.0.role) {
            Ok(&self.0)
        } else {
            Err(AuthError::Forbidden(format!(
                "This action is not available to {} accounts",
                self.0.role
            )))
        }
    }

    pub fn require_admin(&self) -> AuthResult<&User> {
        self.require_role(&[UserRole::Admin])
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AuthError::Unauthenticated)
    }
}
