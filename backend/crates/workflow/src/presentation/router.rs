//! Workflow Router

use std::sync::Arc;

use auth::{AuthConfig, AuthMiddlewareState, require_user};
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
};

use crate::backend::Backend;
use crate::presentation::handlers::{self, WorkflowAppState};

/// Jobs, applications, payments, exams and the workflow admin routes.
/// Every route requires an authenticated user.
pub fn workflow_router<B: Backend>(state: WorkflowAppState<B>, auth_config: Arc<AuthConfig>) -> Router {
    let guard = AuthMiddlewareState {
        repo: state.services.users.clone(),
        config: auth_config,
    };

    Router::new()
        // Jobs
        .route(
            "/jobs",
            get(handlers::list_jobs::<B>).post(handlers::create_job::<B>),
        )
        .route("/jobs/matches/me", get(handlers::my_matches::<B>))
        .route(
            "/jobs/{id}",
            get(handlers::get_job::<B>)
                .put(handlers::update_job::<B>)
                .delete(handlers::close_job::<B>),
        )
        .route("/jobs/{id}/stats", get(handlers::job_stats::<B>))
        // Applications
        .route(
            "/applications",
            get(handlers::list_applications::<B>).post(handlers::submit_application::<B>),
        )
        .route("/applications/{id}", get(handlers::get_application::<B>))
        .route(
            "/applications/{id}/gates",
            get(handlers::application_gates::<B>),
        )
        .route(
            "/applications/{id}/status",
            patch(handlers::update_application_status::<B>),
        )
        .route(
            "/applications/{id}/withdraw",
            patch(handlers::withdraw_application::<B>),
        )
        .route(
            "/applications/{id}/offer/accept",
            post(handlers::accept_offer::<B>),
        )
        .route(
            "/applications/{id}/visa",
            post(handlers::start_visa_processing::<B>),
        )
        // Payments
        .route("/payments/create", post(handlers::create_payment::<B>))
        .route("/payments/verify", post(handlers::verify_payment::<B>))
        .route("/payments/history", get(handlers::payment_history::<B>))
        // Exam
        .route("/exam/start/{exam_id}", post(handlers::start_exam::<B>))
        .route("/exam/violation", post(handlers::report_violation::<B>))
        .route("/exam/validate", post(handlers::validate_exam::<B>))
        .route("/exam/submit", post(handlers::submit_exam::<B>))
        .route("/exam/terminate", post(handlers::terminate_exam::<B>))
        // Admin
        .route("/admin/payments", get(handlers::admin_list_payments::<B>))
        .route(
            "/admin/payments/{id}/fail",
            patch(handlers::admin_fail_payment::<B>),
        )
        .route(
            "/admin/applications",
            get(handlers::admin_list_applications::<B>),
        )
        .route(
            "/admin/applications/{id}/documents/regenerate",
            post(handlers::admin_regenerate_documents::<B>),
        )
        .route_layer(from_fn_with_state(guard, require_user::<B::Users>))
        .with_state(state)
}
