//! HTTP Handlers

use std::sync::Arc;

use auth::{CurrentUser, UserRole};
use axum::Json;
use axum::extract::{Path, Query, State};
use exam::{ExamConfig, ExamSecurityManager, SessionCheck, ViolationOutcome};
use kernel::ApiResponse;
use kernel::id::{ApplicationId, ExamId, JobId, PaymentId, UserId};
use payment::{
    FailPaymentUseCase, ListPaymentsUseCase, PaymentConfig, PaymentHistoryUseCase,
};
use uuid::Uuid;

use crate::application::cache::{JobCaches, JobStats};
use crate::application::config::WorkflowConfig;
use crate::application::manager::WorkflowManager;
use crate::application::{
    AssessmentUseCase, ConfirmPaymentUseCase, CreateJobUseCase, JobMatchesUseCase,
    JobStatsUseCase, ListApplicationsUseCase, ListJobsUseCase, StartPaymentUseCase,
    SubmitApplicationUseCase, UpdateJobUseCase, ensure_can_review, ensure_can_view,
};
use crate::backend::{Backend, Services};
use crate::domain::job::JobMatch;
use crate::error::{WorkflowError, WorkflowResult};
use crate::presentation::dto::{
    ApplicationResponse, CreatePaymentRequest, ExamSessionResponse, GatesResponse, JobRequest,
    JobResponse, ListApplicationsQuery, ListJobsQuery, ListPaymentsQuery, PaymentResponse,
    RegeneratedResponse, ReviewAction, StartExamResponse, SubmitApplicationRequest,
    SubmitExamRequest, TerminateExamRequest, UpdateStatusRequest, VerifyPaymentRequest,
    VerifyPaymentResponse, ViolationRequest,
};
use crate::presentation::extract::{ExamSessionHeader, RequestClient};

const MANUAL_TERMINATION_REASON: &str = "Terminated by candidate";

/// Shared state for workflow handlers
pub struct WorkflowAppState<B: Backend> {
    pub services: Services<B>,
    pub manager: Arc<WorkflowManager<B>>,
    pub caches: JobCaches,
    pub config: Arc<WorkflowConfig>,
    pub payment_config: Arc<PaymentConfig>,
    pub exam_config: Arc<ExamConfig>,
}

impl<B: Backend> Clone for WorkflowAppState<B> {
    fn clone(&self) -> Self {
        Self {
            services: self.services.clone(),
            manager: Arc::clone(&self.manager),
            caches: self.caches.clone(),
            config: Arc::clone(&self.config),
            payment_config: Arc::clone(&self.payment_config),
            exam_config: Arc::clone(&self.exam_config),
        }
    }
}

impl<B: Backend> WorkflowAppState<B> {
    pub fn new(
        services: Services<B>,
        config: Arc<WorkflowConfig>,
        payment_config: Arc<PaymentConfig>,
        exam_config: Arc<ExamConfig>,
    ) -> Self {
        let caches = JobCaches::new(&config);
        let manager = Arc::new(WorkflowManager::new(services.clone(), caches.clone()));
        Self {
            services,
            manager,
            caches,
            config,
            payment_config,
            exam_config,
        }
    }

    fn assessments(&self) -> AssessmentUseCase<B> {
        AssessmentUseCase::new(
            self.services.clone(),
            self.manager.clone(),
            self.exam_config.clone(),
        )
    }

    fn exam(&self) -> ExamSecurityManager<B::Sessions> {
        ExamSecurityManager::new(self.services.sessions.clone(), self.exam_config.clone())
    }
}

// ============================================================================
// Jobs
// ============================================================================

/// GET /jobs
pub async fn list_jobs<B: Backend>(
    State(state): State<WorkflowAppState<B>>,
    Query(query): Query<ListJobsQuery>,
) -> WorkflowResult<ApiResponse<Vec<JobResponse>>> {
    let jobs = ListJobsUseCase::new(state.services.jobs.clone(), state.config.clone())
        .execute(
            query.company_id.map(UserId::from_uuid),
            query.include_closed,
            query.limit,
            query.offset,
        )
        .await?;

    Ok(ApiResponse::ok(jobs.into_iter().map(JobResponse::from).collect()))
}

/// POST /jobs
pub async fn create_job<B: Backend>(
    State(state): State<WorkflowAppState<B>>,
    current: CurrentUser,
    Json(req): Json<JobRequest>,
) -> WorkflowResult<ApiResponse<JobResponse>> {
    let job = CreateJobUseCase::new(state.services.jobs.clone(), state.caches.clone())
        .execute(current.user(), req.into())
        .await?;

    Ok(ApiResponse::ok(JobResponse::from(job)).with_message("Job created"))
}

/// GET /jobs/{id}
pub async fn get_job<B: Backend>(
    State(state): State<WorkflowAppState<B>>,
    Path(job_id): Path<Uuid>,
) -> WorkflowResult<ApiResponse<JobResponse>> {
    let job = ListJobsUseCase::new(state.services.jobs.clone(), state.config.clone())
        .get(&JobId::from_uuid(job_id))
        .await?;

    Ok(ApiResponse::ok(JobResponse::from(job)))
}

/// PUT /jobs/{id}
pub async fn update_job<B: Backend>(
    State(state): State<WorkflowAppState<B>>,
    current: CurrentUser,
    Path(job_id): Path<Uuid>,
    Json(req): Json<JobRequest>,
) -> WorkflowResult<ApiResponse<JobResponse>> {
    let job = UpdateJobUseCase::new(state.services.jobs.clone(), state.caches.clone())
        .execute(current.user(), &JobId::from_uuid(job_id), req.into())
        .await?;

    Ok(ApiResponse::ok(JobResponse::from(job)).with_message("Job updated"))
}

/// DELETE /jobs/{id}
pub async fn close_job<B: Backend>(
    State(state): State<WorkflowAppState<B>>,
    current: CurrentUser,
    Path(job_id): Path<Uuid>,
) -> WorkflowResult<ApiResponse<JobResponse>> {
    let job = UpdateJobUseCase::new(state.services.jobs.clone(), state.caches.clone())
        .close(current.user(), &JobId::from_uuid(job_id))
        .await?;

    Ok(ApiResponse::ok(JobResponse::from(job)).with_message("Job closed"))
}

/// GET /jobs/{id}/stats
pub async fn job_stats<B: Backend>(
    State(state): State<WorkflowAppState<B>>,
    current: CurrentUser,
    Path(job_id): Path<Uuid>,
) -> WorkflowResult<ApiResponse<JobStats>> {
    let stats = JobStatsUseCase::new(
        state.services.jobs.clone(),
        state.services.applications.clone(),
        state.caches.clone(),
    )
    .execute(current.user(), &JobId::from_uuid(job_id))
    .await?;

    Ok(ApiResponse::ok(stats))
}

/// GET /jobs/matches/me
pub async fn my_matches<B: Backend>(
    State(state): State<WorkflowAppState<B>>,
    current: CurrentUser,
) -> WorkflowResult<ApiResponse<Vec<JobMatch>>> {
    let candidate = current.require_role(&[UserRole::Candidate])?;
    let matches = JobMatchesUseCase::new(state.services.jobs.clone(), state.caches.clone())
        .execute(candidate)
        .await?;

    Ok(ApiResponse::ok(matches))
}

// ============================================================================
// Applications
// ============================================================================

/// POST /applications
pub async fn submit_application<B: Backend>(
    State(state): State<WorkflowAppState<B>>,
    current: CurrentUser,
    Json(req): Json<SubmitApplicationRequest>,
) -> WorkflowResult<ApiResponse<ApplicationResponse>> {
    let application = SubmitApplicationUseCase::new(
        state.services.jobs.clone(),
        state.services.applications.clone(),
        state.caches.clone(),
    )
    .execute(current.user(), &JobId::from_uuid(req.job_id), req.cover_letter)
    .await?;

    Ok(ApiResponse::ok(ApplicationResponse::from(application))
        .with_message("Application submitted"))
}

/// GET /applications
pub async fn list_applications<B: Backend>(
    State(state): State<WorkflowAppState<B>>,
    current: CurrentUser,
    Query(query): Query<ListApplicationsQuery>,
) -> WorkflowResult<ApiResponse<Vec<ApplicationResponse>>> {
    let applications = ListApplicationsUseCase::new(
        state.services.jobs.clone(),
        state.services.applications.clone(),
        state.config.clone(),
    )
    .execute(current.user(), query.status, query.limit, query.offset)
    .await?;

    Ok(ApiResponse::ok(
        applications
            .into_iter()
            .map(ApplicationResponse::from)
            .collect(),
    ))
}

/// GET /applications/{id}
pub async fn get_application<B: Backend>(
    State(state): State<WorkflowAppState<B>>,
    current: CurrentUser,
    Path(application_id): Path<Uuid>,
) -> WorkflowResult<ApiResponse<ApplicationResponse>> {
    let application = state
        .manager
        .load(&ApplicationId::from_uuid(application_id))
        .await?;
    let job = state.manager.load_job(&application.job_id).await?;
    ensure_can_view(current.user(), &application, &job)?;

    let payments = state.manager.payment_state(&application).await?;
    Ok(ApiResponse::ok(
        ApplicationResponse::from(application).with_payments(payments),
    ))
}

/// GET /applications/{id}/gates
pub async fn application_gates<B: Backend>(
    State(state): State<WorkflowAppState<B>>,
    current: CurrentUser,
    Path(application_id): Path<Uuid>,
) -> WorkflowResult<ApiResponse<GatesResponse>> {
    let (application, payments) = state
        .manager
        .check_payment_gates(&ApplicationId::from_uuid(application_id))
        .await?;
    let job = state.manager.load_job(&application.job_id).await?;
    ensure_can_view(current.user(), &application, &job)?;

    let gates = payments.gates();
    Ok(ApiResponse::ok(GatesResponse {
        application_id,
        payment_status: payments,
        gates,
        permissions: gates.permissions(),
    }))
}

/// PATCH /applications/{id}/status
pub async fn update_application_status<B: Backend>(
    State(state): State<WorkflowAppState<B>>,
    current: CurrentUser,
    Path(application_id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> WorkflowResult<ApiResponse<ApplicationResponse>> {
    let id = ApplicationId::from_uuid(application_id);
    let application = state.manager.load(&id).await?;
    let job = state.manager.load_job(&application.job_id).await?;
    ensure_can_review(current.user(), &job)?;

    let manager = &state.manager;
    let application = match req.status {
        ReviewAction::Accepted => manager.process_application_acceptance(&id).await?,
        ReviewAction::Rejected => {
            let reason = req
                .reason
                .as_deref()
                .ok_or_else(|| WorkflowError::validation("reason", "A reason is required"))?;
            manager.reject(&id, reason).await?
        }
        ReviewAction::DocumentsVerified => manager.process_document_verification(&id, true).await?,
        ReviewAction::DocumentsRejected => {
            manager.process_document_verification(&id, false).await?
        }
        ReviewAction::Completed => manager.complete(&id).await?,
    };

    Ok(ApiResponse::ok(ApplicationResponse::from(application))
        .with_message("Application status updated"))
}

/// PATCH /applications/{id}/withdraw
pub async fn withdraw_application<B: Backend>(
    State(state): State<WorkflowAppState<B>>,
    current: CurrentUser,
    Path(application_id): Path<Uuid>,
) -> WorkflowResult<ApiResponse<ApplicationResponse>> {
    let candidate = current.require_role(&[UserRole::Candidate])?;
    let application = state
        .manager
        .withdraw(&ApplicationId::from_uuid(application_id), &candidate.user_id)
        .await?;

    Ok(ApiResponse::ok(ApplicationResponse::from(application))
        .with_message("Application withdrawn"))
}

/// POST /applications/{id}/offer/accept
pub async fn accept_offer<B: Backend>(
    State(state): State<WorkflowAppState<B>>,
    current: CurrentUser,
    Path(application_id): Path<Uuid>,
) -> WorkflowResult<ApiResponse<ApplicationResponse>> {
    let candidate = current.require_role(&[UserRole::Candidate])?;
    let application = state
        .manager
        .accept_offer(&ApplicationId::from_uuid(application_id), &candidate.user_id)
        .await?;

    Ok(ApiResponse::ok(ApplicationResponse::from(application)).with_message("Offer accepted"))
}

/// POST /applications/{id}/visa
pub async fn start_visa_processing<B: Backend>(
    State(state): State<WorkflowAppState<B>>,
    current: CurrentUser,
    Path(application_id): Path<Uuid>,
) -> WorkflowResult<ApiResponse<ApplicationResponse>> {
    let id = ApplicationId::from_uuid(application_id);
    let application = state.manager.load(&id).await?;
    let job = state.manager.load_job(&application.job_id).await?;
    ensure_can_view(current.user(), &application, &job)?;

    let application = state.manager.process_visa_processing(&id).await?;
    Ok(ApiResponse::ok(ApplicationResponse::from(application))
        .with_message("Visa processing started"))
}

// ============================================================================
// Payments
// ============================================================================

/// POST /payments/create
pub async fn create_payment<B: Backend>(
    State(state): State<WorkflowAppState<B>>,
    current: CurrentUser,
    Json(req): Json<CreatePaymentRequest>,
) -> WorkflowResult<ApiResponse<PaymentResponse>> {
    let candidate = current.require_role(&[UserRole::Candidate])?;
    let step = req.step()?;

    let payment = StartPaymentUseCase::new(
        state.services.clone(),
        state.manager.clone(),
        state.payment_config.clone(),
    )
    .execute(
        candidate,
        &ApplicationId::from_uuid(req.application_id),
        step,
        req.currency,
    )
    .await?;

    Ok(ApiResponse::ok(PaymentResponse::from(payment)).with_message("Payment created"))
}

/// POST /payments/verify
pub async fn verify_payment<B: Backend>(
    State(state): State<WorkflowAppState<B>>,
    current: CurrentUser,
    Json(req): Json<VerifyPaymentRequest>,
) -> WorkflowResult<ApiResponse<VerifyPaymentResponse>> {
    let confirmed = ConfirmPaymentUseCase::new(state.services.clone(), state.manager.clone())
        .execute(
            current.user(),
            &PaymentId::from_uuid(req.payment_id),
            &req.transaction_hash,
        )
        .await?;

    let message = if confirmed.outcome.confirmed {
        "Payment confirmed"
    } else {
        "Payment is awaiting confirmations"
    };
    Ok(ApiResponse::ok(VerifyPaymentResponse {
        payment: PaymentResponse::from(confirmed.outcome.payment),
        confirmed: confirmed.outcome.confirmed,
        application: confirmed.application.map(ApplicationResponse::from),
    })
    .with_message(message))
}

/// GET /payments/history
pub async fn payment_history<B: Backend>(
    State(state): State<WorkflowAppState<B>>,
    current: CurrentUser,
) -> WorkflowResult<ApiResponse<Vec<PaymentResponse>>> {
    let payments = PaymentHistoryUseCase::new(state.services.payments.clone())
        .execute(&current.user().user_id)
        .await?;

    Ok(ApiResponse::ok(
        payments.into_iter().map(PaymentResponse::from).collect(),
    ))
}

// ============================================================================
// Exam
// ============================================================================

/// POST /exam/start/{exam_id}
pub async fn start_exam<B: Backend>(
    State(state): State<WorkflowAppState<B>>,
    current: CurrentUser,
    RequestClient(client): RequestClient,
    Path(exam_id): Path<Uuid>,
) -> WorkflowResult<ApiResponse<StartExamResponse>> {
    let candidate = current.require_role(&[UserRole::Candidate])?;
    let started = state
        .assessments()
        .start(candidate, &ExamId::from_uuid(exam_id), &client)
        .await?;

    Ok(ApiResponse::ok(StartExamResponse {
        session_id: started.session.session_id.into_uuid(),
        application_id: started.application_id.into_uuid(),
        expires_at: started.session.expires_at,
    })
    .with_message("Exam session started"))
}

/// POST /exam/violation
pub async fn report_violation<B: Backend>(
    State(state): State<WorkflowAppState<B>>,
    current: CurrentUser,
    ExamSessionHeader(session_id): ExamSessionHeader,
    Json(req): Json<ViolationRequest>,
) -> WorkflowResult<ApiResponse<ViolationOutcome>> {
    let outcome = state
        .exam()
        .record_violation(
            &session_id,
            &current.user().user_id,
            req.kind,
            req.severity,
            &req.description,
        )
        .await?;

    Ok(ApiResponse::ok(outcome))
}

/// POST /exam/validate
pub async fn validate_exam<B: Backend>(
    State(state): State<WorkflowAppState<B>>,
    current: CurrentUser,
    RequestClient(client): RequestClient,
    ExamSessionHeader(session_id): ExamSessionHeader,
) -> WorkflowResult<ApiResponse<SessionCheck>> {
    let check = state
        .exam()
        .validate_session(&session_id, &current.user().user_id, &client)
        .await?;

    Ok(ApiResponse::ok(check))
}

/// POST /exam/submit
pub async fn submit_exam<B: Backend>(
    State(state): State<WorkflowAppState<B>>,
    current: CurrentUser,
    RequestClient(client): RequestClient,
    ExamSessionHeader(session_id): ExamSessionHeader,
    Json(req): Json<SubmitExamRequest>,
) -> WorkflowResult<ApiResponse<ApplicationResponse>> {
    let application = state
        .assessments()
        .submit(current.user(), &session_id, &client, req.score)
        .await?;

    Ok(ApiResponse::ok(ApplicationResponse::from(application))
        .with_message("Assessment submitted"))
}

/// POST /exam/terminate
pub async fn terminate_exam<B: Backend>(
    State(state): State<WorkflowAppState<B>>,
    current: CurrentUser,
    ExamSessionHeader(session_id): ExamSessionHeader,
    Json(req): Json<TerminateExamRequest>,
) -> WorkflowResult<ApiResponse<ExamSessionResponse>> {
    let reason = req
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(MANUAL_TERMINATION_REASON);
    let session = state
        .exam()
        .terminate_session(&session_id, &current.user().user_id, reason)
        .await?;

    Ok(ApiResponse::ok(ExamSessionResponse::from(session)).with_message("Exam session terminated"))
}

// ============================================================================
// Admin
// ============================================================================

/// GET /admin/payments
pub async fn admin_list_payments<B: Backend>(
    State(state): State<WorkflowAppState<B>>,
    current: CurrentUser,
    Query(query): Query<ListPaymentsQuery>,
) -> WorkflowResult<ApiResponse<Vec<PaymentResponse>>> {
    current.require_admin()?;

    let payments = ListPaymentsUseCase::new(
        state.services.payments.clone(),
        state.payment_config.clone(),
    )
    .execute(query.status, query.limit, query.offset)
    .await?;

    Ok(ApiResponse::ok(
        payments.into_iter().map(PaymentResponse::from).collect(),
    ))
}

/// PATCH /admin/payments/{id}/fail
pub async fn admin_fail_payment<B: Backend>(
    State(state): State<WorkflowAppState<B>>,
    current: CurrentUser,
    Path(payment_id): Path<Uuid>,
) -> WorkflowResult<ApiResponse<PaymentResponse>> {
    current.require_admin()?;

    let payment = FailPaymentUseCase::new(state.services.payments.clone())
        .execute(&PaymentId::from_uuid(payment_id))
        .await?;

    Ok(ApiResponse::ok(PaymentResponse::from(payment)).with_message("Payment marked as failed"))
}

/// GET /admin/applications
pub async fn admin_list_applications<B: Backend>(
    State(state): State<WorkflowAppState<B>>,
    current: CurrentUser,
    Query(query): Query<ListApplicationsQuery>,
) -> WorkflowResult<ApiResponse<Vec<ApplicationResponse>>> {
    let admin = current.require_admin()?;

    let applications = ListApplicationsUseCase::new(
        state.services.jobs.clone(),
        state.services.applications.clone(),
        state.config.clone(),
    )
    .execute(admin, query.status, query.limit, query.offset)
    .await?;

    Ok(ApiResponse::ok(
        applications
            .into_iter()
            .map(ApplicationResponse::from)
            .collect(),
    ))
}

/// POST /admin/applications/{id}/documents/regenerate
pub async fn admin_regenerate_documents<B: Backend>(
    State(state): State<WorkflowAppState<B>>,
    current: CurrentUser,
    Path(application_id): Path<Uuid>,
) -> WorkflowResult<ApiResponse<RegeneratedResponse>> {
    current.require_admin()?;

    let (application, generated) = state
        .manager
        .regenerate_documents(&ApplicationId::from_uuid(application_id))
        .await?;

    Ok(ApiResponse::ok(RegeneratedResponse {
        application: ApplicationResponse::from(application),
        generated,
    }))
}
