//! API DTOs (Data Transfer Objects)

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use exam::{ExamSession, Severity, Violation, ViolationKind};
use kernel::PaymentStep;
use payment::{Currency, Payment, PaymentStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::application::{Application, AssessmentRecord};
use crate::domain::document::DocumentKind;
use crate::domain::gates::{GatePermissions, PaymentGates, PaymentState};
use crate::domain::job::{Job, JobDraft};
use crate::domain::status::{ApplicationStatus, WorkflowStep};
use crate::error::{WorkflowError, WorkflowResult};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// ============================================================================
// Jobs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    pub title: String,
    pub description: String,
    pub location: String,
    #[serde(default)]
    pub required_skills: Vec<String>,
    pub assessment_cutoff_score: i32,
}

impl From<JobRequest> for JobDraft {
    fn from(req: JobRequest) -> Self {
        JobDraft {
            title: req.title,
            description: req.description,
            location: req.location,
            required_skills: req.required_skills,
            assessment_cutoff_score: req.assessment_cutoff_score,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListJobsQuery {
    pub company_id: Option<Uuid>,
    #[serde(default)]
    pub include_closed: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResponse {
    pub id: Uuid,
    pub company_id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub required_skills: Vec<String>,
    pub assessment_cutoff_score: i32,
    pub exam_id: Uuid,
    pub is_open: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Job> for JobResponse {
    fn from(job: Job) -> Self {
        Self {
            id: job.job_id.into_uuid(),
            company_id: job.company_id.into_uuid(),
            title: job.title,
            description: job.description,
            location: job.location,
            required_skills: job.required_skills,
            assessment_cutoff_score: job.assessment_cutoff_score,
            exam_id: job.exam_id.into_uuid(),
            is_open: job.is_open,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

// ============================================================================
// Applications
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitApplicationRequest {
    pub job_id: Uuid,
    pub cover_letter: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListApplicationsQuery {
    pub status: Option<ApplicationStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Review actions a company or admin may take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    Accepted,
    Rejected,
    DocumentsVerified,
    DocumentsRejected,
    Completed,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub status: ReviewAction,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationResponse {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub job_id: Uuid,
    pub status: ApplicationStatus,
    pub current_step: WorkflowStep,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment: Option<AssessmentRecord>,
    pub documents: BTreeMap<DocumentKind, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_letter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentState>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ApplicationResponse {
    pub fn with_payments(mut self, state: PaymentState) -> Self {
        self.payment_status = Some(state);
        self
    }
}

impl From<Application> for ApplicationResponse {
    fn from(app: Application) -> Self {
        Self {
            id: app.application_id.into_uuid(),
            candidate_id: app.candidate_id.into_uuid(),
            job_id: app.job_id.into_uuid(),
            status: app.status,
            current_step: app.current_step,
            assessment: app.assessment,
            documents: app.generated_documents,
            rejection_reason: app.rejection_reason,
            cover_letter: app.cover_letter,
            payment_status: None,
            version: app.version,
            created_at: app.created_at,
            updated_at: app.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatesResponse {
    pub application_id: Uuid,
    pub payment_status: PaymentState,
    #[serde(flatten)]
    pub gates: PaymentGates,
    #[serde(flatten)]
    pub permissions: GatePermissions,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegeneratedResponse {
    pub application: ApplicationResponse,
    pub generated: Vec<DocumentKind>,
}

// ============================================================================
// Payments
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub application_id: Uuid,
    pub step: String,
    pub currency: Currency,
}

impl CreatePaymentRequest {
    /// Unknown step names are a validation error, never a silent no-op
    pub fn step(&self) -> WorkflowResult<PaymentStep> {
        self.step
            .parse::<PaymentStep>()
            .map_err(|e| WorkflowError::validation("step", e.to_string()))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    pub payment_id: Uuid,
    pub transaction_hash: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPaymentsQuery {
    pub status: Option<PaymentStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub id: Uuid,
    pub application_id: Uuid,
    pub step: PaymentStep,
    pub currency: Currency,
    pub usd_amount: Decimal,
    pub exchange_rate: Decimal,
    pub amount: Decimal,
    pub wallet_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
    pub confirmations: i32,
    pub required_confirmations: i32,
    pub status: PaymentStatus,
    pub expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Payment> for PaymentResponse {
    fn from(p: Payment) -> Self {
        Self {
            id: p.payment_id.into_uuid(),
            application_id: p.application_id.into_uuid(),
            step: p.step,
            currency: p.currency,
            usd_amount: p.usd_amount,
            exchange_rate: p.exchange_rate,
            amount: p.amount,
            wallet_address: p.wallet_address,
            transaction_hash: p.transaction_hash,
            confirmations: p.confirmations,
            required_confirmations: p.required_confirmations,
            status: p.status,
            expires_at: p.expires_at,
            confirmed_at: p.confirmed_at,
            created_at: p.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentResponse {
    pub payment: PaymentResponse,
    pub confirmed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application: Option<ApplicationResponse>,
}

// ============================================================================
// Exam
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartExamResponse {
    pub session_id: Uuid,
    pub application_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViolationRequest {
    #[serde(rename = "type")]
    pub kind: ViolationKind,
    pub severity: Severity,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitExamRequest {
    pub score: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminateExamRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamSessionResponse {
    pub session_id: Uuid,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub termination_reason: Option<String>,
    pub violations: Vec<Violation>,
    pub expires_at: DateTime<Utc>,
}

impl From<ExamSession> for ExamSessionResponse {
    fn from(s: ExamSession) -> Self {
        Self {
            session_id: s.session_id.into_uuid(),
            is_active: s.is_active,
            termination_reason: s.termination_reason,
            violations: s.violations,
            expires_at: s.expires_at,
        }
    }
}
