//! Application Entity
//!
//! Transition methods mutate an in-memory copy; the repository persists the
//! result with a version check, so each transition is one conditional write.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use exam::Violation;
use kernel::PaymentStep;
use kernel::id::{ApplicationId, ExamSessionId, JobId, UserId};
use serde::{Deserialize, Serialize};

use crate::domain::document::DocumentKind;
use crate::domain::gates::{PaymentGates, PaymentRequirements};
use crate::domain::status::{ApplicationStatus, WorkflowStep};
use crate::error::{WorkflowError, WorkflowResult};

pub const WITHDRAWN_REASON: &str = "Withdrawn by candidate";
pub const DOCUMENTS_REJECTED_REASON: &str = "Document verification failed";
const COVER_LETTER_MAX: usize = 5_000;
const REASON_MAX: usize = 500;

/// Proctoring evidence kept with the result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentSecurity {
    pub session_id: ExamSessionId,
    pub fingerprint: String,
    pub violations: Vec<Violation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRecord {
    pub score: i32,
    pub cutoff: i32,
    pub passed: bool,
    pub completed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<AssessmentSecurity>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssessmentOutcome {
    Passed,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Application {
    pub application_id: ApplicationId,
    pub candidate_id: UserId,
    pub job_id: JobId,
    pub status: ApplicationStatus,
    pub current_step: WorkflowStep,
    pub payment_requirements: PaymentRequirements,
    pub assessment: Option<AssessmentRecord>,
    /// Document kind -> file reference
    pub generated_documents: BTreeMap<DocumentKind, String>,
    pub rejection_reason: Option<String>,
    pub cover_letter: Option<String>,
    /// Bumped by every persisted transition
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    pub fn submit(
        candidate_id: UserId,
        job_id: JobId,
        cover_letter: Option<String>,
    ) -> WorkflowResult<Self> {
        let cover_letter = cover_letter
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        if cover_letter
            .as_ref()
            .is_some_and(|c| c.chars().count() > COVER_LETTER_MAX)
        {
            return Err(WorkflowError::validation(
                "coverLetter",
                format!("Cover letter must be at most {COVER_LETTER_MAX} characters"),
            ));
        }

        let now = Utc::now();
        Ok(Self {
            application_id: ApplicationId::new(),
            candidate_id,
            job_id,
            status: ApplicationStatus::Pending,
            current_step: WorkflowStep::Application,
            payment_requirements: PaymentRequirements::default(),
            assessment: None,
            generated_documents: BTreeMap::new(),
            rejection_reason: None,
            cover_letter,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn has_document(&self, kind: DocumentKind) -> bool {
        self.generated_documents.contains_key(&kind)
    }

    fn invalid(&self, action: &'static str) -> WorkflowError {
        WorkflowError::InvalidTransition {
            from: self.status,
            action,
        }
    }

    fn advance(&mut self, status: ApplicationStatus, step: WorkflowStep, now: DateTime<Utc>) {
        self.status = status;
        self.current_step = step;
        self.updated_at = now;
    }

    /// `pending -> accepted`; the assessment fee becomes due
    pub fn accept(&mut self, now: DateTime<Utc>) -> WorkflowResult<()> {
        if self.status != ApplicationStatus::Pending {
            return Err(self.invalid("accept"));
        }
        self.payment_requirements.require(PaymentStep::Assessment);
        self.advance(ApplicationStatus::Accepted, WorkflowStep::Assessment, now);
        Ok(())
    }

    /// Move to the state a confirmed payment for `step` unlocks. Returns
    /// false when there is nothing to do: the application is already at or
    /// past that state, has ended, or has not reached the step yet (the
    /// derived gate is open either way).
    pub fn apply_payment(&mut self, step: PaymentStep, now: DateTime<Utc>) -> bool {
        let (from, to, next_step) = match step {
            PaymentStep::Assessment => (
                ApplicationStatus::Accepted,
                ApplicationStatus::AssessmentPending,
                WorkflowStep::Assessment,
            ),
            PaymentStep::DocumentProcessing => (
                ApplicationStatus::AssessmentCompleted,
                ApplicationStatus::DocumentsPending,
                WorkflowStep::DocumentSubmission,
            ),
            PaymentStep::VisaProcessing => (
                ApplicationStatus::OfferAccepted,
                ApplicationStatus::VisaProcessing,
                WorkflowStep::VisaProcessing,
            ),
        };
        if self.status != from {
            return false;
        }
        self.advance(to, next_step, now);
        true
    }

    /// Checks `complete_assessment` makes before touching anything
    pub fn ensure_assessment_acceptable(
        &self,
        score: i32,
        gates: &PaymentGates,
    ) -> WorkflowResult<()> {
        if !(0..=100).contains(&score) {
            return Err(WorkflowError::validation(
                "score",
                "Score must be between 0 and 100",
            ));
        }
        match self.status {
            ApplicationStatus::AssessmentPending => Ok(()),
            ApplicationStatus::Accepted if gates.is_open(PaymentStep::Assessment) => Ok(()),
            ApplicationStatus::Accepted => {
                Err(WorkflowError::PaymentRequired(PaymentStep::Assessment))
            }
            _ => Err(self.invalid("complete the assessment for")),
        }
    }

    /// Record the exam result; `score >= cutoff` passes
    pub fn complete_assessment(
        &mut self,
        score: i32,
        cutoff: i32,
        gates: &PaymentGates,
        security: Option<AssessmentSecurity>,
        now: DateTime<Utc>,
    ) -> WorkflowResult<AssessmentOutcome> {
        self.ensure_assessment_acceptable(score, gates)?;

        let passed = score >= cutoff;
        self.assessment = Some(AssessmentRecord {
            score,
            cutoff,
            passed,
            completed_at: now,
            security,
        });

        if passed {
            self.payment_requirements
                .require(PaymentStep::DocumentProcessing);
            self.advance(
                ApplicationStatus::AssessmentCompleted,
                WorkflowStep::DocumentSubmission,
                now,
            );
            Ok(AssessmentOutcome::Passed)
        } else {
            self.rejection_reason = Some(format!(
                "Assessment score {score} is below the required cutoff of {cutoff}"
            ));
            self.status = ApplicationStatus::Rejected;
            self.updated_at = now;
            Ok(AssessmentOutcome::Failed)
        }
    }

    /// Company verdict on the submitted documents
    pub fn verify_documents(
        &mut self,
        verified: bool,
        gates: &PaymentGates,
        now: DateTime<Utc>,
    ) -> WorkflowResult<()> {
        match self.status {
            ApplicationStatus::DocumentsPending => {}
            ApplicationStatus::AssessmentCompleted
                if gates.is_open(PaymentStep::DocumentProcessing) => {}
            ApplicationStatus::AssessmentCompleted => {
                return Err(WorkflowError::PaymentRequired(
                    PaymentStep::DocumentProcessing,
                ));
            }
            _ => return Err(self.invalid("verify documents for")),
        }

        if verified {
            self.payment_requirements.require(PaymentStep::VisaProcessing);
            self.advance(
                ApplicationStatus::OfferSent,
                WorkflowStep::DocumentSubmission,
                now,
            );
        } else {
            self.rejection_reason = Some(DOCUMENTS_REJECTED_REASON.to_string());
            self.status = ApplicationStatus::Rejected;
            self.updated_at = now;
        }
        Ok(())
    }

    /// `offer_sent -> offer_accepted`
    pub fn accept_offer(&mut self, now: DateTime<Utc>) -> WorkflowResult<()> {
        if self.status != ApplicationStatus::OfferSent {
            return Err(self.invalid("accept the offer of"));
        }
        self.advance(
            ApplicationStatus::OfferAccepted,
            WorkflowStep::VisaProcessing,
            now,
        );
        Ok(())
    }

    /// Enter relocation. Returns false when already there.
    pub fn start_visa_processing(
        &mut self,
        gates: &PaymentGates,
        now: DateTime<Utc>,
    ) -> WorkflowResult<bool> {
        match (self.status, self.current_step) {
            (ApplicationStatus::VisaProcessing, WorkflowStep::Relocation) => return Ok(false),
            (ApplicationStatus::OfferAccepted | ApplicationStatus::VisaProcessing, _) => {}
            _ => return Err(self.invalid("start visa processing for")),
        }
        if !gates.is_open(PaymentStep::VisaProcessing) {
            return Err(WorkflowError::PaymentRequired(PaymentStep::VisaProcessing));
        }
        self.advance(
            ApplicationStatus::VisaProcessing,
            WorkflowStep::Relocation,
            now,
        );
        Ok(true)
    }

    /// `visa_processing/relocation -> completed`
    pub fn complete(&mut self, now: DateTime<Utc>) -> WorkflowResult<()> {
        if self.status != ApplicationStatus::VisaProcessing
            || self.current_step != WorkflowStep::Relocation
        {
            return Err(self.invalid("complete"));
        }
        self.advance(ApplicationStatus::Completed, WorkflowStep::Completed, now);
        Ok(())
    }

    /// Any non-terminal status -> `rejected`
    pub fn reject(&mut self, reason: &str, now: DateTime<Utc>) -> WorkflowResult<()> {
        if self.status.is_terminal() {
            return Err(self.invalid("reject"));
        }
        let reason = reason.trim();
        if reason.is_empty() || reason.chars().count() > REASON_MAX {
            return Err(WorkflowError::validation(
                "reason",
                format!("Reason must be 1 to {REASON_MAX} characters"),
            ));
        }
        self.rejection_reason = Some(reason.to_string());
        self.status = ApplicationStatus::Rejected;
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_gates() -> PaymentGates {
        PaymentGates {
            assessment_blocked: false,
            document_submission_blocked: false,
            visa_processing_blocked: false,
        }
    }

    fn closed_gates() -> PaymentGates {
        PaymentGates {
            assessment_blocked: true,
            document_submission_blocked: true,
            visa_processing_blocked: true,
        }
    }

    fn accepted() -> Application {
        let mut app = Application::submit(UserId::new(), JobId::new(), None).unwrap();
        app.accept(Utc::now()).unwrap();
        app
    }

    #[test]
    fn test_accept_requires_assessment_fee() {
        let app = accepted();
        assert_eq!(app.status, ApplicationStatus::Accepted);
        assert_eq!(app.current_step, WorkflowStep::Assessment);
        assert!(app.payment_requirements.is_required(PaymentStep::Assessment));
        assert!(!app.payment_requirements.is_required(PaymentStep::VisaProcessing));
    }

    #[test]
    fn test_accept_twice_is_invalid() {
        let mut app = accepted();
        assert!(matches!(
            app.accept(Utc::now()),
            Err(WorkflowError::InvalidTransition { from: ApplicationStatus::Accepted, .. })
        ));
    }

    #[test]
    fn test_payment_advances_only_from_its_source() {
        let mut app = accepted();
        assert!(!app.apply_payment(PaymentStep::VisaProcessing, Utc::now()));
        assert!(app.apply_payment(PaymentStep::Assessment, Utc::now()));
        assert_eq!(app.status, ApplicationStatus::AssessmentPending);
        // re-applying is a no-op
        assert!(!app.apply_payment(PaymentStep::Assessment, Utc::now()));
    }

    #[test]
    fn test_cutoff_is_inclusive() {
        let mut low = accepted();
        low.apply_payment(PaymentStep::Assessment, Utc::now());
        let mut exact = low.clone();

        assert_eq!(
            low.complete_assessment(69, 70, &open_gates(), None, Utc::now()).unwrap(),
            AssessmentOutcome::Failed
        );
        assert_eq!(low.status, ApplicationStatus::Rejected);
        assert_eq!(
            low.rejection_reason.as_deref(),
            Some("Assessment score 69 is below the required cutoff of 70")
        );

        assert_eq!(
            exact.complete_assessment(70, 70, &open_gates(), None, Utc::now()).unwrap(),
            AssessmentOutcome::Passed
        );
        assert_eq!(exact.status, ApplicationStatus::AssessmentCompleted);
        assert!(exact.assessment.as_ref().unwrap().passed);
        assert!(exact.payment_requirements.is_required(PaymentStep::DocumentProcessing));
    }

    #[test]
    fn test_assessment_needs_open_gate_when_accepted() {
        let mut app = accepted();
        assert!(matches!(
            app.complete_assessment(90, 70, &closed_gates(), None, Utc::now()),
            Err(WorkflowError::PaymentRequired(PaymentStep::Assessment))
        ));
        assert!(app.complete_assessment(90, 70, &open_gates(), None, Utc::now()).is_ok());
    }

    #[test]
    fn test_rejected_is_terminal() {
        let mut app = accepted();
        app.reject(WITHDRAWN_REASON, Utc::now()).unwrap();
        assert!(app.reject("again", Utc::now()).is_err());
        assert!(app.accept_offer(Utc::now()).is_err());
        assert!(!app.apply_payment(PaymentStep::Assessment, Utc::now()));
    }

    #[test]
    fn test_full_path() {
        let now = Utc::now();
        let gates = open_gates();
        let mut app = accepted();
        app.apply_payment(PaymentStep::Assessment, now);
        app.complete_assessment(80, 70, &gates, None, now).unwrap();
        app.apply_payment(PaymentStep::DocumentProcessing, now);
        assert_eq!(app.status, ApplicationStatus::DocumentsPending);

        app.verify_documents(true, &gates, now).unwrap();
        assert_eq!(app.status, ApplicationStatus::OfferSent);
        assert!(app.payment_requirements.is_required(PaymentStep::VisaProcessing));

        app.accept_offer(now).unwrap();
        assert!(app.start_visa_processing(&gates, now).unwrap());
        assert!(!app.start_visa_processing(&gates, now).unwrap());
        app.complete(now).unwrap();
        assert_eq!(app.status, ApplicationStatus::Completed);
        assert_eq!(app.current_step, WorkflowStep::Completed);
    }

    #[test]
    fn test_visa_processing_blocked_without_payment() {
        let now = Utc::now();
        let mut app = accepted();
        app.status = ApplicationStatus::OfferAccepted;
        assert!(matches!(
            app.start_visa_processing(&closed_gates(), now),
            Err(WorkflowError::PaymentRequired(PaymentStep::VisaProcessing))
        ));
    }
}
