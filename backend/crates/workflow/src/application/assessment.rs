//! Proctored assessments
//!
//! An exam is bound to a job; starting one requires the candidate's
//! application for that job to be waiting on the assessment with its fee
//! settled, and no earlier attempt for it may have been terminated.
//! Submitting checks the score against the application first, then closes
//! the session and records the score with the session's evidence.

use std::sync::Arc;

use auth::User;
use exam::{ExamConfig, ExamSecurityManager, StartedSession};
use kernel::PaymentStep;
use kernel::id::{ApplicationId, ExamId, ExamSessionId};
use platform::client::ClientFingerprint;

use crate::application::manager::WorkflowManager;
use crate::backend::{Backend, Services};
use crate::domain::application::{Application, AssessmentSecurity};
use crate::domain::repository::{ApplicationRepository, JobRepository};
use crate::domain::status::ApplicationStatus;
use crate::error::{WorkflowError, WorkflowResult};

#[derive(Debug, Clone)]
pub struct StartedAssessment {
    pub session: StartedSession,
    pub application_id: ApplicationId,
}

pub struct AssessmentUseCase<B: Backend> {
    services: Services<B>,
    manager: Arc<WorkflowManager<B>>,
    exam: ExamSecurityManager<B::Sessions>,
}

impl<B: Backend> AssessmentUseCase<B> {
    pub fn new(
        services: Services<B>,
        manager: Arc<WorkflowManager<B>>,
        config: Arc<ExamConfig>,
    ) -> Self {
        let exam = ExamSecurityManager::new(services.sessions.clone(), config);
        Self {
            services,
            manager,
            exam,
        }
    }

    pub fn exam(&self) -> &ExamSecurityManager<B::Sessions> {
        &self.exam
    }

    pub async fn start(
        &self,
        candidate: &User,
        exam_id: &ExamId,
        client: &ClientFingerprint,
    ) -> WorkflowResult<StartedAssessment> {
        let job = self
            .services
            .jobs
            .find_by_exam(exam_id)
            .await?
            .ok_or(WorkflowError::JobNotFound)?;
        let application = self
            .services
            .applications
            .find_for_candidate_job(&candidate.user_id, &job.job_id)
            .await?
            .ok_or(WorkflowError::ApplicationNotFound)?;

        match application.status {
            ApplicationStatus::Accepted | ApplicationStatus::AssessmentPending => {}
            from => {
                return Err(WorkflowError::InvalidTransition {
                    from,
                    action: "start the assessment for",
                });
            }
        }
        let gates = self.manager.payment_state(&application).await?.gates();
        if !gates.is_open(PaymentStep::Assessment) {
            return Err(WorkflowError::PaymentRequired(PaymentStep::Assessment));
        }
        self.exam.ensure_can_attempt(&application.application_id).await?;

        let session = self
            .exam
            .initialize_session(
                candidate.user_id,
                *exam_id,
                Some(application.application_id),
                client,
            )
            .await?;
        Ok(StartedAssessment {
            session,
            application_id: application.application_id,
        })
    }

    pub async fn submit(
        &self,
        candidate: &User,
        session_id: &ExamSessionId,
        client: &ClientFingerprint,
        score: i32,
    ) -> WorkflowResult<Application> {
        let application_id = self
            .exam
            .get_session(session_id, &candidate.user_id)
            .await?
            .application_id
            .ok_or(WorkflowError::ApplicationNotFound)?;
        // a rejected score must leave the session open for a retry
        self.manager
            .check_assessment_completion(&application_id, score)
            .await?;

        let session = self
            .exam
            .close_for_submission(session_id, &candidate.user_id, client)
            .await?;

        let security = AssessmentSecurity {
            session_id: session.session_id,
            fingerprint: session.fingerprint,
            violations: session.violations,
        };
        self.manager
            .process_assessment_completion(&application_id, score, Some(security))
            .await
    }
}
