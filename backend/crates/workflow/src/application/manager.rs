//! Workflow Manager
//!
//! Every transition reads the application, applies one state-machine step
//! to a copy and persists it with `ApplicationRepository::transition`
//! against the version it read. Gates are derived from payment records at
//! the moment of the transition. Documents and notifications follow the
//! write as best-effort side effects.

use auth::UserRepository;
use chrono::Utc;
use kernel::id::{ApplicationId, JobId, PaymentId, UserId};
use payment::{PaymentError, PaymentRepository, PaymentStatus};

use crate::application::cache::JobCaches;
use crate::application::documents::{DocumentContext, DocumentService, expected_documents};
use crate::backend::{Backend, Services};
use crate::domain::application::{
    Application, AssessmentOutcome, AssessmentSecurity, WITHDRAWN_REASON,
};
use crate::domain::document::DocumentKind;
use crate::domain::gates::{PaymentState, derive_payment_state};
use crate::domain::job::Job;
use crate::domain::notification::{Notification, Notifier};
use crate::domain::repository::{ApplicationRepository, JobRepository};
use crate::error::{WorkflowError, WorkflowResult};

pub struct WorkflowManager<B: Backend> {
    services: Services<B>,
    caches: JobCaches,
}

impl<B: Backend> WorkflowManager<B> {
    pub fn new(services: Services<B>, caches: JobCaches) -> Self {
        Self { services, caches }
    }

    fn documents(&self) -> DocumentService<B::Applications, B::Documents> {
        DocumentService::new(
            self.services.applications.clone(),
            self.services.documents.clone(),
        )
    }

    pub async fn load(&self, application_id: &ApplicationId) -> WorkflowResult<Application> {
        self.services
            .applications
            .find_by_id(application_id)
            .await?
            .ok_or(WorkflowError::ApplicationNotFound)
    }

    pub async fn load_job(&self, job_id: &JobId) -> WorkflowResult<Job> {
        self.services
            .jobs
            .find_by_id(job_id)
            .await?
            .ok_or(WorkflowError::JobNotFound)
    }

    /// Per-step payment status derived from the payment records
    pub async fn payment_state(&self, application: &Application) -> WorkflowResult<PaymentState> {
        let payments = self
            .services
            .payments
            .list_for_application(&application.application_id)
            .await?;
        Ok(derive_payment_state(
            &application.payment_requirements,
            &payments,
        ))
    }

    /// Pure read: the derived payment state of an application
    pub async fn check_payment_gates(
        &self,
        application_id: &ApplicationId,
    ) -> WorkflowResult<(Application, PaymentState)> {
        let application = self.load(application_id).await?;
        let state = self.payment_state(&application).await?;
        Ok((application, state))
    }

    async fn commit(
        &self,
        mut application: Application,
        expected_version: i64,
    ) -> WorkflowResult<Application> {
        self.services
            .applications
            .transition(&application, expected_version)
            .await?;
        application.version = expected_version + 1;
        self.caches.application_changed(&application.job_id);

        tracing::info!(
            application_id = %application.application_id,
            status = %application.status,
            step = %application.current_step,
            version = application.version,
            "Application transitioned"
        );
        Ok(application)
    }

    async fn notify(&self, application: &Application, job_title: &str) {
        let notification = Notification::status_changed(
            application.candidate_id,
            application.application_id,
            application.status,
            job_title,
        );
        if let Err(e) = self.services.notifier.notify(&notification).await {
            tracing::warn!(
                application_id = %application.application_id,
                error = %e,
                "Notification failed"
            );
        }
    }

    /// Names for generated documents; `None` when the company account is gone
    async fn document_context(
        &self,
        application: &Application,
        job: &Job,
    ) -> WorkflowResult<Option<DocumentContext>> {
        let Some(company) = self.services.users.find_by_id(&job.company_id).await? else {
            return Ok(None);
        };
        let candidate_name = self
            .services
            .users
            .find_by_id(&application.candidate_id)
            .await?
            .map(|u| u.display_name)
            .unwrap_or_default();

        Ok(Some(DocumentContext {
            candidate_name,
            company_name: company.company_name.unwrap_or(company.display_name),
            job_title: job.title.clone(),
        }))
    }

    async fn generate(&self, application: &Application, job: &Job, kinds: &[DocumentKind]) {
        match self.document_context(application, job).await {
            Ok(Some(context)) => {
                self.documents()
                    .ensure_all(&application.application_id, kinds, &context)
                    .await;
            }
            Ok(None) => {
                tracing::warn!(
                    application_id = %application.application_id,
                    company_id = %job.company_id,
                    "Company record missing; document generation skipped"
                );
            }
            Err(e) => {
                tracing::warn!(
                    application_id = %application.application_id,
                    error = %e,
                    "Could not prepare document context"
                );
            }
        }
    }

    /// `pending -> accepted`; the assessment fee becomes due
    pub async fn process_application_acceptance(
        &self,
        application_id: &ApplicationId,
    ) -> WorkflowResult<Application> {
        let current = self.load(application_id).await?;
        let job = self.load_job(&current.job_id).await?;

        let mut next = current.clone();
        next.accept(Utc::now())?;
        let application = self.commit(next, current.version).await?;

        self.notify(&application, &job.title).await;
        Ok(application)
    }

    /// Advance the application a confirmed payment unlocks. A payment whose
    /// application is not at the step's source state leaves it unchanged.
    pub async fn process_payment_confirmation(
        &self,
        payment_id: &PaymentId,
    ) -> WorkflowResult<Application> {
        let payment = self
            .services
            .payments
            .find_by_id(payment_id)
            .await?
            .ok_or(PaymentError::NotFound)?;
        if payment.status != PaymentStatus::Confirmed {
            return Err(PaymentError::InvalidState(format!(
                "Payment is {}, not confirmed",
                payment.status
            ))
            .into());
        }

        let current = self.load(&payment.application_id).await?;
        let mut next = current.clone();
        if !next.apply_payment(payment.step, Utc::now()) {
            tracing::info!(
                application_id = %current.application_id,
                step = %payment.step,
                status = %current.status,
                "Payment confirmation needs no transition"
            );
            return Ok(current);
        }
        self.commit(next, current.version).await
    }

    /// Would `process_assessment_completion` accept this score now
    pub async fn check_assessment_completion(
        &self,
        application_id: &ApplicationId,
        score: i32,
    ) -> WorkflowResult<()> {
        let current = self.load(application_id).await?;
        let gates = self.payment_state(&current).await?.gates();
        current.ensure_assessment_acceptable(score, &gates)
    }

    /// Record the assessment result against the job's cutoff (inclusive)
    pub async fn process_assessment_completion(
        &self,
        application_id: &ApplicationId,
        score: i32,
        security: Option<AssessmentSecurity>,
    ) -> WorkflowResult<Application> {
        let current = self.load(application_id).await?;
        let job = self.load_job(&current.job_id).await?;
        let gates = self.payment_state(&current).await?.gates();

        let mut next = current.clone();
        let outcome = next.complete_assessment(
            score,
            job.assessment_cutoff_score,
            &gates,
            security,
            Utc::now(),
        )?;
        let application = self.commit(next, current.version).await?;

        if outcome == AssessmentOutcome::Passed {
            self.generate(&application, &job, &[DocumentKind::AssessmentCertificate])
                .await;
        }
        self.notify(&application, &job.title).await;
        Ok(application)
    }

    pub async fn process_document_verification(
        &self,
        application_id: &ApplicationId,
        verified: bool,
    ) -> WorkflowResult<Application> {
        let current = self.load(application_id).await?;
        let job = self.load_job(&current.job_id).await?;
        let gates = self.payment_state(&current).await?.gates();

        let mut next = current.clone();
        next.verify_documents(verified, &gates, Utc::now())?;
        let application = self.commit(next, current.version).await?;

        if verified {
            self.generate(&application, &job, &[DocumentKind::OfferLetter])
                .await;
        }
        self.notify(&application, &job.title).await;
        Ok(application)
    }

    pub async fn accept_offer(
        &self,
        application_id: &ApplicationId,
        candidate_id: &UserId,
    ) -> WorkflowResult<Application> {
        let current = self.load(application_id).await?;
        if current.candidate_id != *candidate_id {
            return Err(WorkflowError::forbidden("Only the candidate can accept the offer"));
        }
        let job = self.load_job(&current.job_id).await?;

        let mut next = current.clone();
        next.accept_offer(Utc::now())?;
        let application = self.commit(next, current.version).await?;

        self.generate(&application, &job, &[DocumentKind::EmploymentContract])
            .await;
        Ok(application)
    }

    /// Enter relocation and produce the visa package
    pub async fn process_visa_processing(
        &self,
        application_id: &ApplicationId,
    ) -> WorkflowResult<Application> {
        let current = self.load(application_id).await?;
        let job = self.load_job(&current.job_id).await?;
        let gates = self.payment_state(&current).await?.gates();

        let mut next = current.clone();
        let application = if next.start_visa_processing(&gates, Utc::now())? {
            self.commit(next, current.version).await?
        } else {
            current
        };

        self.generate(&application, &job, &DocumentKind::VISA_PACKAGE)
            .await;
        self.notify(&application, &job.title).await;
        Ok(application)
    }

    pub async fn complete(&self, application_id: &ApplicationId) -> WorkflowResult<Application> {
        let current = self.load(application_id).await?;
        let job = self.load_job(&current.job_id).await?;

        let mut next = current.clone();
        next.complete(Utc::now())?;
        let application = self.commit(next, current.version).await?;

        self.notify(&application, &job.title).await;
        Ok(application)
    }

    pub async fn reject(
        &self,
        application_id: &ApplicationId,
        reason: &str,
    ) -> WorkflowResult<Application> {
        let current = self.load(application_id).await?;
        let job = self.load_job(&current.job_id).await?;

        let mut next = current.clone();
        next.reject(reason, Utc::now())?;
        let application = self.commit(next, current.version).await?;

        self.notify(&application, &job.title).await;
        Ok(application)
    }

    pub async fn withdraw(
        &self,
        application_id: &ApplicationId,
        candidate_id: &UserId,
    ) -> WorkflowResult<Application> {
        let current = self.load(application_id).await?;
        if current.candidate_id != *candidate_id {
            return Err(WorkflowError::forbidden("Only the candidate can withdraw"));
        }

        let mut next = current.clone();
        next.reject(WITHDRAWN_REASON, Utc::now())?;
        self.commit(next, current.version).await
    }

    /// Generate every expected document that is still missing
    pub async fn regenerate_documents(
        &self,
        application_id: &ApplicationId,
    ) -> WorkflowResult<(Application, Vec<DocumentKind>)> {
        let application = self.load(application_id).await?;
        let job = self.load_job(&application.job_id).await?;

        let context = self.document_context(&application, &job).await?.ok_or_else(|| {
            WorkflowError::DocumentGeneration("Company record is missing".into())
        })?;
        let generated = self
            .documents()
            .regenerate_missing(&application, &context)
            .await?;

        tracing::info!(
            application_id = %application_id,
            expected = expected_documents(&application).len(),
            generated = generated.len(),
            "Documents regenerated"
        );

        let application = self.load(application_id).await?;
        Ok((application, generated))
    }
}
