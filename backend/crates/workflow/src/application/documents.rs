//! Document artifacts
//!
//! Generation is keyed by (application, kind): a kind that already has a
//! reference is never generated again. Failures are left for
//! `regenerate_missing`.

use std::sync::Arc;

use kernel::id::ApplicationId;

use crate::domain::application::Application;
use crate::domain::document::{DocumentGenerator, DocumentKind, DocumentRequest};
use crate::domain::repository::ApplicationRepository;
use crate::domain::status::{ApplicationStatus, WorkflowStep};
use crate::error::{WorkflowError, WorkflowResult};

/// Names printed on generated documents
#[derive(Debug, Clone)]
pub struct DocumentContext {
    pub candidate_name: String,
    pub company_name: String,
    pub job_title: String,
}

/// Documents an application should have in its current state
pub fn expected_documents(application: &Application) -> Vec<DocumentKind> {
    let passed = application.assessment.as_ref().is_some_and(|a| a.passed);
    let rank = application.status.rank().unwrap_or(0);
    let at_least = |status: ApplicationStatus| status.rank().is_some_and(|r| rank >= r);

    let mut kinds = Vec::new();
    if passed {
        kinds.push(DocumentKind::AssessmentCertificate);
    }
    if at_least(ApplicationStatus::OfferSent) {
        kinds.push(DocumentKind::OfferLetter);
    }
    if at_least(ApplicationStatus::OfferAccepted) {
        kinds.push(DocumentKind::EmploymentContract);
    }
    let relocating = matches!(
        application.current_step,
        WorkflowStep::Relocation | WorkflowStep::Completed
    ) && application.status != ApplicationStatus::Rejected;
    if relocating {
        kinds.extend(DocumentKind::VISA_PACKAGE);
    }
    kinds
}

pub struct DocumentService<A, G>
where
    A: ApplicationRepository + Send + Sync + 'static,
    G: DocumentGenerator + Send + Sync + 'static,
{
    applications: Arc<A>,
    generator: Arc<G>,
}

impl<A, G> DocumentService<A, G>
where
    A: ApplicationRepository + Send + Sync + 'static,
    G: DocumentGenerator + Send + Sync + 'static,
{
    pub fn new(applications: Arc<A>, generator: Arc<G>) -> Self {
        Self {
            applications,
            generator,
        }
    }

    /// Reference for `kind`, generating it on first use
    pub async fn ensure(
        &self,
        application_id: &ApplicationId,
        kind: DocumentKind,
        context: &DocumentContext,
    ) -> WorkflowResult<String> {
        let application = self
            .applications
            .find_by_id(application_id)
            .await?
            .ok_or(WorkflowError::ApplicationNotFound)?;
        if let Some(existing) = application.generated_documents.get(&kind) {
            return Ok(existing.clone());
        }

        let reference = self
            .generator
            .generate(&DocumentRequest {
                application_id: *application_id,
                kind,
                candidate_name: context.candidate_name.clone(),
                company_name: context.company_name.clone(),
                job_title: context.job_title.clone(),
            })
            .await?;
        self.applications
            .attach_document(application_id, kind, &reference)
            .await?;

        tracing::info!(
            application_id = %application_id,
            kind = %kind,
            reference = %reference,
            "Document generated"
        );
        Ok(reference)
    }

    /// Generate each kind, logging failures instead of returning them
    pub async fn ensure_all(
        &self,
        application_id: &ApplicationId,
        kinds: &[DocumentKind],
        context: &DocumentContext,
    ) {
        for &kind in kinds {
            if let Err(e) = self.ensure(application_id, kind, context).await {
                tracing::warn!(
                    application_id = %application_id,
                    kind = %kind,
                    error = %e,
                    "Document generation failed; left for regeneration"
                );
            }
        }
    }

    /// Generate every expected document that has no reference yet
    pub async fn regenerate_missing(
        &self,
        application: &Application,
        context: &DocumentContext,
    ) -> WorkflowResult<Vec<DocumentKind>> {
        let mut generated = Vec::new();
        for kind in expected_documents(application) {
            if application.has_document(kind) {
                continue;
            }
            self.ensure(&application.application_id, kind, context)
                .await?;
            generated.push(kind);
        }
        Ok(generated)
    }
}
