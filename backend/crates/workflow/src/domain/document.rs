//! Generated document vocabulary

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    AssessmentCertificate,
    OfferLetter,
    EmploymentContract,
    VisaLetter,
    WorkPermit,
    AccommodationLetter,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 6] = [
        DocumentKind::AssessmentCertificate,
        DocumentKind::OfferLetter,
        DocumentKind::EmploymentContract,
        DocumentKind::VisaLetter,
        DocumentKind::WorkPermit,
        DocumentKind::AccommodationLetter,
    ];

    /// Documents that belong to the visa phase
    pub const VISA_PACKAGE: [DocumentKind; 3] = [
        DocumentKind::VisaLetter,
        DocumentKind::WorkPermit,
        DocumentKind::AccommodationLetter,
    ];

    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            DocumentKind::AssessmentCertificate => "assessment_certificate",
            DocumentKind::OfferLetter => "offer_letter",
            DocumentKind::EmploymentContract => "employment_contract",
            DocumentKind::VisaLetter => "visa_letter",
            DocumentKind::WorkPermit => "work_permit",
            DocumentKind::AccommodationLetter => "accommodation_letter",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.code() == code)
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// What a renderer needs to produce one document
#[derive(Debug, Clone)]
pub struct DocumentRequest {
    pub application_id: kernel::id::ApplicationId,
    pub kind: DocumentKind,
    pub candidate_name: String,
    pub company_name: String,
    pub job_title: String,
}

/// Renders a document and returns a reference to the stored file
#[trait_variant::make(DocumentGenerator: Send)]
pub trait LocalDocumentGenerator {
    async fn generate(&self, request: &DocumentRequest) -> crate::error::WorkflowResult<String>;
}

/// Deterministic storage location for a document
pub fn storage_key(application_id: &kernel::id::ApplicationId, kind: DocumentKind) -> String {
    format!("documents/{application_id}/{kind}.pdf")
}

/// Assigns the storage key and leaves rendering to the file pipeline
#[derive(Debug, Clone, Copy, Default)]
pub struct StorageKeyGenerator;

impl DocumentGenerator for StorageKeyGenerator {
    async fn generate(&self, request: &DocumentRequest) -> crate::error::WorkflowResult<String> {
        tracing::debug!(
            application_id = %request.application_id,
            kind = %request.kind,
            "Assigned document storage key"
        );
        Ok(storage_key(&request.application_id, request.kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::id::ApplicationId;

    #[test]
    fn test_storage_key() {
        let id = ApplicationId::new();
        assert_eq!(
            storage_key(&id, DocumentKind::WorkPermit),
            format!("documents/{id}/work_permit.pdf")
        );
    }
}
