//! Application status and workflow step vocabulary

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
    AssessmentPending,
    AssessmentCompleted,
    OfferSent,
    OfferAccepted,
    DocumentsPending,
    VisaProcessing,
    Completed,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 10] = [
        ApplicationStatus::Pending,
        ApplicationStatus::Accepted,
        ApplicationStatus::Rejected,
        ApplicationStatus::AssessmentPending,
        ApplicationStatus::AssessmentCompleted,
        ApplicationStatus::OfferSent,
        ApplicationStatus::OfferAccepted,
        ApplicationStatus::DocumentsPending,
        ApplicationStatus::VisaProcessing,
        ApplicationStatus::Completed,
    ];

    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::AssessmentPending => "assessment_pending",
            ApplicationStatus::AssessmentCompleted => "assessment_completed",
            ApplicationStatus::OfferSent => "offer_sent",
            ApplicationStatus::OfferAccepted => "offer_accepted",
            ApplicationStatus::DocumentsPending => "documents_pending",
            ApplicationStatus::VisaProcessing => "visa_processing",
            ApplicationStatus::Completed => "completed",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(self, ApplicationStatus::Rejected | ApplicationStatus::Completed)
    }

    /// Position along the forward path; `None` for `rejected`
    pub const fn rank(&self) -> Option<u8> {
        match self {
            ApplicationStatus::Pending => Some(0),
            ApplicationStatus::Accepted => Some(1),
            ApplicationStatus::AssessmentPending => Some(2),
            ApplicationStatus::AssessmentCompleted => Some(3),
            ApplicationStatus::DocumentsPending => Some(4),
            ApplicationStatus::OfferSent => Some(5),
            ApplicationStatus::OfferAccepted => Some(6),
            ApplicationStatus::VisaProcessing => Some(7),
            ApplicationStatus::Completed => Some(8),
            ApplicationStatus::Rejected => None,
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Coarse phase marker shown to candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStep {
    Application,
    Assessment,
    DocumentSubmission,
    VisaProcessing,
    Relocation,
    Completed,
}

impl WorkflowStep {
    pub const ALL: [WorkflowStep; 6] = [
        WorkflowStep::Application,
        WorkflowStep::Assessment,
        WorkflowStep::DocumentSubmission,
        WorkflowStep::VisaProcessing,
        WorkflowStep::Relocation,
        WorkflowStep::Completed,
    ];

    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            WorkflowStep::Application => "application",
            WorkflowStep::Assessment => "assessment",
            WorkflowStep::DocumentSubmission => "document_submission",
            WorkflowStep::VisaProcessing => "visa_processing",
            WorkflowStep::Relocation => "relocation",
            WorkflowStep::Completed => "completed",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_match_serde() {
        for status in ApplicationStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.code()));
            assert_eq!(ApplicationStatus::from_code(status.code()), Some(status));
        }
        for step in WorkflowStep::ALL {
            assert_eq!(WorkflowStep::from_code(step.code()), Some(step));
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(ApplicationStatus::Rejected.is_terminal());
        assert!(ApplicationStatus::Completed.is_terminal());
        assert!(!ApplicationStatus::OfferSent.is_terminal());
    }
}
