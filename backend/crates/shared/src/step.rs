//! Payment step vocabulary
//!
//! The fee-bearing phases of an application. Shared because payments are
//! recorded against a step and the workflow advances by step.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A workflow phase that must be paid for before it unlocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStep {
    Assessment,
    /// Older clients call this step `document_verification`
    #[serde(alias = "document_verification")]
    DocumentProcessing,
    VisaProcessing,
}

impl PaymentStep {
    pub const ALL: [PaymentStep; 3] = [
        PaymentStep::Assessment,
        PaymentStep::DocumentProcessing,
        PaymentStep::VisaProcessing,
    ];

    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            PaymentStep::Assessment => "assessment",
            PaymentStep::DocumentProcessing => "document_processing",
            PaymentStep::VisaProcessing => "visa_processing",
        }
    }
}

impl fmt::Display for PaymentStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown payment step: {0}")]
pub struct UnknownPaymentStep(pub String);

impl FromStr for PaymentStep {
    type Err = UnknownPaymentStep;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "assessment" => Ok(PaymentStep::Assessment),
            "document_processing" | "document_verification" => {
                Ok(PaymentStep::DocumentProcessing)
            }
            "visa_processing" => Ok(PaymentStep::VisaProcessing),
            other => Err(UnknownPaymentStep(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip_through_from_str() {
        for step in PaymentStep::ALL {
            assert_eq!(step.code().parse::<PaymentStep>().unwrap(), step);
        }
    }

    #[test]
    fn test_legacy_document_verification_name() {
        assert_eq!(
            "document_verification".parse::<PaymentStep>().unwrap(),
            PaymentStep::DocumentProcessing
        );
        let step: PaymentStep = serde_json::from_str("\"document_verification\"").unwrap();
        assert_eq!(step, PaymentStep::DocumentProcessing);
    }

    #[test]
    fn test_unknown_step_is_an_error() {
        assert!("relocation".parse::<PaymentStep>().is_err());
        assert!(serde_json::from_str::<PaymentStep>("\"relocation\"").is_err());
    }
}
