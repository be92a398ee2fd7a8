//! Payment gates
//!
//! An application stores only whether each step's fee is due. Whether a
//! step is unlocked is always derived from the payment records, so the two
//! can never disagree.

use kernel::PaymentStep;
use payment::{Payment, PaymentStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentRequirement {
    #[default]
    NotRequired,
    Required,
}

/// Stored per-step requirement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PaymentRequirements {
    pub assessment: PaymentRequirement,
    pub document_processing: PaymentRequirement,
    pub visa_processing: PaymentRequirement,
}

impl PaymentRequirements {
    pub const fn get(&self, step: PaymentStep) -> PaymentRequirement {
        match step {
            PaymentStep::Assessment => self.assessment,
            PaymentStep::DocumentProcessing => self.document_processing,
            PaymentStep::VisaProcessing => self.visa_processing,
        }
    }

    pub fn require(&mut self, step: PaymentStep) {
        let slot = match step {
            PaymentStep::Assessment => &mut self.assessment,
            PaymentStep::DocumentProcessing => &mut self.document_processing,
            PaymentStep::VisaProcessing => &mut self.visa_processing,
        };
        *slot = PaymentRequirement::Required;
    }

    pub fn is_required(&self, step: PaymentStep) -> bool {
        self.get(step) == PaymentRequirement::Required
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStepStatus {
    NotRequired,
    Required,
    Pending,
    Paid,
    Failed,
}

/// Per-step payment status, derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PaymentState {
    pub assessment: PaymentStepStatus,
    pub document_processing: PaymentStepStatus,
    pub visa_processing: PaymentStepStatus,
}

impl PaymentState {
    pub const fn get(&self, step: PaymentStep) -> PaymentStepStatus {
        match step {
            PaymentStep::Assessment => self.assessment,
            PaymentStep::DocumentProcessing => self.document_processing,
            PaymentStep::VisaProcessing => self.visa_processing,
        }
    }

    pub fn is_paid(&self, step: PaymentStep) -> bool {
        self.get(step) == PaymentStepStatus::Paid
    }

    pub fn gates(&self) -> PaymentGates {
        PaymentGates {
            assessment_blocked: !self.is_paid(PaymentStep::Assessment),
            document_submission_blocked: !self.is_paid(PaymentStep::DocumentProcessing),
            visa_processing_blocked: !self.is_paid(PaymentStep::VisaProcessing),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentGates {
    pub assessment_blocked: bool,
    pub document_submission_blocked: bool,
    pub visa_processing_blocked: bool,
}

impl PaymentGates {
    pub const fn is_open(&self, step: PaymentStep) -> bool {
        match step {
            PaymentStep::Assessment => !self.assessment_blocked,
            PaymentStep::DocumentProcessing => !self.document_submission_blocked,
            PaymentStep::VisaProcessing => !self.visa_processing_blocked,
        }
    }

    pub const fn permissions(&self) -> GatePermissions {
        GatePermissions {
            can_take_assessment: !self.assessment_blocked,
            can_submit_documents: !self.document_submission_blocked,
            can_process_visa: !self.visa_processing_blocked,
        }
    }
}

/// What the candidate may do next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatePermissions {
    pub can_take_assessment: bool,
    pub can_submit_documents: bool,
    pub can_process_visa: bool,
}

fn step_status(
    step: PaymentStep,
    requirement: PaymentRequirement,
    payments: &[Payment],
) -> PaymentStepStatus {
    let mut for_step: Vec<&Payment> = payments.iter().filter(|p| p.step == step).collect();

    if for_step.iter().any(|p| p.status == PaymentStatus::Confirmed) {
        return PaymentStepStatus::Paid;
    }
    if for_step.iter().any(|p| p.status == PaymentStatus::Pending) {
        return PaymentStepStatus::Pending;
    }

    for_step.sort_by_key(|p| p.created_at);
    let latest_failed = for_step
        .last()
        .is_some_and(|p| matches!(p.status, PaymentStatus::Failed | PaymentStatus::Expired));

    match requirement {
        PaymentRequirement::Required if latest_failed => PaymentStepStatus::Failed,
        PaymentRequirement::Required => PaymentStepStatus::Required,
        PaymentRequirement::NotRequired => PaymentStepStatus::NotRequired,
    }
}

/// Per-step status from the stored requirements and the application's
/// payment records
pub fn derive_payment_state(
    requirements: &PaymentRequirements,
    payments: &[Payment],
) -> PaymentState {
    PaymentState {
        assessment: step_status(
            PaymentStep::Assessment,
            requirements.assessment,
            payments,
        ),
        document_processing: step_status(
            PaymentStep::DocumentProcessing,
            requirements.document_processing,
            payments,
        ),
        visa_processing: step_status(
            PaymentStep::VisaProcessing,
            requirements.visa_processing,
            payments,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use kernel::id::{ApplicationId, UserId};
    use payment::Currency;
    use payment::domain::payment::NewPayment;
    use rust_decimal::Decimal;

    fn payment(step: PaymentStep, status: PaymentStatus) -> Payment {
        let mut p = Payment::pending(
            NewPayment {
                user_id: UserId::new(),
                application_id: ApplicationId::new(),
                step,
                currency: Currency::Eth,
                usd_amount: Decimal::from(50),
                exchange_rate: Decimal::from(3000),
                amount: Decimal::new(1666667, 8),
                wallet_address: "0xwallet".into(),
            },
            Duration::hours(24),
            Utc::now(),
        );
        p.status = status;
        p
    }

    fn required_assessment() -> PaymentRequirements {
        let mut r = PaymentRequirements::default();
        r.require(PaymentStep::Assessment);
        r
    }

    #[test]
    fn test_no_payments() {
        let state = derive_payment_state(&required_assessment(), &[]);
        assert_eq!(state.assessment, PaymentStepStatus::Required);
        assert_eq!(state.visa_processing, PaymentStepStatus::NotRequired);
        assert!(state.gates().assessment_blocked);
    }

    #[test]
    fn test_confirmed_payment_opens_only_its_gate() {
        let payments = [payment(PaymentStep::Assessment, PaymentStatus::Confirmed)];
        let gates = derive_payment_state(&required_assessment(), &payments).gates();
        assert!(!gates.assessment_blocked);
        assert!(gates.document_submission_blocked);
        assert!(gates.visa_processing_blocked);
        assert!(gates.permissions().can_take_assessment);
    }

    #[test]
    fn test_pending_and_failed() {
        let pending = [payment(PaymentStep::Assessment, PaymentStatus::Pending)];
        let state = derive_payment_state(&required_assessment(), &pending);
        assert_eq!(state.assessment, PaymentStepStatus::Pending);
        assert!(state.gates().assessment_blocked);

        let expired = [payment(PaymentStep::Assessment, PaymentStatus::Expired)];
        let state = derive_payment_state(&required_assessment(), &expired);
        assert_eq!(state.assessment, PaymentStepStatus::Failed);
    }

    #[test]
    fn test_gate_is_negation_of_confirmed_payment() {
        for status in [
            PaymentStatus::Pending,
            PaymentStatus::Confirmed,
            PaymentStatus::Failed,
            PaymentStatus::Expired,
        ] {
            for step in PaymentStep::ALL {
                let payments = [payment(step, status)];
                let gates = derive_payment_state(&PaymentRequirements::default(), &payments).gates();
                assert_eq!(gates.is_open(step), status == PaymentStatus::Confirmed);
            }
        }
    }
}
