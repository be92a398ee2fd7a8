//! Candidate notifications
//!
//! Delivery is best-effort and at-most-once; callers log failures and move
//! on.

use std::sync::Arc;

use kernel::id::{ApplicationId, UserId};
use parking_lot::Mutex;

use crate::domain::status::ApplicationStatus;
use crate::error::WorkflowResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub recipient: UserId,
    pub application_id: ApplicationId,
    pub status: ApplicationStatus,
    pub subject: String,
    pub body: String,
}

impl Notification {
    pub fn status_changed(
        recipient: UserId,
        application_id: ApplicationId,
        status: ApplicationStatus,
        job_title: &str,
    ) -> Self {
        let (subject, body) = match status {
            ApplicationStatus::Accepted => (
                "Your application was accepted".to_string(),
                format!("Your application for {job_title} was accepted. Pay the assessment fee to take the assessment."),
            ),
            ApplicationStatus::AssessmentCompleted => (
                "Assessment passed".to_string(),
                format!("You passed the assessment for {job_title}. Document processing is next."),
            ),
            ApplicationStatus::OfferSent => (
                "You have an offer".to_string(),
                format!("Your documents for {job_title} were verified and an offer is waiting."),
            ),
            ApplicationStatus::Rejected => (
                "Application update".to_string(),
                format!("Your application for {job_title} will not proceed."),
            ),
            other => (
                "Application update".to_string(),
                format!("Your application for {job_title} is now {other}."),
            ),
        };
        Self {
            recipient,
            application_id,
            status,
            subject,
            body,
        }
    }
}

#[trait_variant::make(Notifier: Send)]
pub trait LocalNotifier {
    async fn notify(&self, notification: &Notification) -> WorkflowResult<()>;
}

/// Writes notifications to the trace log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn notify(&self, notification: &Notification) -> WorkflowResult<()> {
        tracing::info!(
            recipient = %notification.recipient,
            application_id = %notification.application_id,
            status = %notification.status,
            subject = %notification.subject,
            "Notification"
        );
        Ok(())
    }
}

/// Keeps every notification; for tests
#[derive(Debug, Clone, Default)]
pub struct MemoryNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().clone()
    }
}

impl Notifier for MemoryNotifier {
    async fn notify(&self, notification: &Notification) -> WorkflowResult<()> {
        self.sent.lock().push(notification.clone());
        Ok(())
    }
}
