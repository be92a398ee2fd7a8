//! Exam Session Entity
//!
//! `active -> terminated`, one way. The violation log is append-only and
//! keeps growing after termination; nothing reactivates a session.

use chrono::{DateTime, Duration, Utc};
use kernel::id::{ApplicationId, ExamId, ExamSessionId, UserId};
use platform::client::ClientFingerprint;
use serde::Serialize;

use crate::domain::severity::{Severity, SeverityCounts, Thresholds};
use crate::domain::violation::{Violation, ViolationKind};

/// Reason recorded when a candidate submits
pub const SUBMITTED_REASON: &str = "submitted";

#[derive(Debug, Clone, PartialEq)]
pub struct ExamSession {
    pub session_id: ExamSessionId,
    pub user_id: UserId,
    pub exam_id: ExamId,
    pub application_id: Option<ApplicationId>,
    pub started_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Opaque header digest captured at start
    pub fingerprint: String,
    /// Last address seen
    pub ip: Option<String>,
    pub violations: Vec<Violation>,
    pub severity_counts: SeverityCounts,
    pub is_active: bool,
    pub termination_reason: Option<String>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Optimistic concurrency token for the shared store
    pub version: i64,
}

/// Result of recording a violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViolationOutcome {
    pub terminated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub violation_count: usize,
}

/// Result of re-checking a session against the current request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionCheck {
    pub valid: bool,
    pub terminated: bool,
}

impl ExamSession {
    pub fn start(
        user_id: UserId,
        exam_id: ExamId,
        application_id: Option<ApplicationId>,
        client: &ClientFingerprint,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id: ExamSessionId::new(),
            user_id,
            exam_id,
            application_id,
            started_at: now,
            expires_at: now + ttl,
            fingerprint: client.value.clone(),
            ip: client.ip_string(),
            violations: Vec::new(),
            severity_counts: SeverityCounts::default(),
            is_active: true,
            termination_reason: None,
            ended_at: None,
            version: 0,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Closed for any reason other than a submission. Such a session bars
    /// further attempts for its application and outlives its expiry.
    pub fn ended_by_violation(&self) -> bool {
        !self.is_active && self.termination_reason.as_deref() != Some(SUBMITTED_REASON)
    }

    /// Safe to drop once expired
    pub fn is_purgeable(&self, now: DateTime<Utc>) -> bool {
        self.is_expired(now) && !(self.application_id.is_some() && self.ended_by_violation())
    }

    /// Append a violation and terminate if its severity reached the ceiling
    pub fn record(&mut self, violation: Violation, thresholds: &Thresholds) -> ViolationOutcome {
        let severity = violation.severity;
        let now = violation.occurred_at;
        self.violations.push(violation);
        let count = self.severity_counts.increment(severity);

        if self.is_active {
            let ceiling = thresholds.ceiling(severity);
            if count >= ceiling {
                self.terminate(
                    format!("{severity} severity violation limit reached ({count}/{ceiling})"),
                    now,
                );
            }
        }

        ViolationOutcome {
            terminated: !self.is_active,
            reason: self.termination_reason.clone(),
            violation_count: self.violations.len(),
        }
    }

    /// Close the session. Returns false when it was already closed.
    pub fn terminate(&mut self, reason: impl Into<String>, now: DateTime<Utc>) -> bool {
        if !self.is_active {
            return false;
        }
        let reason = reason.into();
        self.is_active = false;
        self.ended_at = Some(now);
        self.violations.push(Violation::new(
            ViolationKind::SessionTerminated,
            Severity::Critical,
            reason.clone(),
            now,
        ));
        self.termination_reason = Some(reason);
        true
    }

    /// Compare the current client with the one that started the session.
    /// A different fingerprint is a critical violation and fails the check;
    /// a new address is a high violation that leaves the check to the
    /// session state.
    pub fn check_client(
        &mut self,
        client: &ClientFingerprint,
        thresholds: &Thresholds,
        now: DateTime<Utc>,
    ) -> SessionCheck {
        if !self.is_active {
            return SessionCheck {
                valid: false,
                terminated: true,
            };
        }

        let same_browser = client.value == self.fingerprint;
        if !same_browser {
            self.record(
                Violation::new(
                    ViolationKind::FingerprintMismatch,
                    Severity::Critical,
                    "Request fingerprint differs from the session fingerprint",
                    now,
                ),
                thresholds,
            );
        }

        let ip = client.ip_string();
        if ip.is_some() && self.ip.is_some() && ip != self.ip {
            let description = format!(
                "Address changed from {} to {}",
                self.ip.as_deref().unwrap_or("-"),
                ip.as_deref().unwrap_or("-"),
            );
            self.ip = ip;
            self.record(
                Violation::new(ViolationKind::IpChange, Severity::High, description, now),
                thresholds,
            );
        }

        SessionCheck {
            valid: same_browser && self.is_active,
            terminated: !self.is_active,
        }
    }
}
