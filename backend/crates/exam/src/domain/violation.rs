//! Proctoring violations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::severity::Severity;

const DESCRIPTION_MAX: usize = 500;

/// Known violation kinds; anything else the client reports is kept verbatim
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ViolationKind {
    TabSwitch,
    WindowBlur,
    CopyPaste,
    MultipleFaces,
    FingerprintMismatch,
    IpChange,
    /// Synthetic closing entry
    SessionTerminated,
    Other(String),
}

impl ViolationKind {
    pub fn code(&self) -> &str {
        match self {
            ViolationKind::TabSwitch => "tab_switch",
            ViolationKind::WindowBlur => "window_blur",
            ViolationKind::CopyPaste => "copy_paste",
            ViolationKind::MultipleFaces => "multiple_faces",
            ViolationKind::FingerprintMismatch => "fingerprint_mismatch",
            ViolationKind::IpChange => "ip_change",
            ViolationKind::SessionTerminated => "session_terminated",
            ViolationKind::Other(s) => s,
        }
    }
}

impl From<String> for ViolationKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "tab_switch" => ViolationKind::TabSwitch,
            "window_blur" => ViolationKind::WindowBlur,
            "copy_paste" => ViolationKind::CopyPaste,
            "multiple_faces" => ViolationKind::MultipleFaces,
            "fingerprint_mismatch" => ViolationKind::FingerprintMismatch,
            "ip_change" => ViolationKind::IpChange,
            "session_terminated" => ViolationKind::SessionTerminated,
            _ => ViolationKind::Other(s),
        }
    }
}

impl From<ViolationKind> for String {
    fn from(kind: ViolationKind) -> Self {
        match kind {
            ViolationKind::Other(s) => s,
            known => known.code().to_string(),
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub kind: ViolationKind,
    pub severity: Severity,
    pub description: String,
    pub occurred_at: DateTime<Utc>,
}

impl Violation {
    pub fn new(
        kind: ViolationKind,
        severity: Severity,
        description: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        let mut description: String = description.into();
        if let Some((idx, _)) = description.char_indices().nth(DESCRIPTION_MAX) {
            description.truncate(idx);
        }
        Self {
            kind,
            severity,
            description,
            occurred_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_wire_names() {
        let json = serde_json::to_string(&ViolationKind::TabSwitch).unwrap();
        assert_eq!(json, "\"tab_switch\"");
        let other: ViolationKind = serde_json::from_str("\"devtools_open\"").unwrap();
        assert_eq!(other, ViolationKind::Other("devtools_open".into()));
        assert_eq!(String::from(other), "devtools_open");
    }

    #[test]
    fn test_long_description_is_truncated() {
        let v = Violation::new(ViolationKind::CopyPaste, Severity::Low, "é".repeat(600), Utc::now());
        assert_eq!(v.description.chars().count(), 500);
    }
}
