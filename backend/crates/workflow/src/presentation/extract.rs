//! Request extractors for the proctored exam routes

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use exam::ExamError;
use kernel::id::ExamSessionId;
use platform::client::{ClientFingerprint, extract_client_ip, extract_fingerprint};

use crate::error::WorkflowError;

pub const EXAM_SESSION_HEADER: &str = "x-exam-session";

/// Fingerprint of the calling browser. The address comes from
/// `X-Forwarded-For` when present, otherwise from the socket (if the server
/// was started with connect info).
#[derive(Debug, Clone)]
pub struct RequestClient(pub ClientFingerprint);

impl<S> FromRequestParts<S> for RequestClient
where
    S: Send + Sync,
{
    type Rejection = WorkflowError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let direct = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        let ip = extract_client_ip(&parts.headers, direct);
        let fingerprint = extract_fingerprint(&parts.headers, ip).map_err(ExamError::from)?;
        Ok(Self(fingerprint))
    }
}

/// Session id from the `X-Exam-Session` header
#[derive(Debug, Clone, Copy)]
pub struct ExamSessionHeader(pub ExamSessionId);

impl<S> FromRequestParts<S> for ExamSessionHeader
where
    S: Send + Sync,
{
    type Rejection = WorkflowError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(EXAM_SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ExamError::MissingHeader("X-Exam-Session".to_string()))?;
        let id = ExamSessionId::parse_str(raw.trim())
            .map_err(|_| ExamError::Validation("Invalid exam session id".to_string()))?;
        Ok(Self(id))
    }
}
