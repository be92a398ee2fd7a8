//! Client identification utilities
//!
//! Common functions for identifying clients via HTTP headers.

use axum::http::{HeaderMap, header};
use std::net::IpAddr;

use crate::crypto::{sha256, to_base64};

/// Client fingerprint derived from request headers
///
/// Used to bind exam sessions to the browser that started them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientFingerprint {
    /// Opaque digest of the identifying headers
    pub value: String,
    /// Client IP address (from X-Forwarded-For or direct connection)
    pub ip: Option<IpAddr>,
    /// Original User-Agent string (for logging/display)
    pub user_agent: String,
}

impl ClientFingerprint {
    pub fn new(value: String, ip: Option<IpAddr>, user_agent: String) -> Self {
        Self {
            value,
            ip,
            user_agent,
        }
    }

    /// Same browser, regardless of address
    pub fn matches(&self, other: &ClientFingerprint) -> bool {
        self.value == other.value
    }

    /// Get IP as string (for database storage)
    pub fn ip_string(&self) -> Option<String> {
        self.ip.map(|ip| ip.to_string())
    }
}

/// Error when extracting client fingerprint
#[derive(Debug, Clone, thiserror::Error)]
pub enum FingerprintError {
    #[error("Missing required header: {0}")]
    MissingHeader(String),
}

fn header_str<'a>(headers: &'a HeaderMap, name: header::HeaderName) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// Extract client fingerprint from request headers
///
/// The fingerprint is a base64 SHA-256 digest of
/// `user-agent|accept-language|accept-encoding`. Absent language or encoding
/// headers contribute empty strings; an absent User-Agent is an error.
pub fn extract_fingerprint(
    headers: &HeaderMap,
    client_ip: Option<IpAddr>,
) -> Result<ClientFingerprint, FingerprintError> {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| FingerprintError::MissingHeader("User-Agent".to_string()))?;

    let material = format!(
        "{}|{}|{}",
        user_agent,
        header_str(headers, header::ACCEPT_LANGUAGE),
        header_str(headers, header::ACCEPT_ENCODING),
    );

    Ok(ClientFingerprint::new(
        to_base64(&sha256(material.as_bytes())),
        client_ip,
        user_agent.to_string(),
    ))
}

/// Extract client IP address from headers
///
/// Checks X-Forwarded-For header first (for reverse proxy setups),
/// then falls back to direct connection IP.
pub fn extract_client_ip(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|xff| xff.split(',').next())
        .and_then(|first| first.trim().parse::<IpAddr>().ok())
        .or(direct_ip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn browser_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_static("Mozilla/5.0 Test Browser"),
        );
        headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-US"));
        headers.insert(header::ACCEPT_ENCODING, HeaderValue::from_static("gzip"));
        headers
    }

    #[test]
    fn test_extract_fingerprint() {
        let fp = extract_fingerprint(&browser_headers(), None).unwrap();
        assert_eq!(fp.user_agent, "Mozilla/5.0 Test Browser");
        // base64 of 32 bytes
        assert_eq!(fp.value.len(), 44);
    }

    #[test]
    fn test_fingerprint_is_stable_and_header_sensitive() {
        let a = extract_fingerprint(&browser_headers(), None).unwrap();
        let b = extract_fingerprint(&browser_headers(), Some("10.0.0.9".parse().unwrap())).unwrap();
        assert!(a.matches(&b));

        let mut other = browser_headers();
        other.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("fr-FR"));
        let c = extract_fingerprint(&other, None).unwrap();
        assert!(!a.matches(&c));
    }

    #[test]
    fn test_missing_optional_headers_still_fingerprint() {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_static("curl/8"));
        assert!(extract_fingerprint(&headers, None).is_ok());
    }

    #[test]
    fn test_extract_fingerprint_missing_ua() {
        let headers = HeaderMap::new();
        let result = extract_fingerprint(&headers, None);
        assert!(matches!(result, Err(FingerprintError::MissingHeader(_))));
    }

    #[test]
    fn test_extract_client_ip_xff() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("192.168.1.1, 10.0.0.1"),
        );

        let ip = extract_client_ip(&headers, None);
        assert_eq!(ip, Some("192.168.1.1".parse().unwrap()));
    }

    #[test]
    fn test_extract_client_ip_direct() {
        let headers = HeaderMap::new();
        let direct: IpAddr = "127.0.0.1".parse().unwrap();

        let ip = extract_client_ip(&headers, Some(direct));
        assert_eq!(ip, Some(direct));
    }
}
