//! Signed bearer tokens
//!
//! Format: `<user uuid>.<expiry unix secs>.<base64url(hmac-sha256)>`.
//! The token only carries identity; callers still load the user from the
//! store on every request.

use std::time::{SystemTime, UNIX_EPOCH};

use axum::http::{HeaderMap, header};
use uuid::Uuid;

use crate::crypto::{constant_time_eq, from_base64_url, hmac_sha256, to_base64_url};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("invalid token signature")]
    BadSignature,
    #[error("token expired")]
    Expired,
}

/// Verified token claims
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BearerToken {
    pub user_id: Uuid,
    pub expires_at: u64,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn payload(user_id: &Uuid, expires_at: u64) -> String {
    format!("{}.{}", user_id, expires_at)
}

impl BearerToken {
    /// Issue a token valid for `ttl_secs`
    pub fn issue(user_id: Uuid, secret: &[u8], ttl_secs: u64) -> String {
        Self::issue_at(user_id, secret, now_secs().saturating_add(ttl_secs))
    }

    pub fn issue_at(user_id: Uuid, secret: &[u8], expires_at: u64) -> String {
        let payload = payload(&user_id, expires_at);
        let sig = hmac_sha256(secret, payload.as_bytes());
        format!("{}.{}", payload, to_base64_url(&sig))
    }

    pub fn verify(token: &str, secret: &[u8]) -> Result<Self, TokenError> {
        Self::verify_at(token, secret, now_secs())
    }

    pub fn verify_at(token: &str, secret: &[u8], now: u64) -> Result<Self, TokenError> {
        let mut parts = token.splitn(3, '.');
        let (Some(id), Some(exp), Some(sig)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(TokenError::Malformed);
        };

        let user_id = Uuid::parse_str(id).map_err(|_| TokenError::Malformed)?;
        let expires_at: u64 = exp.parse().map_err(|_| TokenError::Malformed)?;
        let sig = from_base64_url(sig).map_err(|_| TokenError::Malformed)?;

        let expected = hmac_sha256(secret, payload(&user_id, expires_at).as_bytes());
        if !constant_time_eq(&sig, &expected) {
            return Err(TokenError::BadSignature);
        }
        if now >= expires_at {
            return Err(TokenError::Expired);
        }

        Ok(Self {
            user_id,
            expires_at,
        })
    }
}

/// Read `Authorization: Bearer <token>`
pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            v.strip_prefix("Bearer ")
                .or_else(|| v.strip_prefix("bearer "))
        })
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    #[test]
    fn test_issue_and_verify() {
        let id = Uuid::new_v4();
        let token = BearerToken::issue(id, SECRET, 3600);
        let claims = BearerToken::verify(&token, SECRET).unwrap();
        assert_eq!(claims.user_id, id);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = BearerToken::issue(Uuid::new_v4(), SECRET, 3600);
        assert_eq!(
            BearerToken::verify(&token, b"another-secret"),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn test_tampered_user_id_is_rejected() {
        let token = BearerToken::issue_at(Uuid::new_v4(), SECRET, 2_000);
        let (_, rest) = token.split_once('.').unwrap();
        let forged = format!("{}.{}", Uuid::new_v4(), rest);
        assert_eq!(
            BearerToken::verify_at(&forged, SECRET, 1_000),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn test_expired_token() {
        let token = BearerToken::issue_at(Uuid::new_v4(), SECRET, 1_000);
        assert_eq!(
            BearerToken::verify_at(&token, SECRET, 1_000),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_malformed_tokens() {
        for t in ["", "abc", "not-a-uuid.1.sig", &format!("{}.x.y", Uuid::new_v4())] {
            assert_eq!(
                BearerToken::verify_at(t, SECRET, 0),
                Err(TokenError::Malformed),
                "{t}"
            );
        }
    }

    #[test]
    fn test_extract_bearer() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(extract_bearer(&headers), Some("abc.def"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic Zm9v"));
        assert_eq!(extract_bearer(&headers), None);
    }
}
