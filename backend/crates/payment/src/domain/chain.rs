//! On-chain settlement check
//!
//! `ChainVerifier` is the capability the gateway awaits to learn how many
//! confirmations a transfer has. `ShapeCheckVerifier` only validates the
//! hash format and reports the transfer as settled; it stands in until a
//! chain indexer or an attested webhook is wired up.

use crate::domain::currency::Currency;
use crate::error::{PaymentError, PaymentResult};

/// Minimum hex digits in a transaction hash
pub const MIN_HASH_HEX_DIGITS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainObservation {
    pub confirmations: i32,
}

#[trait_variant::make(ChainVerifier: Send)]
pub trait LocalChainVerifier {
    async fn observe(&self, currency: Currency, tx_hash: &str) -> PaymentResult<ChainObservation>;
}

/// Canonical form: trimmed, `0x` prefix dropped, lower-cased.
/// Two spellings of one transfer must normalise to the same string.
pub fn normalize_hash(tx_hash: &str) -> String {
    let trimmed = tx_hash.trim();
    trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed)
        .to_ascii_lowercase()
}

/// Hex string, optional `0x` prefix, at least 64 digits
pub fn is_hash_shaped(tx_hash: &str) -> bool {
    let digits = tx_hash
        .strip_prefix("0x")
        .or_else(|| tx_hash.strip_prefix("0X"))
        .unwrap_or(tx_hash);
    digits.len() >= MIN_HASH_HEX_DIGITS && digits.chars().all(|c| c.is_ascii_hexdigit())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ShapeCheckVerifier;

impl ChainVerifier for ShapeCheckVerifier {
    async fn observe(&self, currency: Currency, tx_hash: &str) -> PaymentResult<ChainObservation> {
        if !is_hash_shaped(tx_hash) {
            return Err(PaymentError::InvalidTransactionHash(currency));
        }
        Ok(ChainObservation {
            confirmations: currency.required_confirmations(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_shape() {
        let hex64 = "a".repeat(64);
        assert!(is_hash_shaped(&hex64));
        assert!(is_hash_shaped(&format!("0x{hex64}")));
        assert!(!is_hash_shaped(&"a".repeat(63)));
        assert!(!is_hash_shaped(&format!("{}g", "a".repeat(64))));
        assert!(!is_hash_shaped("0x"));
    }

    #[test]
    fn test_normalize_hash_drops_prefix_and_case() {
        let bare = "c".repeat(64);
        assert_eq!(normalize_hash(&bare), bare);
        assert_eq!(normalize_hash(&format!("0x{bare}")), bare);
        assert_eq!(normalize_hash(&format!(" 0X{} ", "C".repeat(64))), bare);
    }

    #[tokio::test]
    async fn test_shape_check_reports_required_confirmations() {
        let obs = ChainVerifier::observe(&ShapeCheckVerifier, Currency::Btc, &"f".repeat(64))
            .await
            .unwrap();
        assert_eq!(obs.confirmations, 3);

        assert!(matches!(
            ChainVerifier::observe(&ShapeCheckVerifier, Currency::Eth, "deadbeef").await,
            Err(PaymentError::InvalidTransactionHash(Currency::Eth))
        ));
    }
}
