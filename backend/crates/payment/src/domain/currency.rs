use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Accepted cryptocurrencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Btc,
    Eth,
    Usdt,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::Btc, Currency::Eth, Currency::Usdt];

    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Currency::Btc => "BTC",
            Currency::Eth => "ETH",
            Currency::Usdt => "USDT",
        }
    }

    /// Blocks to wait before a transfer counts as settled
    #[inline]
    pub const fn required_confirmations(&self) -> i32 {
        match self {
            Currency::Btc => 3,
            Currency::Eth | Currency::Usdt => 12,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BTC" => Ok(Currency::Btc),
            "ETH" => Ok(Currency::Eth),
            "USDT" => Ok(Currency::Usdt),
            _ => Err(format!("unknown currency: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_confirmations() {
        assert_eq!(Currency::Btc.required_confirmations(), 3);
        assert_eq!(Currency::Eth.required_confirmations(), 12);
        assert_eq!(Currency::Usdt.required_confirmations(), 12);
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(serde_json::to_string(&Currency::Usdt).unwrap(), "\"USDT\"");
        assert_eq!("eth".parse::<Currency>().unwrap(), Currency::Eth);
        assert!("DOGE".parse::<Currency>().is_err());
    }
}
