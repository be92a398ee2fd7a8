//! Payment configuration

use std::collections::HashMap;
use std::time::Duration;

use kernel::PaymentStep;
use rust_decimal::Decimal;

use crate::domain::currency::Currency;
use crate::domain::fees::FeeSchedule;

#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub fees: FeeSchedule,
    /// How long a quote stays payable
    pub payment_ttl: Duration,
    /// Receiving address per currency
    pub wallets: HashMap<Currency, String>,
    pub max_page_size: i64,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            fees: FeeSchedule::new()
                .with_fee(PaymentStep::Assessment, Decimal::from(50))
                .with_fee(PaymentStep::DocumentProcessing, Decimal::from(150))
                .with_fee(PaymentStep::VisaProcessing, Decimal::from(300)),
            payment_ttl: Duration::from_secs(24 * 3600),
            wallets: HashMap::new(),
            max_page_size: 100,
        }
    }
}

impl PaymentConfig {
    /// Default fees with placeholder receiving addresses
    pub fn development() -> Self {
        let wallets = HashMap::from([
            (Currency::Btc, "bc1qdevreceiver0000000000000000000000000".to_string()),
            (Currency::Eth, "0x000000000000000000000000000000000000dEaD".to_string()),
            (Currency::Usdt, "0x000000000000000000000000000000000000dEaD".to_string()),
        ]);
        Self {
            wallets,
            ..Default::default()
        }
    }

    pub fn wallet(&self, currency: Currency) -> Option<&str> {
        self.wallets.get(&currency).map(String::as_str)
    }

    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.payment_ttl).unwrap_or(chrono::Duration::hours(24))
    }

    pub fn page_size(&self, requested: Option<i64>) -> i64 {
        requested.unwrap_or(20).clamp(1, self.max_page_size)
    }
}
