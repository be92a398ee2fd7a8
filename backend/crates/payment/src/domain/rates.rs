//! Exchange rates (USD per coin)

use std::collections::HashMap;

use parking_lot::RwLock;
use rust_decimal::Decimal;

use crate::domain::currency::Currency;

/// Source of USD prices. Quotes read it once, at payment creation.
pub trait ExchangeRates: Send + Sync {
    fn usd_rate(&self, currency: Currency) -> Option<Decimal>;
}

/// Rate table held in memory and updatable in place
#[derive(Debug, Default)]
pub struct StaticExchangeRates {
    rates: RwLock<HashMap<Currency, Decimal>>,
}

impl StaticExchangeRates {
    pub fn new(rates: impl IntoIterator<Item = (Currency, Decimal)>) -> Self {
        Self {
            rates: RwLock::new(rates.into_iter().collect()),
        }
    }

    /// Fixed development prices
    pub fn development() -> Self {
        Self::new([
            (Currency::Btc, Decimal::from(60_000)),
            (Currency::Eth, Decimal::from(3_000)),
            (Currency::Usdt, Decimal::ONE),
        ])
    }

    pub fn set_rate(&self, currency: Currency, usd: Decimal) {
        self.rates.write().insert(currency, usd);
    }
}

impl ExchangeRates for StaticExchangeRates {
    fn usd_rate(&self, currency: Currency) -> Option<Decimal> {
        self.rates.read().get(&currency).copied()
    }
}
