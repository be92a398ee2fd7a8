//! Step fees and crypto quotes

use std::collections::HashMap;

use kernel::PaymentStep;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{PaymentError, PaymentResult};

/// Decimal places kept on crypto amounts
pub const AMOUNT_SCALE: u32 = 8;

/// USD fee per payment step
#[derive(Debug, Clone, Default)]
pub struct FeeSchedule {
    fees: HashMap<PaymentStep, Decimal>,
}

impl FeeSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fee(mut self, step: PaymentStep, usd: Decimal) -> Self {
        self.fees.insert(step, usd);
        self
    }

    pub fn set(&mut self, step: PaymentStep, usd: Decimal) {
        self.fees.insert(step, usd);
    }

    pub fn usd_fee(&self, step: PaymentStep) -> PaymentResult<Decimal> {
        self.fees
            .get(&step)
            .copied()
            .filter(|fee| *fee > Decimal::ZERO)
            .ok_or(PaymentError::ConfigurationMissing(step))
    }
}

/// `usd_fee / rate`, rounded half away from zero to 8 places
pub fn quote(usd_fee: Decimal, usd_rate: Decimal) -> Option<Decimal> {
    if usd_rate <= Decimal::ZERO {
        return None;
    }
    usd_fee
        .checked_div(usd_rate)
        .map(|a| a.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero))
}
