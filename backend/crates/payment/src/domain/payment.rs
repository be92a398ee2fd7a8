//! Payment Entity

use chrono::{DateTime, Duration, Utc};
use kernel::PaymentStep;
use kernel::id::{ApplicationId, PaymentId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::currency::Currency;
use crate::error::{PaymentError, PaymentResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Confirmed,
    Failed,
    Expired,
}

impl PaymentStatus {
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Confirmed => "confirmed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Expired => "expired",
        }
    }

    /// Pending and confirmed payments occupy the (application, step) slot
    #[inline]
    pub const fn is_non_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Pending | PaymentStatus::Confirmed)
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "pending" => Some(PaymentStatus::Pending),
            "confirmed" => Some(PaymentStatus::Confirmed),
            "failed" => Some(PaymentStatus::Failed),
            "expired" => Some(PaymentStatus::Expired),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Payment {
    pub payment_id: PaymentId,
    pub user_id: UserId,
    pub application_id: ApplicationId,
    pub step: PaymentStep,
    pub currency: Currency,
    pub usd_amount: Decimal,
    /// USD per coin at creation time
    pub exchange_rate: Decimal,
    /// Quoted crypto amount; never recomputed
    pub amount: Decimal,
    pub wallet_address: String,
    pub transaction_hash: Option<String>,
    pub confirmations: i32,
    pub required_confirmations: i32,
    pub status: PaymentStatus,
    pub expires_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Inputs fixed at quote time
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub user_id: UserId,
    pub application_id: ApplicationId,
    pub step: PaymentStep,
    pub currency: Currency,
    pub usd_amount: Decimal,
    pub exchange_rate: Decimal,
    pub amount: Decimal,
    pub wallet_address: String,
}

impl Payment {
    pub fn pending(new: NewPayment, ttl: Duration, now: DateTime<Utc>) -> Self {
        Self {
            payment_id: PaymentId::new(),
            user_id: new.user_id,
            application_id: new.application_id,
            step: new.step,
            currency: new.currency,
            usd_amount: new.usd_amount,
            exchange_rate: new.exchange_rate,
            amount: new.amount,
            wallet_address: new.wallet_address,
            transaction_hash: None,
            confirmations: 0,
            required_confirmations: new.currency.required_confirmations(),
            status: PaymentStatus::Pending,
            expires_at: now + ttl,
            confirmed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// A pending payment past its deadline
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == PaymentStatus::Pending && now >= self.expires_at
    }

    pub fn expire(&mut self, now: DateTime<Utc>) -> PaymentResult<()> {
        self.require_pending()?;
        self.status = PaymentStatus::Expired;
        self.updated_at = now;
        Ok(())
    }

    pub fn fail(&mut self, now: DateTime<Utc>) -> PaymentResult<()> {
        self.require_pending()?;
        self.status = PaymentStatus::Failed;
        self.updated_at = now;
        Ok(())
    }

    /// Record what the chain reports. Returns true when this observation
    /// settles the payment.
    pub fn observe(
        &mut self,
        tx_hash: String,
        confirmations: i32,
        now: DateTime<Utc>,
    ) -> PaymentResult<bool> {
        self.require_pending()?;
        self.transaction_hash = Some(tx_hash);
        self.confirmations = confirmations.max(0);
        self.updated_at = now;

        if self.confirmations >= self.required_confirmations {
            self.status = PaymentStatus::Confirmed;
            self.confirmed_at = Some(now);
            return Ok(true);
        }
        Ok(false)
    }

    fn require_pending(&self) -> PaymentResult<()> {
        match self.status {
            PaymentStatus::Pending => Ok(()),
            other => Err(PaymentError::InvalidState(format!(
                "Payment is {other}, expected pending"
            ))),
        }
    }
}
