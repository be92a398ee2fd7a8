//! Create Payment Use Case

use std::sync::Arc;

use chrono::Utc;
use kernel::PaymentStep;
use kernel::id::{ApplicationId, UserId};

use crate::application::config::PaymentConfig;
use crate::domain::currency::Currency;
use crate::domain::fees::quote;
use crate::domain::payment::{NewPayment, Payment};
use crate::domain::rates::ExchangeRates;
use crate::domain::repository::PaymentRepository;
use crate::error::{PaymentError, PaymentResult};

#[derive(Debug, Clone)]
pub struct CreatePaymentInput {
    pub user_id: UserId,
    pub application_id: ApplicationId,
    pub step: PaymentStep,
    pub currency: Currency,
}

pub struct CreatePaymentUseCase<R>
where
    R: PaymentRepository + Send + Sync + 'static,
{
    repo: Arc<R>,
    rates: Arc<dyn ExchangeRates>,
    config: Arc<PaymentConfig>,
}

impl<R> CreatePaymentUseCase<R>
where
    R: PaymentRepository + Send + Sync + 'static,
{
    pub fn new(repo: Arc<R>, rates: Arc<dyn ExchangeRates>, config: Arc<PaymentConfig>) -> Self {
        Self {
            repo,
            rates,
            config,
        }
    }

    pub async fn execute(&self, input: CreatePaymentInput) -> PaymentResult<Payment> {
        let usd_fee = self.config.fees.usd_fee(input.step)?;
        let wallet = self
            .config
            .wallet(input.currency)
            .ok_or_else(|| {
                PaymentError::Internal(format!("No wallet configured for {}", input.currency))
            })?
            .to_string();

        let now = Utc::now();

        if let Some(mut existing) = self
            .repo
            .find_active(&input.application_id, input.step)
            .await?
        {
            if !existing.is_overdue(now) {
                return Err(PaymentError::DuplicatePayment(input.step));
            }
            // A lapsed quote frees the slot
            existing.expire(now)?;
            self.repo.update_pending(&existing).await?;
            tracing::info!(payment_id = %existing.payment_id, "Expired overdue payment");
        }

        let rate = self
            .rates
            .usd_rate(input.currency)
            .ok_or(PaymentError::RateUnavailable(input.currency))?;
        let amount = quote(usd_fee, rate).ok_or(PaymentError::RateUnavailable(input.currency))?;

        let payment = Payment::pending(
            NewPayment {
                user_id: input.user_id,
                application_id: input.application_id,
                step: input.step,
                currency: input.currency,
                usd_amount: usd_fee,
                exchange_rate: rate,
                amount,
                wallet_address: wallet,
            },
            self.config.ttl(),
            now,
        );

        self.repo.insert(&payment).await?;

        tracing::info!(
            payment_id = %payment.payment_id,
            application_id = %payment.application_id,
            step = %payment.step,
            currency = %payment.currency,
            amount = %payment.amount,
            "Payment created"
        );

        Ok(payment)
    }
}
