//! Verify Payment Use Case

use std::sync::Arc;

use chrono::Utc;
use kernel::id::{PaymentId, UserId};

use crate::domain::chain::{ChainVerifier, normalize_hash};
use crate::domain::payment::{Payment, PaymentStatus};
use crate::domain::repository::PaymentRepository;
use crate::error::{PaymentError, PaymentResult};

#[derive(Debug, Clone)]
pub struct VerifyOutcome {
    pub payment: Payment,
    /// The payment is settled (now or earlier)
    pub confirmed: bool,
}

pub struct VerifyPaymentUseCase<R, V>
where
    R: PaymentRepository + Send + Sync + 'static,
    V: ChainVerifier + Send + Sync + 'static,
{
    repo: Arc<R>,
    verifier: Arc<V>,
}

impl<R, V> VerifyPaymentUseCase<R, V>
where
    R: PaymentRepository + Send + Sync + 'static,
    V: ChainVerifier + Send + Sync + 'static,
{
    pub fn new(repo: Arc<R>, verifier: Arc<V>) -> Self {
        Self { repo, verifier }
    }

    pub async fn execute(
        &self,
        payment_id: &PaymentId,
        user_id: &UserId,
        tx_hash: &str,
    ) -> PaymentResult<VerifyOutcome> {
        let mut payment = self
            .repo
            .find_by_id(payment_id)
            .await?
            .ok_or(PaymentError::NotFound)?;

        if payment.user_id != *user_id {
            return Err(PaymentError::Forbidden);
        }

        let now = Utc::now();
        match payment.status {
            PaymentStatus::Confirmed => {
                return Ok(VerifyOutcome {
                    payment,
                    confirmed: true,
                });
            }
            PaymentStatus::Expired => return Err(PaymentError::PaymentExpired),
            PaymentStatus::Failed => {
                return Err(PaymentError::InvalidState("Payment has failed".into()));
            }
            PaymentStatus::Pending if payment.is_overdue(now) => {
                payment.expire(now)?;
                self.repo.update_pending(&payment).await?;
                tracing::info!(payment_id = %payment.payment_id, "Payment expired at verification");
                return Err(PaymentError::PaymentExpired);
            }
            PaymentStatus::Pending => {}
        }

        let tx_hash = normalize_hash(tx_hash);
        if let Some(other) = self.repo.find_by_transaction_hash(&tx_hash).await? {
            if other.payment_id != payment.payment_id {
                return Err(PaymentError::TransactionAlreadyUsed);
            }
        }

        let observation = self.verifier.observe(payment.currency, &tx_hash).await?;
        let confirmed = payment.observe(tx_hash, observation.confirmations, now)?;
        self.repo.update_pending(&payment).await?;

        if confirmed {
            tracing::info!(
                payment_id = %payment.payment_id,
                application_id = %payment.application_id,
                step = %payment.step,
                "Payment confirmed"
            );
        } else {
            tracing::info!(
                payment_id = %payment.payment_id,
                confirmations = payment.confirmations,
                required = payment.required_confirmations,
                "Payment awaiting confirmations"
            );
        }

        Ok(VerifyOutcome { payment, confirmed })
    }
}
