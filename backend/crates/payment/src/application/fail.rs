//! Fail Payment Use Case (admin)

use std::sync::Arc;

use chrono::Utc;
use kernel::id::PaymentId;

use crate::domain::payment::Payment;
use crate::domain::repository::PaymentRepository;
use crate::error::{PaymentError, PaymentResult};

pub struct FailPaymentUseCase<R>
where
    R: PaymentRepository + Send + Sync + 'static,
{
    repo: Arc<R>,
}

impl<R> FailPaymentUseCase<R>
where
    R: PaymentRepository + Send + Sync + 'static,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, payment_id: &PaymentId) -> PaymentResult<Payment> {
        let mut payment = self
            .repo
            .find_by_id(payment_id)
            .await?
            .ok_or(PaymentError::NotFound)?;

        payment.fail(Utc::now())?;
        self.repo.update_pending(&payment).await?;

        tracing::info!(payment_id = %payment.payment_id, step = %payment.step, "Payment failed");

        Ok(payment)
    }
}
