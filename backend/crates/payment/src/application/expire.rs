//! Expire Stale Payments Use Case

use std::sync::Arc;

use chrono::Utc;

use crate::domain::repository::PaymentRepository;
use crate::error::PaymentResult;

pub struct ExpireStalePaymentsUseCase<R>
where
    R: PaymentRepository + Send + Sync + 'static,
{
    repo: Arc<R>,
}

impl<R> ExpireStalePaymentsUseCase<R>
where
    R: PaymentRepository + Send + Sync + 'static,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self) -> PaymentResult<u64> {
        let expired = self.repo.expire_overdue(Utc::now()).await?;
        tracing::info!(payments_expired = expired, "Expired stale payments");
        Ok(expired)
    }
}
