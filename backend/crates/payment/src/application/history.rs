//! Payment listings

use std::sync::Arc;

use kernel::id::UserId;

use crate::application::config::PaymentConfig;
use crate::domain::payment::{Payment, PaymentStatus};
use crate::domain::repository::{PaymentQuery, PaymentRepository};
use crate::error::PaymentResult;

/// A user's own payments, newest first
pub struct PaymentHistoryUseCase<R>
where
    R: PaymentRepository + Send + Sync + 'static,
{
    repo: Arc<R>,
}

impl<R> PaymentHistoryUseCase<R>
where
    R: PaymentRepository + Send + Sync + 'static,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, user_id: &UserId) -> PaymentResult<Vec<Payment>> {
        self.repo.list_for_user(user_id).await
    }
}

/// Admin listing with an optional status filter
pub struct ListPaymentsUseCase<R>
where
    R: PaymentRepository + Send + Sync + 'static,
{
    repo: Arc<R>,
    config: Arc<PaymentConfig>,
}

impl<R> ListPaymentsUseCase<R>
where
    R: PaymentRepository + Send + Sync + 'static,
{
    pub fn new(repo: Arc<R>, config: Arc<PaymentConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(
        &self,
        status: Option<PaymentStatus>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> PaymentResult<Vec<Payment>> {
        self.repo
            .list(PaymentQuery {
                status,
                limit: self.config.page_size(limit),
                offset: offset.unwrap_or(0).max(0),
            })
            .await
    }
}
