//! Repository Traits

use chrono::{DateTime, Utc};
use kernel::PaymentStep;
use kernel::id::{ApplicationId, PaymentId, UserId};

use crate::domain::payment::{Payment, PaymentStatus};
use crate::error::PaymentResult;

#[derive(Debug, Clone, Copy, Default)]
pub struct PaymentQuery {
    pub status: Option<PaymentStatus>,
    pub limit: i64,
    pub offset: i64,
}

#[trait_variant::make(PaymentRepository: Send)]
pub trait LocalPaymentRepository {
    /// Insert a new payment. Fails with `DuplicatePayment` when a pending or
    /// confirmed payment already holds the (application, step) slot.
    async fn insert(&self, payment: &Payment) -> PaymentResult<()>;

    async fn find_by_id(&self, payment_id: &PaymentId) -> PaymentResult<Option<Payment>>;

    /// The pending or confirmed payment for (application, step), if any
    async fn find_active(
        &self,
        application_id: &ApplicationId,
        step: PaymentStep,
    ) -> PaymentResult<Option<Payment>>;

    async fn find_by_transaction_hash(&self, tx_hash: &str) -> PaymentResult<Option<Payment>>;

    /// Every payment for an application, newest first
    async fn list_for_application(
        &self,
        application_id: &ApplicationId,
    ) -> PaymentResult<Vec<Payment>>;

    /// Newest first
    async fn list_for_user(&self, user_id: &UserId) -> PaymentResult<Vec<Payment>>;

    async fn list(&self, query: PaymentQuery) -> PaymentResult<Vec<Payment>>;

    /// Persist a status change. Only a pending row may be overwritten; a
    /// concurrent writer that already settled it yields `InvalidState`.
    async fn update_pending(&self, payment: &Payment) -> PaymentResult<()>;

    /// Mark every pending payment past its deadline as expired
    async fn expire_overdue(&self, now: DateTime<Utc>) -> PaymentResult<u64>;
}
