//! In-memory payment store
//!
//! The slot and transaction-hash checks run under the same write lock as the
//! insert/update, matching the partial unique indexes of the SQL schema.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use kernel::PaymentStep;
use kernel::id::{ApplicationId, PaymentId, UserId};
use parking_lot::RwLock;

use crate::domain::payment::{Payment, PaymentStatus};
use crate::domain::repository::{PaymentQuery, PaymentRepository};
use crate::error::{PaymentError, PaymentResult};

#[derive(Clone, Default)]
pub struct MemoryPaymentRepository {
    payments: Arc<RwLock<HashMap<PaymentId, Payment>>>,
}

impl MemoryPaymentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(mut payments: Vec<Payment>) -> Vec<Payment> {
    payments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    payments
}

impl PaymentRepository for MemoryPaymentRepository {
    async fn insert(&self, payment: &Payment) -> PaymentResult<()> {
        let mut payments = self.payments.write();
        let taken = payments.values().any(|p| {
            p.application_id == payment.application_id
                && p.step == payment.step
                && p.status.is_non_terminal()
        });
        if taken {
            return Err(PaymentError::DuplicatePayment(payment.step));
        }
        payments.insert(payment.payment_id, payment.clone());
        Ok(())
    }

    async fn find_by_id(&self, payment_id: &PaymentId) -> PaymentResult<Option<Payment>> {
        Ok(self.payments.read().get(payment_id).cloned())
    }

    async fn find_active(
        &self,
        application_id: &ApplicationId,
        step: PaymentStep,
    ) -> PaymentResult<Option<Payment>> {
        Ok(self
            .payments
            .read()
            .values()
            .find(|p| {
                p.application_id == *application_id && p.step == step && p.status.is_non_terminal()
            })
            .cloned())
    }

    async fn find_by_transaction_hash(&self, tx_hash: &str) -> PaymentResult<Option<Payment>> {
        Ok(self
            .payments
            .read()
            .values()
            .find(|p| p.transaction_hash.as_deref() == Some(tx_hash))
            .cloned())
    }

    async fn list_for_application(
        &self,
        application_id: &ApplicationId,
    ) -> PaymentResult<Vec<Payment>> {
        let payments = self
            .payments
            .read()
            .values()
            .filter(|p| p.application_id == *application_id)
            .cloned()
            .collect();
        Ok(newest_first(payments))
    }

    async fn list_for_user(&self, user_id: &UserId) -> PaymentResult<Vec<Payment>> {
        let payments = self
            .payments
            .read()
            .values()
            .filter(|p| p.user_id == *user_id)
            .cloned()
            .collect();
        Ok(newest_first(payments))
    }

    async fn list(&self, query: PaymentQuery) -> PaymentResult<Vec<Payment>> {
        let payments = self
            .payments
            .read()
            .values()
            .filter(|p| query.status.is_none_or(|s| p.status == s))
            .cloned()
            .collect();
        Ok(newest_first(payments)
            .into_iter()
            .skip(query.offset.max(0) as usize)
            .take(query.limit.max(0) as usize)
            .collect())
    }

    async fn update_pending(&self, payment: &Payment) -> PaymentResult<()> {
        let mut payments = self.payments.write();

        if let Some(hash) = payment.transaction_hash.as_deref() {
            let reused = payments
                .values()
                .any(|p| p.payment_id != payment.payment_id && p.transaction_hash.as_deref() == Some(hash));
            if reused {
                return Err(PaymentError::TransactionAlreadyUsed);
            }
        }

        match payments.get_mut(&payment.payment_id) {
            Some(slot) if slot.status == PaymentStatus::Pending => {
                *slot = payment.clone();
                Ok(())
            }
            Some(slot) => Err(PaymentError::InvalidState(format!(
                "Payment is already {}",
                slot.status
            ))),
            None => Err(PaymentError::NotFound),
        }
    }

    async fn expire_overdue(&self, now: DateTime<Utc>) -> PaymentResult<u64> {
        let mut expired = 0;
        for payment in self.payments.write().values_mut() {
            if payment.is_overdue(now) {
                payment.status = PaymentStatus::Expired;
                payment.updated_at = now;
                expired += 1;
            }
        }
        Ok(expired)
    }
}
