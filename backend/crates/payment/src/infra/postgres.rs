//! PostgreSQL Repository Implementation

use chrono::{DateTime, Utc};
use kernel::PaymentStep;
use kernel::error::conversions::is_unique_violation;
use kernel::id::{ApplicationId, PaymentId, UserId};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::currency::Currency;
use crate::domain::payment::{Payment, PaymentStatus};
use crate::domain::repository::{PaymentQuery, PaymentRepository};
use crate::error::{PaymentError, PaymentResult};

#[derive(Clone)]
pub struct PgPaymentRepository {
    pool: PgPool,
}

impl PgPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const PAYMENT_COLUMNS: &str = r#"
    payment_id,
    user_id,
    application_id,
    step,
    currency,
    usd_amount,
    exchange_rate,
    amount,
    wallet_address,
    transaction_hash,
    confirmations,
    required_confirmations,
    status,
    expires_at,
    confirmed_at,
    created_at,
    updated_at
"#;

impl PaymentRepository for PgPaymentRepository {
    async fn insert(&self, payment: &Payment) -> PaymentResult<()> {
        sqlx::query(&format!(
            r#"
            INSERT INTO payments ({PAYMENT_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#
        ))
        .bind(payment.payment_id.as_uuid())
        .bind(payment.user_id.as_uuid())
        .bind(payment.application_id.as_uuid())
        .bind(payment.step.code())
        .bind(payment.currency.code())
        .bind(payment.usd_amount)
        .bind(payment.exchange_rate)
        .bind(payment.amount)
        .bind(&payment.wallet_address)
        .bind(&payment.transaction_hash)
        .bind(payment.confirmations)
        .bind(payment.required_confirmations)
        .bind(payment.status.code())
        .bind(payment.expires_at)
        .bind(payment.confirmed_at)
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            // payments_one_active_per_step
            if is_unique_violation(&e) {
                PaymentError::DuplicatePayment(payment.step)
            } else {
                PaymentError::Database(e)
            }
        })?;

        Ok(())
    }

    async fn find_by_id(&self, payment_id: &PaymentId) -> PaymentResult<Option<Payment>> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE payment_id = $1"
        ))
        .bind(payment_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(PaymentRow::into_payment).transpose()
    }

    async fn find_active(
        &self,
        application_id: &ApplicationId,
        step: PaymentStep,
    ) -> PaymentResult<Option<Payment>> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            r#"
            SELECT {PAYMENT_COLUMNS} FROM payments
            WHERE application_id = $1 AND step = $2 AND status IN ('pending', 'confirmed')
            "#
        ))
        .bind(application_id.as_uuid())
        .bind(step.code())
        .fetch_optional(&self.pool)
        .await?;

        row.map(PaymentRow::into_payment).transpose()
    }

    async fn find_by_transaction_hash(&self, tx_hash: &str) -> PaymentResult<Option<Payment>> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE transaction_hash = $1"
        ))
        .bind(tx_hash)
        .fetch_optional(&self.pool)
        .await?;

        row.map(PaymentRow::into_payment).transpose()
    }

    async fn list_for_application(
        &self,
        application_id: &ApplicationId,
    ) -> PaymentResult<Vec<Payment>> {
        let rows = sqlx::query_as::<_, PaymentRow>(&format!(
            r#"
            SELECT {PAYMENT_COLUMNS} FROM payments
            WHERE application_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(application_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PaymentRow::into_payment).collect()
    }

    async fn list_for_user(&self, user_id: &UserId) -> PaymentResult<Vec<Payment>> {
        let rows = sqlx::query_as::<_, PaymentRow>(&format!(
            r#"
            SELECT {PAYMENT_COLUMNS} FROM payments
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PaymentRow::into_payment).collect()
    }

    async fn list(&self, query: PaymentQuery) -> PaymentResult<Vec<Payment>> {
        let rows = sqlx::query_as::<_, PaymentRow>(&format!(
            r#"
            SELECT {PAYMENT_COLUMNS} FROM payments
            WHERE ($1::TEXT IS NULL OR status = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(query.status.map(|s| s.code()))
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PaymentRow::into_payment).collect()
    }

    async fn update_pending(&self, payment: &Payment) -> PaymentResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE payments SET
                transaction_hash = $2,
                confirmations = $3,
                status = $4,
                confirmed_at = $5,
                updated_at = $6
            WHERE payment_id = $1 AND status = 'pending'
            "#,
        )
        .bind(payment.payment_id.as_uuid())
        .bind(&payment.transaction_hash)
        .bind(payment.confirmations)
        .bind(payment.status.code())
        .bind(payment.confirmed_at)
        .bind(payment.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            // payments_transaction_hash_key
            if is_unique_violation(&e) {
                PaymentError::TransactionAlreadyUsed
            } else {
                PaymentError::Database(e)
            }
        })?;

        if result.rows_affected() == 0 {
            return Err(PaymentError::InvalidState(
                "Payment is no longer pending".into(),
            ));
        }
        Ok(())
    }

    async fn expire_overdue(&self, now: DateTime<Utc>) -> PaymentResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE payments SET status = 'expired', updated_at = $1
            WHERE status = 'pending' AND expires_at <= $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct PaymentRow {
    payment_id: Uuid,
    user_id: Uuid,
    application_id: Uuid,
    step: String,
    currency: String,
    usd_amount: Decimal,
    exchange_rate: Decimal,
    amount: Decimal,
    wallet_address: String,
    transaction_hash: Option<String>,
    confirmations: i32,
    required_confirmations: i32,
    status: String,
    expires_at: DateTime<Utc>,
    confirmed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PaymentRow {
    fn into_payment(self) -> PaymentResult<Payment> {
        let step: PaymentStep = self
            .step
            .parse()
            .map_err(|e| PaymentError::Internal(format!("{e}")))?;
        let currency: Currency = self.currency.parse().map_err(PaymentError::Internal)?;
        let status = PaymentStatus::from_code(&self.status)
            .ok_or_else(|| PaymentError::Internal(format!("Invalid status: {}", self.status)))?;

        Ok(Payment {
            payment_id: PaymentId::from_uuid(self.payment_id),
            user_id: UserId::from_uuid(self.user_id),
            application_id: ApplicationId::from_uuid(self.application_id),
            step,
            currency,
            usd_amount: self.usd_amount,
            exchange_rate: self.exchange_rate,
            amount: self.amount,
            wallet_address: self.wallet_address,
            transaction_hash: self.transaction_hash,
            confirmations: self.confirmations,
            required_confirmations: self.required_confirmations,
            status,
            expires_at: self.expires_at,
            confirmed_at: self.confirmed_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
