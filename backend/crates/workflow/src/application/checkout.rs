//! Workflow fees
//!
//! Payments are created against an application step and, once the chain
//! reports settlement, advance the application through the manager.

use std::sync::Arc;

use auth::User;
use kernel::PaymentStep;
use kernel::id::{ApplicationId, PaymentId};
use payment::{
    CreatePaymentInput, CreatePaymentUseCase, Currency, Payment, PaymentConfig,
    VerifyOutcome, VerifyPaymentUseCase,
};

use crate::application::manager::WorkflowManager;
use crate::backend::{Backend, Services};
use crate::domain::application::Application;
use crate::error::{WorkflowError, WorkflowResult};

/// A fee can be taken for a step the application requires and has not
/// ended.
pub fn ensure_payment_due(application: &Application, step: PaymentStep) -> WorkflowResult<()> {
    if application.status.is_terminal() || !application.payment_requirements.is_required(step) {
        return Err(WorkflowError::PaymentNotDue(step));
    }
    Ok(())
}

pub struct StartPaymentUseCase<B: Backend> {
    services: Services<B>,
    manager: Arc<WorkflowManager<B>>,
    config: Arc<PaymentConfig>,
}

impl<B: Backend> StartPaymentUseCase<B> {
    pub fn new(
        services: Services<B>,
        manager: Arc<WorkflowManager<B>>,
        config: Arc<PaymentConfig>,
    ) -> Self {
        Self {
            services,
            manager,
            config,
        }
    }

    pub async fn execute(
        &self,
        candidate: &User,
        application_id: &ApplicationId,
        step: PaymentStep,
        currency: Currency,
    ) -> WorkflowResult<Payment> {
        let application = self.manager.load(application_id).await?;
        if application.candidate_id != candidate.user_id {
            return Err(WorkflowError::forbidden(
                "Only the candidate can pay for this application",
            ));
        }
        ensure_payment_due(&application, step)?;

        let payment = CreatePaymentUseCase::new(
            self.services.payments.clone(),
            self.services.rates.clone(),
            self.config.clone(),
        )
        .execute(CreatePaymentInput {
            user_id: candidate.user_id,
            application_id: application.application_id,
            step,
            currency,
        })
        .await?;
        Ok(payment)
    }
}

/// Result of a verification, with the application it moved (if any)
#[derive(Debug, Clone)]
pub struct ConfirmedPayment {
    pub outcome: VerifyOutcome,
    pub application: Option<Application>,
}

pub struct ConfirmPaymentUseCase<B: Backend> {
    services: Services<B>,
    manager: Arc<WorkflowManager<B>>,
}

impl<B: Backend> ConfirmPaymentUseCase<B> {
    pub fn new(services: Services<B>, manager: Arc<WorkflowManager<B>>) -> Self {
        Self { services, manager }
    }

    pub async fn execute(
        &self,
        candidate: &User,
        payment_id: &PaymentId,
        tx_hash: &str,
    ) -> WorkflowResult<ConfirmedPayment> {
        let outcome = VerifyPaymentUseCase::new(
            self.services.payments.clone(),
            self.services.chain.clone(),
        )
        .execute(payment_id, &candidate.user_id, tx_hash)
        .await?;

        if !outcome.confirmed {
            return Ok(ConfirmedPayment {
                outcome,
                application: None,
            });
        }

        let application = self
            .manager
            .process_payment_confirmation(&outcome.payment.payment_id)
            .await?;
        Ok(ConfirmedPayment {
            outcome,
            application: Some(application),
        })
    }
}
