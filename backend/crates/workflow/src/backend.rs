//! Backend wiring
//!
//! `Backend` names the concrete store and capability types once, so
//! handlers and the workflow manager take a single type parameter.

use std::sync::Arc;

use auth::{MemoryUserRepository, PgUserRepository, UserRepository};
use exam::{ExamSessionRepository, MemoryExamSessionRepository, PgExamSessionRepository};
use payment::{
    ChainVerifier, ExchangeRates, MemoryPaymentRepository, PaymentRepository,
    PgPaymentRepository, ShapeCheckVerifier, StaticExchangeRates,
};
use sqlx::PgPool;

use crate::domain::document::{DocumentGenerator, StorageKeyGenerator};
use crate::domain::notification::{LogNotifier, MemoryNotifier, Notifier};
use crate::domain::repository::{ApplicationRepository, JobRepository};
use crate::infra::{
    MemoryApplicationRepository, MemoryJobRepository, PgApplicationRepository, PgJobRepository,
};

pub trait Backend: Send + Sync + 'static {
    type Users: UserRepository + Send + Sync + 'static;
    type Jobs: JobRepository + Send + Sync + 'static;
    type Applications: ApplicationRepository + Send + Sync + 'static;
    type Payments: PaymentRepository + Send + Sync + 'static;
    type Sessions: ExamSessionRepository + Send + Sync + 'static;
    type Chain: ChainVerifier + Send + Sync + 'static;
    type Documents: DocumentGenerator + Send + Sync + 'static;
    type Notifier: Notifier + Send + Sync + 'static;
}

/// PostgreSQL stores, shape-checked payments, log notifications
pub struct PgBackend;

impl Backend for PgBackend {
    type Users = PgUserRepository;
    type Jobs = PgJobRepository;
    type Applications = PgApplicationRepository;
    type Payments = PgPaymentRepository;
    type Sessions = PgExamSessionRepository;
    type Chain = ShapeCheckVerifier;
    type Documents = StorageKeyGenerator;
    type Notifier = LogNotifier;
}

/// Everything in process; tests and single-node development
pub struct MemoryBackend;

impl Backend for MemoryBackend {
    type Users = MemoryUserRepository;
    type Jobs = MemoryJobRepository;
    type Applications = MemoryApplicationRepository;
    type Payments = MemoryPaymentRepository;
    type Sessions = MemoryExamSessionRepository;
    type Chain = ShapeCheckVerifier;
    type Documents = StorageKeyGenerator;
    type Notifier = MemoryNotifier;
}

/// Store and capability instances for one backend
pub struct Services<B: Backend> {
    pub users: Arc<B::Users>,
    pub jobs: Arc<B::Jobs>,
    pub applications: Arc<B::Applications>,
    pub payments: Arc<B::Payments>,
    pub sessions: Arc<B::Sessions>,
    pub chain: Arc<B::Chain>,
    pub documents: Arc<B::Documents>,
    pub notifier: Arc<B::Notifier>,
    pub rates: Arc<dyn ExchangeRates>,
}

impl<B: Backend> Clone for Services<B> {
    fn clone(&self) -> Self {
        Self {
            users: Arc::clone(&self.users),
            jobs: Arc::clone(&self.jobs),
            applications: Arc::clone(&self.applications),
            payments: Arc::clone(&self.payments),
            sessions: Arc::clone(&self.sessions),
            chain: Arc::clone(&self.chain),
            documents: Arc::clone(&self.documents),
            notifier: Arc::clone(&self.notifier),
            rates: Arc::clone(&self.rates),
        }
    }
}

impl Services<PgBackend> {
    pub fn postgres(pool: PgPool, rates: Arc<dyn ExchangeRates>) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            jobs: Arc::new(PgJobRepository::new(pool.clone())),
            applications: Arc::new(PgApplicationRepository::new(pool.clone())),
            payments: Arc::new(PgPaymentRepository::new(pool.clone())),
            sessions: Arc::new(PgExamSessionRepository::new(pool)),
            chain: Arc::new(ShapeCheckVerifier),
            documents: Arc::new(StorageKeyGenerator),
            notifier: Arc::new(LogNotifier),
            rates,
        }
    }
}

impl Services<MemoryBackend> {
    pub fn memory() -> Self {
        Self {
            users: Arc::new(MemoryUserRepository::new()),
            jobs: Arc::new(MemoryJobRepository::new()),
            applications: Arc::new(MemoryApplicationRepository::new()),
            payments: Arc::new(MemoryPaymentRepository::new()),
            sessions: Arc::new(MemoryExamSessionRepository::new()),
            chain: Arc::new(ShapeCheckVerifier),
            documents: Arc::new(StorageKeyGenerator),
            notifier: Arc::new(MemoryNotifier::new()),
            rates: Arc::new(StaticExchangeRates::development()),
        }
    }
}
