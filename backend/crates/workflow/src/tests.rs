//! Unit tests for Workflow crate

#[cfg(test)]
mod support {
    use std::sync::Arc;

    use auth::{Email, User, UserRepository, UserRole};
    use kernel::PaymentStep;
    use kernel::id::ApplicationId;
    use payment::{Currency, PaymentConfig};
    use uuid::Uuid;

    use crate::application::cache::JobCaches;
    use crate::application::config::WorkflowConfig;
    use crate::application::manager::WorkflowManager;
    use crate::application::{
        ConfirmPaymentUseCase, ConfirmedPayment, StartPaymentUseCase, SubmitApplicationUseCase,
    };
    use crate::backend::{MemoryBackend, Services};
    use crate::domain::application::Application;
    use crate::domain::job::{Job, JobDraft};
    use crate::domain::repository::JobRepository;

    pub struct World {
        pub services: Services<MemoryBackend>,
        pub caches: JobCaches,
        pub manager: Arc<WorkflowManager<MemoryBackend>>,
        pub payment_config: Arc<PaymentConfig>,
        pub company: User,
        pub candidate: User,
        pub job: Job,
    }

    pub async fn user(
        services: &Services<MemoryBackend>,
        email: &str,
        role: UserRole,
    ) -> User {
        let mut user = User::new(Email::new(email).unwrap(), "Test User", role).unwrap();
        if role == UserRole::Company {
            user.set_company_name(Some("Acme Relocations".into()));
        }
        if role == UserRole::Candidate {
            user.set_skills(vec!["Rust".into(), "SQL".into()]);
        }
        services.users.create(&user).await.unwrap();
        user
    }

    pub fn draft(cutoff: i32) -> JobDraft {
        JobDraft {
            title: "Backend Engineer".into(),
            description: "Build the platform".into(),
            location: "Berlin".into(),
            required_skills: vec!["rust".into(), "sql".into(), "kafka".into()],
            assessment_cutoff_score: cutoff,
        }
    }

    pub async fn world_with_cutoff(cutoff: i32) -> World {
        let services = Services::<MemoryBackend>::memory();
        let caches = JobCaches::new(&WorkflowConfig::development());
        let manager = Arc::new(WorkflowManager::new(services.clone(), caches.clone()));

        let company = user(&services, "hr@acme.example", UserRole::Company).await;
        let candidate = user(&services, "dev@example.com", UserRole::Candidate).await;
        let job = Job::new(company.user_id, draft(cutoff)).unwrap();
        services.jobs.create(&job).await.unwrap();

        World {
            services,
            caches,
            manager,
            payment_config: Arc::new(PaymentConfig::development()),
            company,
            candidate,
            job,
        }
    }

    pub async fn world() -> World {
        world_with_cutoff(70).await
    }

    pub async fn submit(w: &World) -> Application {
        SubmitApplicationUseCase::new(
            w.services.jobs.clone(),
            w.services.applications.clone(),
            w.caches.clone(),
        )
        .execute(&w.candidate, &w.job.job_id, Some("Hello".into()))
        .await
        .unwrap()
    }

    pub fn tx_hash() -> String {
        format!("0x{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
    }

    /// Create and settle a payment for `step`
    pub async fn pay(w: &World, application_id: &ApplicationId, step: PaymentStep) -> ConfirmedPayment {
        let payment = StartPaymentUseCase::new(
            w.services.clone(),
            w.manager.clone(),
            w.payment_config.clone(),
        )
        .execute(&w.candidate, application_id, step, Currency::Eth)
        .await
        .unwrap();

        ConfirmPaymentUseCase::new(w.services.clone(), w.manager.clone())
            .execute(&w.candidate, &payment.payment_id, &tx_hash())
            .await
            .unwrap()
    }
}

#[cfg(test)]
mod manager_tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::Utc;
    use exam::ExamConfig;
    use kernel::PaymentStep;
    use payment::{Currency, FailPaymentUseCase, PaymentError};
    use platform::client::ClientFingerprint;

    use super::support::*;
    use crate::application::documents::{DocumentContext, DocumentService};
    use crate::application::{
        AssessmentUseCase, JobMatchesUseCase, JobStatsUseCase, ListApplicationsUseCase,
        StartPaymentUseCase, SubmitApplicationUseCase, UpdateJobUseCase,
    };
    use crate::application::config::WorkflowConfig;
    use crate::domain::document::{DocumentGenerator, DocumentKind, DocumentRequest, storage_key};
    use crate::domain::gates::PaymentStepStatus;
    use crate::domain::job::Job;
    use crate::domain::repository::{ApplicationRepository, JobRepository};
    use crate::domain::status::{ApplicationStatus, WorkflowStep};
    use crate::error::{WorkflowError, WorkflowResult};

    fn browser(value: &str) -> ClientFingerprint {
        ClientFingerprint::new(value.into(), None, "Mozilla/5.0".into())
    }

    fn assessments(w: &World) -> AssessmentUseCase<crate::backend::MemoryBackend> {
        AssessmentUseCase::new(
            w.services.clone(),
            w.manager.clone(),
            Arc::new(ExamConfig::development()),
        )
    }

    #[tokio::test]
    async fn test_full_workflow_to_completion() {
        let w = world().await;
        let app = submit(&w).await;
        let id = app.application_id;
        assert_eq!(app.status, ApplicationStatus::Pending);

        let app = w.manager.process_application_acceptance(&id).await.unwrap();
        assert_eq!(app.status, ApplicationStatus::Accepted);
        assert!(app.payment_requirements.is_required(PaymentStep::Assessment));

        let paid = pay(&w, &id, PaymentStep::Assessment).await;
        assert!(paid.outcome.confirmed);
        let app = paid.application.unwrap();
        assert_eq!(app.status, ApplicationStatus::AssessmentPending);
        assert_eq!(app.current_step, WorkflowStep::Assessment);

        let app = w
            .manager
            .process_assessment_completion(&id, 85, None)
            .await
            .unwrap();
        assert_eq!(app.status, ApplicationStatus::AssessmentCompleted);
        assert!(app.payment_requirements.is_required(PaymentStep::DocumentProcessing));

        let app = pay(&w, &id, PaymentStep::DocumentProcessing)
            .await
            .application
            .unwrap();
        assert_eq!(app.status, ApplicationStatus::DocumentsPending);

        let app = w.manager.process_document_verification(&id, true).await.unwrap();
        assert_eq!(app.status, ApplicationStatus::OfferSent);

        let app = w.manager.accept_offer(&id, &w.candidate.user_id).await.unwrap();
        assert_eq!(app.status, ApplicationStatus::OfferAccepted);

        let app = pay(&w, &id, PaymentStep::VisaProcessing)
            .await
            .application
            .unwrap();
        assert_eq!(app.status, ApplicationStatus::VisaProcessing);
        assert_eq!(app.current_step, WorkflowStep::VisaProcessing);

        let app = w.manager.process_visa_processing(&id).await.unwrap();
        assert_eq!(app.current_step, WorkflowStep::Relocation);

        let app = w.manager.complete(&id).await.unwrap();
        assert_eq!(app.status, ApplicationStatus::Completed);
        assert_eq!(app.current_step, WorkflowStep::Completed);

        let stored = w.manager.load(&id).await.unwrap();
        for kind in DocumentKind::ALL {
            assert_eq!(
                stored.generated_documents.get(&kind),
                Some(&storage_key(&id, kind)),
                "{kind}"
            );
        }

        let err = w.manager.reject(&id, "too late").await.unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_cutoff_is_inclusive() {
        let w = world_with_cutoff(70).await;

        let passing = submit(&w).await.application_id;
        w.manager.process_application_acceptance(&passing).await.unwrap();
        pay(&w, &passing, PaymentStep::Assessment).await;
        let app = w
            .manager
            .process_assessment_completion(&passing, 70, None)
            .await
            .unwrap();
        assert_eq!(app.status, ApplicationStatus::AssessmentCompleted);
        assert!(app.assessment.unwrap().passed);
    }

    #[tokio::test]
    async fn test_score_below_cutoff_rejects() {
        let w = world_with_cutoff(70).await;
        let id = submit(&w).await.application_id;
        w.manager.process_application_acceptance(&id).await.unwrap();
        pay(&w, &id, PaymentStep::Assessment).await;

        let app = w
            .manager
            .process_assessment_completion(&id, 69, None)
            .await
            .unwrap();
        assert_eq!(app.status, ApplicationStatus::Rejected);
        assert_eq!(
            app.rejection_reason.as_deref(),
            Some("Assessment score 69 is below the required cutoff of 70")
        );
        assert!(!app.has_document(DocumentKind::AssessmentCertificate));
    }

    #[tokio::test]
    async fn test_assessment_requires_paid_gate() {
        let w = world().await;
        let id = submit(&w).await.application_id;
        w.manager.process_application_acceptance(&id).await.unwrap();

        let err = w
            .manager
            .process_assessment_completion(&id, 90, None)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::PaymentRequired(PaymentStep::Assessment)));
        assert_eq!(err.status_code().as_u16(), 402);
    }

    #[tokio::test]
    async fn test_duplicate_application_is_conflict() {
        let w = world().await;
        submit(&w).await;

        let err = SubmitApplicationUseCase::new(
            w.services.jobs.clone(),
            w.services.applications.clone(),
            w.caches.clone(),
        )
        .execute(&w.candidate, &w.job.job_id, None)
        .await
        .unwrap_err();
        assert!(matches!(err, WorkflowError::DuplicateApplication));
        assert_eq!(err.status_code().as_u16(), 409);
    }

    #[tokio::test]
    async fn test_closed_job_refuses_applications() {
        let w = world().await;
        UpdateJobUseCase::new(w.services.jobs.clone(), w.caches.clone())
            .close(&w.company, &w.job.job_id)
            .await
            .unwrap();

        let err = SubmitApplicationUseCase::new(
            w.services.jobs.clone(),
            w.services.applications.clone(),
            w.caches.clone(),
        )
        .execute(&w.candidate, &w.job.job_id, None)
        .await
        .unwrap_err();
        assert!(matches!(err, WorkflowError::JobClosed));
    }

    #[tokio::test]
    async fn test_gates_follow_payment_records() {
        let w = world().await;
        let id = submit(&w).await.application_id;
        w.manager.process_application_acceptance(&id).await.unwrap();

        let (_, state) = w.manager.check_payment_gates(&id).await.unwrap();
        assert_eq!(state.assessment, PaymentStepStatus::Required);
        assert!(!state.gates().permissions().can_take_assessment);

        let payment = StartPaymentUseCase::new(
            w.services.clone(),
            w.manager.clone(),
            w.payment_config.clone(),
        )
        .execute(&w.candidate, &id, PaymentStep::Assessment, Currency::Btc)
        .await
        .unwrap();
        let (_, state) = w.manager.check_payment_gates(&id).await.unwrap();
        assert_eq!(state.assessment, PaymentStepStatus::Pending);
        assert!(state.gates().assessment_blocked);

        FailPaymentUseCase::new(w.services.payments.clone())
            .execute(&payment.payment_id)
            .await
            .unwrap();
        let (_, state) = w.manager.check_payment_gates(&id).await.unwrap();
        assert_eq!(state.assessment, PaymentStepStatus::Failed);

        pay(&w, &id, PaymentStep::Assessment).await;
        let (app, state) = w.manager.check_payment_gates(&id).await.unwrap();
        assert_eq!(state.assessment, PaymentStepStatus::Paid);
        assert!(state.gates().permissions().can_take_assessment);
        assert!(state.gates().document_submission_blocked);
        assert_eq!(app.status, ApplicationStatus::AssessmentPending);
    }

    #[tokio::test]
    async fn test_payment_for_unrequired_step_is_not_due() {
        let w = world().await;
        let id = submit(&w).await.application_id;

        let err = StartPaymentUseCase::new(
            w.services.clone(),
            w.manager.clone(),
            w.payment_config.clone(),
        )
        .execute(&w.candidate, &id, PaymentStep::Assessment, Currency::Eth)
        .await
        .unwrap_err();
        assert!(matches!(err, WorkflowError::PaymentNotDue(PaymentStep::Assessment)));
    }

    #[tokio::test]
    async fn test_repeated_confirmation_is_a_no_op() {
        let w = world().await;
        let id = submit(&w).await.application_id;
        w.manager.process_application_acceptance(&id).await.unwrap();
        let paid = pay(&w, &id, PaymentStep::Assessment).await;
        let before = paid.application.unwrap();

        let again = w
            .manager
            .process_payment_confirmation(&paid.outcome.payment.payment_id)
            .await
            .unwrap();
        assert_eq!(again.status, ApplicationStatus::AssessmentPending);
        assert_eq!(again.version, before.version);
    }

    #[tokio::test]
    async fn test_unconfirmed_payment_cannot_drive_the_workflow() {
        let w = world().await;
        let id = submit(&w).await.application_id;
        w.manager.process_application_acceptance(&id).await.unwrap();
        let payment = StartPaymentUseCase::new(
            w.services.clone(),
            w.manager.clone(),
            w.payment_config.clone(),
        )
        .execute(&w.candidate, &id, PaymentStep::Assessment, Currency::Eth)
        .await
        .unwrap();

        let err = w
            .manager
            .process_payment_confirmation(&payment.payment_id)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Payment(PaymentError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_stale_transition_is_concurrent_modification() {
        let w = world().await;
        let app = submit(&w).await;

        let mut accepted = app.clone();
        accepted.accept(Utc::now()).unwrap();
        w.services
            .applications
            .transition(&accepted, app.version)
            .await
            .unwrap();

        let mut rejected = app.clone();
        rejected.reject("Position filled", Utc::now()).unwrap();
        let err = w
            .services
            .applications
            .transition(&rejected, app.version)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::ConcurrentModification));

        let stored = w.manager.load(&app.application_id).await.unwrap();
        assert_eq!(stored.status, ApplicationStatus::Accepted);
        assert_eq!(stored.version, app.version + 1);
    }

    #[derive(Default)]
    struct CountingGenerator {
        calls: AtomicUsize,
    }

    impl DocumentGenerator for CountingGenerator {
        async fn generate(&self, request: &DocumentRequest) -> WorkflowResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(storage_key(&request.application_id, request.kind))
        }
    }

    #[tokio::test]
    async fn test_ensure_document_generates_once() {
        let w = world().await;
        let app = submit(&w).await;
        let generator = Arc::new(CountingGenerator::default());
        let documents = DocumentService::new(w.services.applications.clone(), generator.clone());
        let context = DocumentContext {
            candidate_name: "Dev".into(),
            company_name: "Acme".into(),
            job_title: "Backend Engineer".into(),
        };

        let first = documents
            .ensure(&app.application_id, DocumentKind::OfferLetter, &context)
            .await
            .unwrap();
        let second = documents
            .ensure(&app.application_id, DocumentKind::OfferLetter, &context)
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);

        let stored = w.manager.load(&app.application_id).await.unwrap();
        assert_eq!(stored.version, app.version);
    }

    #[tokio::test]
    async fn test_withdraw() {
        let w = world().await;
        let id = submit(&w).await.application_id;

        let err = w.manager.withdraw(&id, &w.company.user_id).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Forbidden(_)));

        let app = w.manager.withdraw(&id, &w.candidate.user_id).await.unwrap();
        assert_eq!(app.status, ApplicationStatus::Rejected);
        assert_eq!(app.rejection_reason.as_deref(), Some("Withdrawn by candidate"));

        let err = w.manager.withdraw(&id, &w.candidate.user_id).await.unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_visa_payment_before_offer_acceptance_waits() {
        let w = world().await;
        let id = submit(&w).await.application_id;
        w.manager.process_application_acceptance(&id).await.unwrap();
        pay(&w, &id, PaymentStep::Assessment).await;
        w.manager.process_assessment_completion(&id, 90, None).await.unwrap();
        pay(&w, &id, PaymentStep::DocumentProcessing).await;
        w.manager.process_document_verification(&id, true).await.unwrap();

        let app = pay(&w, &id, PaymentStep::VisaProcessing)
            .await
            .application
            .unwrap();
        assert_eq!(app.status, ApplicationStatus::OfferSent);

        w.manager.accept_offer(&id, &w.candidate.user_id).await.unwrap();
        let app = w.manager.process_visa_processing(&id).await.unwrap();
        assert_eq!(app.status, ApplicationStatus::VisaProcessing);
        assert_eq!(app.current_step, WorkflowStep::Relocation);
    }

    #[tokio::test]
    async fn test_rejected_documents_end_the_application() {
        let w = world().await;
        let id = submit(&w).await.application_id;
        w.manager.process_application_acceptance(&id).await.unwrap();
        pay(&w, &id, PaymentStep::Assessment).await;
        w.manager.process_assessment_completion(&id, 90, None).await.unwrap();
        pay(&w, &id, PaymentStep::DocumentProcessing).await;

        let app = w.manager.process_document_verification(&id, false).await.unwrap();
        assert_eq!(app.status, ApplicationStatus::Rejected);
        assert_eq!(app.rejection_reason.as_deref(), Some("Document verification failed"));
    }

    #[tokio::test]
    async fn test_transitions_notify_candidate() {
        let w = world().await;
        let id = submit(&w).await.application_id;
        w.manager.process_application_acceptance(&id).await.unwrap();
        w.manager.reject(&id, "Position filled").await.unwrap();

        let sent = w.services.notifier.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|n| n.recipient == w.candidate.user_id));
        assert_eq!(sent[0].status, ApplicationStatus::Accepted);
        assert_eq!(sent[1].status, ApplicationStatus::Rejected);
    }

    #[tokio::test]
    async fn test_regenerate_fills_missing_documents() {
        let w = world().await;
        let id = submit(&w).await.application_id;
        w.manager.process_application_acceptance(&id).await.unwrap();
        pay(&w, &id, PaymentStep::Assessment).await;

        // pass the assessment without going through the manager
        let current = w.manager.load(&id).await.unwrap();
        let mut next = current.clone();
        let gates = w.manager.payment_state(&current).await.unwrap().gates();
        next.complete_assessment(95, 70, &gates, None, Utc::now()).unwrap();
        w.services
            .applications
            .transition(&next, current.version)
            .await
            .unwrap();

        let (app, generated) = w.manager.regenerate_documents(&id).await.unwrap();
        assert_eq!(generated, vec![DocumentKind::AssessmentCertificate]);
        assert!(app.has_document(DocumentKind::AssessmentCertificate));

        let (_, generated) = w.manager.regenerate_documents(&id).await.unwrap();
        assert!(generated.is_empty());
    }

    #[tokio::test]
    async fn test_proctored_assessment_records_security() {
        let w = world().await;
        let id = submit(&w).await.application_id;
        w.manager.process_application_acceptance(&id).await.unwrap();
        let assessments = assessments(&w);

        let err = assessments
            .start(&w.candidate, &w.job.exam_id, &browser("fp-a"))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::PaymentRequired(PaymentStep::Assessment)));

        pay(&w, &id, PaymentStep::Assessment).await;
        let started = assessments
            .start(&w.candidate, &w.job.exam_id, &browser("fp-a"))
            .await
            .unwrap();
        assert_eq!(started.application_id, id);

        assessments
            .exam()
            .record_violation(
                &started.session.session_id,
                &w.candidate.user_id,
                exam::ViolationKind::TabSwitch,
                exam::Severity::Low,
                "left the tab",
            )
            .await
            .unwrap();

        let app = assessments
            .submit(&w.candidate, &started.session.session_id, &browser("fp-a"), 88)
            .await
            .unwrap();
        assert_eq!(app.status, ApplicationStatus::AssessmentCompleted);
        let security = app.assessment.unwrap().security.unwrap();
        assert_eq!(security.session_id, started.session.session_id);
        assert_eq!(security.fingerprint, "fp-a");
        assert!(
            security
                .violations
                .iter()
                .any(|v| v.kind == exam::ViolationKind::TabSwitch)
        );
    }

    #[tokio::test]
    async fn test_submit_from_other_browser_is_refused() {
        let w = world().await;
        let id = submit(&w).await.application_id;
        w.manager.process_application_acceptance(&id).await.unwrap();
        pay(&w, &id, PaymentStep::Assessment).await;
        let assessments = assessments(&w);

        let started = assessments
            .start(&w.candidate, &w.job.exam_id, &browser("fp-a"))
            .await
            .unwrap();
        let err = assessments
            .submit(&w.candidate, &started.session.session_id, &browser("fp-b"), 99)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Exam(_)));
        assert_eq!(err.status_code().as_u16(), 403);

        let app = w.manager.load(&id).await.unwrap();
        assert_eq!(app.status, ApplicationStatus::AssessmentPending);
    }

    #[tokio::test]
    async fn test_terminated_attempt_cannot_be_restarted() {
        let w = world().await;
        let id = submit(&w).await.application_id;
        w.manager.process_application_acceptance(&id).await.unwrap();
        pay(&w, &id, PaymentStep::Assessment).await;
        let assessments = assessments(&w);

        let started = assessments
            .start(&w.candidate, &w.job.exam_id, &browser("fp-a"))
            .await
            .unwrap();
        let outcome = assessments
            .exam()
            .record_violation(
                &started.session.session_id,
                &w.candidate.user_id,
                exam::ViolationKind::MultipleFaces,
                exam::Severity::Critical,
                "second face on camera",
            )
            .await
            .unwrap();
        assert!(outcome.terminated);

        let err = assessments
            .start(&w.candidate, &w.job.exam_id, &browser("fp-a"))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Exam(exam::ExamError::SessionTerminated)));
        assert_eq!(err.status_code().as_u16(), 403);
    }

    #[tokio::test]
    async fn test_manually_terminated_attempt_cannot_be_restarted() {
        let w = world().await;
        let id = submit(&w).await.application_id;
        w.manager.process_application_acceptance(&id).await.unwrap();
        pay(&w, &id, PaymentStep::Assessment).await;
        let assessments = assessments(&w);

        let started = assessments
            .start(&w.candidate, &w.job.exam_id, &browser("fp-a"))
            .await
            .unwrap();
        assessments
            .exam()
            .terminate_session(&started.session.session_id, &w.candidate.user_id, "gave up")
            .await
            .unwrap();
        assert!(
            assessments
                .start(&w.candidate, &w.job.exam_id, &browser("fp-a"))
                .await
                .is_err()
        );
        let app = w.manager.load(&id).await.unwrap();
        assert_eq!(app.status, ApplicationStatus::AssessmentPending);
    }

    #[tokio::test]
    async fn test_out_of_range_score_keeps_session_open() {
        let w = world().await;
        let id = submit(&w).await.application_id;
        w.manager.process_application_acceptance(&id).await.unwrap();
        pay(&w, &id, PaymentStep::Assessment).await;
        let assessments = assessments(&w);

        let started = assessments
            .start(&w.candidate, &w.job.exam_id, &browser("fp-a"))
            .await
            .unwrap();
        let err = assessments
            .submit(&w.candidate, &started.session.session_id, &browser("fp-a"), 101)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Validation { field: "score", .. }));

        let session = assessments
            .exam()
            .get_session(&started.session.session_id, &w.candidate.user_id)
            .await
            .unwrap();
        assert!(session.is_active);

        let app = assessments
            .submit(&w.candidate, &started.session.session_id, &browser("fp-a"), 88)
            .await
            .unwrap();
        assert_eq!(app.status, ApplicationStatus::AssessmentCompleted);
        assert_eq!(app.assessment.unwrap().score, 88);
    }

    #[tokio::test]
    async fn test_list_applications_by_role() {
        let w = world().await;
        submit(&w).await;

        let other_company = user(&w.services, "hr@other.example", auth::UserRole::Company).await;
        let other_job = Job::new(other_company.user_id, draft(50)).unwrap();
        w.services.jobs.create(&other_job).await.unwrap();
        let other_candidate = user(&w.services, "two@example.com", auth::UserRole::Candidate).await;
        SubmitApplicationUseCase::new(
            w.services.jobs.clone(),
            w.services.applications.clone(),
            w.caches.clone(),
        )
        .execute(&other_candidate, &other_job.job_id, None)
        .await
        .unwrap();

        let list = ListApplicationsUseCase::new(
            w.services.jobs.clone(),
            w.services.applications.clone(),
            Arc::new(WorkflowConfig::development()),
        );
        let mine = list.execute(&w.candidate, None, None, None).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].candidate_id, w.candidate.user_id);

        let company_view = list.execute(&w.company, None, None, None).await.unwrap();
        assert_eq!(company_view.len(), 1);
        assert_eq!(company_view[0].job_id, w.job.job_id);

        let admin = user(&w.services, "root@example.com", auth::UserRole::Admin).await;
        let all = list.execute(&admin, None, None, None).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_matches_are_cached_until_a_job_changes() {
        let w = world().await;
        let matches = JobMatchesUseCase::new(w.services.jobs.clone(), w.caches.clone());

        let first = matches.execute(&w.candidate).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].score, 66);

        // written straight to the store: the cache still answers
        let hidden = Job::new(w.company.user_id, draft(10)).unwrap();
        w.services.jobs.create(&hidden).await.unwrap();
        assert_eq!(matches.execute(&w.candidate).await.unwrap().len(), 1);

        UpdateJobUseCase::new(w.services.jobs.clone(), w.caches.clone())
            .close(&w.company, &w.job.job_id)
            .await
            .unwrap();
        let after = matches.execute(&w.candidate).await.unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].job_id, hidden.job_id);
    }

    #[tokio::test]
    async fn test_job_stats_follow_applications() {
        let w = world().await;
        let stats = JobStatsUseCase::new(
            w.services.jobs.clone(),
            w.services.applications.clone(),
            w.caches.clone(),
        );
        assert_eq!(stats.execute(&w.company, &w.job.job_id).await.unwrap().total, 0);

        let id = submit(&w).await.application_id;
        w.manager.process_application_acceptance(&id).await.unwrap();
        let current = stats.execute(&w.company, &w.job.job_id).await.unwrap();
        assert_eq!(current.total, 1);
        assert_eq!(current.by_status.get(&ApplicationStatus::Accepted), Some(&1));

        let err = stats
            .execute(&w.candidate, &w.job.job_id)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Forbidden(_)));
    }
}

#[cfg(test)]
mod http_tests {
    use std::sync::Arc;

    use auth::{AuthConfig, User, UserRole};
    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use exam::ExamConfig;
    use payment::PaymentConfig;
    use platform::token::BearerToken;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::support::*;
    use crate::application::config::WorkflowConfig;
    use crate::backend::MemoryBackend;
    use crate::presentation::{WorkflowAppState, workflow_router};

    fn app(w: &World, config: Arc<AuthConfig>) -> Router {
        let state = WorkflowAppState::<MemoryBackend>::new(
            w.services.clone(),
            Arc::new(WorkflowConfig::development()),
            Arc::new(PaymentConfig::development()),
            Arc::new(ExamConfig::development()),
        );
        workflow_router(state, config)
    }

    fn bearer(user: &User, config: &AuthConfig) -> String {
        format!(
            "Bearer {}",
            BearerToken::issue(user.user_id.into_uuid(), &config.token_secret, 3600)
        )
    }

    async fn body_json(res: axum::response::Response) -> Value {
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_requires_token() {
        let w = world().await;
        let res = app(&w, Arc::new(AuthConfig::with_random_secret()))
            .oneshot(Request::get("/applications").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(res).await["success"], false);
    }

    #[tokio::test]
    async fn test_company_accepts_application() {
        let w = world().await;
        let config = Arc::new(AuthConfig::with_random_secret());
        let id = submit(&w).await.application_id;

        let res = app(&w, config.clone())
            .oneshot(
                Request::patch(format!("/applications/{id}/status"))
                    .header(header::AUTHORIZATION, bearer(&w.company, &config))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"status":"accepted"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let json = body_json(res).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["status"], "accepted");
        assert_eq!(json["data"]["currentStep"], "assessment");
    }

    #[tokio::test]
    async fn test_candidate_cannot_review() {
        let w = world().await;
        let config = Arc::new(AuthConfig::with_random_secret());
        let id = submit(&w).await.application_id;

        let res = app(&w, config.clone())
            .oneshot(
                Request::patch(format!("/applications/{id}/status"))
                    .header(header::AUTHORIZATION, bearer(&w.candidate, &config))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"status":"accepted"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_other_candidate_cannot_read_application() {
        let w = world().await;
        let config = Arc::new(AuthConfig::with_random_secret());
        let id = submit(&w).await.application_id;
        let stranger = user(&w.services, "nosy@example.com", UserRole::Candidate).await;

        let res = app(&w, config.clone())
            .oneshot(
                Request::get(format!("/applications/{id}"))
                    .header(header::AUTHORIZATION, bearer(&stranger, &config))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_gates_endpoint_reports_permissions() {
        let w = world().await;
        let config = Arc::new(AuthConfig::with_random_secret());
        let id = submit(&w).await.application_id;
        w.manager.process_application_acceptance(&id).await.unwrap();

        let res = app(&w, config.clone())
            .oneshot(
                Request::get(format!("/applications/{id}/gates"))
                    .header(header::AUTHORIZATION, bearer(&w.candidate, &config))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let json = body_json(res).await;
        assert_eq!(json["data"]["assessmentBlocked"], true);
        assert_eq!(json["data"]["canTakeAssessment"], false);
        assert_eq!(json["data"]["paymentStatus"]["assessment"], "required");
    }

    #[tokio::test]
    async fn test_exam_start_without_payment_is_402() {
        let w = world().await;
        let config = Arc::new(AuthConfig::with_random_secret());
        let id = submit(&w).await.application_id;
        w.manager.process_application_acceptance(&id).await.unwrap();

        let res = app(&w, config.clone())
            .oneshot(
                Request::post(format!("/exam/start/{}", w.job.exam_id))
                    .header(header::AUTHORIZATION, bearer(&w.candidate, &config))
                    .header(header::USER_AGENT, "Mozilla/5.0 Test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::PAYMENT_REQUIRED);
        assert_eq!(body_json(res).await["success"], false);
    }

    #[tokio::test]
    async fn test_exam_violation_needs_session_header() {
        let w = world().await;
        let config = Arc::new(AuthConfig::with_random_secret());

        let res = app(&w, config.clone())
            .oneshot(
                Request::post("/exam/violation")
                    .header(header::AUTHORIZATION, bearer(&w.candidate, &config))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"type":"tab_switch","severity":"low"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_payment_step_is_rejected() {
        let w = world().await;
        let config = Arc::new(AuthConfig::with_random_secret());
        let id = submit(&w).await.application_id;

        let res = app(&w, config.clone())
            .oneshot(
                Request::post("/payments/create")
                    .header(header::AUTHORIZATION, bearer(&w.candidate, &config))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(format!(
                        r#"{{"applicationId":"{id}","step":"relocation","currency":"ETH"}}"#
                    )))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(res).await["errors"][0]["field"], "step");
    }

    #[tokio::test]
    async fn test_admin_routes_reject_companies() {
        let w = world().await;
        let config = Arc::new(AuthConfig::with_random_secret());

        let res = app(&w, config.clone())
            .oneshot(
                Request::get("/admin/payments")
                    .header(header::AUTHORIZATION, bearer(&w.company, &config))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_company_posts_job() {
        let w = world().await;
        let config = Arc::new(AuthConfig::with_random_secret());

        let res = app(&w, config.clone())
            .oneshot(
                Request::post("/jobs")
                    .header(header::AUTHORIZATION, bearer(&w.company, &config))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"title":"SRE","description":"Keep it up","location":"Lisbon","requiredSkills":["Linux"],"assessmentCutoffScore":60}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let json = body_json(res).await;
        assert_eq!(json["data"]["title"], "SRE");
        assert_eq!(json["data"]["isOpen"], true);
    }
}
