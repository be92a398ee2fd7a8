//! Unit tests for Exam crate

#[cfg(test)]
mod manager_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::Utc;
    use kernel::id::{ApplicationId, ExamId, ExamSessionId, UserId};
    use platform::client::ClientFingerprint;

    use crate::application::config::ExamConfig;
    use crate::application::manager::ExamSecurityManager;
    use crate::domain::repository::ExamSessionRepository;
    use crate::domain::session::SUBMITTED_REASON;
    use crate::domain::severity::Severity;
    use crate::domain::violation::ViolationKind;
    use crate::error::ExamError;
    use crate::infra::memory::MemoryExamSessionRepository;

    struct Harness {
        repo: Arc<MemoryExamSessionRepository>,
        manager: ExamSecurityManager<MemoryExamSessionRepository>,
        user: UserId,
    }

    fn harness_with(config: ExamConfig) -> Harness {
        let repo = Arc::new(MemoryExamSessionRepository::new());
        Harness {
            manager: ExamSecurityManager::new(repo.clone(), Arc::new(config)),
            repo,
            user: UserId::new(),
        }
    }

    fn harness() -> Harness {
        harness_with(ExamConfig::default())
    }

    fn browser(ip: &str) -> ClientFingerprint {
        ClientFingerprint::new("fp-browser-a".into(), ip.parse().ok(), "UA".into())
    }

    fn other_browser() -> ClientFingerprint {
        ClientFingerprint::new("fp-browser-b".into(), "10.0.0.1".parse().ok(), "UA".into())
    }

    impl Harness {
        async fn start(&self) -> ExamSessionId {
            self.manager
                .initialize_session(self.user, ExamId::new(), None, &browser("10.0.0.1"))
                .await
                .unwrap()
                .session_id
        }

        async fn report(&self, id: &ExamSessionId, severity: Severity) -> bool {
            self.manager
                .record_violation(id, &self.user, ViolationKind::TabSwitch, severity, "left")
                .await
                .unwrap()
                .terminated
        }
    }

    #[tokio::test]
    async fn test_three_high_violations_terminate() {
        let h = harness();
        let id = h.start().await;

        assert!(!h.report(&id, Severity::High).await);
        assert!(!h.report(&id, Severity::High).await);
        assert!(h.report(&id, Severity::High).await);

        let session = h.manager.get_session(&id, &h.user).await.unwrap();
        assert!(!session.is_active);
        assert_eq!(session.severity_counts.high, 3);
        assert!(session.termination_reason.unwrap().contains("(3/3)"));
    }

    #[tokio::test]
    async fn test_custom_thresholds() {
        let mut config = ExamConfig::default();
        config.thresholds.low = 2;
        let h = harness_with(config);
        let id = h.start().await;

        assert!(!h.report(&id, Severity::Low).await);
        assert!(h.report(&id, Severity::Low).await);
    }

    #[tokio::test]
    async fn test_terminate_is_idempotent() {
        let h = harness();
        let id = h.start().await;

        let first = h.manager.terminate_session(&id, &h.user, "proctor").await.unwrap();
        let second = h.manager.terminate_session(&id, &h.user, "again").await.unwrap();

        assert_eq!(first.termination_reason.as_deref(), Some("proctor"));
        assert_eq!(second.termination_reason.as_deref(), Some("proctor"));
        assert_eq!(first.violations.len(), second.violations.len());
    }

    #[tokio::test]
    async fn test_other_user_is_forbidden() {
        let h = harness();
        let id = h.start().await;

        let err = h
            .manager
            .record_violation(&id, &UserId::new(), ViolationKind::CopyPaste, Severity::Low, "")
            .await
            .unwrap_err();
        assert!(matches!(err, ExamError::Forbidden));
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let h = harness();
        let err = h
            .manager
            .validate_session(&ExamSessionId::new(), &h.user, &browser("10.0.0.1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExamError::SessionNotFound));
        assert_eq!(err.status_code().as_u16(), 404);
    }

    #[tokio::test]
    async fn test_fingerprint_mismatch_terminates() {
        let h = harness();
        let id = h.start().await;

        let check = h
            .manager
            .validate_session(&id, &h.user, &other_browser())
            .await
            .unwrap();
        assert!(!check.valid);
        assert!(check.terminated);

        // the original browser cannot resume
        let check = h
            .manager
            .validate_session(&id, &h.user, &browser("10.0.0.1"))
            .await
            .unwrap();
        assert!(!check.valid);
    }

    #[tokio::test]
    async fn test_ip_change_alone_stays_valid() {
        let h = harness();
        let id = h.start().await;

        let check = h
            .manager
            .validate_session(&id, &h.user, &browser("10.0.0.2"))
            .await
            .unwrap();
        assert!(check.valid);

        let session = h.manager.get_session(&id, &h.user).await.unwrap();
        assert_eq!(session.severity_counts.high, 1);
        assert_eq!(session.ip.as_deref(), Some("10.0.0.2"));

        // same new address again is not another violation
        h.manager
            .validate_session(&id, &h.user, &browser("10.0.0.2"))
            .await
            .unwrap();
        let session = h.manager.get_session(&id, &h.user).await.unwrap();
        assert_eq!(session.severity_counts.high, 1);
    }

    #[tokio::test]
    async fn test_stale_save_is_rejected() {
        let h = harness();
        let id = h.start().await;

        let stale = h.repo.find(&id, Utc::now()).await.unwrap().unwrap();
        h.report(&id, Severity::Low).await;

        let err = h.repo.save(&stale).await.unwrap_err();
        assert!(matches!(err, ExamError::ConcurrentModification));
    }

    #[tokio::test]
    async fn test_concurrent_reports_are_all_counted() {
        let h = Arc::new(harness());
        let id = h.start().await;

        let mut tasks = Vec::new();
        for _ in 0..4 {
            let h = h.clone();
            tasks.push(tokio::spawn(async move {
                h.manager
                    .record_violation(&id, &h.user, ViolationKind::WindowBlur, Severity::Low, "")
                    .await
            }));
        }
        let mut ok = 0;
        for task in tasks {
            if task.await.unwrap().is_ok() {
                ok += 1;
            }
        }

        let session = h.manager.get_session(&id, &h.user).await.unwrap();
        assert_eq!(session.severity_counts.low, ok);
    }

    #[tokio::test]
    async fn test_expired_session_is_invisible_and_purged() {
        let h = harness_with(ExamConfig {
            session_ttl: Duration::ZERO,
            ..ExamConfig::default()
        });
        let id = h.start().await;

        let err = h.manager.get_session(&id, &h.user).await.unwrap_err();
        assert!(matches!(err, ExamError::SessionNotFound));

        assert_eq!(h.manager.purge_expired().await.unwrap(), 1);
        assert!(h.repo.is_empty());
    }

    #[tokio::test]
    async fn test_submission_closes_session() {
        let h = harness();
        let id = h.start().await;

        let session = h
            .manager
            .close_for_submission(&id, &h.user, &browser("10.0.0.1"))
            .await
            .unwrap();
        assert!(!session.is_active);
        assert_eq!(session.termination_reason.as_deref(), Some(SUBMITTED_REASON));

        let err = h
            .manager
            .close_for_submission(&id, &h.user, &browser("10.0.0.1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExamError::SessionTerminated));
    }

    #[tokio::test]
    async fn test_submission_from_other_browser_is_refused() {
        let h = harness();
        let id = h.start().await;
        h.report(&id, Severity::Low).await;

        let err = h
            .manager
            .close_for_submission(&id, &h.user, &other_browser())
            .await
            .unwrap_err();
        // the mismatch is critical, so the session is gone
        assert!(matches!(err, ExamError::SessionTerminated));
    }

    #[tokio::test]
    async fn test_terminated_attempt_blocks_a_new_one() {
        let h = harness();
        let app = ApplicationId::new();
        let first = h
            .manager
            .initialize_session(h.user, ExamId::new(), Some(app), &browser("10.0.0.1"))
            .await
            .unwrap()
            .session_id;
        h.manager.ensure_can_attempt(&app).await.unwrap();

        assert!(h.report(&first, Severity::Critical).await);
        assert!(matches!(
            h.manager.ensure_can_attempt(&app).await,
            Err(ExamError::SessionTerminated)
        ));

        // other applications are unaffected
        h.manager.ensure_can_attempt(&ApplicationId::new()).await.unwrap();
    }

    #[tokio::test]
    async fn test_submitted_attempt_does_not_block() {
        let h = harness();
        let app = ApplicationId::new();
        let id = h
            .manager
            .initialize_session(h.user, ExamId::new(), Some(app), &browser("10.0.0.1"))
            .await
            .unwrap()
            .session_id;
        h.manager
            .close_for_submission(&id, &h.user, &browser("10.0.0.1"))
            .await
            .unwrap();

        h.manager.ensure_can_attempt(&app).await.unwrap();
    }

    #[tokio::test]
    async fn test_purge_keeps_attempts_ended_by_violation() {
        let h = harness_with(ExamConfig {
            session_ttl: Duration::from_millis(50),
            ..ExamConfig::default()
        });
        let app = ApplicationId::new();
        let caught = h
            .manager
            .initialize_session(h.user, ExamId::new(), Some(app), &browser("10.0.0.1"))
            .await
            .unwrap()
            .session_id;
        assert!(h.report(&caught, Severity::Critical).await);
        h.start().await;

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(h.manager.purge_expired().await.unwrap(), 1);
        assert_eq!(h.repo.len(), 1);
        assert!(h.manager.ensure_can_attempt(&app).await.is_err());
    }
}
