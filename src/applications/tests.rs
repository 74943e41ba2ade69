//! Tests for the applications module

#[cfg(test)]
mod tests {
    use super::super::handlers::*;
    use super::super::models::*;
    use super::super::validators::ApplicationValidator;
    use crate::analytics::AnalyticsService;
    use crate::auth::AuthedUser;
    use crate::common::dev_mode::DevModeConfig;
    use crate::common::migrations::run_migrations;
    use crate::common::{ApiError, AppState, Validator};
    use crate::outreach::dispatcher::{DispatchError, OutreachSender, SenderProfile};
    use crate::outreach::prober::{AddressVerifier, Verdict};
    use crate::outreach::OutreachOrchestrator;
    use crate::profile::SqliteProfileStore;
    use async_trait::async_trait;
    use axum::extract::{Extension, Json, Path};
    use sqlx::sqlite::SqlitePoolOptions;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::sync::{Notify, RwLock};

    const USER_ID: &str = "U_TEST01";

    struct AcceptFirstName;

    #[async_trait]
    impl AddressVerifier for AcceptFirstName {
        async fn probe(&self, address: &str) -> Verdict {
            if address.starts_with("jane.doe@") {
                Verdict::Accepted
            } else {
                Verdict::Rejected(crate::outreach::prober::RejectReason::Mailbox)
            }
        }
    }

    #[derive(Default)]
    struct NotifyingSender {
        sent: Mutex<Vec<(String, String, String)>>,
        delivered: Notify,
    }

    #[async_trait]
    impl OutreachSender for NotifyingSender {
        async fn send(
            &self,
            address: &str,
            job_title: &str,
            profile: &SenderProfile,
        ) -> Result<(), DispatchError> {
            self.sent.lock().unwrap().push((
                address.to_string(),
                job_title.to_string(),
                profile.display_name.clone(),
            ));
            self.delivered.notify_one();
            Ok(())
        }
    }

    async fn setup_state(
        sender: Option<Arc<NotifyingSender>>,
    ) -> (Arc<RwLock<AppState>>, Arc<AnalyticsService>) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();

        sqlx::query("INSERT INTO users (id, email, username) VALUES (?, ?, ?)")
            .bind(USER_ID)
            .bind("jane@applicant.dev")
            .bind("Jane Applicant")
            .execute(&pool)
            .await
            .unwrap();

        let analytics = Arc::new(AnalyticsService::new(pool.clone()));
        let outreach = sender.map(|sender| {
            Arc::new(OutreachOrchestrator::new(
                Arc::new(AcceptFirstName),
                sender,
                Arc::new(SqliteProfileStore::new(pool.clone())),
                analytics.clone(),
                4,
            ))
        });

        let state = AppState {
            db: pool,
            jwt_secret: "test-secret".to_string(),
            dev_mode: DevModeConfig {
                enabled: false,
                user_email: "dev@test.com".to_string(),
                user_name: "Dev User".to_string(),
            },
            analytics_service: analytics.clone(),
            outreach,
        };

        (Arc::new(RwLock::new(state)), analytics)
    }

    fn authed() -> AuthedUser {
        AuthedUser {
            id: USER_ID.to_string(),
            email: "jane@applicant.dev".to_string(),
        }
    }

    fn direct_request() -> CreateApplicationRequest {
        CreateApplicationRequest {
            job_title: "Backend Engineer".to_string(),
            company_name: "Acme".to_string(),
            platform: "Indeed".to_string(),
            ..Default::default()
        }
    }

    fn cold_request(names: &[&str]) -> CreateApplicationRequest {
        CreateApplicationRequest {
            job_title: "Backend Engineer".to_string(),
            company_name: "Acme".to_string(),
            platform: "LinkedIn".to_string(),
            application_type: Some(COLD_EMAIL.to_string()),
            domain: Some(" @Acme.com ".to_string()),
            employee_names: names.iter().map(|n| n.to_string()).collect(),
            ..Default::default()
        }
    }

    async fn wait_for_total(analytics: &AnalyticsService, expected: i64) {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let snapshot = analytics.get_user_analytics(USER_ID).await.unwrap();
                if snapshot.total_applications >= expected {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("analytics should be recorded in the background");
    }

    async fn wait_for_cold_emails(
        state: &Arc<RwLock<AppState>>,
        application_id: &str,
    ) -> ApplicationDetail {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let Json(detail) = get_application(
                    Extension(state.clone()),
                    authed(),
                    Path(application_id.to_string()),
                )
                .await
                .unwrap();
                if detail
                    .cold_emails
                    .iter()
                    .all(|c| c.status != COLD_EMAIL_PENDING)
                {
                    return detail;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("every cold email should report back")
    }

    // ============================================================================
    // Validator Tests
    // ============================================================================

    #[test]
    fn test_direct_application_needs_no_domain() {
        let result = ApplicationValidator.validate(&direct_request());
        assert!(result.is_valid);
    }

    #[test]
    fn test_required_fields() {
        let result = ApplicationValidator.validate(&CreateApplicationRequest::default());
        let fields: Vec<&str> = result.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["job_title", "company_name", "platform"]);
    }

    #[test]
    fn test_cold_email_requires_domain_and_names() {
        let mut request = cold_request(&[]);
        request.domain = None;
        let result = ApplicationValidator.validate(&request);
        let fields: Vec<&str> = result.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["domain", "employee_names"]);
    }

    #[test]
    fn test_cold_email_domain_must_have_dot() {
        let mut request = cold_request(&["Jane Doe"]);
        request.domain = Some("localhost".to_string());
        let result = ApplicationValidator.validate(&request);
        assert!(!result.is_valid);
        assert_eq!(result.errors[0].field, "domain");
    }

    #[test]
    fn test_job_title_with_line_break_rejected() {
        let mut request = cold_request(&["Jane Doe"]);
        request.job_title = "Engineer\r\nBcc: victim@evil.com\r\nX-Injected: yes".to_string();
        let result = ApplicationValidator.validate(&request);
        assert!(!result.is_valid);
        assert_eq!(result.errors[0].field, "job_title");

        let update = UpdateApplicationRequest {
            job_title: Some("Engineer\nX-Injected: yes".to_string()),
            ..Default::default()
        };
        let result = ApplicationValidator.validate(&update);
        assert!(!result.is_valid);
        assert_eq!(result.errors[0].field, "job_title");
    }

    #[test]
    fn test_non_ascii_job_title_accepted() {
        let mut request = cold_request(&["José Núñez"]);
        request.job_title = "Ingénieur".to_string();
        assert!(ApplicationValidator.validate(&request).is_valid);
    }

    #[test]
    fn test_blank_names_do_not_count_towards_limit() {
        let mut names: Vec<String> = (0..19).map(|i| format!("Person Number{}", i)).collect();
        names.extend(std::iter::repeat(" ".to_string()).take(6));
        let mut request = cold_request(&[]);
        request.employee_names = names;
        assert!(ApplicationValidator.validate(&request).is_valid);

        request
            .employee_names
            .extend((19..21).map(|i| format!("Person Number{}", i)));
        let result = ApplicationValidator.validate(&request);
        assert!(!result.is_valid);
        assert_eq!(result.errors[0].field, "employee_names");
    }

    #[test]
    fn test_unknown_status_rejected() {
        let request = UpdateApplicationRequest {
            status: Some("ghosted".to_string()),
            ..Default::default()
        };
        let result = ApplicationValidator.validate(&request);
        assert!(!result.is_valid);
        assert_eq!(result.errors[0].field, "status");
    }

    #[test]
    fn test_empty_update_rejected() {
        let result = ApplicationValidator.validate(&UpdateApplicationRequest::default());
        assert!(!result.is_valid);
    }

    #[test]
    fn test_row_with_bad_names_json_reads_as_empty() {
        let row = ApplicationRow {
            id: "A_TEST01".to_string(),
            user_id: USER_ID.to_string(),
            job_title: "Engineer".to_string(),
            company_name: "Acme".to_string(),
            platform: "LinkedIn".to_string(),
            status: DEFAULT_STATUS.to_string(),
            application_type: COLD_EMAIL.to_string(),
            domain: Some("acme.com".to_string()),
            employee_names: Some("not json".to_string()),
            date_applied: None,
            updated_at: None,
        };
        let application = JobApplication::from(row);
        assert!(application.employee_names.is_empty());
        assert!(application.is_cold_email());
    }

    // ============================================================================
    // Handler Tests
    // ============================================================================

    #[tokio::test]
    async fn test_direct_application_records_non_email_event() {
        let (state, analytics) = setup_state(None).await;

        let Json(application) =
            create_application(Extension(state), authed(), Json(direct_request()))
                .await
                .unwrap();

        assert!(application.id.starts_with("A_"));
        assert_eq!(application.status, DEFAULT_STATUS);
        assert_eq!(application.application_type, DEFAULT_APPLICATION_TYPE);

        wait_for_total(&analytics, 1).await;
        let snapshot = analytics.get_user_analytics(USER_ID).await.unwrap();
        assert_eq!(snapshot.cold_emails_sent, 0);
        assert_eq!(snapshot.platform_breakdown[0].platform, "Indeed");
    }

    #[tokio::test]
    async fn test_cold_email_application_dispatches_in_background() {
        let sender = Arc::new(NotifyingSender::default());
        let (state, analytics) = setup_state(Some(sender.clone())).await;

        let Json(application) = create_application(
            Extension(state),
            authed(),
            Json(cold_request(&["Jane Doe", "Bob X"])),
        )
        .await
        .unwrap();

        assert_eq!(application.domain.as_deref(), Some("acme.com"));
        assert_eq!(application.employee_names, vec!["Jane Doe", "Bob X"]);

        tokio::time::timeout(Duration::from_secs(5), sender.delivered.notified())
            .await
            .expect("cold email should be sent");
        assert_eq!(
            sender.sent.lock().unwrap().as_slice(),
            &[(
                "jane.doe@acme.com".to_string(),
                "Backend Engineer".to_string(),
                "Jane Applicant".to_string()
            )]
        );

        wait_for_total(&analytics, 1).await;
        let snapshot = analytics.get_user_analytics(USER_ID).await.unwrap();
        assert_eq!(snapshot.cold_emails_sent, 1);
    }

    #[tokio::test]
    async fn test_cold_email_without_relay_still_persists() {
        let (state, _analytics) = setup_state(None).await;

        let result = create_application(
            Extension(state.clone()),
            authed(),
            Json(cold_request(&["Jane Doe"])),
        )
        .await;
        assert!(result.is_ok());

        let Json(all) = list_applications(Extension(state.clone()), authed())
            .await
            .unwrap();
        assert_eq!(all.len(), 1);

        let Json(detail) = get_application(Extension(state), authed(), Path(all[0].id.clone()))
            .await
            .unwrap();
        assert_eq!(detail.cold_emails.len(), 1);
        assert_eq!(detail.cold_emails[0].recipient_name, "Jane Doe");
        assert_eq!(detail.cold_emails[0].status, COLD_EMAIL_DISABLED);
    }

    #[tokio::test]
    async fn test_cold_email_rows_track_each_attempt() {
        let sender = Arc::new(NotifyingSender::default());
        let (state, _analytics) = setup_state(Some(sender)).await;

        let Json(application) = create_application(
            Extension(state.clone()),
            authed(),
            Json(cold_request(&["Jane Doe", " Bob X ", "Jane Doe"])),
        )
        .await
        .unwrap();
        assert_eq!(application.employee_names, vec!["Jane Doe", "Bob X"]);

        let detail = wait_for_cold_emails(&state, &application.id).await;
        assert_eq!(detail.application, application);
        assert_eq!(detail.cold_emails.len(), 2);

        let jane = &detail.cold_emails[0];
        assert_eq!(jane.recipient_name, "Jane Doe");
        assert_eq!(jane.status, "sent");
        assert_eq!(jane.resolved_address.as_deref(), Some("jane.doe@acme.com"));
        assert_eq!(jane.probes, 1);

        let bob = &detail.cold_emails[1];
        assert_eq!(bob.recipient_name, "Bob X");
        assert_eq!(bob.status, "skipped");
        assert_eq!(bob.resolved_address, None);
        assert_eq!(bob.probes, 0);
    }

    #[tokio::test]
    async fn test_direct_application_has_no_cold_emails() {
        let (state, _analytics) = setup_state(None).await;

        let Json(created) =
            create_application(Extension(state.clone()), authed(), Json(direct_request()))
                .await
                .unwrap();

        let Json(detail) = get_application(Extension(state), authed(), Path(created.id))
            .await
            .unwrap();
        assert!(detail.cold_emails.is_empty());
    }

    #[tokio::test]
    async fn test_failed_cold_email_insert_rolls_back_application() {
        let (state, _analytics) = setup_state(None).await;
        let db = state.read().await.db.clone();
        sqlx::query(
            r#"
            CREATE TRIGGER reject_cold_emails BEFORE INSERT ON cold_emails
            BEGIN SELECT RAISE(ABORT, 'cold emails unavailable'); END
            "#,
        )
        .execute(&db)
        .await
        .unwrap();

        let result = create_application(
            Extension(state.clone()),
            authed(),
            Json(cold_request(&["Jane Doe"])),
        )
        .await;
        assert!(matches!(result, Err(ApiError::DatabaseError(_))));

        let Json(all) = list_applications(Extension(state), authed()).await.unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn test_validation_failure_persists_nothing() {
        let (state, _analytics) = setup_state(None).await;

        let result = create_application(
            Extension(state.clone()),
            authed(),
            Json(CreateApplicationRequest::default()),
        )
        .await;
        assert!(matches!(result, Err(ApiError::ValidationError(_))));

        let Json(all) = list_applications(Extension(state), authed()).await.unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn test_update_get_and_delete() {
        let (state, _analytics) = setup_state(None).await;

        let Json(created) =
            create_application(Extension(state.clone()), authed(), Json(direct_request()))
                .await
                .unwrap();

        let Json(updated) = update_application(
            Extension(state.clone()),
            authed(),
            Path(created.id.clone()),
            Json(UpdateApplicationRequest {
                status: Some("interviewing".to_string()),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated.status, "interviewing");
        assert_eq!(updated.job_title, created.job_title);

        let Json(fetched) =
            get_application(Extension(state.clone()), authed(), Path(created.id.clone()))
                .await
                .unwrap();
        assert_eq!(fetched.application, updated);
        assert!(fetched.cold_emails.is_empty());

        delete_application(Extension(state.clone()), authed(), Path(created.id.clone()))
            .await
            .unwrap();

        let missing = get_application(Extension(state), authed(), Path(created.id)).await;
        assert!(matches!(missing, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_other_users_applications_are_hidden() {
        let (state, _analytics) = setup_state(None).await;

        let Json(created) =
            create_application(Extension(state.clone()), authed(), Json(direct_request()))
                .await
                .unwrap();

        let stranger = AuthedUser {
            id: "U_OTHER1".to_string(),
            email: "other@mail.dev".to_string(),
        };
        let result = get_application(Extension(state.clone()), stranger, Path(created.id)).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }
}
