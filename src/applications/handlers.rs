// src/applications/handlers.rs

use axum::extract::{Extension, Json, Path};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::models::*;
use super::validators::ApplicationValidator;
use crate::analytics::AnalyticsRecorder;
use crate::auth::AuthedUser;
use crate::common::{generate_application_id, ApiError, AppState, Validator};
use crate::outreach::{AttemptReport, OutreachHandle, OutreachRequest};

async fn fetch_application(
    state: &AppState,
    user_id: &str,
    application_id: &str,
) -> Result<JobApplication, ApiError> {
    sqlx::query_as::<_, ApplicationRow>("SELECT * FROM applications WHERE id = ? AND user_id = ?")
        .bind(application_id)
        .bind(user_id)
        .fetch_optional(&state.db)
        .await
        .map_err(|e| {
            error!(
                error = %e,
                application_id = %application_id,
                "Database error fetching application"
            );
            ApiError::DatabaseError(e)
        })?
        .map(JobApplication::from)
        .ok_or_else(|| {
            ApiError::NotFound(format!("Application with ID {} not found", application_id))
        })
}

async fn fetch_cold_emails(
    state: &AppState,
    application_id: &str,
) -> Result<Vec<ColdEmail>, ApiError> {
    sqlx::query_as::<_, ColdEmail>(
        r#"
        SELECT id, recipient_name, resolved_address, status, probes, detail, created_at, updated_at
        FROM cold_emails WHERE application_id = ? ORDER BY id
        "#,
    )
    .bind(application_id)
    .fetch_all(&state.db)
    .await
    .map_err(|e| {
        error!(
            error = %e,
            application_id = %application_id,
            "Database error fetching cold emails"
        );
        ApiError::DatabaseError(e)
    })
}

async fn record_attempt(
    db: &SqlitePool,
    application_id: &str,
    report: &AttemptReport,
) -> Result<(), sqlx::Error> {
    let (status, detail) = cold_email_status(&report.outcome);

    sqlx::query(
        r#"
        UPDATE cold_emails SET
            status = ?,
            resolved_address = ?,
            probes = ?,
            detail = ?,
            updated_at = datetime('now')
        WHERE application_id = ? AND recipient_name = ?
        "#,
    )
    .bind(status)
    .bind(report.resolved_address.as_deref())
    .bind(report.probes as i64)
    .bind(detail)
    .bind(application_id)
    .bind(&report.name)
    .execute(db)
    .await?;

    Ok(())
}

/// Write each attempt's outcome onto its cold email row as reports arrive.
/// Ends when the last attempt has reported.
fn track_outreach(db: SqlitePool, application_id: String, handle: OutreachHandle) {
    let OutreachHandle { mut reports, .. } = handle;
    tokio::spawn(async move {
        while let Some(report) = reports.recv().await {
            match record_attempt(&db, &application_id, &report).await {
                Ok(()) => debug!(
                    application_id = %application_id,
                    name = %report.name,
                    "Cold email status updated"
                ),
                Err(e) => error!(
                    application_id = %application_id,
                    name = %report.name,
                    error = %e,
                    "Failed to update cold email status"
                ),
            }
        }
    });
}

/// Kick off the post-create side effects without waiting for them.
///
/// Cold emails go through the outreach pipeline, which records analytics per
/// delivered message. Everything else records a single non-email event.
fn trigger_follow_up(state: &AppState, application: &JobApplication) {
    if application.is_cold_email() {
        let Some(outreach) = &state.outreach else {
            warn!(
                application_id = %application.id,
                "Outreach is not configured, skipping cold emails"
            );
            return;
        };

        let handle = outreach.launch(OutreachRequest {
            application_id: application.id.clone(),
            recipient_names: application.employee_names.clone(),
            job_title: application.job_title.clone(),
            domain: application.domain.clone().unwrap_or_default(),
            user_id: application.user_id.clone(),
            platform: application.platform.clone(),
        });
        // Attempts keep running on their own; only the reports are consumed
        track_outreach(state.db.clone(), application.id.clone(), handle);
        return;
    }

    let analytics = Arc::clone(&state.analytics_service);
    let user_id = application.user_id.clone();
    let platform = application.platform.clone();
    tokio::spawn(async move {
        if let Err(e) = analytics.record_event(&user_id, &platform, false).await {
            error!(user_id = %user_id, error = %e, "Failed to update analytics");
        }
    });
}

/// POST /api/applications - Record an application and start any outreach
pub async fn create_application(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(request): Json<CreateApplicationRequest>,
) -> Result<Json<JobApplication>, ApiError> {
    let state = state_lock.read().await.clone();

    info!(
        user_id = %authed.id,
        company = %request.company_name,
        application_type = %request.application_type(),
        "Creating new job application"
    );

    let validation_result = ApplicationValidator.validate(&request);
    if !validation_result.is_valid {
        warn!(
            user_id = %authed.id,
            errors = ?validation_result.errors,
            "Application creation validation failed"
        );
        return Err(ApiError::from(validation_result));
    }

    let employee_names = request.recipient_names();
    let employee_names_json = serde_json::to_string(&employee_names)
        .map_err(|e| ApiError::InternalServer(e.to_string()))?;

    let application_id = generate_application_id();
    let db_error = |e: sqlx::Error| {
        error!(error = %e, user_id = %authed.id, "Database error creating application");
        ApiError::DatabaseError(e)
    };

    // The application and its cold email rows land together or not at all
    let mut tx = state.db.begin().await.map_err(db_error)?;

    sqlx::query(
        r#"
        INSERT INTO applications (
            id, user_id, job_title, company_name, platform, status,
            application_type, domain, employee_names, date_applied, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, COALESCE(?, datetime('now')), datetime('now'))
        "#,
    )
    .bind(&application_id)
    .bind(&authed.id)
    .bind(request.job_title.trim())
    .bind(request.company_name.trim())
    .bind(request.platform.trim())
    .bind(request.status.as_deref().unwrap_or(DEFAULT_STATUS))
    .bind(request.application_type())
    .bind(request.normalized_domain())
    .bind(&employee_names_json)
    .bind(request.date_applied.as_deref())
    .execute(&mut *tx)
    .await
    .map_err(db_error)?;

    let initial_status = if state.outreach.is_some() {
        COLD_EMAIL_PENDING
    } else {
        COLD_EMAIL_DISABLED
    };
    let cold_email_names: &[String] = if request.is_cold_email() {
        &employee_names
    } else {
        &[]
    };
    for name in cold_email_names {
        sqlx::query(
            r#"
            INSERT INTO cold_emails (application_id, user_id, recipient_name, status)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&application_id)
        .bind(&authed.id)
        .bind(name)
        .bind(initial_status)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;
    }

    tx.commit().await.map_err(db_error)?;

    let application = fetch_application(&state, &authed.id, &application_id).await?;

    info!(
        user_id = %authed.id,
        application_id = %application_id,
        recipients = application.employee_names.len(),
        "Application created successfully"
    );

    trigger_follow_up(&state, &application);

    Ok(Json(application))
}

/// GET /api/applications - All applications of the authenticated user
pub async fn list_applications(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<Vec<JobApplication>>, ApiError> {
    let state = state_lock.read().await.clone();

    let rows = sqlx::query_as::<_, ApplicationRow>(
        "SELECT * FROM applications WHERE user_id = ? ORDER BY date_applied DESC, id DESC",
    )
    .bind(&authed.id)
    .fetch_all(&state.db)
    .await
    .map_err(|e| {
        error!(error = %e, user_id = %authed.id, "Database error listing applications");
        ApiError::DatabaseError(e)
    })?;

    Ok(Json(rows.into_iter().map(JobApplication::from).collect()))
}

/// GET /api/applications/:id - The application with its cold emails
pub async fn get_application(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(application_id): Path<String>,
) -> Result<Json<ApplicationDetail>, ApiError> {
    let state = state_lock.read().await.clone();
    let application = fetch_application(&state, &authed.id, &application_id).await?;
    let cold_emails = fetch_cold_emails(&state, &application_id).await?;
    Ok(Json(ApplicationDetail {
        application,
        cold_emails,
    }))
}

/// PUT /api/applications/:id - Update tracked fields; never re-triggers outreach
pub async fn update_application(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(application_id): Path<String>,
    Json(request): Json<UpdateApplicationRequest>,
) -> Result<Json<JobApplication>, ApiError> {
    let state = state_lock.read().await.clone();

    let validation_result = ApplicationValidator.validate(&request);
    if !validation_result.is_valid {
        warn!(
            user_id = %authed.id,
            application_id = %application_id,
            errors = ?validation_result.errors,
            "Application update validation failed"
        );
        return Err(ApiError::from(validation_result));
    }

    let result = sqlx::query(
        r#"
        UPDATE applications SET
            job_title = COALESCE(?, job_title),
            company_name = COALESCE(?, company_name),
            platform = COALESCE(?, platform),
            status = COALESCE(?, status),
            date_applied = COALESCE(?, date_applied),
            updated_at = datetime('now')
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(request.job_title.as_deref().map(str::trim))
    .bind(request.company_name.as_deref().map(str::trim))
    .bind(request.platform.as_deref().map(str::trim))
    .bind(request.status.as_deref())
    .bind(request.date_applied.as_deref())
    .bind(&application_id)
    .bind(&authed.id)
    .execute(&state.db)
    .await
    .map_err(|e| {
        error!(
            error = %e,
            application_id = %application_id,
            "Database error updating application"
        );
        ApiError::DatabaseError(e)
    })?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(format!(
            "Application with ID {} not found",
            application_id
        )));
    }

    info!(
        user_id = %authed.id,
        application_id = %application_id,
        "Application updated successfully"
    );

    let application = fetch_application(&state, &authed.id, &application_id).await?;
    Ok(Json(application))
}

/// DELETE /api/applications/:id - In-flight outreach is not affected
pub async fn delete_application(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(application_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let result = sqlx::query("DELETE FROM applications WHERE id = ? AND user_id = ?")
        .bind(&application_id)
        .bind(&authed.id)
        .execute(&state.db)
        .await
        .map_err(|e| {
            error!(
                error = %e,
                application_id = %application_id,
                "Database error deleting application"
            );
            ApiError::DatabaseError(e)
        })?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(format!(
            "Application with ID {} not found",
            application_id
        )));
    }

    info!(
        user_id = %authed.id,
        application_id = %application_id,
        "Application deleted"
    );

    Ok(Json(serde_json::json!({
        "message": "Application deleted successfully"
    })))
}
