// src/analytics/service.rs
//! Per-user application counters.
//!
//! Every event touches three rows (user total, platform, month) inside one
//! transaction. Increments happen in SQL so concurrent events never read a
//! stale count, and the unique keys make first-time inserts converge.

use async_trait::async_trait;
use chrono::Local;
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::time::Duration;
use tracing::{debug, warn};

use super::models::{AnalyticsSnapshot, MonthlyStat, PlatformBreakdown};

pub const MAX_UPDATE_ATTEMPTS: u32 = 5;
const RETRY_BACKOFF: Duration = Duration::from_millis(25);

#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Analytics update still contended after {attempts} attempts: {source}")]
    Contended { attempts: u32, source: sqlx::Error },
}

/// Sink for application events
#[async_trait]
pub trait AnalyticsRecorder: Send + Sync {
    async fn record_event(
        &self,
        user_id: &str,
        platform: &str,
        is_cold_email: bool,
    ) -> Result<(), AnalyticsError>;
}

#[derive(Debug, Clone)]
pub struct AnalyticsService {
    db_pool: SqlitePool,
}

impl AnalyticsService {
    pub fn new(db_pool: SqlitePool) -> Self {
        Self { db_pool }
    }

    /// Record one event against an explicit `YYYY-MM` bucket
    pub async fn record_event_for_month(
        &self,
        user_id: &str,
        platform: &str,
        is_cold_email: bool,
        month: &str,
    ) -> Result<(), AnalyticsError> {
        let mut attempt = 1;
        loop {
            match self.apply_event(user_id, platform, is_cold_email, month).await {
                Ok(()) => {
                    debug!(
                        user_id = %user_id,
                        platform = %platform,
                        is_cold_email,
                        month = %month,
                        "Analytics updated"
                    );
                    return Ok(());
                }
                Err(e) if is_retryable(&e) => {
                    if attempt >= MAX_UPDATE_ATTEMPTS {
                        return Err(AnalyticsError::Contended {
                            attempts: attempt,
                            source: e,
                        });
                    }
                    warn!(
                        user_id = %user_id,
                        attempt,
                        error = %e,
                        "Analytics update contended, retrying"
                    );
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn apply_event(
        &self,
        user_id: &str,
        platform: &str,
        is_cold_email: bool,
        month: &str,
    ) -> Result<(), sqlx::Error> {
        let cold = i64::from(is_cold_email);
        let mut tx = self.db_pool.begin().await?;

        let analytics_id = upsert_parent(&mut tx, user_id, cold).await?;

        sqlx::query(
            r#"
            INSERT INTO platform_breakdowns (analytics_id, platform, applications, cold_emails)
            VALUES (?, ?, 1, ?)
            ON CONFLICT(analytics_id, platform) DO UPDATE SET
                applications = applications + 1,
                cold_emails = cold_emails + excluded.cold_emails
            "#,
        )
        .bind(analytics_id)
        .bind(platform)
        .bind(cold)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO monthly_stats (analytics_id, month, applications, emails)
            VALUES (?, ?, 1, ?)
            ON CONFLICT(analytics_id, month) DO UPDATE SET
                applications = applications + 1,
                emails = emails + excluded.emails
            "#,
        )
        .bind(analytics_id)
        .bind(month)
        .bind(cold)
        .execute(&mut *tx)
        .await?;

        tx.commit().await
    }

    /// Current counters for a user; zeros when nothing has been recorded
    pub async fn get_user_analytics(&self, user_id: &str) -> Result<AnalyticsSnapshot, AnalyticsError> {
        let parent = sqlx::query_as::<_, (i64, i64, i64, Option<String>)>(
            "SELECT id, total_applications, cold_emails_sent, updated_at FROM analytics WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.db_pool)
        .await?;

        let Some((analytics_id, total_applications, cold_emails_sent, updated_at)) = parent else {
            return Ok(AnalyticsSnapshot::empty(user_id));
        };

        let platform_breakdown = sqlx::query_as::<_, PlatformBreakdown>(
            "SELECT platform, applications, cold_emails FROM platform_breakdowns WHERE analytics_id = ? ORDER BY platform",
        )
        .bind(analytics_id)
        .fetch_all(&self.db_pool)
        .await?;

        let monthly_stats = sqlx::query_as::<_, MonthlyStat>(
            "SELECT month, applications, emails FROM monthly_stats WHERE analytics_id = ? ORDER BY month",
        )
        .bind(analytics_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(AnalyticsSnapshot {
            user_id: user_id.to_string(),
            total_applications,
            cold_emails_sent,
            platform_breakdown,
            monthly_stats,
            updated_at,
        })
    }
}

#[async_trait]
impl AnalyticsRecorder for AnalyticsService {
    async fn record_event(
        &self,
        user_id: &str,
        platform: &str,
        is_cold_email: bool,
    ) -> Result<(), AnalyticsError> {
        let month = current_month();
        self.record_event_for_month(user_id, platform, is_cold_email, &month)
            .await
    }
}

/// Local-time `YYYY-MM` bucket
pub fn current_month() -> String {
    Local::now().format("%Y-%m").to_string()
}

async fn upsert_parent(
    tx: &mut Transaction<'_, Sqlite>,
    user_id: &str,
    cold: i64,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO analytics (user_id, total_applications, cold_emails_sent, updated_at)
        VALUES (?, 1, ?, datetime('now'))
        ON CONFLICT(user_id) DO UPDATE SET
            total_applications = total_applications + 1,
            cold_emails_sent = cold_emails_sent + excluded.cold_emails_sent,
            updated_at = datetime('now')
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(cold)
    .fetch_one(&mut **tx)
    .await
}

/// Busy / locked databases and first-insert unique races are worth another try
fn is_retryable(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db) => {
            db.is_unique_violation()
                || matches!(db.code().as_deref(), Some("5") | Some("6") | Some("517") | Some("262"))
        }
        sqlx::Error::PoolTimedOut => true,
        _ => false,
    }
}
