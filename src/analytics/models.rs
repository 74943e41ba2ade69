// src/analytics/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct PlatformBreakdown {
    pub platform: String,
    pub applications: i64,
    pub cold_emails: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct MonthlyStat {
    /// `YYYY-MM`
    pub month: String,
    pub applications: i64,
    pub emails: i64,
}

/// Aggregate counters for one user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalyticsSnapshot {
    pub user_id: String,
    pub total_applications: i64,
    pub cold_emails_sent: i64,
    pub platform_breakdown: Vec<PlatformBreakdown>,
    pub monthly_stats: Vec<MonthlyStat>,
    pub updated_at: Option<String>,
}

impl AnalyticsSnapshot {
    /// Zero counters for a user with no recorded activity
    pub fn empty(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            total_applications: 0,
            cold_emails_sent: 0,
            platform_breakdown: Vec::new(),
            monthly_stats: Vec::new(),
            updated_at: None,
        }
    }
}
