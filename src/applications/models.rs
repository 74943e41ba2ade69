// src/applications/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::outreach::AttemptOutcome;

pub const COLD_EMAIL: &str = "cold_email";
pub const DEFAULT_APPLICATION_TYPE: &str = "direct";
pub const DEFAULT_STATUS: &str = "applied";
pub const VALID_STATUSES: [&str; 5] = ["applied", "interviewing", "offer", "rejected", "withdrawn"];

/// Cold email row states before an attempt reports back
pub const COLD_EMAIL_PENDING: &str = "pending";
pub const COLD_EMAIL_DISABLED: &str = "disabled";

/// Row as stored; recipient names are a JSON array
#[derive(Debug, Clone, FromRow)]
pub struct ApplicationRow {
    pub id: String,
    pub user_id: String,
    pub job_title: String,
    pub company_name: String,
    pub platform: String,
    pub status: String,
    pub application_type: String,
    pub domain: Option<String>,
    pub employee_names: Option<String>,
    pub date_applied: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobApplication {
    pub id: String,
    pub user_id: String,
    pub job_title: String,
    pub company_name: String,
    pub platform: String,
    pub status: String,
    pub application_type: String,
    pub domain: Option<String>,
    pub employee_names: Vec<String>,
    pub date_applied: Option<String>,
    pub updated_at: Option<String>,
}

impl JobApplication {
    pub fn is_cold_email(&self) -> bool {
        self.application_type == COLD_EMAIL
    }
}

impl From<ApplicationRow> for JobApplication {
    fn from(row: ApplicationRow) -> Self {
        let employee_names = row
            .employee_names
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default();

        Self {
            id: row.id,
            user_id: row.user_id,
            job_title: row.job_title,
            company_name: row.company_name,
            platform: row.platform,
            status: row.status,
            application_type: row.application_type,
            domain: row.domain,
            employee_names,
            date_applied: row.date_applied,
            updated_at: row.updated_at,
        }
    }
}

/// One recipient of a cold-email application and how its attempt ended
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, FromRow)]
pub struct ColdEmail {
    pub id: i64,
    pub recipient_name: String,
    pub resolved_address: Option<String>,
    pub status: String,
    pub probes: i64,
    pub detail: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Stored status for a finished attempt, plus the failure reason if any
pub fn cold_email_status(outcome: &AttemptOutcome) -> (&'static str, Option<&str>) {
    match outcome {
        AttemptOutcome::Sent => ("sent", None),
        AttemptOutcome::Failed(reason) => ("failed", Some(reason.as_str())),
        AttemptOutcome::Exhausted => ("exhausted", None),
        AttemptOutcome::Skipped => ("skipped", None),
    }
}

/// `GET /api/applications/:id` body: the application with its cold emails
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ApplicationDetail {
    #[serde(flatten)]
    pub application: JobApplication,
    pub cold_emails: Vec<ColdEmail>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateApplicationRequest {
    pub job_title: String,
    pub company_name: String,
    pub platform: String,
    pub status: Option<String>,
    pub application_type: Option<String>,
    pub domain: Option<String>,
    #[serde(default)]
    pub employee_names: Vec<String>,
    pub date_applied: Option<String>,
}

impl CreateApplicationRequest {
    pub fn application_type(&self) -> &str {
        self.application_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_APPLICATION_TYPE)
    }

    pub fn is_cold_email(&self) -> bool {
        self.application_type() == COLD_EMAIL
    }

    /// Lower-cased domain without a leading `@`
    pub fn normalized_domain(&self) -> Option<String> {
        self.domain
            .as_deref()
            .map(|d| d.trim().trim_start_matches('@').to_lowercase())
            .filter(|d| !d.is_empty())
    }

    /// Trimmed, non-blank recipient names, first occurrence wins
    pub fn recipient_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for name in &self.employee_names {
            let name = name.trim();
            if !name.is_empty() && !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        names
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateApplicationRequest {
    pub job_title: Option<String>,
    pub company_name: Option<String>,
    pub platform: Option<String>,
    pub status: Option<String>,
    pub date_applied: Option<String>,
}
