// src/profile/store.rs
//! Sender identity lookups for outgoing mail

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::debug;

use crate::auth::User;
use crate::outreach::SenderProfile;

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("User not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn sender_profile(&self, user_id: &str) -> Result<SenderProfile, ProfileError>;
}

/// Reads sender profiles from the `users` table
#[derive(Debug, Clone)]
pub struct SqliteProfileStore {
    db_pool: SqlitePool,
}

impl SqliteProfileStore {
    pub fn new(db_pool: SqlitePool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl ProfileStore for SqliteProfileStore {
    async fn sender_profile(&self, user_id: &str) -> Result<SenderProfile, ProfileError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| ProfileError::NotFound(user_id.to_string()))?;

        debug!(user_id = %user_id, "Loaded sender profile");
        Ok(sender_profile_for(&user))
    }
}

/// Name used in the subject and signature; falls back to the mailbox name
pub fn display_name_for(user: &User) -> String {
    user.username
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| {
            user.email
                .split('@')
                .next()
                .unwrap_or(&user.email)
                .to_string()
        })
}

pub fn sender_profile_for(user: &User) -> SenderProfile {
    SenderProfile {
        display_name: display_name_for(user),
        email: user.email.clone(),
        linkedin_url: non_empty(&user.linkedin_url),
        github_url: non_empty(&user.github_url),
        resume_url: non_empty(&user.resume_url),
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
