// src/common/dev_mode.rs
//! Development mode configuration and utilities
//! Allows bypassing authentication for local testing

use chrono::Utc;
use std::env;

use super::id_generator::EntityPrefix;
use crate::auth::models::User;

#[derive(Debug, Clone)]
pub struct DevModeConfig {
    pub enabled: bool,
    pub user_email: String,
    pub user_name: String,
}

impl DevModeConfig {
    pub fn from_env() -> Self {
        let enabled = env::var("DEV_MODE")
            .unwrap_or_else(|_| "false".to_string())
            .to_lowercase()
            == "true";

        let user_email = env::var("DEV_USER_EMAIL").unwrap_or_else(|_| "dev@test.com".to_string());

        let user_name = env::var("DEV_USER_NAME").unwrap_or_else(|_| "Dev User".to_string());

        Self {
            enabled,
            user_email,
            user_name,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Fixed ID so every dev request maps to the same user row
    pub fn dev_user_id(&self) -> String {
        format!("{}_DEV001", EntityPrefix::User.as_str())
    }

    /// Create a dev user for testing
    pub fn create_dev_user(&self) -> User {
        let now = Utc::now().to_rfc3339();
        User {
            id: self.dev_user_id(),
            email: self.user_email.clone(),
            username: Some(self.user_name.clone()),
            profile_title: None,
            linkedin_url: None,
            github_url: None,
            resume_url: None,
            created_at: Some(now.clone()),
            updated_at: Some(now),
        }
    }
}

/// CLI argument parsing for dev mode
pub fn parse_dev_mode_args() -> Option<bool> {
    let args: Vec<String> = env::args().collect();

    for arg in &args {
        match arg.as_str() {
            "--dev" | "--dev-mode" => return Some(true),
            "--no-dev" | "--prod" | "--production" => return Some(false),
            _ => {}
        }
    }

    None
}

/// Override dev mode from CLI args
pub fn apply_cli_override(mut config: DevModeConfig) -> DevModeConfig {
    if let Some(cli_dev_mode) = parse_dev_mode_args() {
        tracing::info!(dev_mode = cli_dev_mode, "CLI override for DEV_MODE");
        config.enabled = cli_dev_mode;
    }

    config
}

/// Log dev mode status on startup
pub fn log_dev_mode_status(config: &DevModeConfig) {
    if config.enabled {
        tracing::warn!(
            dev_user = %config.user_name,
            "DEV MODE ENABLED: authentication bypassed, do not use in production"
        );
    } else {
        tracing::info!("Production mode - authentication required");
    }
}
