// src/profile/models.rs

use serde::{Deserialize, Serialize};

use crate::auth::User;

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub profile_title: Option<String>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub resume_url: Option<String>,
}

/// Profile as returned to the client, with the name outgoing mail is signed with
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: User,
    pub display_name: String,
}
