// src/profile/validators.rs

use super::models::UpdateProfileRequest;
use crate::common::{ValidationResult, Validator};

pub struct ProfileValidator;

impl Validator<UpdateProfileRequest> for ProfileValidator {
    fn validate(&self, data: &UpdateProfileRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if data.username.is_none()
            && data.profile_title.is_none()
            && data.linkedin_url.is_none()
            && data.github_url.is_none()
            && data.resume_url.is_none()
        {
            result.add_error("general", "At least one field must be provided for update");
            return result;
        }

        if let Some(username) = &data.username {
            if username.trim().is_empty() {
                result.add_error("username", "Name cannot be empty");
            } else if username.contains(['\r', '\n']) {
                result.add_error("username", "Name must be a single line");
            } else if username.len() > 100 {
                result.add_error("username", "Name must be less than 100 characters");
            }
        }

        if let Some(title) = &data.profile_title {
            if title.len() > 255 {
                result.add_error("profile_title", "Title must be less than 255 characters");
            }
        }

        for (field, value) in [
            ("linkedin_url", &data.linkedin_url),
            ("github_url", &data.github_url),
            ("resume_url", &data.resume_url),
        ] {
            if let Some(url) = value {
                // Empty clears the link
                if !url.is_empty() && !is_http_url(url) {
                    result.add_error(field, "Must be an http(s) URL");
                } else if url.len() > 500 {
                    result.add_error(field, "URL must be less than 500 characters");
                }
            }
        }

        result
    }
}

fn is_http_url(value: &str) -> bool {
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    matches!(rest, Some(host) if !host.trim().is_empty())
}
