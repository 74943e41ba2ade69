// src/applications/validators.rs

use super::models::*;
use crate::common::{ValidationResult, Validator};

pub struct ApplicationValidator;

fn has_line_break(value: &str) -> bool {
    value.contains(['\r', '\n'])
}

fn check_required(result: &mut ValidationResult, field: &str, label: &str, value: &str) {
    if value.trim().is_empty() {
        result.add_error(field, &format!("{} is required", label));
    } else if has_line_break(value) {
        result.add_error(field, &format!("{} must be a single line", label));
    } else if value.len() > 255 {
        result.add_error(field, &format!("{} must be less than 255 characters", label));
    }
}

fn check_status(result: &mut ValidationResult, status: &str) {
    if !VALID_STATUSES.contains(&status) {
        result.add_error(
            "status",
            &format!("Status must be one of: {}", VALID_STATUSES.join(", ")),
        );
    }
}

impl Validator<CreateApplicationRequest> for ApplicationValidator {
    fn validate(&self, data: &CreateApplicationRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        check_required(&mut result, "job_title", "Job title", &data.job_title);
        check_required(&mut result, "company_name", "Company name", &data.company_name);
        check_required(&mut result, "platform", "Platform", &data.platform);

        if let Some(status) = &data.status {
            check_status(&mut result, status);
        }

        if data.is_cold_email() {
            match data.normalized_domain() {
                None => result.add_error("domain", "Domain is required for cold email"),
                Some(domain) if !domain.contains('.') || domain.contains(char::is_whitespace) => {
                    result.add_error("domain", "Domain must look like example.com")
                }
                Some(_) => {}
            }

            if data.employee_names.iter().all(|n| n.trim().is_empty()) {
                result.add_error(
                    "employee_names",
                    "At least one employee name is required for cold email",
                );
            } else if data
                .employee_names
                .iter()
                .filter(|n| !n.trim().is_empty())
                .count()
                > 20
            {
                result.add_error("employee_names", "At most 20 employee names are allowed");
            }
        }

        result
    }
}

impl Validator<UpdateApplicationRequest> for ApplicationValidator {
    fn validate(&self, data: &UpdateApplicationRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if data.job_title.is_none()
            && data.company_name.is_none()
            && data.platform.is_none()
            && data.status.is_none()
            && data.date_applied.is_none()
        {
            result.add_error("general", "At least one field must be provided for update");
            return result;
        }

        if let Some(title) = &data.job_title {
            check_required(&mut result, "job_title", "Job title", title);
        }
        if let Some(company) = &data.company_name {
            check_required(&mut result, "company_name", "Company name", company);
        }
        if let Some(platform) = &data.platform {
            check_required(&mut result, "platform", "Platform", platform);
        }
        if let Some(status) = &data.status {
            check_status(&mut result, status);
        }

        result
    }
}
