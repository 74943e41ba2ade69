// src/profile/handlers/profile.rs

use axum::extract::{Extension, Json};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::super::models::{ProfileResponse, UpdateProfileRequest};
use super::super::store::display_name_for;
use super::super::validators::ProfileValidator;
use crate::auth::{AuthedUser, User};
use crate::common::{ApiError, AppState, Validator};

async fn load_user(state: &AppState, user_id: &str) -> Result<User, ApiError> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(&state.db)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = %user_id, "Database error loading profile");
            ApiError::DatabaseError(e)
        })?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

/// GET /api/profile - Sender profile of the authenticated user
pub async fn profile_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    let user = load_user(&state, &authed.id).await?;
    let display_name = display_name_for(&user);

    Ok(Json(ProfileResponse { user, display_name }))
}

/// PUT /api/profile - Update the links and name used in outgoing mail
pub async fn update_profile_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    info!(user_id = %authed.id, "Profile update request received");

    let validation = ProfileValidator.validate(&request);
    if !validation.is_valid {
        warn!(user_id = %authed.id, errors = ?validation.errors, "Profile update rejected");
        return Err(validation.into());
    }

    // Empty strings clear a link, absent fields are left untouched
    sqlx::query(
        r#"
        UPDATE users SET
            username = COALESCE(?, username),
            profile_title = COALESCE(?, profile_title),
            linkedin_url = COALESCE(NULLIF(?, ''), CASE WHEN ? IS NULL THEN linkedin_url END),
            github_url = COALESCE(NULLIF(?, ''), CASE WHEN ? IS NULL THEN github_url END),
            resume_url = COALESCE(NULLIF(?, ''), CASE WHEN ? IS NULL THEN resume_url END),
            updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(request.username.as_deref().map(str::trim))
    .bind(request.profile_title.as_deref())
    .bind(request.linkedin_url.as_deref())
    .bind(request.linkedin_url.as_deref())
    .bind(request.github_url.as_deref())
    .bind(request.github_url.as_deref())
    .bind(request.resume_url.as_deref())
    .bind(request.resume_url.as_deref())
    .bind(&authed.id)
    .execute(&state.db)
    .await
    .map_err(|e| {
        error!(error = %e, user_id = %authed.id, "Database error updating profile");
        ApiError::DatabaseError(e)
    })?;

    let user = load_user(&state, &authed.id).await?;
    let display_name = display_name_for(&user);

    info!(user_id = %authed.id, "Profile updated successfully");

    Ok(Json(ProfileResponse { user, display_name }))
}
