// src/analytics/handlers.rs

use axum::{extract::Extension, response::Json};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

use super::models::AnalyticsSnapshot;
use super::service::AnalyticsError;
use crate::auth::AuthedUser;
use crate::common::{ApiError, AppState};

/// GET /api/analytics - Aggregate counters for the authenticated user
pub async fn get_user_analytics(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<AnalyticsSnapshot>, ApiError> {
    let state = state_lock.read().await.clone();

    info!(user_id = %authed.id, "Fetching user analytics");

    let snapshot = state
        .analytics_service
        .get_user_analytics(&authed.id)
        .await
        .map_err(|e| {
            error!(user_id = %authed.id, error = %e, "Failed to load analytics");
            match e {
                AnalyticsError::DatabaseError(e) => ApiError::DatabaseError(e),
                other => ApiError::InternalServer(other.to_string()),
            }
        })?;

    Ok(Json(snapshot))
}
