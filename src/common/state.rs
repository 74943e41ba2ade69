// Application state shared across all modules

use sqlx::SqlitePool;
use std::sync::Arc;

use crate::analytics::AnalyticsService;
use crate::common::dev_mode::DevModeConfig;
use crate::outreach::OutreachOrchestrator;

/// Application state containing database pool, services, and configuration
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub jwt_secret: String,
    pub dev_mode: DevModeConfig,
    pub analytics_service: Arc<AnalyticsService>,
    /// `None` when the outbound relay is not configured
    pub outreach: Option<Arc<OutreachOrchestrator>>,
}
