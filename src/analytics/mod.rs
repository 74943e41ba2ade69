// src/analytics/mod.rs

pub mod handlers;
pub mod models;
pub mod routes;
pub mod service;

pub use models::*;
pub use routes::analytics_routes;
pub use service::{AnalyticsError, AnalyticsRecorder, AnalyticsService};
