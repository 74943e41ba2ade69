// src/analytics/routes.rs

use axum::{routing::get, Router};

use super::handlers;

pub fn analytics_routes() -> Router {
    Router::new().route("/api/analytics", get(handlers::get_user_analytics))
}
