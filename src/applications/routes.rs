// src/applications/routes.rs

use axum::{routing::get, Router};

use super::handlers;

/// Create the applications router
pub fn applications_routes() -> Router {
    Router::new()
        .route(
            "/api/applications",
            get(handlers::list_applications).post(handlers::create_application),
        )
        .route(
            "/api/applications/:id",
            get(handlers::get_application)
                .put(handlers::update_application)
                .delete(handlers::delete_application),
        )
}
