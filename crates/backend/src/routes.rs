use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;

/// All API routes of the server
pub fn configure_routes() -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // ========================================
        // REPORT BUILDER
        // ========================================
        .route(
            "/api/reportbuilder/connections",
            get(handlers::report_builder::list_connections),
        )
        .route(
            "/api/reportbuilder/datasources/check",
            post(handlers::report_builder::check_data_source),
        )
        // ========================================
        // REPORTS
        // ========================================
        .route(
            "/api/reports",
            get(handlers::reports::list).post(handlers::reports::create),
        )
        .route("/api/reports/preview", post(handlers::reports::preview))
        .route(
            "/api/reports/:id",
            get(handlers::reports::get_by_id)
                .put(handlers::reports::update)
                .delete(handlers::reports::delete),
        )
}
