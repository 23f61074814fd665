//! Route definitions for the Dining Waste Tracker

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Scan submission (multipart upload)
        .route(
            "/scan",
            post(handlers::submit_scan)
                .layer(DefaultBodyLimit::max(handlers::scan::MAX_SCAN_UPLOAD_BYTES)),
        )
        // Reports
        .route("/daily-report", get(handlers::get_daily_report))
        .route("/weekly-report", get(handlers::get_weekly_report))
        .route("/student-stats", get(handlers::get_student_stats))
        .route("/leaderboard", get(handlers::get_leaderboard))
        .route("/insights", get(handlers::get_insights))
}
