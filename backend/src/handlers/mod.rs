//! HTTP request handlers

pub mod health;
pub mod reporting;
pub mod scan;

pub use health::health_check;
pub use reporting::{
    get_daily_report, get_insights, get_leaderboard, get_student_stats, get_weekly_report,
};
pub use scan::submit_scan;
