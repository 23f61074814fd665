//! Reporting handlers for waste analytics and data export

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use shared::{
    parse_report_date, DailyReport, Insights, LeaderboardPeriod, StudentStats, WeeklyReport,
};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::reporting::{LeaderboardRow, ReportingService};
use crate::AppState;

const DEFAULT_STUDENT_DAYS: u32 = 7;
const DEFAULT_INSIGHT_DAYS: u32 = 30;

#[derive(Debug, Deserialize, Validate)]
pub struct DailyReportQuery {
    #[validate(length(min = 1, max = 64))]
    pub school_id: Option<String>,
    /// YYYY-MM-DD, defaults to today
    pub date: Option<String>,
    pub format: Option<String>, // "json" or "csv"
}

#[derive(Debug, Deserialize, Validate)]
pub struct WeeklyReportQuery {
    #[validate(length(min = 1, max = 64))]
    pub school_id: Option<String>,
    #[validate(range(max = 520))]
    pub weeks_back: Option<u32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct StudentStatsQuery {
    #[validate(length(min = 1, max = 64))]
    pub student_id: String,
    #[validate(range(min = 1, max = 3650))]
    pub days: Option<u32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LeaderboardQuery {
    #[validate(length(min = 1, max = 64))]
    pub school_id: Option<String>,
    pub period: Option<String>, // "week", "month", "all"
    pub format: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct InsightsQuery {
    #[validate(length(min = 1, max = 64))]
    pub school_id: Option<String>,
    #[validate(range(min = 1, max = 3650))]
    pub days: Option<u32>,
}

fn school_or_default(state: &AppState, school_id: Option<String>) -> String {
    school_id.unwrap_or_else(|| state.config.reporting.default_school_id.clone())
}

fn wants_csv(format: Option<&str>) -> bool {
    format.is_some_and(|f| f.eq_ignore_ascii_case("csv"))
}

fn csv_response(body: String, filename: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

/// Per-dish waste for one school and day
pub async fn get_daily_report(
    State(state): State<AppState>,
    Query(query): Query<DailyReportQuery>,
) -> AppResult<Response> {
    query.validate()?;

    let date = match query.date.as_deref() {
        Some(raw) => parse_report_date(raw).map_err(|msg| AppError::validation("date", msg))?,
        None => state.reporting.today(),
    };
    let school_id = school_or_default(&state, query.school_id);

    let report: DailyReport = state.reporting.daily_report(&school_id, date).await?;

    if wants_csv(query.format.as_deref()) {
        let rows = report
            .summary
            .as_ref()
            .map(|s| s.by_food.as_slice())
            .unwrap_or_default();
        let csv = ReportingService::export_to_csv(rows)?;
        Ok(csv_response(csv, &format!("daily_report_{}.csv", date)))
    } else {
        Ok(Json(report).into_response())
    }
}

/// Daily breakdown and worst dishes for one week
pub async fn get_weekly_report(
    State(state): State<AppState>,
    Query(query): Query<WeeklyReportQuery>,
) -> AppResult<Json<WeeklyReport>> {
    query.validate()?;
    let school_id = school_or_default(&state, query.school_id);

    let report = state
        .reporting
        .weekly_report(&school_id, query.weeks_back.unwrap_or(0))
        .await?;
    Ok(Json(report))
}

/// Personal statistics for one student
pub async fn get_student_stats(
    State(state): State<AppState>,
    Query(query): Query<StudentStatsQuery>,
) -> AppResult<Json<StudentStats>> {
    query.validate()?;

    let stats = state
        .reporting
        .student_stats(
            query.student_id.trim(),
            query.days.unwrap_or(DEFAULT_STUDENT_DAYS),
        )
        .await?;
    Ok(Json(stats))
}

/// Students ranked by points
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> AppResult<Response> {
    query.validate()?;

    let period = query
        .period
        .as_deref()
        .map(LeaderboardPeriod::parse_lenient)
        .unwrap_or_default();
    let school_id = school_or_default(&state, query.school_id);

    let leaderboard = state.reporting.leaderboard(&school_id, period).await?;

    if wants_csv(query.format.as_deref()) {
        let rows: Vec<LeaderboardRow> = leaderboard
            .leaderboard
            .iter()
            .map(LeaderboardRow::from)
            .collect();
        let csv = ReportingService::export_to_csv(&rows)?;
        Ok(csv_response(csv, "leaderboard.csv"))
    } else {
        Ok(Json(leaderboard).into_response())
    }
}

/// Alerts, successes and patterns over a trailing window
pub async fn get_insights(
    State(state): State<AppState>,
    Query(query): Query<InsightsQuery>,
) -> AppResult<Json<Insights>> {
    query.validate()?;
    let school_id = school_or_default(&state, query.school_id);

    let insights = state
        .reporting
        .insights(&school_id, query.days.unwrap_or(DEFAULT_INSIGHT_DAYS))
        .await?;
    Ok(Json(insights))
}
