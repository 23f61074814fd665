//! Report shapes computed on demand from the scan log
//!
//! None of these are persisted. Empty windows are represented explicitly
//! (an absent summary, or `StudentStats::NoData`) rather than as errors.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{Badge, FoodCategory, NextGoal};
use crate::types::LeaderboardPeriod;

/// Per-dish rollup within a daily report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodSummary {
    pub food: String,
    pub appearances: usize,
    pub avg_waste_pct: f64,
    pub total_wasted_oz: f64,
    pub category: FoodCategory,
    pub recommendation: String,
}

/// Summed impact figures across a set of scans
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ImpactTotals {
    pub weight_lbs: f64,
    pub cost_usd: f64,
    pub co2_kg: f64,
    pub water_gallons: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub avg_waste_pct: f64,
    pub totals: ImpactTotals,
    pub by_food: Vec<FoodSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub school_id: String,
    pub total_scans: usize,
    #[serde(flatten)]
    pub summary: Option<DailySummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayBreakdown {
    pub date: NaiveDate,
    pub scans: usize,
    pub avg_waste_pct: f64,
    pub cost_usd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodPerformance {
    pub food: String,
    pub avg_waste_pct: f64,
    pub appearances: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySummary {
    pub daily_breakdown: Vec<DayBreakdown>,
    pub top_offenders: Vec<FoodPerformance>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyReport {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub total_scans: usize,
    #[serde(flatten)]
    pub summary: Option<WeeklySummary>,
}

/// A dish this student tends to leave
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalOffender {
    pub food: String,
    pub times_wasted: usize,
    pub avg_waste_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentImpact {
    pub weight_lbs: f64,
    pub cost_saved: f64,
    pub co2_prevented: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentSummary {
    pub student_id: String,
    pub period_days: u32,
    pub total_scans: usize,
    pub total_points: u32,
    pub avg_waste_pct: f64,
    pub total_impact: StudentImpact,
    pub foods_to_avoid: Vec<PersonalOffender>,
    pub badge: Badge,
    pub next_goal: NextGoal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StudentStats {
    Stats(StudentSummary),
    NoData {
        student_id: String,
        scans: usize,
        message: String,
    },
}

impl StudentStats {
    pub fn no_data(student_id: impl Into<String>) -> Self {
        StudentStats::NoData {
            student_id: student_id.into(),
            scans: 0,
            message: "No scans found for this period".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub student_id: String,
    pub total_points: u32,
    pub scans: usize,
    pub avg_waste_pct: f64,
    pub badge: Badge,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub period: LeaderboardPeriod,
    pub leaderboard: Vec<LeaderboardEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Alert,
    Success,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightPriority {
    High,
    Medium,
    Info,
    Low,
}

/// Numeric payload attached to an insight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InsightData {
    Food {
        food: String,
        avg_waste_pct: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        servings: Option<usize>,
    },
    Impact {
        weight_lbs: f64,
        cost_usd: f64,
        co2_kg: f64,
        projected_savings_usd: f64,
    },
    Weekday {
        day: String,
        avg_waste_pct: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub title: String,
    pub description: String,
    pub priority: InsightPriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    pub data: InsightData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Insights {
    pub insights: Vec<Insight>,
}
