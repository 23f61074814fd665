//! Common types used across the platform

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// School used when a request does not name one
pub const DEFAULT_SCHOOL_ID: &str = "school_001";

/// Round half away from zero to `places` decimal places
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

/// Trailing window a leaderboard sums points over
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LeaderboardPeriod {
    #[default]
    Week,
    Month,
    All,
}

impl LeaderboardPeriod {
    /// Unknown periods fall back to the unbounded window
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "week" => LeaderboardPeriod::Week,
            "month" => LeaderboardPeriod::Month,
            _ => LeaderboardPeriod::All,
        }
    }

    /// Window length in days, `None` for all-time
    pub fn window_days(&self) -> Option<i64> {
        match self {
            LeaderboardPeriod::Week => Some(7),
            LeaderboardPeriod::Month => Some(30),
            LeaderboardPeriod::All => None,
        }
    }
}

/// Time-window inclusion test for report windows `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: Option<DateTime<Utc>>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// `days` back from `end`, both bounds inclusive
    pub fn trailing_days(end: DateTime<Utc>, days: i64) -> Self {
        Self {
            start: Some(end - Duration::days(days)),
            end,
        }
    }

    pub fn unbounded(end: DateTime<Utc>) -> Self {
        Self { start: None, end }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start.map_or(true, |start| instant >= start) && instant <= self.end
    }
}
