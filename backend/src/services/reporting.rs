//! Reporting service: daily, weekly, student, leaderboard and insight views
//!
//! Every view is recomputed from a snapshot of the scan log. Food groups keep
//! first-appearance order and every sort is stable on the displayed
//! (rounded) value, so ties are resolved by log order.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Offset, Utc, Weekday};
use serde::Serialize;
use shared::{
    assign_badge, food_recommendation, next_goal, round_to, weekly_recommendations, BadgeLevel,
    DailyReport, DailySummary, DayBreakdown, FoodCategory, FoodItem, FoodPerformance, FoodSummary,
    ImpactTotals, Insight, InsightData, InsightKind, InsightPriority, Insights, Leaderboard,
    LeaderboardEntry, LeaderboardPeriod, PersonalOffender, ScanRecord, StudentImpact,
    StudentStats, StudentSummary, TimeWindow, WeeklyReport, WeeklySummary,
};

use crate::error::{AppError, AppResult};
use crate::services::repository::ScanLog;

/// Foods listed in a daily report
pub const DAILY_FOOD_LIMIT: usize = 10;
/// Worst foods listed in a weekly report
pub const TOP_OFFENDER_LIMIT: usize = 10;
/// Personal offenders listed for a student
pub const FOODS_TO_AVOID_LIMIT: usize = 5;
pub const FOODS_TO_AVOID_THRESHOLD: f64 = 30.0;
pub const LEADERBOARD_LIMIT: usize = 50;

/// Mean waste above which the worst food raises an alert
pub const ALERT_WASTE_THRESHOLD: f64 = 30.0;
/// Servings a food needs before it can appear in an insight
pub const INSIGHT_MIN_SERVINGS: usize = 5;
/// Waste reduction used for the projected saving
pub const PROJECTED_REDUCTION: f64 = 0.2;

/// Per-name accumulation of food items
#[derive(Debug, Clone)]
struct FoodGroup {
    name: String,
    appearances: usize,
    waste_sum: f64,
    weight_oz_sum: f64,
    category: FoodCategory,
}

impl FoodGroup {
    fn mean_waste(&self) -> f64 {
        self.waste_sum / self.appearances as f64
    }
}

/// Group items by name, in order of first appearance
fn group_foods<'a>(items: impl Iterator<Item = &'a FoodItem>) -> Vec<FoodGroup> {
    let mut groups: Vec<FoodGroup> = Vec::new();
    let mut index: HashMap<&'a str, usize> = HashMap::new();

    for item in items {
        match index.get(item.name.as_str()) {
            Some(&i) => {
                let group = &mut groups[i];
                group.appearances += 1;
                group.waste_sum += item.waste_percentage;
                group.weight_oz_sum += item.estimated_weight_oz;
            }
            None => {
                index.insert(item.name.as_str(), groups.len());
                groups.push(FoodGroup {
                    name: item.name.clone(),
                    appearances: 1,
                    waste_sum: item.waste_percentage,
                    weight_oz_sum: item.estimated_weight_oz,
                    category: item.category,
                });
            }
        }
    }

    groups
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

fn scan_mean_waste(scans: &[&ScanRecord]) -> f64 {
    mean(scans.iter().map(|s| s.avg_waste_percentage))
}

fn sort_by_waste_desc<T>(rows: &mut [T], key: impl Fn(&T) -> f64) {
    rows.sort_by(|a, b| key(b).total_cmp(&key(a)));
}

/// Pure aggregation over a scan snapshot
#[derive(Debug, Clone, Copy)]
pub struct AggregationEngine {
    offset: FixedOffset,
}

impl AggregationEngine {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn utc() -> Self {
        Self::new(Utc.fix())
    }

    /// Build from a minute offset; out-of-range offsets are a configuration error
    pub fn from_offset_minutes(minutes: i32) -> AppResult<Self> {
        FixedOffset::east_opt(minutes * 60)
            .map(Self::new)
            .ok_or_else(|| {
                AppError::Configuration(format!("invalid UTC offset: {} minutes", minutes))
            })
    }

    /// Calendar date of an instant at the reporting offset
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    pub fn local_weekday(&self, instant: DateTime<Utc>) -> Weekday {
        instant.with_timezone(&self.offset).weekday()
    }

    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        self.local_date(now)
    }

    pub fn daily_report(
        &self,
        scans: &[Arc<ScanRecord>],
        school_id: &str,
        date: NaiveDate,
    ) -> DailyReport {
        let matching: Vec<&ScanRecord> = scans
            .iter()
            .map(Arc::as_ref)
            .filter(|s| s.school_id == school_id && self.local_date(s.timestamp) == date)
            .collect();

        let summary = if matching.is_empty() {
            None
        } else {
            let mut by_food: Vec<FoodSummary> =
                group_foods(matching.iter().flat_map(|s| s.food_items.iter()))
                    .into_iter()
                    .map(|group| {
                        let avg = group.mean_waste();
                        FoodSummary {
                            food: group.name,
                            appearances: group.appearances,
                            avg_waste_pct: round_to(avg, 1),
                            total_wasted_oz: round_to(group.weight_oz_sum, 2),
                            category: group.category,
                            recommendation: food_recommendation(avg),
                        }
                    })
                    .collect();
            sort_by_waste_desc(&mut by_food, |f| f.avg_waste_pct);
            by_food.truncate(DAILY_FOOD_LIMIT);

            let totals = ImpactTotals {
                weight_lbs: round_to(matching.iter().map(|s| s.impact.weight_lbs).sum(), 2),
                cost_usd: round_to(matching.iter().map(|s| s.impact.cost_usd).sum(), 2),
                co2_kg: round_to(matching.iter().map(|s| s.impact.co2_kg).sum(), 2),
                water_gallons: round_to(matching.iter().map(|s| s.impact.water_gallons).sum(), 1),
            };

            Some(DailySummary {
                avg_waste_pct: round_to(scan_mean_waste(&matching), 1),
                totals,
                by_food,
            })
        };

        DailyReport {
            date,
            school_id: school_id.to_string(),
            total_scans: matching.len(),
            summary,
        }
    }

    /// Week ending `weeks_back` weeks before `now`
    pub fn weekly_report(
        &self,
        scans: &[Arc<ScanRecord>],
        school_id: &str,
        weeks_back: u32,
        now: DateTime<Utc>,
    ) -> WeeklyReport {
        let end = now - Duration::weeks(weeks_back as i64);
        let window = TimeWindow::trailing_days(end, 7);

        let matching: Vec<&ScanRecord> = scans
            .iter()
            .map(Arc::as_ref)
            .filter(|s| s.school_id == school_id && window.contains(s.timestamp))
            .collect();

        let summary = if matching.is_empty() {
            None
        } else {
            let mut days: BTreeMap<NaiveDate, Vec<&ScanRecord>> = BTreeMap::new();
            for &scan in &matching {
                days.entry(self.local_date(scan.timestamp))
                    .or_default()
                    .push(scan);
            }

            let daily_breakdown = days
                .into_iter()
                .map(|(date, day_scans)| DayBreakdown {
                    date,
                    scans: day_scans.len(),
                    avg_waste_pct: round_to(scan_mean_waste(&day_scans), 1),
                    cost_usd: round_to(day_scans.iter().map(|s| s.impact.cost_usd).sum(), 2),
                })
                .collect();

            let mut top_offenders: Vec<FoodPerformance> =
                group_foods(matching.iter().flat_map(|s| s.food_items.iter()))
                    .into_iter()
                    .map(|group| FoodPerformance {
                        avg_waste_pct: round_to(group.mean_waste(), 1),
                        appearances: group.appearances,
                        food: group.name,
                    })
                    .collect();
            sort_by_waste_desc(&mut top_offenders, |f| f.avg_waste_pct);
            top_offenders.truncate(TOP_OFFENDER_LIMIT);

            let recommendations = weekly_recommendations(
                top_offenders
                    .first()
                    .map(|f| (f.food.as_str(), f.avg_waste_pct)),
            );

            Some(WeeklySummary {
                daily_breakdown,
                top_offenders,
                recommendations,
            })
        };

        WeeklyReport {
            week_start: self.local_date(window.start.unwrap_or(end)),
            week_end: self.local_date(end),
            total_scans: matching.len(),
            summary,
        }
    }

    pub fn student_stats(
        &self,
        scans: &[Arc<ScanRecord>],
        student_id: &str,
        days: u32,
        now: DateTime<Utc>,
    ) -> StudentStats {
        let window = TimeWindow::trailing_days(now, days as i64);
        let matching: Vec<&ScanRecord> = scans
            .iter()
            .map(Arc::as_ref)
            .filter(|s| s.student_id.as_deref() == Some(student_id) && window.contains(s.timestamp))
            .collect();

        if matching.is_empty() {
            return StudentStats::no_data(student_id);
        }

        let total_points: u32 = matching.iter().map(|s| s.points).sum();
        let avg_waste = scan_mean_waste(&matching);

        let mut foods_to_avoid: Vec<PersonalOffender> =
            group_foods(matching.iter().flat_map(|s| s.food_items.iter()))
                .into_iter()
                .filter(|group| group.mean_waste() > FOODS_TO_AVOID_THRESHOLD)
                .map(|group| PersonalOffender {
                    avg_waste_pct: round_to(group.mean_waste(), 1),
                    times_wasted: group.appearances,
                    food: group.name,
                })
                .collect();
        sort_by_waste_desc(&mut foods_to_avoid, |f| f.avg_waste_pct);
        foods_to_avoid.truncate(FOODS_TO_AVOID_LIMIT);

        StudentStats::Stats(StudentSummary {
            student_id: student_id.to_string(),
            period_days: days,
            total_scans: matching.len(),
            total_points,
            avg_waste_pct: round_to(avg_waste, 1),
            total_impact: StudentImpact {
                weight_lbs: round_to(matching.iter().map(|s| s.impact.weight_lbs).sum(), 2),
                cost_saved: round_to(matching.iter().map(|s| s.impact.cost_usd).sum(), 2),
                co2_prevented: round_to(matching.iter().map(|s| s.impact.co2_kg).sum(), 2),
            },
            foods_to_avoid,
            badge: assign_badge(avg_waste),
            next_goal: next_goal(total_points),
        })
    }

    /// Ranked students; scans without a student are not ranked
    pub fn leaderboard(
        &self,
        scans: &[Arc<ScanRecord>],
        school_id: &str,
        period: LeaderboardPeriod,
        now: DateTime<Utc>,
    ) -> Leaderboard {
        let window = match period.window_days() {
            Some(days) => TimeWindow::trailing_days(now, days),
            None => TimeWindow::unbounded(now),
        };

        struct Tally<'a> {
            student_id: &'a str,
            points: u32,
            scans: usize,
            waste_sum: f64,
        }

        let mut tallies: Vec<Tally> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();

        for scan in scans.iter().filter(|s| {
            s.school_id == school_id && window.contains(s.timestamp)
        }) {
            let Some(student_id) = scan.student_id.as_deref() else {
                continue;
            };
            let i = *index.entry(student_id).or_insert_with(|| {
                tallies.push(Tally {
                    student_id,
                    points: 0,
                    scans: 0,
                    waste_sum: 0.0,
                });
                tallies.len() - 1
            });
            let tally = &mut tallies[i];
            tally.points += scan.points;
            tally.scans += 1;
            tally.waste_sum += scan.avg_waste_percentage;
        }

        tallies.sort_by(|a, b| b.points.cmp(&a.points));

        let leaderboard = tallies
            .into_iter()
            .take(LEADERBOARD_LIMIT)
            .enumerate()
            .map(|(i, tally)| {
                let avg = tally.waste_sum / tally.scans as f64;
                LeaderboardEntry {
                    rank: i + 1,
                    student_id: tally.student_id.to_string(),
                    total_points: tally.points,
                    scans: tally.scans,
                    avg_waste_pct: round_to(avg, 1),
                    badge: assign_badge(avg),
                }
            })
            .collect();

        Leaderboard {
            period,
            leaderboard,
        }
    }

    pub fn insights(
        &self,
        scans: &[Arc<ScanRecord>],
        school_id: &str,
        days: u32,
        now: DateTime<Utc>,
    ) -> Insights {
        let window = TimeWindow::trailing_days(now, days as i64);
        let matching: Vec<&ScanRecord> = scans
            .iter()
            .map(Arc::as_ref)
            .filter(|s| s.school_id == school_id && window.contains(s.timestamp))
            .collect();

        if matching.is_empty() {
            return Insights::default();
        }

        let mut insights = Vec::new();
        let groups = group_foods(matching.iter().flat_map(|s| s.food_items.iter()));

        if let Some(worst) = extreme_group(&groups, |candidate, best| candidate > best) {
            let avg = worst.mean_waste();
            if avg > ALERT_WASTE_THRESHOLD && worst.appearances > INSIGHT_MIN_SERVINGS {
                insights.push(Insight {
                    kind: InsightKind::Alert,
                    title: format!("High Waste Alert: {}", worst.name),
                    description: format!(
                        "{} shows {}% average waste across {} servings. Consider smaller portions or menu substitution.",
                        worst.name, avg as i64, worst.appearances
                    ),
                    priority: InsightPriority::High,
                    action: Some("reduce_portion".to_string()),
                    data: InsightData::Food {
                        food: worst.name.clone(),
                        avg_waste_pct: round_to(avg, 1),
                        servings: Some(worst.appearances),
                    },
                });
            }
        }

        if let Some(best) = extreme_group(&groups, |candidate, best| candidate < best) {
            let avg = best.mean_waste();
            if best.appearances > INSIGHT_MIN_SERVINGS {
                insights.push(Insight {
                    kind: InsightKind::Success,
                    title: format!("Popular Choice: {}", best.name),
                    description: format!(
                        "{} has only {}% waste. Students love this option!",
                        best.name, avg as i64
                    ),
                    priority: InsightPriority::Medium,
                    action: None,
                    data: InsightData::Food {
                        food: best.name.clone(),
                        avg_waste_pct: round_to(avg, 1),
                        servings: Some(best.appearances),
                    },
                });
            }
        }

        let weight_lbs: f64 = matching.iter().map(|s| s.impact.weight_lbs).sum();
        let cost_usd: f64 = matching.iter().map(|s| s.impact.cost_usd).sum();
        let co2_kg: f64 = matching.iter().map(|s| s.impact.co2_kg).sum();
        let projected_savings = cost_usd * PROJECTED_REDUCTION;
        insights.push(Insight {
            kind: InsightKind::Info,
            title: "Monthly Environmental Impact".to_string(),
            description: format!(
                "{} lbs of food wasted, ${} lost, {} kg CO2 emitted. Reducing waste by 20% would save ${}/month.",
                weight_lbs as i64, cost_usd as i64, co2_kg as i64, projected_savings as i64
            ),
            priority: InsightPriority::Info,
            action: None,
            data: InsightData::Impact {
                weight_lbs: round_to(weight_lbs, 1),
                cost_usd: round_to(cost_usd, 2),
                co2_kg: round_to(co2_kg, 1),
                projected_savings_usd: round_to(projected_savings, 2),
            },
        });

        if let Some(insight) = self.weekday_pattern(&matching) {
            insights.push(insight);
        }

        Insights { insights }
    }

    /// Lowest-waste weekday, only when the scans span several weekdays
    fn weekday_pattern(&self, scans: &[&ScanRecord]) -> Option<Insight> {
        let mut days: Vec<(Weekday, f64, usize)> = Vec::new();
        for scan in scans {
            let weekday = self.local_weekday(scan.timestamp);
            match days.iter_mut().find(|(day, ..)| *day == weekday) {
                Some((_, sum, count)) => {
                    *sum += scan.avg_waste_percentage;
                    *count += 1;
                }
                None => days.push((weekday, scan.avg_waste_percentage, 1)),
            }
        }

        if days.len() < 2 {
            return None;
        }

        let mut best: Option<(Weekday, f64)> = None;
        for (day, sum, count) in days {
            let avg = sum / count as f64;
            if best.map_or(true, |(_, lowest)| avg < lowest) {
                best = Some((day, avg));
            }
        }
        let (day, avg) = best?;
        let name = weekday_name(day);

        Some(Insight {
            kind: InsightKind::Info,
            title: format!("{} Success", name),
            description: format!(
                "{} has the lowest waste at {}%. Consider analyzing this day's menu for successful patterns.",
                name, avg as i64
            ),
            priority: InsightPriority::Low,
            action: None,
            data: InsightData::Weekday {
                day: name.to_string(),
                avg_waste_pct: round_to(avg, 1),
            },
        })
    }
}

/// First group whose mean beats every earlier one under `better`
fn extreme_group(groups: &[FoodGroup], better: impl Fn(f64, f64) -> bool) -> Option<&FoodGroup> {
    let mut chosen: Option<&FoodGroup> = None;
    for group in groups {
        if chosen.map_or(true, |c| better(group.mean_waste(), c.mean_waste())) {
            chosen = Some(group);
        }
    }
    chosen
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Flat leaderboard row for CSV export
#[derive(Debug, Serialize)]
pub struct LeaderboardRow {
    pub rank: usize,
    pub student_id: String,
    pub total_points: u32,
    pub scans: usize,
    pub avg_waste_pct: f64,
    pub badge: BadgeLevel,
    pub badge_description: String,
}

impl From<&LeaderboardEntry> for LeaderboardRow {
    fn from(entry: &LeaderboardEntry) -> Self {
        Self {
            rank: entry.rank,
            student_id: entry.student_id.clone(),
            total_points: entry.total_points,
            scans: entry.scans,
            avg_waste_pct: entry.avg_waste_pct,
            badge: entry.badge.level,
            badge_description: entry.badge.description.clone(),
        }
    }
}

/// Reporting service over the shared scan log
#[derive(Clone)]
pub struct ReportingService {
    log: Arc<dyn ScanLog>,
    engine: AggregationEngine,
}

impl ReportingService {
    pub fn new(log: Arc<dyn ScanLog>, engine: AggregationEngine) -> Self {
        Self { log, engine }
    }

    pub fn today(&self) -> NaiveDate {
        self.engine.today(Utc::now())
    }

    pub async fn daily_report(&self, school_id: &str, date: NaiveDate) -> AppResult<DailyReport> {
        let scans = self.log.snapshot().await?;
        Ok(self.engine.daily_report(&scans, school_id, date))
    }

    pub async fn weekly_report(&self, school_id: &str, weeks_back: u32) -> AppResult<WeeklyReport> {
        let scans = self.log.snapshot().await?;
        Ok(self
            .engine
            .weekly_report(&scans, school_id, weeks_back, Utc::now()))
    }

    pub async fn student_stats(&self, student_id: &str, days: u32) -> AppResult<StudentStats> {
        let scans = self.log.snapshot().await?;
        Ok(self
            .engine
            .student_stats(&scans, student_id, days, Utc::now()))
    }

    pub async fn leaderboard(
        &self,
        school_id: &str,
        period: LeaderboardPeriod,
    ) -> AppResult<Leaderboard> {
        let scans = self.log.snapshot().await?;
        Ok(self.engine.leaderboard(&scans, school_id, period, Utc::now()))
    }

    pub async fn insights(&self, school_id: &str, days: u32) -> AppResult<Insights> {
        let scans = self.log.snapshot().await?;
        Ok(self.engine.insights(&scans, school_id, days, Utc::now()))
    }

    /// Export data to CSV format
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
    }
}
