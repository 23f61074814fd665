//! Gamification points for a single scan

use serde::Serialize;

use crate::models::{
    calculate_impact, classify_waste_level, mean_waste_percentage, FoodItem, Impact,
    ImpactFactors, WasteLevel,
};
use crate::types::round_to;

/// Ordered `(max mean waste %, points)` tiers, first match wins
pub const POINT_TIERS: [(f64, u32); 4] = [(10.0, 15), (25.0, 10), (40.0, 5), (60.0, 2)];

/// Points when the mean waste exceeds every tier
pub const MIN_POINTS: u32 = 1;

/// Points for a given mean waste percentage
pub fn points_for_mean_waste(mean_waste: f64) -> u32 {
    POINT_TIERS
        .iter()
        .find(|(max_waste, _)| mean_waste <= *max_waste)
        .map(|(_, points)| *points)
        .unwrap_or(MIN_POINTS)
}

/// Points for a scan; a plate with no recognised items earns nothing
pub fn calculate_points(items: &[FoodItem]) -> u32 {
    if items.is_empty() {
        return 0;
    }
    points_for_mean_waste(mean_waste_percentage(items))
}

/// Everything derived from a scan's item list
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScanMetrics {
    /// Mean item waste, rounded to 2 dp as stored on the record
    pub avg_waste_percentage: f64,
    pub waste_level: WasteLevel,
    pub points: u32,
    pub impact: Impact,
}

impl ScanMetrics {
    pub fn from_items(items: &[FoodItem], factors: &ImpactFactors) -> Self {
        let mean = mean_waste_percentage(items);
        Self {
            avg_waste_percentage: round_to(mean, 2),
            waste_level: classify_waste_level(mean / 100.0),
            points: calculate_points(items),
            impact: calculate_impact(items, factors),
        }
    }
}
