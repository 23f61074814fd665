//! Environmental and financial impact of wasted food

use serde::{Deserialize, Serialize};

use crate::models::FoodItem;
use crate::types::round_to;

/// Conversion factors from wasted weight to impact figures
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ImpactFactors {
    /// Average cost of prepared food, USD per lb
    pub cost_per_lb: f64,
    /// Emissions per lb of food waste
    pub co2_per_lb: f64,
    /// Water used to produce one lb of food
    pub water_per_lb: f64,
    /// Weight of one typical meal
    pub lbs_per_meal: f64,
}

impl Default for ImpactFactors {
    fn default() -> Self {
        Self {
            cost_per_lb: 5.50,
            co2_per_lb: 2.0,
            water_per_lb: 25.0,
            lbs_per_meal: 0.75,
        }
    }
}

/// Impact of one scan, rounded for display
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Impact {
    pub weight_lbs: f64,
    pub weight_oz: f64,
    pub cost_usd: f64,
    pub co2_kg: f64,
    pub water_gallons: f64,
    pub meals_equivalent: f64,
}

/// Calculate the impact of the wasted portions of `items`
pub fn calculate_impact(items: &[FoodItem], factors: &ImpactFactors) -> Impact {
    let total_weight_oz: f64 = items.iter().map(|i| i.estimated_weight_oz).sum();
    let total_weight_lbs = total_weight_oz / 16.0;

    let meals_equivalent = if factors.lbs_per_meal > 0.0 {
        total_weight_lbs / factors.lbs_per_meal
    } else {
        0.0
    };

    Impact {
        weight_lbs: round_to(total_weight_lbs, 3),
        weight_oz: round_to(total_weight_oz, 2),
        cost_usd: round_to(total_weight_lbs * factors.cost_per_lb, 2),
        co2_kg: round_to(total_weight_lbs * factors.co2_per_lb, 2),
        water_gallons: round_to(total_weight_lbs * factors.water_per_lb, 1),
        meals_equivalent: round_to(meals_equivalent, 2),
    }
}
