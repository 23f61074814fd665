//! WebAssembly module for the Dining Waste Tracker
//!
//! Lets a kiosk or browser preview a scan before it is submitted:
//! - Waste level classification
//! - Points for a set of food items
//! - Environmental impact
//! - Badge and next goal for a student

use serde_json::Value;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;

/// Parse a JSON array of loosely-typed food items
fn parse_items(items_json: &str) -> Result<Vec<FoodItem>, String> {
    let value: Value =
        serde_json::from_str(items_json).map_err(|e| format!("Invalid items JSON: {}", e))?;
    let items = value
        .as_array()
        .ok_or_else(|| "Items JSON must be an array".to_string())?;
    Ok(items
        .iter()
        .filter(|v| v.is_object())
        .map(FoodItem::from_json)
        .collect())
}

fn impact_json(items_json: &str) -> Result<String, String> {
    let items = parse_items(items_json)?;
    let impact = calculate_impact(&items, &ImpactFactors::default());
    serde_json::to_string(&impact).map_err(|e| e.to_string())
}

/// Waste level label for a fraction in [0, 1]
#[wasm_bindgen]
pub fn classify_waste(fraction: f64) -> String {
    classify_waste_level(fraction).label().to_string()
}

/// Points a plate would earn
#[wasm_bindgen]
pub fn preview_points(items_json: &str) -> Result<u32, JsValue> {
    let items = parse_items(items_json).map_err(|e| JsValue::from_str(&e))?;
    Ok(calculate_points(&items))
}

/// Impact of a plate's wasted portions, as JSON
#[wasm_bindgen]
pub fn preview_impact(items_json: &str) -> Result<String, JsValue> {
    impact_json(items_json).map_err(|e| JsValue::from_str(&e))
}

/// Badge for a mean waste percentage, as JSON
#[wasm_bindgen]
pub fn badge_for(avg_waste_pct: f64) -> String {
    serde_json::to_string(&assign_badge(avg_waste_pct)).unwrap_or_default()
}

/// Next milestone for a point total, as JSON
#[wasm_bindgen]
pub fn next_goal_for(points: u32) -> String {
    serde_json::to_string(&next_goal(points)).unwrap_or_default()
}

/// Check a student or school identifier
#[wasm_bindgen]
pub fn is_valid_identifier(id: &str) -> bool {
    validate_identifier(id).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLATE: &str = r#"[
        {"name": "A", "waste_percentage": 20, "estimated_weight_oz": 2},
        {"name": "B", "waste_percentage": 60, "estimated_weight_oz": 6}
    ]"#;

    #[test]
    fn test_classify_waste() {
        assert_eq!(classify_waste(0.0), "None");
        assert_eq!(classify_waste(0.3), "Significant");
        assert_eq!(classify_waste(0.9), "Most Left");
    }

    #[test]
    fn test_preview_points() {
        assert_eq!(calculate_points(&parse_items(PLATE).unwrap()), 5);
        assert_eq!(calculate_points(&parse_items("[]").unwrap()), 0);
    }

    #[test]
    fn test_preview_impact() {
        let impact: Value = serde_json::from_str(&impact_json(PLATE).unwrap()).unwrap();
        assert_eq!(impact["weight_oz"], 8.0);
        assert_eq!(impact["cost_usd"], 2.75);
    }

    #[test]
    fn test_rejects_non_array() {
        assert!(parse_items(r#"{"name": "A"}"#).is_err());
        assert!(parse_items("not json").is_err());
    }

    #[test]
    fn test_badge_and_goal() {
        let badge: Value = serde_json::from_str(&badge_for(15.0)).unwrap();
        assert_eq!(badge["level"], "Gold");

        let goal: Value = serde_json::from_str(&next_goal_for(1000)).unwrap();
        assert_eq!(goal["message"], "Max level reached!");
    }

    #[test]
    fn test_identifier() {
        assert!(is_valid_identifier("stu_42"));
        assert!(!is_valid_identifier(""));
    }
}
