//! Food item models
//!
//! A `FoodItem` is one dish on a scanned plate. Estimators hand us loosely
//! typed JSON; it is normalized once here so downstream calculators never
//! need to default missing fields themselves.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name used when an estimator omits or blanks the item name
pub const UNKNOWN_FOOD_NAME: &str = "Unknown";

/// Dish category reported by an estimator
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum FoodCategory {
    Entree,
    Side,
    Vegetable,
    Dessert,
    Beverage,
    Mixed,
    #[default]
    Other,
}

impl FoodCategory {
    /// Lenient, case-insensitive parse; anything unrecognised is `Other`
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "entree" | "entrée" => FoodCategory::Entree,
            "side" => FoodCategory::Side,
            "vegetable" => FoodCategory::Vegetable,
            "dessert" => FoodCategory::Dessert,
            "beverage" => FoodCategory::Beverage,
            "mixed" => FoodCategory::Mixed,
            _ => FoodCategory::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FoodCategory::Entree => "entree",
            FoodCategory::Side => "side",
            FoodCategory::Vegetable => "vegetable",
            FoodCategory::Dessert => "dessert",
            FoodCategory::Beverage => "beverage",
            FoodCategory::Mixed => "mixed",
            FoodCategory::Other => "other",
        }
    }
}

impl std::fmt::Display for FoodCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single dish and how much of it was left on the plate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FoodItem {
    pub name: String,
    pub initial_portion: String,
    pub remaining_portion: String,
    /// Percent of the item LEFT on the plate, in [0, 100]
    pub waste_percentage: f64,
    /// Weight of the wasted portion only
    pub estimated_weight_oz: f64,
    pub category: FoodCategory,
}

impl FoodItem {
    /// Build a normalized item; out-of-range numbers are clamped
    pub fn new(
        name: impl Into<String>,
        waste_percentage: f64,
        estimated_weight_oz: f64,
        category: FoodCategory,
    ) -> Self {
        let name = name.into();
        Self {
            name: if name.trim().is_empty() {
                UNKNOWN_FOOD_NAME.to_string()
            } else {
                name
            },
            initial_portion: String::new(),
            remaining_portion: String::new(),
            waste_percentage: clamp_percentage(waste_percentage),
            estimated_weight_oz: clamp_weight(estimated_weight_oz),
            category,
        }
    }

    pub fn with_portions(
        mut self,
        initial_portion: impl Into<String>,
        remaining_portion: impl Into<String>,
    ) -> Self {
        self.initial_portion = initial_portion.into();
        self.remaining_portion = remaining_portion.into();
        self
    }

    /// Normalize one estimator-provided JSON object.
    ///
    /// Numbers may arrive as JSON numbers or numeric strings; anything else
    /// is treated as absent.
    pub fn from_json(value: &Value) -> Self {
        let text = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_default()
        };

        FoodItem::new(
            text("name"),
            number_field(value, "waste_percentage"),
            number_field(value, "estimated_weight_oz"),
            FoodCategory::parse_lenient(&text("category")),
        )
        .with_portions(text("initial_portion"), text("remaining_portion"))
    }
}

fn number_field(value: &Value, key: &str) -> f64 {
    match value.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().trim_end_matches('%').parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn clamp_percentage(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

fn clamp_weight(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Arithmetic mean of `waste_percentage`; 0 for an empty plate
pub fn mean_waste_percentage(items: &[FoodItem]) -> f64 {
    if items.is_empty() {
        return 0.0;
    }
    items.iter().map(|i| i.waste_percentage).sum::<f64>() / items.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_missing_fields() {
        let item = FoodItem::from_json(&json!({}));
        assert_eq!(item.name, UNKNOWN_FOOD_NAME);
        assert_eq!(item.waste_percentage, 0.0);
        assert_eq!(item.estimated_weight_oz, 0.0);
        assert_eq!(item.category, FoodCategory::Other);
    }

    #[test]
    fn accepts_numeric_strings_and_clamps() {
        let item = FoodItem::from_json(&json!({
            "name": "Rice",
            "waste_percentage": "135%",
            "estimated_weight_oz": -2,
            "category": "SIDE"
        }));
        assert_eq!(item.waste_percentage, 100.0);
        assert_eq!(item.estimated_weight_oz, 0.0);
        assert_eq!(item.category, FoodCategory::Side);
    }

    #[test]
    fn mean_of_empty_plate_is_zero() {
        assert_eq!(mean_waste_percentage(&[]), 0.0);
    }
}
