//! Tests for the impact calculator
//! Verifies linearity in wasted weight and the default conversion factors

use proptest::prelude::*;
use shared::{calculate_impact, FoodCategory, FoodItem, Impact, ImpactFactors};

fn item(weight_oz: f64) -> FoodItem {
    FoodItem::new("Dish", 50.0, weight_oz, FoodCategory::Entree)
}

mod defaults {
    use super::*;

    #[test]
    fn empty_plate_has_zero_impact() {
        assert_eq!(
            calculate_impact(&[], &ImpactFactors::default()),
            Impact::default()
        );
    }

    #[test]
    fn one_pound_of_waste() {
        let impact = calculate_impact(&[item(10.0), item(6.0)], &ImpactFactors::default());

        assert_eq!(impact.weight_oz, 16.0);
        assert_eq!(impact.weight_lbs, 1.0);
        assert_eq!(impact.cost_usd, 5.5);
        assert_eq!(impact.co2_kg, 2.0);
        assert_eq!(impact.water_gallons, 25.0);
        assert_eq!(impact.meals_equivalent, 1.33);
    }

    #[test]
    fn half_pound_costs_two_seventy_five() {
        let impact = calculate_impact(&[item(2.0), item(6.0)], &ImpactFactors::default());
        assert_eq!(impact.weight_lbs, 0.5);
        assert_eq!(impact.cost_usd, 2.75);
    }

    #[test]
    fn custom_factors_are_honoured() {
        let factors = ImpactFactors {
            cost_per_lb: 10.0,
            co2_per_lb: 1.0,
            water_per_lb: 100.0,
            lbs_per_meal: 1.0,
        };
        let impact = calculate_impact(&[item(16.0)], &factors);
        assert_eq!(impact.cost_usd, 10.0);
        assert_eq!(impact.water_gallons, 100.0);
        assert_eq!(impact.meals_equivalent, 1.0);
    }
}

// =============================================================================
// Property: doubling every weight doubles every impact figure
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn impact_is_linear_in_weight(weights in prop::collection::vec(0u32..64, 1..6)) {
        let factors = ImpactFactors::default();
        // Display rounding on both sides bounds the difference
        let single: Vec<FoodItem> = weights.iter().map(|w| item(*w as f64)).collect();
        let doubled: Vec<FoodItem> = weights.iter().map(|w| item(*w as f64 * 2.0)).collect();

        let a = calculate_impact(&single, &factors);
        let b = calculate_impact(&doubled, &factors);

        prop_assert_eq!(b.weight_oz, a.weight_oz * 2.0);
        prop_assert!((b.weight_lbs - a.weight_lbs * 2.0).abs() < 0.0016);
        prop_assert!((b.cost_usd - a.cost_usd * 2.0).abs() < 0.016);
        prop_assert!((b.co2_kg - a.co2_kg * 2.0).abs() < 0.016);
        prop_assert!((b.water_gallons - a.water_gallons * 2.0).abs() < 0.16);
    }

    #[test]
    fn impact_is_never_negative(weights in prop::collection::vec(-10.0f64..40.0, 0..6)) {
        let items: Vec<FoodItem> = weights.iter().map(|w| item(*w)).collect();
        let impact = calculate_impact(&items, &ImpactFactors::default());

        prop_assert!(impact.weight_oz >= 0.0);
        prop_assert!(impact.cost_usd >= 0.0);
        prop_assert!(impact.meals_equivalent >= 0.0);
    }
}
