//! Tests for gamification points and per-scan metrics

use proptest::prelude::*;
use shared::{
    calculate_points, points_for_mean_waste, FoodCategory, FoodItem, ImpactFactors, ScanMetrics,
    WasteLevel, MIN_POINTS,
};

fn item(waste: f64, weight: f64) -> FoodItem {
    FoodItem::new("Dish", waste, weight, FoodCategory::Side)
}

mod tiers {
    use super::*;

    #[test]
    fn boundaries_resolve_to_the_lower_tier() {
        assert_eq!(points_for_mean_waste(10.0), 15);
        assert_eq!(points_for_mean_waste(25.0), 10);
        assert_eq!(points_for_mean_waste(40.0), 5);
        assert_eq!(points_for_mean_waste(60.0), 2);
    }

    #[test]
    fn above_every_tier_earns_minimum() {
        assert_eq!(points_for_mean_waste(60.01), MIN_POINTS);
        assert_eq!(points_for_mean_waste(100.0), MIN_POINTS);
    }

    #[test]
    fn empty_plate_earns_nothing() {
        assert_eq!(calculate_points(&[]), 0);
    }
}

mod metrics {
    use super::*;

    #[test]
    fn two_item_round_trip() {
        let metrics = ScanMetrics::from_items(
            &[item(20.0, 2.0), item(60.0, 6.0)],
            &ImpactFactors::default(),
        );

        assert_eq!(metrics.avg_waste_percentage, 40.0);
        assert_eq!(metrics.points, 5);
        assert_eq!(metrics.waste_level, WasteLevel::Significant);
        assert_eq!(metrics.impact.weight_oz, 8.0);
        assert_eq!(metrics.impact.weight_lbs, 0.5);
        assert_eq!(metrics.impact.cost_usd, 2.75);
    }

    #[test]
    fn empty_plate_is_classified_from_zero() {
        let metrics = ScanMetrics::from_items(&[], &ImpactFactors::default());
        assert_eq!(metrics.avg_waste_percentage, 0.0);
        assert_eq!(metrics.waste_level, WasteLevel::NoWaste);
        assert_eq!(metrics.points, 0);
    }

    #[test]
    fn stored_mean_is_rounded_to_two_places() {
        let metrics = ScanMetrics::from_items(
            &[item(10.0, 1.0), item(20.0, 1.0), item(20.0, 1.0)],
            &ImpactFactors::default(),
        );
        assert_eq!(metrics.avg_waste_percentage, 16.67);
    }
}

// =============================================================================
// Property: points never increase as waste increases
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn points_are_non_increasing(a in 0.0f64..=100.0, b in 0.0f64..=100.0) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(points_for_mean_waste(low) >= points_for_mean_waste(high));
    }

    #[test]
    fn non_empty_plates_earn_at_least_minimum(
        wastes in prop::collection::vec(0.0f64..=100.0, 1..8),
    ) {
        let items: Vec<FoodItem> = wastes.iter().map(|w| item(*w, 1.0)).collect();
        let points = calculate_points(&items);
        prop_assert!((MIN_POINTS..=15).contains(&points));
    }
}
