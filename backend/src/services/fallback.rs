//! Deterministic pixel-comparison waste heuristic
//!
//! Used whenever the vision estimator is disabled or fails. Food is told
//! apart from the plate by chrominance: each pixel is converted to 8-bit
//! CIE L*a*b* and scored by how far a* and b* sit from the neutral midpoint.
//! The waste ratio is the share of "before" food pixels still present
//! "after".

use image::{imageops::FilterType, DynamicImage, RgbImage};
use shared::{round_to, tips_from_waste, FoodCategory, FoodItem, WasteAnalysis};
use thiserror::Error;

/// Chrominance score above which a pixel counts as food
pub const FOOD_CHROMA_THRESHOLD: u32 = 15;

/// Assumed weight of a full plate
pub const FULL_PLATE_WEIGHT_OZ: f64 = 8.0;

/// Ratio used when the heuristic itself cannot produce a number
pub const SAFE_DEFAULT_RATIO: f64 = 0.5;

pub const FALLBACK_ITEM_NAME: &str = "Mixed Plate";

const NEUTRAL_CHROMA: i32 = 128;

#[derive(Debug, Error, PartialEq)]
pub enum FallbackError {
    #[error("image has no pixels ({0}x{1})")]
    EmptyImage(u32, u32),

    #[error("waste ratio is not a finite number")]
    NonFinite,

    #[error("fallback task failed: {0}")]
    TaskFailed(String),
}

/// Convert one sRGB pixel to 8-bit `(a*, b*)`, offset so 128 is neutral
pub fn srgb_to_lab_chroma(rgb: [u8; 3]) -> (u8, u8) {
    let linear = |v: u8| {
        let c = v as f64 / 255.0;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    let (r, g, b) = (linear(rgb[0]), linear(rgb[1]), linear(rgb[2]));

    // D65 reference white
    let x = (0.412453 * r + 0.357580 * g + 0.180423 * b) / 0.950456;
    let y = 0.212671 * r + 0.715160 * g + 0.072169 * b;
    let z = (0.019334 * r + 0.119193 * g + 0.950227 * b) / 1.088754;

    let f = |t: f64| {
        if t > 0.008856 {
            t.cbrt()
        } else {
            7.787 * t + 16.0 / 116.0
        }
    };

    let a = 500.0 * (f(x) - f(y)) + NEUTRAL_CHROMA as f64;
    let b = 200.0 * (f(y) - f(z)) + NEUTRAL_CHROMA as f64;

    (
        a.round().clamp(0.0, 255.0) as u8,
        b.round().clamp(0.0, 255.0) as u8,
    )
}

/// Sum of absolute chroma deviations from neutral
pub fn chroma_score(rgb: [u8; 3]) -> u32 {
    let (a, b) = srgb_to_lab_chroma(rgb);
    ((a as i32 - NEUTRAL_CHROMA).abs() + (b as i32 - NEUTRAL_CHROMA).abs()) as u32
}

/// Number of pixels whose chroma score exceeds the food threshold
pub fn food_pixel_count(image: &RgbImage) -> u64 {
    image
        .pixels()
        .filter(|p| chroma_score(p.0) > FOOD_CHROMA_THRESHOLD)
        .count() as u64
}

/// Share of "before" food pixels still present in "after", in [0, 1]
pub fn waste_ratio(before: &DynamicImage, after: &DynamicImage) -> Result<f64, FallbackError> {
    for img in [before, after] {
        if img.width() == 0 || img.height() == 0 {
            return Err(FallbackError::EmptyImage(img.width(), img.height()));
        }
    }

    let before = before.to_rgb8();
    let after = if after.width() == before.width() && after.height() == before.height() {
        after.to_rgb8()
    } else {
        after
            .resize_exact(before.width(), before.height(), FilterType::Triangle)
            .to_rgb8()
    };

    let before_food = food_pixel_count(&before);
    let after_food = food_pixel_count(&after);
    tracing::debug!(before_food, after_food, "Fallback food pixel counts");

    if before_food == 0 {
        return Ok(0.0);
    }

    let ratio = after_food as f64 / before_food as f64;
    if !ratio.is_finite() {
        return Err(FallbackError::NonFinite);
    }
    Ok(ratio.clamp(0.0, 1.0))
}

/// Waste ratio with any failure replaced by the safe default
pub fn estimate_waste_ratio(before: &DynamicImage, after: &DynamicImage) -> f64 {
    waste_ratio(before, after).unwrap_or_else(|e| {
        tracing::warn!("Fallback heuristic failed, using default ratio: {}", e);
        SAFE_DEFAULT_RATIO
    })
}

/// Single synthetic item plus tiered tips for a plate-level ratio
pub fn fallback_analysis(ratio: f64) -> WasteAnalysis {
    let wasted_pct = (ratio * 100.0) as i64;
    let consumed_pct = ((1.0 - ratio) * 100.0) as i64;

    let item = FoodItem::new(
        FALLBACK_ITEM_NAME,
        round_to(ratio * 100.0, 1),
        round_to(FULL_PLATE_WEIGHT_OZ * ratio, 2),
        FoodCategory::Mixed,
    )
    .with_portions("Full serving", format!("{}% remaining", wasted_pct));

    WasteAnalysis {
        food_items: vec![item],
        overall_assessment: format!(
            "Approximately {}% of food was consumed, {}% wasted.",
            consumed_pct, wasted_pct
        ),
        suggestions: tips_from_waste(ratio),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    const RED: Rgb<u8> = Rgb([220, 40, 30]);
    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
    const GRAY: Rgb<u8> = Rgb([128, 128, 128]);

    fn solid(width: u32, height: u32, color: Rgb<u8>) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, color))
    }

    #[test]
    fn neutral_pixels_sit_at_midpoint() {
        assert_eq!(srgb_to_lab_chroma([255, 255, 255]), (128, 128));
        assert_eq!(srgb_to_lab_chroma([128, 128, 128]), (128, 128));
        assert_eq!(chroma_score([0, 0, 0]), 0);
    }

    #[test]
    fn colourful_pixels_score_above_threshold() {
        assert!(chroma_score(RED.0) > FOOD_CHROMA_THRESHOLD);
        assert!(chroma_score([40, 160, 40]) > FOOD_CHROMA_THRESHOLD);
    }

    #[test]
    fn identical_images_are_fully_wasted() {
        let plate = solid(16, 16, RED);
        assert_eq!(waste_ratio(&plate, &plate).unwrap(), 1.0);

        let analysis = fallback_analysis(1.0);
        assert_eq!(analysis.food_items[0].waste_percentage, 100.0);
    }

    #[test]
    fn neutral_after_image_has_no_waste() {
        let ratio = waste_ratio(&solid(16, 16, RED), &solid(16, 16, WHITE)).unwrap();
        assert_eq!(ratio, 0.0);
        assert_eq!(fallback_analysis(ratio).food_items[0].waste_percentage, 0.0);
    }

    #[test]
    fn empty_before_plate_yields_zero() {
        assert_eq!(
            waste_ratio(&solid(8, 8, GRAY), &solid(8, 8, RED)).unwrap(),
            0.0
        );
    }

    #[test]
    fn half_eaten_plate() {
        let before = solid(10, 10, RED);
        let after = DynamicImage::ImageRgb8(RgbImage::from_fn(10, 10, |x, _| {
            if x < 5 {
                RED
            } else {
                WHITE
            }
        }));
        assert_eq!(waste_ratio(&before, &after).unwrap(), 0.5);
    }

    #[test]
    fn after_image_is_resized_to_before() {
        assert_eq!(
            waste_ratio(&solid(10, 10, RED), &solid(40, 30, RED)).unwrap(),
            1.0
        );
    }

    #[test]
    fn degenerate_image_uses_safe_default() {
        let empty = DynamicImage::ImageRgb8(RgbImage::new(0, 0));
        assert_eq!(
            waste_ratio(&empty, &solid(4, 4, RED)),
            Err(FallbackError::EmptyImage(0, 0))
        );
        assert_eq!(estimate_waste_ratio(&empty, &solid(4, 4, RED)), SAFE_DEFAULT_RATIO);
    }

    #[test]
    fn fallback_item_and_assessment() {
        let analysis = fallback_analysis(0.3);
        let item = &analysis.food_items[0];

        assert_eq!(item.name, "Mixed Plate");
        assert_eq!(item.category, FoodCategory::Mixed);
        assert_eq!(item.waste_percentage, 30.0);
        assert_eq!(item.estimated_weight_oz, 2.4);
        assert_eq!(item.initial_portion, "Full serving");
        assert_eq!(item.remaining_portion, "30% remaining");
        assert_eq!(
            analysis.overall_assessment,
            "Approximately 70% of food was consumed, 30% wasted."
        );
        assert_eq!(analysis.suggestions.len(), 2);
    }

    #[test]
    fn clean_plate_gets_single_tip() {
        let analysis = fallback_analysis(0.0);
        assert_eq!(analysis.suggestions.len(), 1);
        assert_eq!(analysis.food_items[0].estimated_weight_oz, 0.0);
    }
}
