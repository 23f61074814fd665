//! Waste estimation pipeline
//!
//! The vision estimator is tried first; any failure (disabled, transport,
//! timeout, unusable payload) becomes `EstimateOutcome::Error`, which the
//! settle step maps to the pixel fallback. `analyze` therefore always
//! produces an analysis.

use std::sync::Arc;
use std::time::Duration;

use image::DynamicImage;
use sha2::{Digest, Sha256};
use shared::{ImageRef, WasteAnalysis};

use crate::config::EstimatorConfig;
use crate::error::{AppError, AppResult};
use crate::external::{vision::EncodedImage, VisionClient};
use crate::services::fallback::{
    estimate_waste_ratio, fallback_analysis, FallbackError, SAFE_DEFAULT_RATIO,
};

/// An uploaded plate photo, decoded once
#[derive(Clone)]
pub struct PlateImage {
    pub bytes: Arc<[u8]>,
    pub mime_type: String,
    pub decoded: Arc<DynamicImage>,
    pub reference: ImageRef,
}

impl PlateImage {
    /// Decode raw upload bytes; undecodable data is a client error
    pub fn decode(bytes: &[u8]) -> AppResult<Self> {
        if bytes.is_empty() {
            return Err(AppError::InvalidImage("empty upload".to_string()));
        }

        let format =
            image::guess_format(bytes).map_err(|e| AppError::InvalidImage(e.to_string()))?;
        let decoded = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| AppError::InvalidImage(e.to_string()))?;

        Ok(Self {
            bytes: Arc::from(bytes),
            mime_type: format.to_mime_type().to_string(),
            decoded: Arc::new(decoded),
            reference: content_digest(bytes),
        })
    }

    fn encoded(&self) -> EncodedImage<'_> {
        EncodedImage {
            bytes: &self.bytes,
            mime_type: &self.mime_type,
        }
    }
}

/// `sha256:<hex>` reference for stored image bytes
pub fn content_digest(bytes: &[u8]) -> ImageRef {
    let hex: String = Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect();
    ImageRef(format!("sha256:{}", hex))
}

/// Result of the primary estimator call
#[derive(Debug, Clone, PartialEq)]
pub enum EstimateOutcome {
    Estimate(WasteAnalysis),
    Error(String),
}

#[derive(Clone)]
pub struct WasteEstimator {
    client: Option<VisionClient>,
    timeout: Duration,
}

impl WasteEstimator {
    pub fn new(client: Option<VisionClient>, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub fn from_config(config: &EstimatorConfig) -> AppResult<Self> {
        Ok(Self::new(
            VisionClient::from_config(config)?,
            Duration::from_secs(config.timeout_secs),
        ))
    }

    /// Estimator that always uses the pixel heuristic
    pub fn fallback_only() -> Self {
        Self::new(None, Duration::from_secs(0))
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    /// Estimate waste for a before/after pair; never fails
    pub async fn analyze(&self, before: &PlateImage, after: &PlateImage) -> WasteAnalysis {
        let outcome = self.estimate(before, after).await;
        self.settle(outcome, before, after).await
    }

    async fn estimate(&self, before: &PlateImage, after: &PlateImage) -> EstimateOutcome {
        let Some(client) = &self.client else {
            return EstimateOutcome::Error("vision estimator is not configured".to_string());
        };

        match tokio::time::timeout(
            self.timeout,
            client.analyze_plate(before.encoded(), after.encoded()),
        )
        .await
        {
            Ok(Ok(analysis)) => EstimateOutcome::Estimate(analysis),
            Ok(Err(e)) => EstimateOutcome::Error(e.to_string()),
            Err(_) => EstimateOutcome::Error(format!(
                "no answer within {}s",
                self.timeout.as_secs()
            )),
        }
    }

    async fn settle(
        &self,
        outcome: EstimateOutcome,
        before: &PlateImage,
        after: &PlateImage,
    ) -> WasteAnalysis {
        match outcome {
            EstimateOutcome::Estimate(analysis) => analysis,
            EstimateOutcome::Error(reason) => {
                if self.is_enabled() {
                    tracing::warn!("Vision estimator failed, using pixel fallback: {}", reason);
                } else {
                    tracing::debug!("Using pixel fallback: {}", reason);
                }
                run_fallback(Arc::clone(&before.decoded), Arc::clone(&after.decoded)).await
            }
        }
    }
}

/// Run the pixel heuristic off the async executor
pub async fn run_fallback(before: Arc<DynamicImage>, after: Arc<DynamicImage>) -> WasteAnalysis {
    let ratio = tokio::task::spawn_blocking(move || estimate_waste_ratio(&before, &after))
        .await
        .unwrap_or_else(|e| {
            tracing::warn!("{}", FallbackError::TaskFailed(e.to_string()));
            SAFE_DEFAULT_RATIO
        });

    fallback_analysis(ratio)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use shared::{FoodCategory, FoodItem};
    use std::io::Cursor;

    fn png(color: [u8; 3]) -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(12, 12, Rgb(color)));
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    #[test]
    fn decodes_png_with_digest_reference() {
        let plate = PlateImage::decode(&png([200, 50, 40])).unwrap();

        assert_eq!(plate.mime_type, "image/png");
        assert_eq!(plate.decoded.width(), 12);
        assert!(plate.reference.as_str().starts_with("sha256:"));
        assert_eq!(plate.reference.as_str().len(), "sha256:".len() + 64);
    }

    #[test]
    fn rejects_undecodable_bytes() {
        assert!(matches!(
            PlateImage::decode(b"definitely not an image"),
            Err(AppError::InvalidImage(_))
        ));
        assert!(matches!(
            PlateImage::decode(&[]),
            Err(AppError::InvalidImage(_))
        ));
    }

    #[test]
    fn digest_is_content_addressed() {
        assert_eq!(content_digest(b"plate"), content_digest(b"plate"));
        assert_ne!(content_digest(b"plate"), content_digest(b"plates"));
    }

    #[test]
    fn blocking_fallback_runs_on_a_fresh_runtime() {
        let plate = PlateImage::decode(&png([200, 50, 40])).unwrap();
        let analysis = tokio_test::block_on(run_fallback(
            Arc::clone(&plate.decoded),
            Arc::clone(&plate.decoded),
        ));
        assert_eq!(analysis.food_items[0].waste_percentage, 100.0);
        assert_eq!(analysis.suggestions.len(), 3);
    }

    #[tokio::test]
    async fn disabled_estimator_uses_fallback() {
        let before = PlateImage::decode(&png([200, 50, 40])).unwrap();
        let after = PlateImage::decode(&png([255, 255, 255])).unwrap();

        let analysis = WasteEstimator::fallback_only().analyze(&before, &after).await;

        assert_eq!(analysis.food_items.len(), 1);
        assert_eq!(analysis.food_items[0].name, "Mixed Plate");
        assert_eq!(analysis.food_items[0].waste_percentage, 0.0);
    }

    #[tokio::test]
    async fn unreachable_estimator_falls_back() {
        let config = EstimatorConfig {
            api_key: Some("test-key".into()),
            endpoint: "http://127.0.0.1:9".into(),
            model: "test".into(),
            timeout_secs: 2,
        };
        let estimator = WasteEstimator::from_config(&config).unwrap();
        assert!(estimator.is_enabled());

        let before = PlateImage::decode(&png([200, 50, 40])).unwrap();
        let after = PlateImage::decode(&png([200, 50, 40])).unwrap();
        let analysis = estimator.analyze(&before, &after).await;

        assert_eq!(analysis.food_items.len(), 1);
        assert_eq!(analysis.food_items[0].name, "Mixed Plate");
        assert_eq!(analysis.food_items[0].waste_percentage, 100.0);
    }

    #[tokio::test]
    async fn settle_keeps_a_successful_estimate() {
        let plate = PlateImage::decode(&png([200, 50, 40])).unwrap();
        let estimate = WasteAnalysis {
            food_items: vec![FoodItem::new("Rice", 10.0, 1.0, FoodCategory::Side)],
            overall_assessment: "Mostly eaten".into(),
            suggestions: vec![],
        };

        let settled = WasteEstimator::fallback_only()
            .settle(EstimateOutcome::Estimate(estimate.clone()), &plate, &plate)
            .await;
        assert_eq!(settled, estimate);
    }

    #[tokio::test]
    async fn settle_maps_errors_to_fallback() {
        let plate = PlateImage::decode(&png([200, 50, 40])).unwrap();

        let settled = WasteEstimator::fallback_only()
            .settle(EstimateOutcome::Error("timeout".into()), &plate, &plate)
            .await;
        assert_eq!(settled.food_items[0].category, FoodCategory::Mixed);
        assert_eq!(settled.food_items[0].waste_percentage, 100.0);
    }
}
