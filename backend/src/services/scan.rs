//! Scan submission service

use std::sync::Arc;

use chrono::Utc;
use shared::{mean_waste_percentage, ImpactFactors, NewScan, ScanMetrics, ScanResponse};

use crate::error::AppResult;
use crate::services::estimator::{PlateImage, WasteEstimator};
use crate::services::repository::ScanLog;

/// Who submitted a scan
#[derive(Debug, Clone)]
pub struct ScanSubmitter {
    pub school_id: String,
    pub student_id: Option<String>,
}

/// Scan service: estimate, score, record
#[derive(Clone)]
pub struct ScanService {
    log: Arc<dyn ScanLog>,
    estimator: WasteEstimator,
    factors: ImpactFactors,
}

impl ScanService {
    pub fn new(log: Arc<dyn ScanLog>, estimator: WasteEstimator, factors: ImpactFactors) -> Self {
        Self {
            log,
            estimator,
            factors,
        }
    }

    pub fn estimator_enabled(&self) -> bool {
        self.estimator.is_enabled()
    }

    /// Process one before/after pair and append the resulting record.
    ///
    /// Both images are decoded before anything else happens, so an
    /// undecodable upload is rejected without creating a record.
    pub async fn submit(
        &self,
        before_bytes: &[u8],
        after_bytes: &[u8],
        submitter: ScanSubmitter,
    ) -> AppResult<ScanResponse> {
        let before = PlateImage::decode(before_bytes)?;
        let after = PlateImage::decode(after_bytes)?;

        let analysis = self.estimator.analyze(&before, &after).await;
        let mean_waste = mean_waste_percentage(&analysis.food_items);
        let metrics = ScanMetrics::from_items(&analysis.food_items, &self.factors);

        let record = self
            .log
            .append(NewScan::from_analysis(
                Utc::now(),
                submitter.school_id,
                submitter.student_id,
                analysis,
                metrics,
                (before.reference, after.reference),
            ))
            .await?;

        tracing::info!(
            scan_id = record.id,
            school_id = %record.school_id,
            items = record.food_items.len(),
            points = record.points,
            "Recorded scan"
        );

        Ok(ScanResponse::from_record(&record, mean_waste))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::services::repository::MemoryScanLog;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use shared::{FoodCategory, FoodItem, WasteLevel};
    use std::io::Cursor;

    fn png(color: [u8; 3]) -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb(color)));
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    fn service(log: Arc<MemoryScanLog>) -> ScanService {
        ScanService::new(
            log,
            WasteEstimator::fallback_only(),
            ImpactFactors::default(),
        )
    }

    fn submitter() -> ScanSubmitter {
        ScanSubmitter {
            school_id: "school_001".into(),
            student_id: Some("stu_1".into()),
        }
    }

    #[tokio::test]
    async fn fallback_scan_is_recorded() {
        let log = Arc::new(MemoryScanLog::new());
        let response = service(log.clone())
            .submit(&png([200, 60, 40]), &png([200, 60, 40]), submitter())
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(response.scan_id, 1);
        assert_eq!(response.avg_waste_percentage, 100.0);
        assert_eq!(response.waste_level, WasteLevel::MostLeft);
        assert_eq!(response.points, 1);
        assert_eq!(response.impact.weight_oz, 8.0);

        let records = log.snapshot().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].student_id.as_deref(), Some("stu_1"));
        assert_eq!(records[0].before_image, records[0].after_image);
    }

    #[tokio::test]
    async fn invalid_image_creates_no_record() {
        let log = Arc::new(MemoryScanLog::new());
        let result = service(log.clone())
            .submit(b"garbage", &png([200, 60, 40]), submitter())
            .await;

        assert!(matches!(result, Err(AppError::InvalidImage(_))));
        assert_eq!(log.len().await.unwrap(), 0);
    }

    #[test]
    fn two_item_plate_metrics() {
        let items = vec![
            FoodItem::new("A", 20.0, 2.0, FoodCategory::Entree),
            FoodItem::new("B", 60.0, 6.0, FoodCategory::Side),
        ];
        let metrics = ScanMetrics::from_items(&items, &ImpactFactors::default());

        assert_eq!(metrics.avg_waste_percentage, 40.0);
        assert_eq!(metrics.points, 5);
        assert_eq!(metrics.impact.weight_oz, 8.0);
        assert_eq!(metrics.impact.weight_lbs, 0.5);
        assert_eq!(metrics.impact.cost_usd, 2.75);
    }
}
