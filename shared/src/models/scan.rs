//! Scan records and the estimator analysis contract

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::models::{FoodItem, Impact, ScanMetrics, WasteLevel};
use crate::types::round_to;

/// Opaque reference to a stored source image (a content digest)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(pub String);

impl ImageRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Structured estimate of one before/after plate pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WasteAnalysis {
    pub food_items: Vec<FoodItem>,
    pub overall_assessment: String,
    pub suggestions: Vec<String>,
}

/// Why an estimator payload could not be used
#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    #[error("response is not a JSON object")]
    NotAnObject,

    #[error("response has no food_items array")]
    MissingFoodItems,
}

impl WasteAnalysis {
    /// Validate and normalize a parsed estimator payload.
    ///
    /// `food_items` is mandatory; the assessment and suggestions default to
    /// empty. Non-object entries in `food_items` are dropped.
    pub fn from_json(value: &Value) -> Result<Self, AnalysisError> {
        let object = value.as_object().ok_or(AnalysisError::NotAnObject)?;

        let food_items = object
            .get("food_items")
            .and_then(Value::as_array)
            .ok_or(AnalysisError::MissingFoodItems)?
            .iter()
            .filter(|v| v.is_object())
            .map(FoodItem::from_json)
            .collect();

        let overall_assessment = object
            .get("overall_assessment")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let suggestions = object
            .get("suggestions")
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            food_items,
            overall_assessment,
            suggestions,
        })
    }
}

/// A scan ready to be appended to the log; the log assigns the identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewScan {
    pub timestamp: DateTime<Utc>,
    pub school_id: String,
    pub student_id: Option<String>,
    pub food_items: Vec<FoodItem>,
    pub avg_waste_percentage: f64,
    pub waste_level: WasteLevel,
    pub points: u32,
    pub impact: Impact,
    pub overall_assessment: String,
    pub suggestions: Vec<String>,
    pub before_image: ImageRef,
    pub after_image: ImageRef,
}

impl NewScan {
    pub fn from_analysis(
        timestamp: DateTime<Utc>,
        school_id: String,
        student_id: Option<String>,
        analysis: WasteAnalysis,
        metrics: ScanMetrics,
        images: (ImageRef, ImageRef),
    ) -> Self {
        Self {
            timestamp,
            school_id,
            student_id,
            food_items: analysis.food_items,
            avg_waste_percentage: metrics.avg_waste_percentage,
            waste_level: metrics.waste_level,
            points: metrics.points,
            impact: metrics.impact,
            overall_assessment: analysis.overall_assessment,
            suggestions: analysis.suggestions,
            before_image: images.0,
            after_image: images.1,
        }
    }

    /// Freeze into an immutable record under a log-assigned identifier
    pub fn into_record(self, id: u64) -> ScanRecord {
        ScanRecord {
            id,
            timestamp: self.timestamp,
            school_id: self.school_id,
            student_id: self.student_id,
            food_items: self.food_items,
            avg_waste_percentage: self.avg_waste_percentage,
            waste_level: self.waste_level,
            points: self.points,
            impact: self.impact,
            overall_assessment: self.overall_assessment,
            suggestions: self.suggestions,
            before_image: self.before_image,
            after_image: self.after_image,
        }
    }
}

/// Immutable measurement record for one scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRecord {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub school_id: String,
    pub student_id: Option<String>,
    pub food_items: Vec<FoodItem>,
    pub avg_waste_percentage: f64,
    pub waste_level: WasteLevel,
    pub points: u32,
    pub impact: Impact,
    pub overall_assessment: String,
    pub suggestions: Vec<String>,
    pub before_image: ImageRef,
    pub after_image: ImageRef,
}

/// Response to a scan submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResponse {
    pub success: bool,
    pub scan_id: u64,
    pub food_items: Vec<FoodItem>,
    pub waste_level: WasteLevel,
    pub avg_waste_percentage: f64,
    pub points: u32,
    pub impact: Impact,
    pub overall_assessment: String,
    pub tips: Vec<String>,
}

impl ScanResponse {
    /// `mean_waste` is the unrounded item mean; the record only keeps 2 dp
    pub fn from_record(record: &ScanRecord, mean_waste: f64) -> Self {
        Self {
            success: true,
            scan_id: record.id,
            food_items: record.food_items.clone(),
            waste_level: record.waste_level,
            avg_waste_percentage: round_to(mean_waste, 1),
            points: record.points,
            impact: record.impact,
            overall_assessment: record.overall_assessment.clone(),
            tips: record.suggestions.clone(),
        }
    }
}
