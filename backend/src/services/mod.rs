//! Business logic services for the Dining Waste Tracker

pub mod estimator;
pub mod fallback;
pub mod reporting;
pub mod repository;
pub mod scan;

pub use estimator::WasteEstimator;
pub use reporting::{AggregationEngine, ReportingService};
pub use repository::{MemoryScanLog, PgScanLog, ScanLog};
pub use scan::ScanService;
