//! Append-only scan log
//!
//! Readers only ever see fully built records: the memory log pushes a
//! finished `Arc<ScanRecord>` under the write lock, and snapshots clone the
//! `Arc` list under the read lock.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::{FoodItem, ImageRef, Impact, NewScan, ScanRecord, WasteLevel};
use sqlx::{types::Json, FromRow, PgPool};
use tokio::sync::RwLock;

use crate::error::{AppError, AppResult};

/// Storage seam for scan records
#[async_trait]
pub trait ScanLog: Send + Sync {
    /// Append a scan and return it with its assigned identifier
    async fn append(&self, scan: NewScan) -> AppResult<ScanRecord>;

    /// Every record in identifier order
    async fn snapshot(&self) -> AppResult<Vec<Arc<ScanRecord>>>;

    async fn len(&self) -> AppResult<usize>;

    /// Short label for health output
    fn backend_name(&self) -> &'static str;
}

/// Process-lifetime log; identifiers are 1-based positions
#[derive(Default)]
pub struct MemoryScanLog {
    records: RwLock<Vec<Arc<ScanRecord>>>,
}

impl MemoryScanLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScanLog for MemoryScanLog {
    async fn append(&self, scan: NewScan) -> AppResult<ScanRecord> {
        let mut records = self.records.write().await;
        let record = scan.into_record(records.len() as u64 + 1);
        records.push(Arc::new(record.clone()));
        Ok(record)
    }

    async fn snapshot(&self) -> AppResult<Vec<Arc<ScanRecord>>> {
        Ok(self.records.read().await.clone())
    }

    async fn len(&self) -> AppResult<usize> {
        Ok(self.records.read().await.len())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// PostgreSQL-backed log over the `scans` table
#[derive(Clone)]
pub struct PgScanLog {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct ScanRow {
    id: i64,
    recorded_at: DateTime<Utc>,
    school_id: String,
    student_id: Option<String>,
    food_items: Json<Vec<FoodItem>>,
    avg_waste_percentage: f64,
    waste_level: String,
    points: i32,
    impact: Json<Impact>,
    overall_assessment: String,
    suggestions: Json<Vec<String>>,
    before_image: String,
    after_image: String,
}

impl TryFrom<ScanRow> for ScanRecord {
    type Error = AppError;

    fn try_from(row: ScanRow) -> Result<Self, Self::Error> {
        let waste_level: WasteLevel = row.waste_level.parse().map_err(|_| {
            AppError::StorageError(format!(
                "scan {} has unknown waste level '{}'",
                row.id, row.waste_level
            ))
        })?;

        Ok(ScanRecord {
            id: row.id as u64,
            timestamp: row.recorded_at,
            school_id: row.school_id,
            student_id: row.student_id,
            food_items: row.food_items.0,
            avg_waste_percentage: row.avg_waste_percentage,
            waste_level,
            points: row.points.max(0) as u32,
            impact: row.impact.0,
            overall_assessment: row.overall_assessment,
            suggestions: row.suggestions.0,
            before_image: ImageRef(row.before_image),
            after_image: ImageRef(row.after_image),
        })
    }
}

const SCAN_COLUMNS: &str = "id, recorded_at, school_id, student_id, food_items, \
    avg_waste_percentage, waste_level, points, impact, overall_assessment, \
    suggestions, before_image, after_image";

impl PgScanLog {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ScanLog for PgScanLog {
    async fn append(&self, scan: NewScan) -> AppResult<ScanRecord> {
        let row = sqlx::query_as::<_, ScanRow>(&format!(
            r#"
            INSERT INTO scans (
                recorded_at, school_id, student_id, food_items, avg_waste_percentage,
                waste_level, points, impact, overall_assessment, suggestions,
                before_image, after_image
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {}
            "#,
            SCAN_COLUMNS
        ))
        .bind(scan.timestamp)
        .bind(&scan.school_id)
        .bind(&scan.student_id)
        .bind(Json(&scan.food_items))
        .bind(scan.avg_waste_percentage)
        .bind(scan.waste_level.label())
        .bind(scan.points as i32)
        .bind(Json(&scan.impact))
        .bind(&scan.overall_assessment)
        .bind(Json(&scan.suggestions))
        .bind(scan.before_image.as_str())
        .bind(scan.after_image.as_str())
        .fetch_one(&self.db)
        .await?;

        row.try_into()
    }

    async fn snapshot(&self) -> AppResult<Vec<Arc<ScanRecord>>> {
        let rows = sqlx::query_as::<_, ScanRow>(&format!(
            "SELECT {} FROM scans ORDER BY id",
            SCAN_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(|row| ScanRecord::try_from(row).map(Arc::new))
            .collect()
    }

    async fn len(&self) -> AppResult<usize> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM scans")
            .fetch_one(&self.db)
            .await?;
        Ok(count.max(0) as usize)
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
