//! Scan submission handler

use axum::{
    extract::{Multipart, Query, State},
    Json,
};
use serde::Deserialize;
use shared::{normalize_optional_id, validate_identifier, ScanResponse};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::scan::ScanSubmitter;
use crate::AppState;

/// Upload size limit for one scan request (two images)
pub const MAX_SCAN_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Identifiers may also arrive on the query string; form fields win
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ScanQuery {
    #[validate(length(min = 1, max = 64))]
    pub student_id: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub school_id: Option<String>,
}

#[derive(Default)]
struct ScanForm {
    before_image: Option<Vec<u8>>,
    after_image: Option<Vec<u8>>,
    student_id: Option<String>,
    school_id: Option<String>,
}

async fn read_form(mut multipart: Multipart) -> AppResult<ScanForm> {
    let mut form = ScanForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::ValidationError(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "before_image" | "after_image" => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::validation(&name, e.to_string()))?;
                if name == "before_image" {
                    form.before_image = Some(data.to_vec());
                } else {
                    form.after_image = Some(data.to_vec());
                }
            }
            "student_id" | "school_id" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::validation(&name, e.to_string()))?;
                if name == "student_id" {
                    form.student_id = Some(text);
                } else {
                    form.school_id = Some(text);
                }
            }
            other => tracing::debug!("Ignoring multipart field '{}'", other),
        }
    }

    Ok(form)
}

fn checked_id(field: &str, value: Option<String>) -> AppResult<Option<String>> {
    let value = normalize_optional_id(value);
    if let Some(id) = &value {
        validate_identifier(id).map_err(|msg| AppError::validation(field, msg))?;
    }
    Ok(value)
}

/// Submit a before/after plate pair
pub async fn submit_scan(
    State(state): State<AppState>,
    Query(query): Query<ScanQuery>,
    multipart: Multipart,
) -> AppResult<Json<ScanResponse>> {
    query.validate()?;
    let form = read_form(multipart).await?;

    let before = form
        .before_image
        .ok_or_else(|| AppError::validation("before_image", "before_image is required"))?;
    let after = form
        .after_image
        .ok_or_else(|| AppError::validation("after_image", "after_image is required"))?;

    let student_id = checked_id("student_id", form.student_id.or(query.student_id))?;
    let school_id = checked_id("school_id", form.school_id.or(query.school_id))?
        .unwrap_or_else(|| state.config.reporting.default_school_id.clone());

    let response = state
        .scans
        .submit(
            &before,
            &after,
            ScanSubmitter {
                school_id,
                student_id,
            },
        )
        .await?;

    Ok(Json(response))
}
