//! Validation utilities for the Dining Waste Tracker

use chrono::NaiveDate;

/// Longest accepted school or student identifier
pub const MAX_IDENTIFIER_LEN: usize = 64;

/// Validate a school or student identifier
pub fn validate_identifier(id: &str) -> Result<(), &'static str> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err("Identifier cannot be empty");
    }
    if trimmed.len() > MAX_IDENTIFIER_LEN {
        return Err("Identifier must be at most 64 characters");
    }
    if trimmed.chars().any(char::is_control) {
        return Err("Identifier cannot contain control characters");
    }
    Ok(())
}

/// Parse a `YYYY-MM-DD` report date
pub fn parse_report_date(raw: &str) -> Result<NaiveDate, &'static str> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| "Date must be YYYY-MM-DD")
}

/// Blank optional identifiers are treated as absent
pub fn normalize_optional_id(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
