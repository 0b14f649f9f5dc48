//! Validation functions for form values.
//!
//! Functions return an error message if validation fails, None if valid.

use chrono::NaiveDate;

/// Caption shown under a required field left blank.
pub const REQUIRED_MESSAGE: &str = "This field is required";

/// Format used by date fields.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Validate that a required value is non-empty after trimming.
pub fn validate_required(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        Some(REQUIRED_MESSAGE.to_string())
    } else {
        None
    }
}

/// Parse a date field value. Blank values parse to `None`.
pub fn parse_date(value: &str) -> Result<Option<NaiveDate>, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map(Some)
        .map_err(|_| format!("\"{}\" is not a valid date (expected YYYY-MM-DD)", trimmed))
}

/// Validate a new category name against the names already in use.
/// Comparison ignores case and surrounding whitespace.
pub fn validate_category_name<'a>(
    name: &str,
    existing: impl IntoIterator<Item = &'a str>,
) -> Option<String> {
    if let Some(msg) = validate_required(name) {
        return Some(msg);
    }
    let wanted = name.trim().to_lowercase();
    if existing
        .into_iter()
        .any(|n| n.trim().to_lowercase() == wanted)
    {
        Some(format!("A category named \"{}\" already exists", name.trim()))
    } else {
        None
    }
}
