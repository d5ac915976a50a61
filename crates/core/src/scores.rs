//! Score parsing for order completion.
//!
//! Scores arrive as multipart text fields from the admin form. Completion
//! requires both the AI and similarity scores to be present, non-empty, and
//! numeric percentages.

use crate::error::CoreError;

/// Parse a single score field.
///
/// `label` names the field in the error message (`"ai_score"` /
/// `"sim_score"`). Empty or whitespace-only input fails validation, as does
/// anything outside 0–100.
pub fn parse_score(label: &str, raw: &str) -> Result<i32, CoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(format!("{label} is required")));
    }
    let value: i32 = trimmed
        .parse()
        .map_err(|_| CoreError::Validation(format!("{label} must be a number")))?;
    if !(0..=100).contains(&value) {
        return Err(CoreError::Validation(format!(
            "{label} must be between 0 and 100"
        )));
    }
    Ok(value)
}
