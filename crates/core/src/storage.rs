//! Stored-filename namespacing for uploads and reports.
//!
//! Files on disk are namespaced so that concurrent uploads of the same
//! document never collide and so ownership can be traced back from a bare
//! filename:
//!
//! - document uploads:  `{user_id}_{unix_ts}_{original_name}`
//! - admin reports:     `report_{order_id}_{unix_ts}_{original_name}`
//!
//! The internal prefix must never leak into user-visible names; downloads
//! advertise the original name via `Content-Disposition`.

use crate::error::CoreError;
use crate::types::DbId;

/// Prefix marking admin-attached report files.
const REPORT_PREFIX: &str = "report_";

/// Maximum accepted upload size: 10 MB.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Reject uploads larger than [`MAX_UPLOAD_BYTES`].
pub fn validate_upload_size(size: usize) -> Result<(), CoreError> {
    if size > MAX_UPLOAD_BYTES {
        return Err(CoreError::Validation(
            "File too large. Maximum size is 10 MB".to_string(),
        ));
    }
    Ok(())
}

/// Build the stored name for a user-uploaded document.
pub fn stored_upload_name(user_id: DbId, unix_ts: i64, original: &str) -> String {
    format!("{user_id}_{unix_ts}_{original}")
}

/// Build the stored name for an admin-attached report.
pub fn stored_report_name(order_id: DbId, unix_ts: i64, original: &str) -> String {
    format!("{REPORT_PREFIX}{order_id}_{unix_ts}_{original}")
}

/// Recover the human-readable original name from a stored filename.
///
/// Strips the `{user_id}_{ts}_` or `report_{order_id}_{ts}_` prefix. A name
/// that does not match either pattern is returned unchanged — better to show
/// a namespaced name than to fail a download over cosmetics.
pub fn display_name(stored: &str) -> &str {
    let without_report = stored.strip_prefix(REPORT_PREFIX).unwrap_or(stored);
    strip_numeric_prefix(without_report, 2).unwrap_or(stored)
}

/// Drop `count` leading underscore-separated segments, provided each is all
/// digits. Returns `None` when the pattern does not match.
fn strip_numeric_prefix(name: &str, count: usize) -> Option<&str> {
    let mut rest = name;
    for _ in 0..count {
        let (segment, tail) = rest.split_once('_')?;
        if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        rest = tail;
    }
    if rest.is_empty() {
        None
    } else {
        Some(rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_name_round_trips() {
        let stored = stored_upload_name(3, 1765899518, "essay.docx");
        assert_eq!(stored, "3_1765899518_essay.docx");
        assert_eq!(display_name(&stored), "essay.docx");
    }

    #[test]
    fn report_name_round_trips() {
        let stored = stored_report_name(12, 1765899518, "similarity.pdf");
        assert_eq!(stored, "report_12_1765899518_similarity.pdf");
        assert_eq!(display_name(&stored), "similarity.pdf");
    }

    #[test]
    fn original_with_underscores_survives() {
        let stored = stored_upload_name(7, 1700000000, "my_final_draft.docx");
        assert_eq!(display_name(&stored), "my_final_draft.docx");
    }

    #[test]
    fn unnamespaced_name_passes_through() {
        assert_eq!(display_name("essay.docx"), "essay.docx");
        assert_eq!(display_name("not_a_match.pdf"), "not_a_match.pdf");
    }

    #[test]
    fn size_gate() {
        assert!(validate_upload_size(MAX_UPLOAD_BYTES).is_ok());
        assert!(validate_upload_size(MAX_UPLOAD_BYTES + 1).is_err());
    }
}
