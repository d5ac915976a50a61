//! Mobile-money phone number validation.
//!
//! The payment provider only accepts Kenyan MSISDNs in international format
//! without the leading `+`: the `254` country prefix followed by exactly
//! nine digits (e.g. `254712345678`).

use std::sync::OnceLock;

use regex::Regex;

use crate::error::CoreError;

/// `254` followed by nine digits, nothing else.
const PHONE_PATTERN: &str = r"^254\d{9}$";

fn phone_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(PHONE_PATTERN).expect("phone pattern is valid"))
}

/// Validate a phone number for payment initiation.
///
/// Returns [`CoreError::Validation`] with a user-facing message on mismatch.
pub fn validate_phone_number(phone: &str) -> Result<(), CoreError> {
    if phone_regex().is_match(phone) {
        Ok(())
    } else {
        Err(CoreError::Validation(
            "Invalid phone number. Expected format: 254XXXXXXXXX".to_string(),
        ))
    }
}
