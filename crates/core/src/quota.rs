//! Daily upload quota arithmetic.
//!
//! The counter itself lives in the `daily_limits` table and is advanced with
//! an atomic conditional update (see `DailyLimitRepo::try_admit`); the
//! helpers here cover the read-side arithmetic and the admin "remaining
//! slots today" edit form.

/// Remaining uploads for today, clamped at zero.
///
/// The cap can legitimately sit below current usage when an admin lowers it
/// mid-day, so the subtraction must not go negative.
pub fn remaining(max_uploads: i32, current_uploads: i32) -> i32 {
    (max_uploads - current_uploads).max(0)
}

/// Convert a "remaining slots today" edit into an absolute cap.
///
/// Setting remaining = R at usage = U must always yield `max = U + R`,
/// regardless of any earlier edits made the same day — the conversion is a
/// function of current usage only, so repeating it is idempotent.
pub fn max_from_remaining(current_uploads: i32, remaining_today: i32) -> i32 {
    current_uploads + remaining_today
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_clamps_at_zero() {
        assert_eq!(remaining(10, 3), 7);
        assert_eq!(remaining(5, 5), 0);
        assert_eq!(remaining(2, 6), 0);
    }

    #[test]
    fn remaining_edit_adds_to_usage() {
        // Admin sets "10 remaining" while 3 uploads already happened today.
        assert_eq!(max_from_remaining(3, 10), 13);
    }

    #[test]
    fn remaining_edit_is_idempotent() {
        let max = max_from_remaining(3, 10);
        // A second identical edit at the same usage must not double-count.
        assert_eq!(max_from_remaining(3, 10), max);
    }
}
