//! Clock-time validation for the booking dialogue
//!
//! Accepts 12-hour times such as "10:00 AM" or "2:30 pm" and normalizes
//! the meridiem marker to upper case. No timezone interpretation.

use regex::Regex;
use std::sync::OnceLock;

/// 12-hour clock: 1-2 digit hour 01-12, two-digit minutes 00-59,
/// optional space, AM/PM in any case.
const TIME_PATTERN: &str = r"^(0?[1-9]|1[0-2]):[0-5]\d ?([AaPp][Mm])$";

fn time_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(TIME_PATTERN).expect("Invalid time pattern"))
}

/// Validates a clock-time string, returning its normalized form
///
/// The accepted shape is exactly: 1-2 digit hour (01-12, leading zero
/// optional), colon, two-digit minutes (00-59), optional single space,
/// AM/PM marker in any case. On success the input is returned with the
/// meridiem upper-cased; anything else is `None`.
///
/// # Examples
///
/// ```
/// use clinicbot::booking::times::validate;
///
/// assert_eq!(validate("2:30 pm"), Some("2:30 PM".to_string()));
/// assert_eq!(validate("25:00"), None);
/// ```
pub fn validate(text: &str) -> Option<String> {
    if time_regex().is_match(text) {
        Some(text.to_uppercase())
    } else {
        None
    }
}
