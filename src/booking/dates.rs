//! Free-form date interpretation for the booking dialogue
//!
//! Parses user-supplied date expressions ("tomorrow", "next friday",
//! "2025-06-15", "Jun 3") into calendar dates relative to a reference
//! date. Pure functions; the caller supplies today's date so behavior is
//! fully deterministic in tests.

use chrono::{Datelike, Days, NaiveDate, Weekday};

/// Explicit date formats tried in order after the keyword rules.
///
/// chrono's numeric fields accept unpadded digits, so `%m/%d/%Y` also
/// covers `M/d/yyyy` and `%d/%m/%Y` covers `d/M/yyyy`.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%d-%m-%Y"];

/// Weekday names recognized in "next <weekday>" expressions.
const WEEKDAYS: [(&str, Weekday); 7] = [
    ("next monday", Weekday::Mon),
    ("next tuesday", Weekday::Tue),
    ("next wednesday", Weekday::Wed),
    ("next thursday", Weekday::Thu),
    ("next friday", Weekday::Fri),
    ("next saturday", Weekday::Sat),
    ("next sunday", Weekday::Sun),
];

/// Interprets a free-form date expression relative to `reference`
///
/// Recognition order:
/// 1. "today" / "tomorrow" (exact, case-insensitive, trimmed)
/// 2. "next <weekday>" (case-insensitive substring): the next occurrence
///    strictly after `reference`, so "next monday" sent on a Monday means
///    seven days out
/// 3. Explicit formats: ISO `yyyy-MM-dd`, `MM/dd/yyyy`, `dd/MM/yyyy`,
///    `dd-MM-yyyy` (unpadded digits accepted), first successful parse wins
/// 4. Month-day ("Jun 3", "June 3") in the reference year; if that already
///    passed, the user means next year's occurrence
///
/// Whatever rule matched, a resolved date strictly before `reference` is
/// rejected; past dates are never bookable.
///
/// # Arguments
///
/// * `text` - The user's date expression
/// * `reference` - Today's date, used to resolve relative expressions
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use clinicbot::booking::dates::interpret;
///
/// let today = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
/// assert_eq!(interpret("tomorrow", today), NaiveDate::from_ymd_opt(2025, 6, 3));
/// assert_eq!(interpret("gibberish", today), None);
/// ```
pub fn interpret(text: &str, reference: NaiveDate) -> Option<NaiveDate> {
    let resolved = resolve(text, reference)?;
    if resolved < reference {
        return None;
    }
    Some(resolved)
}

/// Applies the recognition rules without the final past-date check.
fn resolve(text: &str, reference: NaiveDate) -> Option<NaiveDate> {
    let trimmed = text.trim();
    let lowered = trimmed.to_lowercase();

    if lowered == "today" {
        return Some(reference);
    }
    if lowered == "tomorrow" {
        return reference.checked_add_days(Days::new(1));
    }

    for (phrase, weekday) in WEEKDAYS {
        if lowered.contains(phrase) {
            return Some(next_weekday(reference, weekday));
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }

    parse_month_day(trimmed, reference)
}

/// The next occurrence of `weekday` strictly after `reference`.
fn next_weekday(reference: NaiveDate, weekday: Weekday) -> NaiveDate {
    let ahead = (weekday.num_days_from_monday() + 7
        - reference.weekday().num_days_from_monday())
        % 7;
    let ahead = if ahead == 0 { 7 } else { ahead };
    reference + Days::new(u64::from(ahead))
}

/// Parses "Jun 3" / "June 3" style input against the reference year,
/// rolling forward a year when the date has already passed.
///
/// chrono's `%B` accepts both full and abbreviated month names.
fn parse_month_day(text: &str, reference: NaiveDate) -> Option<NaiveDate> {
    let candidate = format!("{} {}", text, reference.year());
    let date = NaiveDate::parse_from_str(&candidate, "%B %d %Y").ok()?;
    if date < reference {
        // "Jun 3" in December means next June, not last June.
        return date.with_year(reference.year() + 1);
    }
    Some(date)
}
