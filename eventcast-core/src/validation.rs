//! Input validation for the location search form.
//!
//! All checks are pure. Date checks take an explicit `today` in their `_on`
//! variants so callers (and tests) can pin the calendar; the plain variants
//! use the local date.

use chrono::{Days, Local, NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

pub const MIN_LOCATION_LEN: usize = 2;
pub const MAX_LOCATION_LEN: usize = 100;

/// How far ahead a forecast date may be, in days from today.
pub const MAX_FORECAST_DAYS: u64 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Location is required")]
    Required,
    #[error("Location must be at least 2 characters")]
    TooShort,
    #[error("Location must be less than 100 characters")]
    TooLong,
    #[error("Location must contain at least one letter")]
    MissingLetter,
    #[error("Location contains invalid characters")]
    InvalidCharacters,
    #[error("Invalid date")]
    InvalidDate,
    #[error("Date cannot be in the past")]
    InPast,
    #[error("Date cannot be more than 14 days in the future")]
    TooFarAhead,
}

impl ValidationError {
    /// True for the variants produced by location checks.
    pub fn is_location_error(&self) -> bool {
        matches!(
            self,
            Self::Required
                | Self::TooShort
                | Self::TooLong
                | Self::MissingLetter
                | Self::InvalidCharacters
        )
    }
}

pub type ValidationResult = Result<(), ValidationError>;

/// Check a free-form location string. The first failing rule wins.
pub fn validate_location(location: &str) -> ValidationResult {
    let trimmed = location.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required);
    }

    let len = trimmed.chars().count();
    if len < MIN_LOCATION_LEN {
        return Err(ValidationError::TooShort);
    }
    if len > MAX_LOCATION_LEN {
        return Err(ValidationError::TooLong);
    }

    if !trimmed.chars().any(|c| c.is_ascii_alphabetic()) {
        return Err(ValidationError::MissingLetter);
    }

    if !trimmed.chars().all(is_allowed_location_char) {
        return Err(ValidationError::InvalidCharacters);
    }

    Ok(())
}

fn is_allowed_location_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || c.is_whitespace()
        || matches!(c, '-' | '\'' | ',' | '.')
        || ('\u{00C0}'..='\u{017F}').contains(&c)
}

/// Check a forecast date against the local calendar.
pub fn validate_date(date: NaiveDateTime) -> ValidationResult {
    validate_date_on(date, Local::now().date_naive())
}

/// Check a forecast date against `today`. Time of day is ignored on both sides.
pub fn validate_date_on(date: NaiveDateTime, today: NaiveDate) -> ValidationResult {
    let selected = date.date();

    if selected < today {
        return Err(ValidationError::InPast);
    }

    let max_date = today
        .checked_add_days(Days::new(MAX_FORECAST_DAYS))
        .ok_or(ValidationError::InvalidDate)?;

    if selected > max_date {
        return Err(ValidationError::TooFarAhead);
    }

    Ok(())
}

/// Location first; the date is only looked at once the location passes.
pub fn validate_inputs(location: &str, date: NaiveDateTime) -> ValidationResult {
    validate_inputs_on(location, date, Local::now().date_naive())
}

pub fn validate_inputs_on(location: &str, date: NaiveDateTime, today: NaiveDate) -> ValidationResult {
    validate_location(location)?;
    validate_date_on(date, today)
}

/// Parse a user-supplied date, either `YYYY-MM-DD` (midnight) or
/// `YYYY-MM-DDTHH:MM[:SS]`.
pub fn parse_date(input: &str) -> Result<NaiveDateTime, ValidationError> {
    let input = input.trim();

    if let Ok(day) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(day.and_time(NaiveTime::MIN));
    }

    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .ok_or(ValidationError::InvalidDate)
}

/// Trim, collapse whitespace runs and strip non-alphanumeric edges.
pub fn sanitize_location(location: &str) -> String {
    let collapsed = location.split_whitespace().collect::<Vec<_>>().join(" ");

    collapsed
        .trim_matches(|c: char| !c.is_ascii_alphanumeric())
        .to_string()
}

pub fn format_validation_error(error: &ValidationError) -> String {
    format!("⚠️ {error}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn at(date: NaiveDate, h: u32, min: u32) -> NaiveDateTime {
        date.and_hms_opt(h, min, 0).expect("valid time")
    }

    #[test]
    fn empty_and_blank_locations_are_required() {
        assert_eq!(validate_location(""), Err(ValidationError::Required));
        assert_eq!(validate_location("   "), Err(ValidationError::Required));
        assert_eq!(validate_location("\t\n"), Err(ValidationError::Required));
    }

    #[test]
    fn location_length_bounds() {
        assert_eq!(validate_location("A"), Err(ValidationError::TooShort));
        assert_eq!(validate_location("  A  "), Err(ValidationError::TooShort));
        assert_eq!(validate_location("Ab"), Ok(()));

        let hundred = "a".repeat(100);
        assert_eq!(validate_location(&hundred), Ok(()));

        let too_long = "a".repeat(101);
        assert_eq!(validate_location(&too_long), Err(ValidationError::TooLong));
    }

    #[test]
    fn location_needs_a_letter() {
        assert_eq!(validate_location("123"), Err(ValidationError::MissingLetter));
        assert_eq!(validate_location("--"), Err(ValidationError::MissingLetter));
    }

    #[test]
    fn location_character_set() {
        assert_eq!(validate_location("New York, NY"), Ok(()));
        assert_eq!(validate_location("St. John's"), Ok(()));
        assert_eq!(validate_location("Saint-Étienne"), Ok(()));
        assert_eq!(validate_location("Kraków"), Ok(()));
        assert_eq!(validate_location("New$York"), Err(ValidationError::InvalidCharacters));
        assert_eq!(validate_location("Paris!"), Err(ValidationError::InvalidCharacters));
    }

    #[test]
    fn too_long_wins_over_invalid_characters() {
        let input = format!("{}$", "a".repeat(120));
        assert_eq!(validate_location(&input), Err(ValidationError::TooLong));
    }

    #[test]
    fn date_window_is_day_granular() {
        let today = day(2026, 3, 10);

        assert_eq!(
            validate_date_on(at(day(2026, 3, 9), 23, 59), today),
            Err(ValidationError::InPast)
        );
        assert_eq!(validate_date_on(at(today, 0, 0), today), Ok(()));
        assert_eq!(validate_date_on(at(today, 23, 59), today), Ok(()));
        assert_eq!(validate_date_on(at(day(2026, 3, 24), 23, 0), today), Ok(()));
        assert_eq!(
            validate_date_on(at(day(2026, 3, 25), 0, 0), today),
            Err(ValidationError::TooFarAhead)
        );
    }

    #[test]
    fn date_window_against_local_today() {
        let now = Local::now().naive_local();
        let yesterday = now - chrono::Duration::days(1);

        assert_eq!(validate_date(yesterday), Err(ValidationError::InPast));
        assert_eq!(validate_date(now), Ok(()));
        assert_eq!(validate_date(now + chrono::Duration::days(14)), Ok(()));
        assert_eq!(
            validate_date(now + chrono::Duration::days(15)),
            Err(ValidationError::TooFarAhead)
        );
    }

    #[test]
    fn inputs_report_location_before_date() {
        let today = day(2026, 3, 10);
        let past = at(day(2026, 1, 1), 12, 0);

        assert_eq!(
            validate_inputs_on("1", past, today),
            Err(ValidationError::MissingLetter)
        );
        assert_eq!(
            validate_inputs_on("Amsterdam", past, today),
            Err(ValidationError::InPast)
        );
        assert_eq!(validate_inputs_on("Amsterdam", at(today, 8, 0), today), Ok(()));
    }

    #[test]
    fn parse_date_formats() {
        assert_eq!(parse_date("2026-03-10"), Ok(at(day(2026, 3, 10), 0, 0)));
        assert_eq!(parse_date(" 2026-03-10T14:30 "), Ok(at(day(2026, 3, 10), 14, 30)));
        assert_eq!(parse_date("2026-02-30"), Err(ValidationError::InvalidDate));
        assert_eq!(parse_date("tomorrow"), Err(ValidationError::InvalidDate));
    }

    #[test]
    fn sanitize_collapses_and_strips() {
        assert_eq!(sanitize_location("  New   York!! "), "New York");
        assert_eq!(sanitize_location("...Paris, France."), "Paris, France");
        assert_eq!(sanitize_location("!!!"), "");
    }

    #[test]
    fn sanitize_is_idempotent() {
        for raw in ["  New   York!! ", " -- a \t b -- ", "Zürich ", "'s-Hertogenbosch", ""] {
            let once = sanitize_location(raw);
            assert_eq!(sanitize_location(&once), once, "input: {raw:?}");
        }
    }

    #[test]
    fn error_banner_and_classification() {
        assert_eq!(
            format_validation_error(&ValidationError::Required),
            "⚠️ Location is required"
        );
        assert!(ValidationError::TooShort.is_location_error());
        assert!(!ValidationError::InPast.is_location_error());
    }
}
