//! Type coercion from instrument text to typed values.
//!
//! Every function here is total: text that does not coerce yields `None`
//! and the caller decides whether that is worth reporting.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Time-of-day layouts the instrument has been seen to write.
const TIME_FORMATS: [&str; 3] = ["%H:%M:%S", "%H:%M:%S%.f", "%H%M%S"];

/// Coerce a channel value to a finite number.
///
/// Empty text, non-numeric text and `NaN`/`inf` spellings all map to `None`.
///
/// # Example
///
/// ```
/// use gasex_tidy::core::transforms::parse_channel;
///
/// assert_eq!(parse_channel(" 12.5 "), Some(12.5));
/// assert_eq!(parse_channel(""), None);
/// assert_eq!(parse_channel("--"), None);
/// ```
pub fn parse_channel(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Parse a time-of-day string such as `09:21:01` or `092101`.
pub fn parse_time_of_day(text: &str) -> Option<NaiveTime> {
    let text = text.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(text, fmt).ok())
}

/// Combine the configured calendar date with a row's time of day.
///
/// Returns `None` when no date is configured or the time does not parse.
pub fn build_timestamp(date: Option<NaiveDate>, time: &str) -> Option<NaiveDateTime> {
    let date = date?;
    parse_time_of_day(time).map(|t| date.and_time(t))
}
