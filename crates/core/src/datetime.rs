//! Spreadsheet date-serial decoding.
//!
//! Spreadsheets store dates as a count of days since 1899-12-30, with the
//! time of day as the fractional part. Values that look like such a serial
//! are rendered as fixed-width `DD/MM/YYYY HH:MM:SS` strings; anything that
//! fails to decode keeps its raw value.

use crate::options::MergeOptions;
use crate::value::CellValue;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::fmt::Write;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Nudges fractions like 0.49999999 up to the intended second.
const FRACTION_EPSILON: f64 = 0.000_000_1;

/// Day zero of the 1900 date system, as used by every mainstream spreadsheet.
fn epoch() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1899, 12, 30)
}

/// Convert a date serial to a calendar date-time.
///
/// Returns `None` if the serial is not finite or falls outside chrono's range.
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }

    let whole_days = serial.floor();
    // A fraction within the epsilon of a whole day rounds up to the next midnight
    let seconds = (SECONDS_PER_DAY * (serial - whole_days + FRACTION_EPSILON)).floor() as i64;

    let date = epoch()?.checked_add_signed(Duration::try_days(whole_days as i64)?)?;
    date.and_hms_opt(0, 0, 0)?
        .checked_add_signed(Duration::try_seconds(seconds)?)
}

/// Whether a number falls in the configured date-serial window.
pub fn is_date_serial(value: f64, options: &MergeOptions) -> bool {
    value > options.min_date_serial && value <= options.max_date_serial
}

/// Normalize one cell value for the merged output.
///
/// Numbers inside the date-serial window become formatted date strings;
/// everything else passes through unchanged.
pub fn normalize(value: &CellValue, options: &MergeOptions) -> CellValue {
    let Some(n) = value.as_number() else {
        return value.clone();
    };

    if !options.decode_dates || !is_date_serial(n, options) {
        return value.clone();
    }

    match serial_to_datetime(n).and_then(|dt| format_datetime(&dt, &options.date_format)) {
        Some(text) => CellValue::Text(text),
        None => {
            tracing::trace!(serial = n, "date serial did not decode, keeping raw value");
            value.clone()
        }
    }
}

/// Format without panicking on a malformed format string.
fn format_datetime(dt: &NaiveDateTime, pattern: &str) -> Option<String> {
    let mut out = String::new();
    write!(out, "{}", dt.format(pattern)).ok()?;
    Some(out)
}
