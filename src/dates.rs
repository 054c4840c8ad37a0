//! # Date Matching
//!
//! Catalog entries and streaming metadata both carry release dates, but in
//! wildly different shapes: `"1975"`, `"1975-05-01"`, `"1975-05"`, or nothing
//! usable at all. Only the year is compared, and an unreadable year never
//! blocks a match unless the caller asks for strictness.

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

lazy_static! {
    static ref YEAR_PATTERN: Regex = Regex::new(r"[0-9]{4}").expect("year pattern is valid");
}

/// Compare two free-form date strings by year.
///
/// Returns `allow_fail` when either year cannot be determined, otherwise
/// whether both years are equal.
///
/// # Examples
///
/// ```
/// use liveskipper::dates::dates_fit;
///
/// assert!(dates_fit("1975-05-01", "1975", true));
/// assert!(!dates_fit("1975", "1976", true));
/// assert!(dates_fit("unknown", "1975", true));
/// assert!(!dates_fit("unknown", "1975", false));
/// ```
#[must_use]
pub fn dates_fit(date_a: &str, date_b: &str, allow_fail: bool) -> bool {
    let year_a = extract_year(date_a);
    let year_b = extract_year(date_b);

    if year_a == 0 || year_b == 0 {
        return allow_fail;
    }
    year_a == year_b
}

/// Extract the year of a date string, 0 meaning unknown.
///
/// Four-character inputs are taken as the year verbatim; anything else is
/// searched for its first run of four digits.
#[must_use]
pub fn extract_year(date: &str) -> i32 {
    let candidate = if date.chars().count() == 4 {
        date
    } else {
        match YEAR_PATTERN.find(date) {
            Some(m) => m.as_str(),
            None => {
                debug!("Weird date: {date}");
                return 0;
            }
        }
    };

    match candidate.parse::<i32>() {
        Ok(year) => year,
        Err(_) => {
            debug!("Weird date: {date}");
            0
        }
    }
}
