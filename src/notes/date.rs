//! Date header extraction
//!
//! A note is dated by its first heading line of the form `## M/D/YY`.
//! The two-digit year is trusted less than the month and day: it is always
//! forced to the configured year, and the override is logged.

use chrono::Month;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static DATE_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^#{1,6}[ \t]*(\d{1,2})/(\d{1,2})/(\d{2})\b")
        .expect("date heading pattern should compile")
});

/// A calendar date read from a note's heading.
///
/// `year` always equals the configured expected year. When the heading said
/// otherwise, `was_corrected` is set and `original_year` keeps what it said.
/// `day` is only range-checked (1..=31), never against the month's length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExtractedDate {
    pub month: u32,
    pub day: u32,
    pub year: i32,
    pub was_corrected: bool,
    pub original_year: Option<i32>,
}

impl ExtractedDate {
    /// Sortable month key, `YYYY-MM`
    pub fn month_key(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    /// Human-readable month, e.g. `February 2025`
    pub fn month_label(&self) -> String {
        format!("{} {}", month_name(self.month), self.year)
    }
}

/// English month name for 1..=12, `"Unknown"` otherwise.
pub fn month_name(month: u32) -> &'static str {
    u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map(|m| m.name())
        .unwrap_or("Unknown")
}

/// Extract the date from the first `M/D/YY` heading in `content`.
///
/// Returns `None` when no heading matches or when the first match has a
/// month outside 1..=12 or a day outside 1..=31. Never fails otherwise.
pub fn extract_date(content: &str, expected_year: i32) -> Option<ExtractedDate> {
    let caps = DATE_HEADING.captures(content)?;
    let month: u32 = caps[1].parse().ok()?;
    let day: u32 = caps[2].parse().ok()?;
    let yy: i32 = caps[3].parse().ok()?;

    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        tracing::debug!(
            heading = %caps[0].trim(),
            "rejected date heading with out-of-range month or day"
        );
        return None;
    }

    let parsed_year = 2000 + yy;
    let (year, was_corrected, original_year) = if parsed_year != expected_year {
        tracing::info!(
            heading = %caps[0].trim(),
            from = parsed_year,
            to = expected_year,
            "corrected year in date heading"
        );
        (expected_year, true, Some(parsed_year))
    } else {
        (parsed_year, false, None)
    };

    Some(ExtractedDate {
        month,
        day,
        year,
        was_corrected,
        original_year,
    })
}
