//! Date formatting shared by the views.

use chrono::{DateTime, Utc};

/// Label used when a post has no readable timestamp.
pub const UNKNOWN_DATE: &str = "Unknown";

/// Card date such as `19 Oct 2026`, or `Unknown`.
///
/// # Examples
/// ```
/// use blogverse::views::short_date;
/// use chrono::{TimeZone, Utc};
///
/// let ts = Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).single();
/// assert_eq!(short_date(ts), "19 Oct 2026");
/// assert_eq!(short_date(None), "Unknown");
/// ```
pub fn short_date(timestamp: Option<DateTime<Utc>>) -> String {
    timestamp.map_or_else(
        || UNKNOWN_DATE.to_owned(),
        |ts| ts.format("%-d %b %Y").to_string(),
    )
}

/// Detail page date such as `19 October 2026`.
pub fn long_date(timestamp: Option<DateTime<Utc>>) -> Option<String> {
    timestamp.map(|ts| ts.format("%-d %B %Y").to_string())
}
