//! Timestamp and duration helpers

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

/// Calendar date of a track timestamp (`YYYY-MM-DD`)
pub fn format_date(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d").to_string()
}
