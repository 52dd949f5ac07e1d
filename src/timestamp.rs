//! Wayback Machine timestamp parsing
//!
//! Snapshot timestamps are 14-digit `YYYYMMDDHHMMSS` strings in UTC.

use crate::TimestampError;
use chrono::{DateTime, NaiveDateTime, Utc};

/// Parses a 14-digit Wayback timestamp into a UTC datetime
///
/// # Examples
///
/// ```
/// use chrono::Datelike;
/// use wayback_archiver::timestamp::parse_wayback_timestamp;
///
/// let ts = parse_wayback_timestamp("20230615120000").unwrap();
/// assert_eq!(ts.year(), 2023);
/// assert_eq!(ts.month(), 6);
/// ```
pub fn parse_wayback_timestamp(timestamp: &str) -> Result<DateTime<Utc>, TimestampError> {
    if timestamp.len() != 14 || !timestamp.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TimestampError::Format(timestamp.to_string()));
    }

    NaiveDateTime::parse_from_str(timestamp, "%Y%m%d%H%M%S")
        .map(|naive| naive.and_utc())
        .map_err(|_| TimestampError::OutOfRange(timestamp.to_string()))
}
