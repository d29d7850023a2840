//! Timestamps as the app stores them: epoch milliseconds.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use rusqlite::types::ValueRef;

pub fn now_millis() -> i64 {
    Local::now().timestamp_millis()
}

/// Parse the timestamp forms found in checkpoints and scrape databases:
/// RFC 3339, naive local ISO (with or without fraction), a plain
/// `YYYY-MM-DD HH:MM:SS`, or an integer already in milliseconds.
pub fn parse_millis(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(ms) = s.parse::<i64>() {
        return Some(ms);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|dt| dt.timestamp_millis())
}

/// Read a timestamp column whatever its storage class.
pub(crate) fn millis_value(value: ValueRef<'_>) -> Option<i64> {
    match value {
        ValueRef::Integer(i) => Some(i),
        ValueRef::Real(f) => Some(f as i64),
        ValueRef::Text(t) => std::str::from_utf8(t).ok().and_then(parse_millis),
        ValueRef::Null | ValueRef::Blob(_) => None,
    }
}
