//! Timestamp value generators.

use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use rndb_core::Value;

/// Generate a random timestamp, at second precision, in the given range.
///
/// The start and end are RFC 3339 timestamps or `YYYY-MM-DD` dates. An
/// unparseable bound collapses the range onto the other one; with neither
/// parseable the value is null. The current time is never consulted.
pub fn generate_timestamp_range<R: Rng + ?Sized>(rng: &mut R, start: &str, end: &str) -> Value {
    match (parse_timestamp(start), parse_timestamp(end)) {
        (Some(start), Some(end)) => {
            let start_ts = start.timestamp();
            let end_ts = end.timestamp();

            if start_ts >= end_ts {
                Value::DateTime(start)
            } else {
                let random_ts = rng.gen_range(start_ts..=end_ts);
                let dt = DateTime::from_timestamp(random_ts, 0).unwrap_or(start);
                Value::DateTime(dt)
            }
        }
        (Some(dt), None) | (None, Some(dt)) => Value::DateTime(dt),
        (None, None) => Value::Null,
    }
}

/// Parse a timestamp string in various formats.
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }

    None
}
