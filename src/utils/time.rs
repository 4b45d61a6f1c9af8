//! Conversion between timestamps and milliseconds since the Unix epoch
//!
//! Datastore entities and client requests carry times as integer epoch
//! milliseconds; everything else works with `chrono` values.

use crate::error::TimeError;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

const NANOS_PER_MILLI: i128 = 1_000_000;

/// Convert a timezone-aware timestamp to epoch milliseconds
///
/// Rounds to the nearest millisecond, with ties going away from zero. The
/// arithmetic runs on the exact nanosecond count, so no precision is lost to
/// floating point.
pub fn ms_from_datetime<Tz: TimeZone>(dt: &DateTime<Tz>) -> i64 {
    // timestamp() is floored, so subsec nanos are always non-negative
    let nanos =
        i128::from(dt.timestamp()) * 1_000_000_000 + i128::from(dt.timestamp_subsec_nanos());
    let half = NANOS_PER_MILLI / 2;
    let rounded = if nanos >= 0 {
        (nanos + half) / NANOS_PER_MILLI
    } else {
        (nanos - half) / NANOS_PER_MILLI
    };
    // chrono's range is a few hundred thousand years, well inside i64 millis
    rounded as i64
}

/// Convert epoch milliseconds to a UTC timestamp
pub fn datetime_from_ms(ms: i64) -> Result<DateTime<Utc>, TimeError> {
    DateTime::from_timestamp_millis(ms).ok_or(TimeError::OutOfRange { ms })
}

/// Parse an RFC 3339 timestamp and convert it to epoch milliseconds
///
/// Timestamps without an offset are rejected rather than assumed to be UTC
/// or local time.
pub fn ms_from_rfc3339(value: &str) -> Result<i64, TimeError> {
    match DateTime::parse_from_rfc3339(value) {
        Ok(dt) => Ok(ms_from_datetime(&dt)),
        Err(e) => {
            if is_naive(value) {
                Err(TimeError::MissingTimezone {
                    value: value.to_string(),
                })
            } else {
                Err(TimeError::Parse {
                    value: value.to_string(),
                    message: e.to_string(),
                })
            }
        }
    }
}

fn is_naive(value: &str) -> bool {
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .any(|fmt| NaiveDateTime::parse_from_str(value, fmt).is_ok())
}
