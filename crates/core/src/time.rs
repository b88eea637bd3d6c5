//! Conversions between instants and fractional hours.

use chrono::Duration;
use crate::Time;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Signed number of hours from `from` to `to`.
pub fn hours_between(from: Time, to: Time) -> f64 {
    (to - from).num_milliseconds() as f64 / MILLIS_PER_HOUR
}

/// Convert fractional hours to a duration.
///
/// Returns `None` for non-finite values and for spans chrono cannot hold.
pub fn duration_from_hours(hours: f64) -> Option<Duration> {
    if !hours.is_finite() {
        return None;
    }
    let millis = (hours * MILLIS_PER_HOUR).round();
    // Leave headroom so the later checked add can still fail cleanly.
    if millis.abs() >= (i64::MAX / 2) as f64 {
        return None;
    }
    Some(Duration::milliseconds(millis as i64))
}

/// `at + hours`, or `None` if the result is out of range.
pub fn add_hours(at: Time, hours: f64) -> Option<Time> {
    at.checked_add_signed(duration_from_hours(hours)?)
}
