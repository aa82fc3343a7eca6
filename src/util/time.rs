//! Time helpers, in the style of `garage_util::time` (`now_msec`,
//! `msec_to_rfc3339`): a couple of small free functions rather than a
//! wrapper type, used at every call site that needs "now" or needs to
//! format/parse the cluster's listing timestamps.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, SecondsFormat, Utc};

/// Milliseconds since the Unix epoch, wall-clock.
pub fn now_msec() -> u64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("system clock is before the Unix epoch")
		.as_millis() as u64
}

/// Microseconds since the Unix epoch, wall-clock.
fn now_usec() -> u64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("system clock is before the Unix epoch")
		.as_micros() as u64
}

/// Format a millisecond timestamp the way listing entries carry
/// `last_modified`: ISO-8601 with microsecond precision and no timezone
/// suffix, e.g. `2024-01-15T00:00:00.000000`.
pub fn msec_to_listing_timestamp(msec: u64) -> String {
	let dt = DateTime::<Utc>::from(UNIX_EPOCH + std::time::Duration::from_millis(msec));
	let s = dt.to_rfc3339_opts(SecondsFormat::Micros, true);
	// Drop the trailing "Z" that `to_rfc3339_opts` appends: listing
	// timestamps in this cluster format carry no timezone suffix.
	s.trim_end_matches('Z').to_string()
}

/// Parse a listing entry's `last_modified` field back into milliseconds
/// since the epoch. Returns `None` if the value isn't a recognizable
/// ISO-8601 timestamp; callers should treat that the same as a missing
/// `last_modified`.
pub fn parse_listing_timestamp(s: &str) -> Option<u64> {
	let with_tz = format!("{}Z", s);
	DateTime::parse_from_rfc3339(&with_tz)
		.ok()
		.map(|dt| dt.timestamp_millis().max(0) as u64)
}

/// The first 10 characters of a listing timestamp, i.e. its `YYYY-MM-DD`
/// date prefix, used as the histogram key for `missing_by_day` /
/// `potentially_missing_by_day`.
pub fn date_prefix(listing_timestamp: &str) -> String {
	listing_timestamp.chars().take(10).collect()
}

static LAST_INTERNAL_TIMESTAMP_USEC: AtomicU64 = AtomicU64::new(0);

/// Produce the cluster's internal timestamp format (`X-Timestamp`
/// header value): seconds since the epoch with 5 decimal digits of
/// sub-second precision, e.g. `1704931200.00000`.
///
/// Strictly increasing within one process even when called back to back
/// faster than the clock's resolution, the same guarantee Swift's own
/// `Timestamp` helper gives callers that need a fresh delete marker that
/// is provably newer than whatever the container currently holds.
pub fn internal_timestamp_now() -> String {
	let now = now_usec();
	let mut stored = 0;
	LAST_INTERNAL_TIMESTAMP_USEC
		.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
			stored = std::cmp::max(now, last + 1);
			Some(stored)
		})
		.unwrap();
	format_internal_timestamp(stored)
}

fn format_internal_timestamp(usec: u64) -> String {
	format!("{}.{:05}", usec / 1_000_000, (usec % 1_000_000) / 10)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn listing_timestamp_roundtrip() {
		let msec = 1_705_276_800_123; // 2024-01-15T00:00:00.123
		let s = msec_to_listing_timestamp(msec);
		assert_eq!(s, "2024-01-15T00:00:00.123000");
		assert_eq!(parse_listing_timestamp(&s), Some(msec));
	}

	#[test]
	fn date_prefix_is_first_ten_chars() {
		assert_eq!(date_prefix("2024-01-15T00:00:00.000000"), "2024-01-15");
	}

	#[test]
	fn internal_timestamps_strictly_increase() {
		let a = internal_timestamp_now();
		let b = internal_timestamp_now();
		let c = internal_timestamp_now();
		assert!(a < b);
		assert!(b < c);
	}
}
