//! Stats Reporter (SPEC_FULL §4.8): counters and day-bucketed histograms
//! mutated from worker tasks and read back by the periodic snapshot,
//! the human-readable report, and the invariant checks in SPEC_FULL §8.
//! A single struct instead of module-level globals, per the "process
//! scoped state" design note (SPEC_FULL §9).

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

#[derive(Debug, Default, Clone)]
struct Counters {
	accounts_checked: u64,
	accounts_failed: u64,
	containers_checked: u64,
	containers_failed: u64,
	objects_checked: u64,
	missing_objects: u64,
	objects_deleted: u64,
	potentially_missing: u64,
	account_objects_checked: u64,
	account_objs_estimate: Option<u64>,
	missing_by_day: HashMap<String, u64>,
	potentially_missing_by_day: HashMap<String, u64>,
	latest_missing_day: Option<String>,
}

pub struct StatsReporter {
	counters: Mutex<Counters>,
	started_at: Instant,
}

/// A read-only copy of the counters at one instant, for printing or for
/// assertions in tests.
#[derive(Debug, Clone)]
pub struct StatsSnapshot {
	pub accounts_checked: u64,
	pub accounts_failed: u64,
	pub containers_checked: u64,
	pub containers_failed: u64,
	pub objects_checked: u64,
	pub missing_objects: u64,
	pub objects_deleted: u64,
	pub potentially_missing: u64,
	pub account_objects_checked: u64,
	pub account_objs_estimate: Option<u64>,
	pub missing_by_day: HashMap<String, u64>,
	pub potentially_missing_by_day: HashMap<String, u64>,
	pub latest_missing_day: Option<String>,
	pub objects_per_second: f64,
}

impl Default for StatsReporter {
	fn default() -> Self {
		Self::new()
	}
}

impl StatsReporter {
	pub fn new() -> Self {
		StatsReporter {
			counters: Mutex::new(Counters::default()),
			started_at: Instant::now(),
		}
	}

	pub fn inc_accounts_checked(&self) {
		self.counters.lock().unwrap().accounts_checked += 1;
	}

	pub fn inc_accounts_failed(&self) {
		self.counters.lock().unwrap().accounts_failed += 1;
	}

	pub fn inc_containers_checked(&self) {
		self.counters.lock().unwrap().containers_checked += 1;
	}

	pub fn inc_containers_failed(&self) {
		self.counters.lock().unwrap().containers_failed += 1;
	}

	pub fn inc_objects_checked(&self) {
		let mut c = self.counters.lock().unwrap();
		c.objects_checked += 1;
		c.account_objects_checked += 1;
	}

	pub fn reset_account_objects_checked(&self) {
		self.counters.lock().unwrap().account_objects_checked = 0;
	}

	pub fn set_account_objs_estimate(&self, count: u64) {
		self.counters.lock().unwrap().account_objs_estimate = Some(count);
	}

	/// Records a confirmed-missing object, keyed by the date prefix of
	/// `last_modified` (SPEC_FULL §4.8). `last_modified` of `None` (no
	/// listing entry ever matched) is not bucketed into a day, matching
	/// the "or literal not-in-listing" case in SPEC_FULL §6.
	pub fn record_missing(&self, last_modified: Option<&str>) {
		let mut c = self.counters.lock().unwrap();
		c.missing_objects += 1;
		if let Some(lm) = last_modified {
			let day = auditor_util::time::date_prefix(lm);
			*c.missing_by_day.entry(day.clone()).or_insert(0) += 1;
			c.latest_missing_day = Some(match c.latest_missing_day.take() {
				Some(prev) if prev >= day => prev,
				_ => day,
			});
		}
	}

	pub fn record_potentially_missing(&self, last_modified: Option<&str>) {
		let mut c = self.counters.lock().unwrap();
		c.potentially_missing += 1;
		if let Some(lm) = last_modified {
			let day = auditor_util::time::date_prefix(lm);
			*c.potentially_missing_by_day.entry(day).or_insert(0) += 1;
		}
	}

	pub fn inc_objects_deleted(&self) {
		self.counters.lock().unwrap().objects_deleted += 1;
	}

	pub fn snapshot(&self) -> StatsSnapshot {
		let c = self.counters.lock().unwrap();
		let elapsed = self.started_at.elapsed().as_secs_f64().max(0.001);
		StatsSnapshot {
			accounts_checked: c.accounts_checked,
			accounts_failed: c.accounts_failed,
			containers_checked: c.containers_checked,
			containers_failed: c.containers_failed,
			objects_checked: c.objects_checked,
			missing_objects: c.missing_objects,
			objects_deleted: c.objects_deleted,
			potentially_missing: c.potentially_missing,
			account_objects_checked: c.account_objects_checked,
			account_objs_estimate: c.account_objs_estimate,
			missing_by_day: c.missing_by_day.clone(),
			potentially_missing_by_day: c.potentially_missing_by_day.clone(),
			latest_missing_day: c.latest_missing_day.clone(),
			objects_per_second: c.objects_checked as f64 / elapsed,
		}
	}

	/// Prints a stats section to stdout in the field-width format
	/// SPEC_FULL §6 specifies: a blank line, then 30-character
	/// right-aligned labels.
	pub fn report(&self) {
		let s = self.snapshot();
		println!();
		print_stat("Accounts Checked", s.accounts_checked);
		print_stat("Accounts Failed", s.accounts_failed);
		print_stat("Containers Checked", s.containers_checked);
		print_stat("Containers Failed", s.containers_failed);
		print_stat("Objects Checked", s.objects_checked);
		print_stat("Missing", s.missing_objects);
		print_stat("Potentially Missing", s.potentially_missing);
		print_stat("Deleted", s.objects_deleted);
		print_stat("Account Objects Checked", s.account_objects_checked);
		if let Some(estimate) = s.account_objs_estimate {
			print_stat("Account Objects Estimate", estimate);
		}
		println!("{:>30}: {:.2}", "Objects/sec", s.objects_per_second);
		if let Some(day) = &s.latest_missing_day {
			println!("{:>30}: {}", "Latest Missing Date", day);
		}
	}
}

fn print_stat(label: &str, value: u64) {
	println!("{:>30}: {}", label, value);
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn missing_objects_equals_sum_of_day_histogram() {
		let reporter = StatsReporter::new();
		reporter.record_missing(Some("2024-01-15T00:00:00.000000"));
		reporter.record_missing(Some("2024-01-15T01:00:00.000000"));
		reporter.record_missing(Some("2024-01-16T00:00:00.000000"));
		let snap = reporter.snapshot();
		let sum: u64 = snap.missing_by_day.values().sum();
		assert_eq!(snap.missing_objects, sum);
		assert_eq!(snap.missing_by_day.get("2024-01-15"), Some(&2));
		assert_eq!(snap.latest_missing_day.as_deref(), Some("2024-01-16"));
	}

	#[test]
	fn account_objects_checked_resets_per_account() {
		let reporter = StatsReporter::new();
		reporter.inc_objects_checked();
		reporter.inc_objects_checked();
		assert_eq!(reporter.snapshot().account_objects_checked, 2);
		reporter.reset_account_objects_checked();
		assert_eq!(reporter.snapshot().account_objects_checked, 0);
		assert_eq!(reporter.snapshot().objects_checked, 2);
	}
}
