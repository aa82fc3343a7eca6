//! Object Prober (SPEC_FULL §4.3): decides whether one object is
//! present, missing, or only potentially missing, and acts on that
//! decision (rescue dispatch, error-file write, delete).

use std::sync::Arc;

use auditor_client::{DirectClient, HeadResult, ListContainerOpts};
use auditor_ring::{Node, RingSource};
use auditor_util::config::RunConfig;
use auditor_util::path::Path;
use auditor_util::time::internal_timestamp_now;

use crate::rescue::RescueDispatcher;
use crate::stats::StatsReporter;

/// What a single probe concluded, mostly useful for tests: production
/// code reacts to the outcome inline rather than matching on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
	Present,
	Missing,
	PotentiallyMissing,
	RemovedCleanly,
}

pub struct ObjectProber {
	ring: Arc<dyn RingSource>,
	client: Arc<dyn DirectClient>,
	rescue: Arc<RescueDispatcher>,
	stats: Arc<StatsReporter>,
	error_file: Arc<crate::auditor::ErrorFile>,
	config: Arc<RunConfig>,
}

impl ObjectProber {
	pub fn new(
		ring: Arc<dyn RingSource>,
		client: Arc<dyn DirectClient>,
		rescue: Arc<RescueDispatcher>,
		stats: Arc<StatsReporter>,
		error_file: Arc<crate::auditor::ErrorFile>,
		config: Arc<RunConfig>,
	) -> Self {
		ObjectProber {
			ring,
			client,
			rescue,
			stats,
			error_file,
			config,
		}
	}

	/// Probes one object (SPEC_FULL §4.3). `last_modified` and
	/// `list_time` are only known when the probe was spawned from a
	/// container page; an explicit object target (SPEC_FULL §4.9) passes
	/// `None` for both.
	pub async fn probe(
		&self,
		account: &str,
		container: &str,
		object: &str,
		last_modified: Option<&str>,
		list_time: Option<&str>,
	) -> ProbeOutcome {
		let location = match self.ring.locate_object(account, container, object) {
			Ok(loc) => loc,
			Err(e) => {
				warn!("could not resolve {}/{}/{} on the ring: {}", account, container, object, e);
				return ProbeOutcome::Present;
			}
		};
		let replica_count = location.primaries.len();
		let primary_and_handoff_window = 2 * replica_count;

		let mut window: Vec<Node> = location.primaries.clone();
		if self.config.check_all {
			// Every device in the object ring, still in rank order, so the
			// primary/handoff split and exception_count cap below stay
			// meaningful instead of depending on ring-descriptor order.
			window.extend(location.handoffs);
		} else {
			window.extend(location.handoffs.take(replica_count));
		}

		let mut found_replicas = 0usize;
		let mut exception_count = 0usize;

		for (i, node) in window.iter().enumerate() {
			match self
				.client
				.head_object(node, location.partition, account, container, object, true)
				.await
			{
				HeadResult::Present { .. } => {
					found_replicas += 1;
					if i >= replica_count {
						self.rescue.dispatch(node, location.partition);
					} else if self.config.verbose {
						info!("found {}/{}/{} on {}", account, container, object, node);
					}
					break;
				}
				HeadResult::Status(404) | HeadResult::Status(507) => {}
				HeadResult::Status(_) | HeadResult::Transport(_) => {
					if i < primary_and_handoff_window {
						exception_count += 1;
					}
				}
			}
		}

		self.stats.inc_objects_checked();

		if found_replicas > 0 {
			return ProbeOutcome::Present;
		}

		let (still_in_listings, confirmed_last_modified) =
			self.confirm(account, container, object).await;

		if !still_in_listings {
			return ProbeOutcome::RemovedCleanly;
		}

		let effective_last_modified = confirmed_last_modified.or_else(|| last_modified.map(String::from));

		if exception_count == 0 {
			self.handle_missing(
				account,
				container,
				object,
				effective_last_modified.as_deref(),
				list_time,
			)
			.await;
			ProbeOutcome::Missing
		} else {
			self.stats.record_potentially_missing(effective_last_modified.as_deref());
			info!(
				"potentially missing object {}/{}/{} ({} exception(s) during probe)",
				account, container, object, exception_count
			);
			ProbeOutcome::PotentiallyMissing
		}
	}

	/// Re-reads every container replica for `prefix=object, limit=1`
	/// (SPEC_FULL §4.3 step 3). A replica that errors is skipped, not
	/// treated as proof of absence; if every replica errors we refuse to
	/// conclude the object still exists (SPEC_FULL §4.3 tie-breaks).
	async fn confirm(&self, account: &str, container: &str, object: &str) -> (bool, Option<String>) {
		let (partition, replicas) = match self.ring.locate_container(account, container) {
			Ok(v) => v,
			Err(e) => {
				warn!("could not resolve container {}/{} for confirmation: {}", account, container, e);
				return (false, None);
			}
		};
		let opts = ListContainerOpts {
			marker: String::new(),
			prefix: Some(object.to_string()),
			limit: 1,
		};
		for node in &replicas {
			match self.client.list_container(node, partition, account, container, &opts).await {
				Ok(page) => {
					if let Some(entry) = page.entries.iter().find(|e| e.name == object) {
						return (true, Some(entry.timestamp.clone()));
					}
				}
				Err(e) => {
					debug!("confirmation listing failed on {}: {}", node, e);
				}
			}
		}
		(false, None)
	}

	async fn handle_missing(
		&self,
		account: &str,
		container: &str,
		object: &str,
		last_modified: Option<&str>,
		list_time: Option<&str>,
	) {
		let probe_time = internal_timestamp_now();
		let last_modified_display = last_modified.unwrap_or("not-in-listing");
		let list_time_display = list_time.unwrap_or("not-in-listing");
		println!(
			"Missing object: /{}/{}/{} last-mod: {} list-time: {} probe-time: {}",
			account, container, object, last_modified_display, list_time_display, probe_time
		);

		self.stats.record_missing(last_modified);
		self.error_file.append(&Path::object(account, container, object));

		if self.config.delete {
			let delete_timestamp = internal_timestamp_now();
			if self.delete_everywhere(account, container, object, &delete_timestamp).await {
				self.stats.inc_objects_deleted();
			}
		}
	}

	/// Deletes the container row on every replica (SPEC_FULL §4.3 step
	/// 4); returns whether *every* replica accepted the delete, which is
	/// the condition for counting it in `objects_deleted`.
	async fn delete_everywhere(&self, account: &str, container: &str, object: &str, timestamp: &str) -> bool {
		let (partition, replicas) = match self.ring.locate_container(account, container) {
			Ok(v) => v,
			Err(e) => {
				warn!("could not resolve container {}/{} for delete: {}", account, container, e);
				return false;
			}
		};
		let mut all_ok = true;
		for node in &replicas {
			if let Err(e) = self
				.client
				.delete_container_row(node, partition, account, container, object, timestamp)
				.await
			{
				warn!("delete of {}/{}/{} failed on {}: {}", account, container, object, node, e);
				all_ok = false;
			}
		}
		all_ok
	}
}
