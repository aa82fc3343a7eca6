//! Container Lister (SPEC_FULL §4.4): pages one container's listing
//! across its ring replicas and spawns an object probe for every entry
//! that survives the min-age filter.

use std::sync::Arc;

use auditor_client::{DirectClient, ListContainerOpts};
use auditor_ring::{Node, Partition, RingSource};
use auditor_util::config::{RunConfig, DEFAULT_PAGE_SIZE};
use auditor_util::time::{internal_timestamp_now, now_msec, parse_listing_timestamp};

use crate::prober::ObjectProber;
use crate::scheduler::Scheduler;
use crate::stats::StatsReporter;

pub struct ContainerLister {
	ring: Arc<dyn RingSource>,
	client: Arc<dyn DirectClient>,
	prober: Arc<ObjectProber>,
	scheduler: Arc<Scheduler>,
	stats: Arc<StatsReporter>,
	config: Arc<RunConfig>,
}

impl ContainerLister {
	pub fn new(
		ring: Arc<dyn RingSource>,
		client: Arc<dyn DirectClient>,
		prober: Arc<ObjectProber>,
		scheduler: Arc<Scheduler>,
		stats: Arc<StatsReporter>,
		config: Arc<RunConfig>,
	) -> Self {
		ContainerLister {
			ring,
			client,
			prober,
			scheduler,
			stats,
			config,
		}
	}

	/// Audits one container (SPEC_FULL §4.4). Called directly for
	/// explicit `account/container` targets, and spawned onto the
	/// container pool once per entry by the `AccountLister`.
	pub async fn audit_container(self: Arc<Self>, account: String, container: String) {
		let (partition, replicas) = match self.ring.locate_container(&account, &container) {
			Ok(v) => v,
			Err(e) => {
				warn!("could not resolve container {}/{}: {}", account, container, e);
				self.stats.inc_containers_failed();
				return;
			}
		};

		let mut completed_any_replica = false;
		for node in &replicas {
			let completed = self.scan_replica(node, partition, &account, &container).await;
			if completed {
				completed_any_replica = true;
				if !self.config.thorough {
					break;
				}
			}
		}

		if completed_any_replica {
			self.stats.inc_containers_checked();
		} else {
			self.stats.inc_containers_failed();
			warn!("container {}/{} failed on every replica", account, container);
		}
	}

	/// Pages one replica from an empty marker until an empty page.
	/// Returns whether the replica completed without a listing error
	/// (SPEC_FULL §4.4's "move to the next replica" error policy).
	async fn scan_replica(&self, node: &Node, partition: Partition, account: &str, container: &str) -> bool {
		let mut marker = String::new();
		loop {
			let opts = ListContainerOpts::after(marker.clone(), DEFAULT_PAGE_SIZE);
			let page = match self.client.list_container(node, partition, account, container, &opts).await {
				Ok(page) => page,
				Err(e) => {
					debug!("listing {}/{} failed on {}: {}", account, container, node, e);
					return false;
				}
			};
			if page.entries.is_empty() {
				return true;
			}
			let list_time = internal_timestamp_now();
			for entry in &page.entries {
				marker = entry.name.clone();
				if self.skip_for_age(&entry.timestamp) {
					continue;
				}
				let prober = self.prober.clone();
				let account = account.to_string();
				let container = container.to_string();
				let object = entry.name.clone();
				let last_modified = entry.timestamp.clone();
				let list_time = list_time.clone();
				self.scheduler.object_pool.spawn(async move {
					prober
						.probe(&account, &container, &object, Some(&last_modified), Some(&list_time))
						.await;
				});
			}
		}
	}

	/// `-m S`: skip entries younger than `S` seconds (SPEC_FULL §6). A
	/// timestamp this crate cannot parse is never filtered out, so a
	/// malformed `last_modified` is probed rather than silently skipped.
	fn skip_for_age(&self, timestamp: &str) -> bool {
		let min_age = match self.config.min_age {
			Some(d) => d,
			None => return false,
		};
		match parse_listing_timestamp(timestamp) {
			Some(entry_msec) => {
				let age_msec = now_msec().saturating_sub(entry_msec);
				(age_msec as u128) < min_age.as_millis()
			}
			None => false,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::auditor::ErrorFile;
	use crate::rescue::{ProcessRescueLauncher, RescueDispatcher};
	use async_trait::async_trait;
	use auditor_client::{ClientError, HeadResult, ListContainerPage, ListingEntry};
	use auditor_ring::ObjectLocation;
	use auditor_util::Error;
	use std::net::IpAddr;
	use std::sync::Mutex;
	use std::time::Duration;

	fn node(id: &str) -> Node {
		Node {
			ip: "127.0.0.1".parse::<IpAddr>().unwrap(),
			port: 6000,
			device: "sda".into(),
			id: id.into(),
		}
	}

	struct SingleReplicaRing {
		device: Node,
	}

	impl RingSource for SingleReplicaRing {
		fn locate_account(&self, _account: &str) -> Result<(Partition, Vec<Node>), Error> {
			Ok((0, vec![self.device.clone()]))
		}
		fn locate_container(&self, _account: &str, _container: &str) -> Result<(Partition, Vec<Node>), Error> {
			Ok((0, vec![self.device.clone()]))
		}
		fn locate_object(&self, _account: &str, _container: &str, _object: &str) -> Result<ObjectLocation, Error> {
			Ok(ObjectLocation {
				partition: 0,
				primaries: vec![self.device.clone()],
				handoffs: Box::new(std::iter::empty()),
			})
		}
	}

	/// Serves listing pages in fixed chunks, then HEAD 404s for every
	/// object, so spawned probes can run to completion and increment
	/// `objects_checked`.
	struct PagedClient {
		pages: Mutex<Vec<Vec<ListingEntry>>>,
	}

	#[async_trait]
	impl DirectClient for PagedClient {
		async fn head_object(
			&self,
			_node: &Node,
			_partition: Partition,
			_account: &str,
			_container: &str,
			_object: &str,
			_force_acquire: bool,
		) -> HeadResult {
			HeadResult::Status(404)
		}

		async fn list_container(
			&self,
			_node: &Node,
			_partition: Partition,
			_account: &str,
			_container: &str,
			_opts: &ListContainerOpts,
		) -> Result<ListContainerPage, ClientError> {
			let mut pages = self.pages.lock().unwrap();
			if pages.is_empty() {
				return Ok(ListContainerPage::default());
			}
			let entries = pages.remove(0);
			Ok(ListContainerPage {
				entries,
				object_count: None,
			})
		}

		async fn list_account(
			&self,
			_node: &Node,
			_partition: Partition,
			_account: &str,
			_marker: &str,
		) -> Result<(Vec<String>, Option<u64>), ClientError> {
			Ok((vec![], None))
		}

		async fn delete_container_row(
			&self,
			_node: &Node,
			_partition: Partition,
			_account: &str,
			_container: &str,
			_object: &str,
			_timestamp: &str,
		) -> Result<(), ClientError> {
			Ok(())
		}
	}

	fn config_with_min_age(min_age: Option<Duration>) -> Arc<RunConfig> {
		Arc::new(RunConfig {
			concurrency: 8,
			ring_dir: "/etc/swift".into(),
			error_file: None,
			delete: false,
			check_all: false,
			thorough: false,
			min_age,
			verbose: false,
			ssh_rescue: false,
		})
	}

	fn make_lister(entries: Vec<Vec<ListingEntry>>, min_age: Option<Duration>) -> (Arc<ContainerLister>, Arc<Scheduler>, Arc<StatsReporter>) {
		let ring: Arc<dyn RingSource> = Arc::new(SingleReplicaRing { device: node("d1") });
		let client: Arc<dyn DirectClient> = Arc::new(PagedClient { pages: Mutex::new(entries) });
		let config = config_with_min_age(min_age);
		let stats = Arc::new(StatsReporter::new());
		let scheduler = Arc::new(Scheduler::new(&config));
		let prober = Arc::new(ObjectProber::new(
			ring.clone(),
			client.clone(),
			Arc::new(RescueDispatcher::new(Arc::new(ProcessRescueLauncher), false)),
			stats.clone(),
			Arc::new(ErrorFile::disabled()),
			config.clone(),
		));
		let lister = Arc::new(ContainerLister::new(ring, client, prober, scheduler.clone(), stats.clone(), config));
		(lister, scheduler, stats)
	}

	#[tokio::test]
	async fn s5_min_age_filter_skips_recent_entries() {
		let recent = auditor_util::time::msec_to_listing_timestamp(now_msec() - 10_000);
		let old = auditor_util::time::msec_to_listing_timestamp(now_msec() - 10_000_000);
		let entries = vec![vec![
			ListingEntry { name: "recent".into(), timestamp: recent },
			ListingEntry { name: "old".into(), timestamp: old },
		]];
		let (lister, scheduler, stats) = make_lister(entries, Some(Duration::from_secs(3600)));
		lister.audit_container("acct".into(), "cont".into()).await;
		scheduler.quiesce().await;
		assert_eq!(stats.snapshot().objects_checked, 1);
	}

	#[tokio::test]
	async fn completes_on_first_empty_page_by_default() {
		let entries = vec![vec![ListingEntry {
			name: "obj1".into(),
			timestamp: "2024-01-15T00:00:00.000000".into(),
		}]];
		let (lister, scheduler, stats) = make_lister(entries, None);
		lister.audit_container("acct".into(), "cont".into()).await;
		scheduler.quiesce().await;
		assert_eq!(stats.snapshot().objects_checked, 1);
		assert_eq!(stats.snapshot().containers_checked, 1);
	}
}
