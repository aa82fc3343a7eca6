//! Account Lister (SPEC_FULL §4.5): pages one account's container list
//! across its ring replicas and spawns a container audit for each entry.

use std::sync::Arc;

use auditor_client::DirectClient;
use auditor_ring::RingSource;
use auditor_util::config::RunConfig;

use crate::container_lister::ContainerLister;
use crate::scheduler::Scheduler;
use crate::stats::StatsReporter;

pub struct AccountLister {
	ring: Arc<dyn RingSource>,
	client: Arc<dyn DirectClient>,
	container_lister: Arc<ContainerLister>,
	scheduler: Arc<Scheduler>,
	stats: Arc<StatsReporter>,
	#[allow(dead_code)]
	config: Arc<RunConfig>,
}

impl AccountLister {
	pub fn new(
		ring: Arc<dyn RingSource>,
		client: Arc<dyn DirectClient>,
		container_lister: Arc<ContainerLister>,
		scheduler: Arc<Scheduler>,
		stats: Arc<StatsReporter>,
		config: Arc<RunConfig>,
	) -> Self {
		AccountLister {
			ring,
			client,
			container_lister,
			scheduler,
			stats,
			config,
		}
	}

	/// Audits one account (SPEC_FULL §4.5): pages containers across
	/// replicas until the first empty page, spawning a container audit
	/// per entry, then quiesces the scheduler before emitting stats.
	pub async fn audit_account(self: Arc<Self>, account: String) {
		let (partition, replicas) = match self.ring.locate_account(&account) {
			Ok(v) => v,
			Err(e) => {
				warn!("could not resolve account {}: {}", account, e);
				self.stats.inc_accounts_failed();
				return;
			}
		};

		self.stats.reset_account_objects_checked();

		let mut succeeded_once = false;
		let mut first_page = true;

		'replica: for node in &replicas {
			let mut marker = String::new();
			loop {
				match self.client.list_account(node, partition, &account, &marker).await {
					Ok((names, object_count)) => {
						succeeded_once = true;
						if first_page {
							if let Some(count) = object_count {
								self.stats.set_account_objs_estimate(count);
							}
							first_page = false;
						}
						if names.is_empty() {
							break 'replica;
						}
						for name in &names {
							marker = name.clone();
							let lister = self.container_lister.clone();
							let account = account.clone();
							let container = name.clone();
							self.scheduler.container_pool.spawn(async move {
								lister.audit_container(account, container).await;
							});
						}
					}
					Err(e) => {
						debug!("account listing for {} failed on {}: {}", account, node, e);
						continue 'replica;
					}
				}
			}
		}

		self.scheduler.quiesce().await;

		if succeeded_once {
			self.stats.inc_accounts_checked();
		} else {
			self.stats.inc_accounts_failed();
			warn!("account {} failed on every replica", account);
		}

		self.stats.report();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::auditor::ErrorFile;
	use crate::prober::ObjectProber;
	use crate::rescue::{ProcessRescueLauncher, RescueDispatcher};
	use async_trait::async_trait;
	use auditor_client::{ClientError, HeadResult, ListContainerOpts, ListContainerPage};
	use auditor_ring::{Node, ObjectLocation, Partition};
	use auditor_util::Error;
	use std::net::IpAddr;
	use std::sync::Mutex;

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

	struct FixtureClient {
		containers: Vec<String>,
		container_objects: Mutex<Vec<String>>,
	}

	#[async_trait]
	impl DirectClient for FixtureClient {
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
			let mut remaining = self.container_objects.lock().unwrap();
			if remaining.is_empty() {
				return Ok(ListContainerPage::default());
			}
			let entries = std::mem::take(&mut *remaining)
				.into_iter()
				.map(|name| auditor_client::ListingEntry {
					name,
					timestamp: "2024-01-15T00:00:00.000000".into(),
				})
				.collect();
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
			marker: &str,
		) -> Result<(Vec<String>, Option<u64>), ClientError> {
			if marker.is_empty() {
				Ok((self.containers.clone(), Some(3)))
			} else {
				Ok((vec![], None))
			}
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

	#[tokio::test]
	async fn audits_every_container_returned_by_the_account_listing() {
		let ring: Arc<dyn RingSource> = Arc::new(SingleReplicaRing { device: node("d1") });
		let client: Arc<dyn DirectClient> = Arc::new(FixtureClient {
			containers: vec!["c1".into(), "c2".into()],
			container_objects: Mutex::new(vec!["o1".into()]),
		});
		let config = Arc::new(RunConfig {
			concurrency: 8,
			ring_dir: "/etc/swift".into(),
			error_file: None,
			delete: false,
			check_all: false,
			thorough: false,
			min_age: None,
			verbose: false,
			ssh_rescue: false,
		});
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
		let container_lister = Arc::new(ContainerLister::new(
			ring.clone(),
			client.clone(),
			prober,
			scheduler.clone(),
			stats.clone(),
			config.clone(),
		));
		let account_lister = Arc::new(AccountLister::new(ring, client, container_lister, scheduler, stats.clone(), config));
		account_lister.audit_account("acct".into()).await;
		let snap = stats.snapshot();
		assert_eq!(snap.containers_checked, 2);
		assert_eq!(snap.objects_checked, 1);
		assert_eq!(snap.account_objs_estimate, Some(3));
		assert_eq!(snap.accounts_checked, 1);
	}
}
