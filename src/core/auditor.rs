//! `Auditor`: process-scoped state for one run (SPEC_FULL §9 "module
//! level dictionaries -> process-scoped state"), wiring the ring and
//! direct-client adapters to the scheduler, listers, prober, rescue
//! dispatcher and stats reporter, and driving the input targets
//! described in SPEC_FULL §4.9 at the right granularity.

use std::io::Write as _;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use auditor_client::DirectClient;
use auditor_ring::RingSource;
use auditor_util::config::{RunConfig, STATS_INTERVAL};
use auditor_util::path::Path;
use auditor_util::Error;

use crate::account_lister::AccountLister;
use crate::container_lister::ContainerLister;
use crate::prober::ObjectProber;
use crate::rescue::{RescueDispatcher, RescueLauncher};
use crate::scheduler::Scheduler;
use crate::stats::StatsReporter;

/// The append-only missing-objects file (SPEC_FULL §6 "Error file
/// format"): one URL-encoded path per line, flushed after every write.
pub struct ErrorFile {
	file: Mutex<Option<std::fs::File>>,
}

impl ErrorFile {
	pub fn open(path: Option<&PathBuf>) -> Result<Self, Error> {
		let file = match path {
			None => None,
			Some(p) => Some(
				std::fs::OpenOptions::new()
					.create(true)
					.append(true)
					.open(p)
					.map_err(|e| Error::Message(format!("could not open error file {}: {}", p.display(), e)))?,
			),
		};
		Ok(ErrorFile { file: Mutex::new(file) })
	}

	pub fn disabled() -> Self {
		ErrorFile { file: Mutex::new(None) }
	}

	/// Appends one path and flushes immediately, so the file is never
	/// left in a state where a crash loses records already reported on
	/// stdout (SPEC_FULL §8, scenario S6).
	pub fn append(&self, path: &Path) {
		let mut guard = self.file.lock().unwrap();
		if let Some(file) = guard.as_mut() {
			if let Err(e) = writeln!(file, "{}", path.encoded()).and_then(|_| file.flush()) {
				warn!("could not write to error file: {}", e);
			}
		}
	}
}

/// Everything one invocation of the auditor needs, built once at
/// startup and handed out to the listers/prober by reference-counted
/// handle, the way `garage_model::Garage` bundles the table managers a
/// running node needs.
pub struct Auditor {
	scheduler: Arc<Scheduler>,
	stats: Arc<StatsReporter>,
	rescue: Arc<RescueDispatcher>,
	config: Arc<RunConfig>,
	account_lister: Arc<AccountLister>,
	container_lister: Arc<ContainerLister>,
	prober: Arc<ObjectProber>,
}

impl Auditor {
	pub fn new(
		ring: Arc<dyn RingSource>,
		client: Arc<dyn DirectClient>,
		rescue_launcher: Arc<dyn RescueLauncher>,
		config: RunConfig,
	) -> Result<Self, Error> {
		let config = Arc::new(config);
		let error_file = Arc::new(ErrorFile::open(config.error_file.as_ref())?);
		let stats = Arc::new(StatsReporter::new());
		let scheduler = Arc::new(Scheduler::new(&config));
		let rescue = Arc::new(RescueDispatcher::new(rescue_launcher, config.ssh_rescue));

		let prober = Arc::new(ObjectProber::new(
			ring.clone(),
			client.clone(),
			rescue.clone(),
			stats.clone(),
			error_file,
			config.clone(),
		));
		let container_lister = Arc::new(ContainerLister::new(
			ring.clone(),
			client.clone(),
			prober.clone(),
			scheduler.clone(),
			stats.clone(),
			config.clone(),
		));
		let account_lister = Arc::new(AccountLister::new(
			ring,
			client,
			container_lister.clone(),
			scheduler.clone(),
			stats.clone(),
			config.clone(),
		));

		Ok(Auditor {
			scheduler,
			stats,
			rescue,
			config,
			account_lister,
			container_lister,
			prober,
		})
	}

	/// Runs every target to completion, in order, then joins the
	/// scheduler and every outstanding rescue subprocess before a final
	/// stats report (SPEC_FULL §4.8, §4.9).
	pub async fn run(&self, targets: Vec<Path>) {
		let stats_for_ticker = self.stats.clone();
		tokio::spawn(async move {
			let mut interval = tokio::time::interval(STATS_INTERVAL);
			interval.tick().await; // first tick fires immediately; skip it
			loop {
				interval.tick().await;
				stats_for_ticker.report();
			}
		});

		for target in targets {
			self.dispatch(target).await;
		}

		self.scheduler.quiesce().await;
		self.rescue.wait_for_rescues().await;
		self.stats.report();
	}

	/// Dispatches one target at the granularity described in SPEC_FULL
	/// §4.9: a bare account goes through the Account Lister, an
	/// account+container through the Container Lister directly, and a
	/// fully-qualified path straight to the Object Prober.
	async fn dispatch(&self, path: Path) {
		match (path.container, path.object) {
			(None, None) => {
				self.account_lister.clone().audit_account(path.account).await;
			}
			(Some(container), None) => {
				self.container_lister.clone().audit_container(path.account, container).await;
			}
			(Some(container), Some(object)) => {
				self.prober.probe(&path.account, &container, &object, None, None).await;
			}
			(None, Some(_)) => {
				// Path::parse never produces this shape.
			}
		}
	}
}
