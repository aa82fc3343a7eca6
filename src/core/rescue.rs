//! Rescue Dispatcher (SPEC_FULL §4.7): when a probe finds an object only
//! on a handoff, the partition that handoff lives on needs a
//! replication pass. Two launch modes, one de-duplicating set of
//! partitions, and (in SSH mode) a one-command-per-device cap.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::task::JoinHandle;

use auditor_ring::{Node, Partition};
use auditor_util::config::MAX_PARTS_TO_RESCUE;
use auditor_util::Error;

/// Abstract over how a rescue pass is actually launched, so tests can
/// assert dispatch behavior without shelling out.
#[async_trait]
pub trait RescueLauncher: Send + Sync {
	async fn rescue_local(&self, partition: Partition) -> Result<(), Error>;
	async fn rescue_ssh(&self, node: Node, partition: Partition) -> Result<(), Error>;
}

/// Shells out to the cluster's own rescue helper (SPEC_FULL §6):
/// `rescueparts <part>` locally, or `object-replicator -partitions <p>
/// -devices <d> -once` over SSH on the node that holds the handoff.
pub struct ProcessRescueLauncher;

#[async_trait]
impl RescueLauncher for ProcessRescueLauncher {
	async fn rescue_local(&self, partition: Partition) -> Result<(), Error> {
		let status = tokio::process::Command::new("rescueparts")
			.arg(partition.to_string())
			.status()
			.await?;
		if !status.success() {
			warn!("rescueparts exited with {} for partition {}", status, partition);
		}
		Ok(())
	}

	async fn rescue_ssh(&self, node: Node, partition: Partition) -> Result<(), Error> {
		let status = tokio::process::Command::new("ssh")
			.arg(node.ip.to_string())
			.arg("object-replicator")
			.arg("-partitions")
			.arg(partition.to_string())
			.arg("-devices")
			.arg(&node.device)
			.arg("-once")
			.status()
			.await?;
		if !status.success() {
			warn!(
				"object-replicator exited with {} for {}/{}",
				status, node, partition
			);
		}
		Ok(())
	}
}

#[derive(Default)]
struct RescueState {
	parts_to_rescue: HashSet<Partition>,
	devices_rescuing: HashMap<String, usize>,
	handles: Vec<JoinHandle<()>>,
}

/// Owns the de-duplication state described in SPEC_FULL §4.7 and
/// invariants 6/7 (§8): at most one outstanding rescue per partition,
/// and in SSH mode at most one subprocess per (ip, device) per run.
pub struct RescueDispatcher {
	launcher: std::sync::Arc<dyn RescueLauncher>,
	ssh_mode: bool,
	state: Mutex<RescueState>,
}

impl RescueDispatcher {
	pub fn new(launcher: std::sync::Arc<dyn RescueLauncher>, ssh_mode: bool) -> Self {
		RescueDispatcher {
			launcher,
			ssh_mode,
			state: Mutex::new(RescueState::default()),
		}
	}

	/// Dispatches a rescue for `partition`, owned by `node` in SSH mode.
	/// A no-op (with a warning) if either cap in SPEC_FULL §4.7 is
	/// already at its limit; neither cap is treated as an error.
	pub fn dispatch(&self, node: &Node, partition: Partition) {
		let device_key = node.ip_device_key();
		let handle = {
			let mut state = self.state.lock().unwrap();
			if state.parts_to_rescue.contains(&partition) {
				warn!("partition {} already queued for rescue this run, skipping", partition);
				return;
			}
			if state.parts_to_rescue.len() >= MAX_PARTS_TO_RESCUE {
				warn!(
					"rescue cap of {} partitions reached, skipping partition {}",
					MAX_PARTS_TO_RESCUE, partition
				);
				return;
			}
			if self.ssh_mode && state.devices_rescuing.contains_key(&device_key) {
				warn!("already rescuing device {}, skipping partition {}", device_key, partition);
				return;
			}
			state.parts_to_rescue.insert(partition);
			if self.ssh_mode {
				state.devices_rescuing.insert(device_key, 1);
			}
			let launcher = self.launcher.clone();
			let ssh_mode = self.ssh_mode;
			let node = node.clone();
			tokio::spawn(async move {
				let result = if ssh_mode {
					launcher.rescue_ssh(node, partition).await
				} else {
					launcher.rescue_local(partition).await
				};
				if let Err(e) = result {
					warn!("rescue spawn failed for partition {}: {}", partition, e);
				}
			})
		};
		self.state.lock().unwrap().handles.push(handle);
	}

	pub fn parts_to_rescue_count(&self) -> usize {
		self.state.lock().unwrap().parts_to_rescue.len()
	}

	/// Joins every rescue subprocess launched this run. Per SPEC_FULL
	/// §4.7/§9, a hung subprocess is a known, accepted risk: this waits
	/// unconditionally, with no timeout.
	pub async fn wait_for_rescues(&self) {
		let handles = {
			let mut state = self.state.lock().unwrap();
			std::mem::take(&mut state.handles)
		};
		for handle in handles {
			let _ = handle.await;
		}
	}
}
