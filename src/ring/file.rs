//! Reference `RingSource`: loads three independent ring descriptors
//! (account, container, object) from a directory, as JSON, and resolves
//! paths against them with rendezvous hashing (`crate::hrw`).
//!
//! A production deployment would swap this for a binding to its actual
//! ring library (SPEC_FULL §1, §6 "Ring source"); this implementation
//! exists so the crate is runnable standalone and so the scheduler,
//! listers, and prober have something real to drive in tests.

use std::path::Path;

use serde::{Deserialize, Serialize};

use auditor_util::error::{Error, ErrContext};

use crate::hrw::{partition_for, rank_devices};
use crate::node::Node;
use crate::{ObjectLocation, Partition, RingSource};

/// On-disk shape of one ring descriptor file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RingDescriptor {
	/// Number of replicas the ring assigns to each partition (`R`).
	pub replica_count: usize,
	/// Partitions are numbered `0..2^partition_power`.
	pub partition_power: u32,
	pub devices: Vec<Node>,
}

impl RingDescriptor {
	fn partition_count(&self) -> u64 {
		1u64 << self.partition_power.min(63)
	}

	fn locate(&self, path: &str) -> (Partition, Vec<Node>) {
		let partition = partition_for(path, self.partition_count());
		let ranked = rank_devices(partition, &self.devices);
		let r = self.replica_count.min(ranked.len());
		(partition, ranked[..r].to_vec())
	}
}

pub struct FileRingSource {
	account: RingDescriptor,
	container: RingDescriptor,
	object: RingDescriptor,
}

const ACCOUNT_RING_FILE: &str = "account.ring.json";
const CONTAINER_RING_FILE: &str = "container.ring.json";
const OBJECT_RING_FILE: &str = "object.ring.json";

/// Load the three ring descriptors out of `ring_dir`
/// (SPEC_FULL §6, default `/etc/swift`).
pub fn load_rings(ring_dir: &Path) -> Result<FileRingSource, Error> {
	Ok(FileRingSource {
		account: load_one(ring_dir, ACCOUNT_RING_FILE)?,
		container: load_one(ring_dir, CONTAINER_RING_FILE)?,
		object: load_one(ring_dir, OBJECT_RING_FILE)?,
	})
}

fn load_one(ring_dir: &Path, file_name: &str) -> Result<RingDescriptor, Error> {
	let path = ring_dir.join(file_name);
	let data = std::fs::read(&path).err_context(format!("reading ring descriptor {}", path.display()))?;
	let desc: RingDescriptor = serde_json::from_slice(&data)?;
	if desc.devices.is_empty() {
		return Err(Error::Message(format!(
			"Ring descriptor {} declares no devices",
			path.display()
		)));
	}
	Ok(desc)
}

impl RingSource for FileRingSource {
	fn locate_account(&self, account: &str) -> Result<(Partition, Vec<Node>), Error> {
		Ok(self.account.locate(account))
	}

	fn locate_container(
		&self,
		account: &str,
		container: &str,
	) -> Result<(Partition, Vec<Node>), Error> {
		Ok(self
			.container
			.locate(&format!("{}/{}", account, container)))
	}

	fn locate_object(
		&self,
		account: &str,
		container: &str,
		object: &str,
	) -> Result<ObjectLocation, Error> {
		let path = format!("{}/{}/{}", account, container, object);
		let partition = partition_for(&path, self.object.partition_count());
		let ranked = rank_devices(partition, &self.object.devices);
		let r = self.object.replica_count.min(ranked.len());
		let primaries = ranked[..r].to_vec();
		let handoffs = ranked[r..].to_vec().into_iter();
		Ok(ObjectLocation {
			partition,
			primaries,
			handoffs: Box::new(handoffs),
		})
	}
}

/// Builds a deterministic `FileRingSource` in memory, for tests and for
/// documenting the descriptor format without touching the filesystem.
pub fn in_memory(
	account: RingDescriptor,
	container: RingDescriptor,
	object: RingDescriptor,
) -> FileRingSource {
	FileRingSource {
		account,
		container,
		object,
	}
}

/// Builds a single-device-type ring descriptor from a flat device list,
/// handy in tests that only care about the object ring.
pub fn descriptor(replica_count: usize, partition_power: u32, devices: Vec<Node>) -> RingDescriptor {
	RingDescriptor {
		replica_count,
		partition_power,
		devices,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::net::IpAddr;

	fn node(id: &str) -> Node {
		Node {
			ip: "10.0.0.1".parse::<IpAddr>().unwrap(),
			port: 6000,
			device: "sda".into(),
			id: id.into(),
		}
	}

	fn ring(replicas: usize, n_devices: usize) -> FileRingSource {
		let devices = (0..n_devices).map(|i| node(&i.to_string())).collect();
		let d = descriptor(replicas, 4, devices);
		in_memory(d.clone(), d.clone(), d)
	}

	#[test]
	fn locate_object_splits_primaries_and_handoffs() {
		let r = ring(3, 8);
		let loc = r.locate_object("a", "c", "o").unwrap();
		assert_eq!(loc.primaries.len(), 3);
		let handoffs: Vec<_> = loc.handoffs.collect();
		assert_eq!(handoffs.len(), 5);
		for p in &loc.primaries {
			assert!(!handoffs.contains(p));
		}
	}

	#[test]
	fn locate_is_deterministic_across_calls() {
		let r = ring(3, 8);
		let loc1 = r.locate_object("a", "c", "o").unwrap();
		let loc2 = r.locate_object("a", "c", "o").unwrap();
		assert_eq!(loc1.partition, loc2.partition);
		assert_eq!(loc1.primaries, loc2.primaries);
	}

	#[test]
	fn replica_count_caps_at_device_count() {
		let r = ring(10, 3);
		let loc = r.locate_object("a", "c", "o").unwrap();
		assert_eq!(loc.primaries.len(), 3);
		assert_eq!(loc.handoffs.count(), 0);
	}
}
