//! Deterministic rendezvous (highest-random-weight) hashing: the same
//! partition always ranks the same devices in the same order, which is
//! what the spec requires of ring node iteration order (SPEC_FULL §4.3,
//! "Node iteration order is deterministic per partition").
//!
//! This stands in for whatever real ring algorithm a deployment uses
//! (consistent hashing, assignment tables, ...); the auditor only needs
//! the contract `RingSource` describes, not a specific ring scheme.

use xxhash_rust::xxh3::xxh3_64;

use crate::node::Node;
use crate::Partition;

/// Maps a `/`-joined path to a partition number in `[0, partition_count)`.
pub fn partition_for(path: &str, partition_count: u64) -> Partition {
	xxh3_64(path.as_bytes()) % partition_count.max(1)
}

/// Ranks `devices` for `partition` by descending rendezvous score, with
/// device id as a deterministic tie-break. The first `replica_count`
/// entries are the primaries; the rest are handoffs, in probe order.
pub fn rank_devices(partition: Partition, devices: &[Node]) -> Vec<Node> {
	let mut scored: Vec<(u64, &Node)> = devices
		.iter()
		.map(|n| (score(partition, n), n))
		.collect();
	scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.id.cmp(&b.1.id)));
	scored.into_iter().map(|(_, n)| n.clone()).collect()
}

fn score(partition: Partition, node: &Node) -> u64 {
	xxh3_64(format!("{}:{}", partition, node.id).as_bytes())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::net::IpAddr;

	fn node(id: &str) -> Node {
		Node {
			ip: "127.0.0.1".parse::<IpAddr>().unwrap(),
			port: 6000,
			device: "sda".into(),
			id: id.into(),
		}
	}

	#[test]
	fn ranking_is_deterministic() {
		let devices = vec![node("a"), node("b"), node("c"), node("d")];
		let r1 = rank_devices(42, &devices);
		let r2 = rank_devices(42, &devices);
		assert_eq!(r1, r2);
	}

	#[test]
	fn ranking_is_a_permutation() {
		let devices = vec![node("a"), node("b"), node("c")];
		let ranked = rank_devices(7, &devices);
		assert_eq!(ranked.len(), devices.len());
		for d in &devices {
			assert!(ranked.contains(d));
		}
	}

	#[test]
	fn different_partitions_can_reorder() {
		let devices: Vec<Node> = (0..8).map(|i| node(&i.to_string())).collect();
		let r1 = rank_devices(1, &devices);
		let r2 = rank_devices(2, &devices);
		// Not a hard guarantee for every pair of partitions, but with 8
		// devices it would be a suspicious coincidence for every
		// partition to rank identically; this is a smoke test that the
		// partition number actually participates in the score.
		assert_ne!(r1, r2);
	}
}
