//! Run configuration (SPEC_FULL §13): the flags parsed by the `cluster-audit`
//! binary, assembled into one value and threaded by reference through every
//! component, the same way `garage_util::config::Config` is threaded through
//! `System`/`Garage`/`BlockManager` at construction time. Also the home for
//! the tunable constants the spec pins to fixed values, so they live in one
//! place instead of as magic numbers scattered across the core crate.

use std::path::PathBuf;
use std::time::Duration;

/// Connect timeout for a single direct-client request (SPEC_FULL §4.2).
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Response timeout for a single direct-client request (SPEC_FULL §4.2).
pub const RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);

/// Minimum interval between stats snapshots (SPEC_FULL §4.8).
pub const STATS_INTERVAL: Duration = Duration::from_secs(300);

/// Maximum number of distinct partitions queued for rescue in one run
/// (SPEC_FULL §3, §4.7).
pub const MAX_PARTS_TO_RESCUE: usize = 50;

/// Default page size used when paging container/account listings
/// (SPEC_FULL §4.4/§4.5), absent any override from the direct client.
pub const DEFAULT_PAGE_SIZE: usize = 10_000;

/// Default ring directory (SPEC_FULL §6).
pub const DEFAULT_RING_DIR: &str = "/etc/swift";

/// Default concurrency (SPEC_FULL §6).
pub const DEFAULT_CONCURRENCY: usize = 50;

/// Header the direct client sends to ask a storage node to serve a
/// request even if it has quarantined the resource (SPEC_FULL §4.2).
pub const FORCE_ACQUIRE_HEADER: &str = "X-Force-Acquire";
/// Header carrying the delete timestamp on a container-row delete
/// (SPEC_FULL §4.2).
pub const TIMESTAMP_HEADER: &str = "X-Timestamp";
/// Response header carrying an account's total object count
/// (SPEC_FULL §4.5).
pub const ACCOUNT_OBJECT_COUNT_HEADER: &str = "X-Account-Object-Count";
/// Response header carrying a container's total object count
/// (SPEC_FULL §4.4).
pub const CONTAINER_OBJECT_COUNT_HEADER: &str = "X-Container-Object-Count";

/// One assembled run of the auditor: every CLI flag plus the ring
/// directory and concurrency knobs, handed by reference to the
/// scheduler, listers, prober, and rescue dispatcher.
#[derive(Debug, Clone)]
pub struct RunConfig {
	/// Total worker concurrency `C`; split 1:3 between the container and
	/// object pools (SPEC_FULL §4.6).
	pub concurrency: usize,
	/// Directory holding the three ring descriptors.
	pub ring_dir: PathBuf,
	/// Path to append missing-object records to, if any.
	pub error_file: Option<PathBuf>,
	/// `-d`: delete confirmed-missing container rows.
	pub delete: bool,
	/// `-p`: probe every device in the ring, not just primaries+handoffs.
	pub check_all: bool,
	/// `-t`: exhaustively check every container replica rather than
	/// stopping at the first empty page.
	pub thorough: bool,
	/// `-m`: ignore listing entries younger than this many seconds.
	pub min_age: Option<Duration>,
	/// `-v`: log found-object hits and raise the default log level.
	pub verbose: bool,
	/// `-f`: use SSH-mode rescue instead of local-mode rescue.
	pub ssh_rescue: bool,
}

impl RunConfig {
	/// Capacity of the container worker pool: `max(1, C/4)`
	/// (SPEC_FULL §4.6).
	pub fn container_pool_capacity(&self) -> usize {
		std::cmp::max(1, self.concurrency / 4)
	}

	/// Capacity of the object worker pool: `max(1, 3C/4)`
	/// (SPEC_FULL §4.6).
	pub fn object_pool_capacity(&self) -> usize {
		std::cmp::max(1, 3 * self.concurrency / 4)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn base() -> RunConfig {
		RunConfig {
			concurrency: 50,
			ring_dir: PathBuf::from(DEFAULT_RING_DIR),
			error_file: None,
			delete: false,
			check_all: false,
			thorough: false,
			min_age: None,
			verbose: false,
			ssh_rescue: false,
		}
	}

	#[test]
	fn pool_capacities_split_one_to_three() {
		let cfg = base();
		assert_eq!(cfg.container_pool_capacity(), 12);
		assert_eq!(cfg.object_pool_capacity(), 37);
	}

	#[test]
	fn pool_capacities_never_zero() {
		let mut cfg = base();
		cfg.concurrency = 1;
		assert_eq!(cfg.container_pool_capacity(), 1);
		assert_eq!(cfg.object_pool_capacity(), 1);
	}
}
