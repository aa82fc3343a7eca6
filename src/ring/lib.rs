//! Ring Adapter (SPEC_FULL §4.1): resolves account/container/object paths
//! to a partition plus an ordered device list, the way `garage_rpc`
//! resolves paths through its own `Ring` (see `garage_rpc::ring`) -- here
//! generalized to the three independent per-tier rings (account,
//! container, object) that an eventually-consistent listing cluster
//! keeps, instead of Garage's single sharded table ring.
//!
//! The ring's own internal algorithm is explicitly out of scope for the
//! auditor (SPEC_FULL §1); `RingSource` is the abstract interface the
//! rest of the crate programs against. `FileRingSource` is the shipped
//! reference implementation: a deterministic rendezvous-hashing ring
//! loaded from a directory of ring descriptor files.

#[macro_use]
extern crate tracing;

mod file;
mod hrw;
mod node;

pub use file::{load_rings, FileRingSource, RingDescriptor};
pub use node::Node;

use auditor_util::Error;

/// An integer bucket returned by the ring; the unit addressed by
/// rescue (SPEC_FULL §3).
pub type Partition = u64;

/// The result of resolving an object path: the partition it belongs to,
/// its primary nodes (`primaries.len()` is the replica count `R`), and a
/// lazy iterator over handoff nodes beyond the primaries.
pub struct ObjectLocation {
	pub partition: Partition,
	pub primaries: Vec<Node>,
	/// Lazy and potentially large: every other device in the object
	/// ring, ranked by rendezvous score for this object, excluding the
	/// primaries already returned above.
	pub handoffs: Box<dyn Iterator<Item = Node> + Send>,
}

/// Abstract ring interface consumed by the rest of the crate
/// (SPEC_FULL §4.1). Read-only and safe to call concurrently from many
/// worker tasks.
pub trait RingSource: Send + Sync {
	fn locate_account(&self, account: &str) -> Result<(Partition, Vec<Node>), Error>;
	fn locate_container(&self, account: &str, container: &str)
		-> Result<(Partition, Vec<Node>), Error>;
	fn locate_object(
		&self,
		account: &str,
		container: &str,
		object: &str,
	) -> Result<ObjectLocation, Error>;
}
