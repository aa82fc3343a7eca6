//! Direct Client Adapter (SPEC_FULL §4.2): HEAD object, GET a container
//! or account listing, and DELETE a container row, each issued directly
//! against one named storage node -- never through the ring, never load
//! balanced. `DirectClient` is the abstract interface the rest of the
//! crate programs against; `HttpClient` is the shipped `reqwest`-based
//! implementation.
//!
//! Response classification happens at the *caller* (the object prober),
//! per SPEC_FULL §4.2/§7: this crate only reports what happened on the
//! wire (`HeadResult`, `Result<_, ClientError>`), it never decides
//! whether a given outcome counts as "absent" or "uncertain".

#[macro_use]
extern crate tracing;

mod http;
mod types;

pub use http::HttpClient;
pub use types::{ClientError, HeadResult, ListContainerOpts, ListContainerPage, ListingEntry};

use async_trait::async_trait;

use auditor_ring::{Node, Partition};

/// Abstract direct-client interface (SPEC_FULL §4.2).
#[async_trait]
pub trait DirectClient: Send + Sync {
	/// HEAD the object on one specific node. Never returns `Err`: every
	/// outcome, including transport failures, is reported through
	/// `HeadResult` so the prober can apply the window/rank rules from
	/// SPEC_FULL §4.3 uniformly.
	async fn head_object(
		&self,
		node: &Node,
		partition: Partition,
		account: &str,
		container: &str,
		object: &str,
		force_acquire: bool,
	) -> HeadResult;

	/// Page a container listing on one specific replica.
	async fn list_container(
		&self,
		node: &Node,
		partition: Partition,
		account: &str,
		container: &str,
		opts: &ListContainerOpts,
	) -> Result<ListContainerPage, ClientError>;

	/// Page an account listing on one specific replica. Returns the
	/// container names on this page and, on the first page, the
	/// account's total object count if the node reports one.
	async fn list_account(
		&self,
		node: &Node,
		partition: Partition,
		account: &str,
		marker: &str,
	) -> Result<(Vec<String>, Option<u64>), ClientError>;

	/// Delete one container row. `timestamp` is the caller-supplied
	/// `X-Timestamp` value (SPEC_FULL §4.2, §9).
	async fn delete_container_row(
		&self,
		node: &Node,
		partition: Partition,
		account: &str,
		container: &str,
		object: &str,
		timestamp: &str,
	) -> Result<(), ClientError>;
}
