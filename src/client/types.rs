use err_derive::Error;

/// Outcome of a single HEAD request against one replica (SPEC_FULL §4.2,
/// §4.3). Transport failures are folded in here rather than surfaced as
/// `Result::Err` so the prober can treat "node refused" and "node is
/// unreachable" uniformly when it builds its per-partition reply window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadResult {
	/// 2xx: the node has the object, with this listing timestamp.
	Present { timestamp: String },
	/// Any other HTTP status, most commonly 404 or 507.
	Status(u16),
	/// Connection refused, timed out, TLS failure, etc.
	Transport(String),
}

/// Errors from the listing and delete endpoints, which unlike HEAD do
/// need an error channel: there is no sensible "absent" reading of a
/// failed container listing page.
#[derive(Debug, Error)]
pub enum ClientError {
	#[error(display = "transport error: {}", _0)]
	Transport(String),
	#[error(display = "node returned status {}", _0)]
	Status(u16),
	#[error(display = "malformed response body: {}", _0)]
	Decode(String),
}

/// One row of a container listing page (SPEC_FULL §4.4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
	pub name: String,
	pub timestamp: String,
}

/// Request parameters for one container listing page (SPEC_FULL §4.4).
#[derive(Debug, Clone)]
pub struct ListContainerOpts {
	pub marker: String,
	pub prefix: Option<String>,
	pub limit: usize,
}

impl ListContainerOpts {
	pub fn first_page(limit: usize) -> Self {
		ListContainerOpts {
			marker: String::new(),
			prefix: None,
			limit,
		}
	}

	pub fn after(marker: impl Into<String>, limit: usize) -> Self {
		ListContainerOpts {
			marker: marker.into(),
			prefix: None,
			limit,
		}
	}
}

/// One page of a container listing.
#[derive(Debug, Clone, Default)]
pub struct ListContainerPage {
	pub entries: Vec<ListingEntry>,
	/// `X-Container-Object-Count` on the first page, if the node sent it.
	pub object_count: Option<u64>,
}
