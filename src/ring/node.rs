//! The `Node` data model (SPEC_FULL §3): a storage endpoint, opaque to
//! the rest of the crate except for use with the direct client adapter.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Node {
	pub ip: IpAddr,
	pub port: u16,
	pub device: String,
	pub id: String,
}

impl Node {
	/// Key used to de-duplicate SSH-mode rescue dispatch: one command
	/// per (ip, device) per run (SPEC_FULL §3, §4.7).
	pub fn ip_device_key(&self) -> String {
		format!("{}/{}", self.ip, self.device)
	}
}

impl std::fmt::Display for Node {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}:{}/{}", self.ip, self.port, self.device)
	}
}
