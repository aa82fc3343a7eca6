//! `reqwest`-backed `DirectClient`: the adapter a real deployment links
//! against (SPEC_FULL §4.2). URLs follow the storage node wire
//! convention `http://ip:port/device/partition/account[/container[/object]]`.

use async_trait::async_trait;
use serde::Deserialize;

use auditor_ring::{Node, Partition};
use auditor_util::config::{
	ACCOUNT_OBJECT_COUNT_HEADER, CONNECT_TIMEOUT, CONTAINER_OBJECT_COUNT_HEADER,
	FORCE_ACQUIRE_HEADER, RESPONSE_TIMEOUT, TIMESTAMP_HEADER,
};

use crate::types::{ClientError, HeadResult, ListContainerOpts, ListContainerPage, ListingEntry};
use crate::DirectClient;

pub struct HttpClient {
	inner: reqwest::Client,
}

impl HttpClient {
	pub fn new() -> Result<Self, ClientError> {
		let inner = reqwest::Client::builder()
			.connect_timeout(CONNECT_TIMEOUT)
			.timeout(RESPONSE_TIMEOUT)
			.build()
			.map_err(|e| ClientError::Transport(e.to_string()))?;
		Ok(HttpClient { inner })
	}

	fn base_url(&self, node: &Node, partition: Partition) -> String {
		format!(
			"http://{}:{}/{}/{}",
			node.ip, node.port, node.device, partition
		)
	}
}

impl Default for HttpClient {
	fn default() -> Self {
		Self::new().expect("failed to build default reqwest client")
	}
}

#[derive(Debug, Deserialize)]
struct ListingRow {
	name: String,
	#[serde(default)]
	last_modified: String,
}

#[async_trait]
impl DirectClient for HttpClient {
	async fn head_object(
		&self,
		node: &Node,
		partition: Partition,
		account: &str,
		container: &str,
		object: &str,
		force_acquire: bool,
	) -> HeadResult {
		let url = format!(
			"{}/{}/{}/{}",
			self.base_url(node, partition),
			account,
			container,
			object
		);
		let mut req = self.inner.head(&url);
		if force_acquire {
			req = req.header(FORCE_ACQUIRE_HEADER, "true");
		}
		match req.send().await {
			Ok(resp) if resp.status().is_success() => {
				let timestamp = resp
					.headers()
					.get(TIMESTAMP_HEADER)
					.and_then(|v| v.to_str().ok())
					.unwrap_or_default()
					.to_string();
				HeadResult::Present { timestamp }
			}
			Ok(resp) => HeadResult::Status(resp.status().as_u16()),
			Err(e) => HeadResult::Transport(e.to_string()),
		}
	}

	async fn list_container(
		&self,
		node: &Node,
		partition: Partition,
		account: &str,
		container: &str,
		opts: &ListContainerOpts,
	) -> Result<ListContainerPage, ClientError> {
		let url = format!("{}/{}/{}", self.base_url(node, partition), account, container);
		let mut query = vec![
			("format", "json".to_string()),
			("limit", opts.limit.to_string()),
		];
		if !opts.marker.is_empty() {
			query.push(("marker", opts.marker.clone()));
		}
		if let Some(prefix) = &opts.prefix {
			query.push(("prefix", prefix.clone()));
		}
		let resp = self
			.inner
			.get(&url)
			.query(&query)
			.send()
			.await
			.map_err(|e| ClientError::Transport(e.to_string()))?;
		if !resp.status().is_success() {
			return Err(ClientError::Status(resp.status().as_u16()));
		}
		let object_count = resp
			.headers()
			.get(CONTAINER_OBJECT_COUNT_HEADER)
			.and_then(|v| v.to_str().ok())
			.and_then(|v| v.parse().ok());
		let rows: Vec<ListingRow> = resp
			.json()
			.await
			.map_err(|e| ClientError::Decode(e.to_string()))?;
		let entries = rows
			.into_iter()
			.map(|r| ListingEntry {
				name: r.name,
				timestamp: r.last_modified,
			})
			.collect();
		Ok(ListContainerPage {
			entries,
			object_count,
		})
	}

	async fn list_account(
		&self,
		node: &Node,
		partition: Partition,
		account: &str,
		marker: &str,
	) -> Result<(Vec<String>, Option<u64>), ClientError> {
		let url = format!("{}/{}", self.base_url(node, partition), account);
		let mut query = vec![("format", "json".to_string())];
		if !marker.is_empty() {
			query.push(("marker", marker.to_string()));
		}
		let resp = self
			.inner
			.get(&url)
			.query(&query)
			.send()
			.await
			.map_err(|e| ClientError::Transport(e.to_string()))?;
		if !resp.status().is_success() {
			return Err(ClientError::Status(resp.status().as_u16()));
		}
		let object_count = resp
			.headers()
			.get(ACCOUNT_OBJECT_COUNT_HEADER)
			.and_then(|v| v.to_str().ok())
			.and_then(|v| v.parse().ok());
		let rows: Vec<ListingRow> = resp
			.json()
			.await
			.map_err(|e| ClientError::Decode(e.to_string()))?;
		Ok((rows.into_iter().map(|r| r.name).collect(), object_count))
	}

	async fn delete_container_row(
		&self,
		node: &Node,
		partition: Partition,
		account: &str,
		container: &str,
		object: &str,
		timestamp: &str,
	) -> Result<(), ClientError> {
		let url = format!(
			"{}/{}/{}/{}",
			self.base_url(node, partition),
			account,
			container,
			object
		);
		let resp = self
			.inner
			.delete(&url)
			.header(TIMESTAMP_HEADER, timestamp)
			.send()
			.await
			.map_err(|e| ClientError::Transport(e.to_string()))?;
		if resp.status().is_success() || resp.status().as_u16() == 404 {
			Ok(())
		} else {
			Err(ClientError::Status(resp.status().as_u16()))
		}
	}
}
