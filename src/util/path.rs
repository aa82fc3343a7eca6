//! The `Path` data model (SPEC_FULL §3): an account, with an optional
//! container and, only if a container is present, an optional object.
//! Paths travel the wire URL-encoded and are decoded before being handed
//! to the ring.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

const PATH_SEGMENT: &AsciiSet = &CONTROLS.add(b'/').add(b'%').add(b'?').add(b'#');

/// An audit target: `account`, `account/container`, or
/// `account/container/object`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
	pub account: String,
	pub container: Option<String>,
	pub object: Option<String>,
}

impl Path {
	pub fn account(account: impl Into<String>) -> Self {
		Path {
			account: account.into(),
			container: None,
			object: None,
		}
	}

	pub fn container(account: impl Into<String>, container: impl Into<String>) -> Self {
		Path {
			account: account.into(),
			container: Some(container.into()),
			object: None,
		}
	}

	pub fn object(
		account: impl Into<String>,
		container: impl Into<String>,
		object: impl Into<String>,
	) -> Self {
		Path {
			account: account.into(),
			container: Some(container.into()),
			object: Some(object.into()),
		}
	}

	/// Parse a single `-`/positional-argument target: up to three
	/// `/`-separated, URL-encoded segments. Returns `None` for an empty
	/// string or more than three segments.
	pub fn parse(raw: &str) -> Option<Path> {
		let raw = raw.trim();
		if raw.is_empty() {
			return None;
		}
		let mut segments = raw.splitn(3, '/');
		let account = decode_segment(segments.next()?);
		let container = segments.next().map(decode_segment);
		let object = segments.next().map(decode_segment);
		if account.is_empty() {
			return None;
		}
		Some(Path {
			account,
			container,
			object,
		})
	}

	/// URL-encoded `/`-joined representation, as written to the error
	/// file and logged in the "Missing object" line.
	pub fn encoded(&self) -> String {
		let mut out = encode_segment(&self.account);
		if let Some(c) = &self.container {
			out.push('/');
			out.push_str(&encode_segment(c));
		}
		if let Some(o) = &self.object {
			out.push('/');
			out.push_str(&encode_segment(o));
		}
		out
	}
}

fn decode_segment(s: &str) -> String {
	percent_decode_str(s).decode_utf8_lossy().into_owned()
}

fn encode_segment(s: &str) -> String {
	utf8_percent_encode(s, PATH_SEGMENT).to_string()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_all_three_granularities() {
		assert_eq!(
			Path::parse("acct"),
			Some(Path {
				account: "acct".into(),
				container: None,
				object: None
			})
		);
		assert_eq!(
			Path::parse("acct/cont"),
			Some(Path {
				account: "acct".into(),
				container: Some("cont".into()),
				object: None
			})
		);
		assert_eq!(
			Path::parse("acct/cont/obj1"),
			Some(Path {
				account: "acct".into(),
				container: Some("cont".into()),
				object: Some("obj1".into())
			})
		);
	}

	#[test]
	fn decodes_percent_encoding() {
		let p = Path::parse("acct/my%20container/my%2Fobject").unwrap();
		assert_eq!(p.container.as_deref(), Some("my container"));
		assert_eq!(p.object.as_deref(), Some("my/object"));
	}

	#[test]
	fn encode_roundtrips_through_parse() {
		let p = Path::object("acct", "my container", "a/b");
		let encoded = p.encoded();
		assert_eq!(Path::parse(&encoded).unwrap(), p);
	}

	#[test]
	fn rejects_empty_input() {
		assert_eq!(Path::parse(""), None);
		assert_eq!(Path::parse("   "), None);
	}
}
