//! Crate-wide error type, in the style of `garage_util::error`: a flat
//! enum of the failure classes the auditor's own code can produce, plus a
//! catch-all `Message` variant and a couple of extension traits so call
//! sites read `foo.ok_or_message("...")?` / `foo.err_context("...")?`
//! instead of matching by hand everywhere.
//!
//! Per the error handling design (SPEC_FULL §7/§12), this type is only
//! for *fatal* errors: a bad ring directory, an unparseable flag. Errors
//! from individual probes and listing calls are classified at their call
//! site and folded into `ProbeOutcome` / counters, never propagated here.

use err_derive::Error;

#[derive(Debug, Error)]
pub enum Error {
	#[error(display = "IO error: {}", _0)]
	Io(#[error(source)] std::io::Error),

	#[error(display = "JSON error: {}", _0)]
	Json(#[error(source)] serde_json::Error),

	#[error(display = "Invalid argument: {}", _0)]
	Message(String),
}

impl From<&str> for Error {
	fn from(v: &str) -> Error {
		Error::Message(v.into())
	}
}

impl From<String> for Error {
	fn from(v: String) -> Error {
		Error::Message(v)
	}
}

/// Mirrors `garage_util::error::OkOrMessage`: turns an `Option` into a
/// `Result<_, Error>` by supplying the message for the `None` case.
pub trait OkOrMessage<T> {
	fn ok_or_message<M: Into<String>>(self, msg: M) -> Result<T, Error>;
}

impl<T> OkOrMessage<T> for Option<T> {
	fn ok_or_message<M: Into<String>>(self, msg: M) -> Result<T, Error> {
		self.ok_or_else(|| Error::Message(msg.into()))
	}
}

/// Mirrors `garage_util::error::Error::err_context`: attach a bit of extra
/// context to whatever error a fallible call produced, without discarding
/// the original `Display` text.
pub trait ErrContext<T> {
	fn err_context<M: Into<String>>(self, ctx: M) -> Result<T, Error>;
}

impl<T, E: std::fmt::Display> ErrContext<T> for Result<T, E> {
	fn err_context<M: Into<String>>(self, ctx: M) -> Result<T, Error> {
		self.map_err(|e| Error::Message(format!("{}: {}", ctx.into(), e)))
	}
}
