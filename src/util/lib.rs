//! Shared error type, time helpers, path encoding and run configuration
//! for the object storage listing auditor.

#[macro_use]
extern crate tracing;

pub mod config;
pub mod error;
pub mod path;
pub mod time;

pub use error::Error;
