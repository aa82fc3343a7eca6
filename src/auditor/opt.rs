use std::path::PathBuf;

use structopt::StructOpt;

/// Audits a cluster for objects that are present in container listings
/// but missing from every storage node that should hold them.
#[derive(StructOpt, Debug)]
#[structopt(name = "cluster-audit")]
pub struct Opt {
	/// Worker concurrency; split 1:3 between the container and object
	/// pools.
	#[structopt(short = "c", default_value = "50")]
	pub concurrency: usize,

	/// Directory holding the three ring descriptors.
	#[structopt(short = "r", parse(from_os_str), default_value = "/etc/swift")]
	pub ring_dir: PathBuf,

	/// Append confirmed-missing paths to this file.
	#[structopt(short = "e", parse(from_os_str))]
	pub error_file: Option<PathBuf>,

	/// Delete confirmed-missing container rows.
	#[structopt(short = "d")]
	pub delete: bool,

	/// Probe every device in the object ring, not just primaries and
	/// handoffs.
	#[structopt(short = "p")]
	pub check_all: bool,

	/// Exhaustively check every container replica instead of stopping
	/// at the first empty page.
	#[structopt(short = "t")]
	pub thorough: bool,

	/// Ignore listing entries younger than this many seconds. Does not
	/// apply to explicit object targets.
	#[structopt(short = "m")]
	pub min_age: Option<u64>,

	/// Log found-object hits and raise the default log level.
	#[structopt(short = "v")]
	pub verbose: bool,

	/// Use SSH-mode rescue instead of local-mode rescue.
	#[structopt(short = "f")]
	pub ssh_rescue: bool,

	/// Read additional targets from this file, one per line.
	#[structopt(short = "i", parse(from_os_str))]
	pub input_file: Option<PathBuf>,

	/// Accepted for compatibility; has no effect.
	#[allow(dead_code)]
	#[structopt(short = "a", hidden = true)]
	unused_a: bool,

	/// Accepted for compatibility; has no effect.
	#[allow(dead_code)]
	#[structopt(short = "b", hidden = true)]
	unused_b: bool,

	/// Audit targets: `account`, `account/container`, or
	/// `account/container/object`, URL-encoded.
	pub targets: Vec<String>,
}
