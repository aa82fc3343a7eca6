//! `cluster-audit` CLI: parses the invocation surface described in
//! SPEC_FULL §6, wires the ring and direct-client adapters into an
//! `Auditor`, and runs every target to completion.

#[macro_use]
extern crate tracing;

mod opt;

use std::io::{self, BufRead};
use std::sync::Arc;
use std::time::Duration;

use structopt::StructOpt;

use auditor_client::HttpClient;
use auditor_core::{Auditor, ProcessRescueLauncher};
use auditor_ring::load_rings;
use auditor_util::config::RunConfig;
use auditor_util::path::Path;

use opt::Opt;

#[tokio::main]
async fn main() {
	let opt = match Opt::from_args_safe() {
		Ok(o) => o,
		Err(e) => {
			eprintln!("{}", e);
			std::process::exit(2);
		}
	};

	if std::env::var("RUST_LOG").is_err() {
		let default_log = if opt.verbose {
			"cluster_audit=debug"
		} else {
			"cluster_audit=info"
		};
		std::env::set_var("RUST_LOG", default_log);
	}
	tracing_subscriber::fmt()
		.with_writer(std::io::stderr)
		.with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
		.init();

	let targets = match gather_targets(&opt) {
		Ok(targets) => targets,
		Err(()) => {
			Opt::clap().print_help().ok();
			println!();
			std::process::exit(2);
		}
	};

	let config = RunConfig {
		concurrency: opt.concurrency,
		ring_dir: opt.ring_dir.clone(),
		error_file: opt.error_file.clone(),
		delete: opt.delete,
		check_all: opt.check_all,
		thorough: opt.thorough,
		min_age: opt.min_age.map(Duration::from_secs),
		verbose: opt.verbose,
		ssh_rescue: opt.ssh_rescue,
	};

	let ring = match load_rings(&config.ring_dir) {
		Ok(r) => Arc::new(r),
		Err(e) => {
			eprintln!("Error: could not load rings from {}: {}", config.ring_dir.display(), e);
			std::process::exit(2);
		}
	};
	let client = match HttpClient::new() {
		Ok(c) => Arc::new(c),
		Err(e) => {
			eprintln!("Error: could not build HTTP client: {}", e);
			std::process::exit(2);
		}
	};
	let rescue_launcher = Arc::new(ProcessRescueLauncher);

	let auditor = match Auditor::new(ring, client, rescue_launcher, config) {
		Ok(a) => a,
		Err(e) => {
			eprintln!("Error: {}", e);
			std::process::exit(2);
		}
	};

	auditor.run(targets).await;
}

/// Gathers audit targets from positional arguments, `-i FILE`, and
/// standard input, per SPEC_FULL §6. Returns `Err(())` only when no
/// source of targets is available and stdin is a terminal.
fn gather_targets(opt: &Opt) -> Result<Vec<Path>, ()> {
	let mut raw = opt.targets.clone();

	if let Some(input_file) = &opt.input_file {
		match std::fs::read_to_string(input_file) {
			Ok(contents) => raw.extend(contents.lines().map(String::from)),
			Err(e) => {
				eprintln!("Error: could not read {}: {}", input_file.display(), e);
			}
		}
	}

	let have_explicit_source = !opt.targets.is_empty() || opt.input_file.is_some();

	if !have_explicit_source {
		if atty::is(atty::Stream::Stdin) {
			return Err(());
		}
		let stdin = io::stdin();
		for line in stdin.lock().lines().filter_map(Result::ok) {
			raw.push(line);
		}
	}

	Ok(raw
		.iter()
		.filter_map(|line| {
			let parsed = Path::parse(line);
			if parsed.is_none() && !line.trim().is_empty() {
				warn!("ignoring unparseable target: {}", line);
			}
			parsed
		})
		.collect())
}
