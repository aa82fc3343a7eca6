//! Scheduler, listers, prober, rescue dispatcher and stats reporter for
//! the object storage listing auditor: everything that runs once the
//! ring and direct-client adapters exist, gathered behind the
//! `Auditor` struct that owns all of a run's process-scoped state, the
//! way `garage_model::Garage` gathers the table managers a running node
//! needs behind one struct built once at startup.

#[macro_use]
extern crate tracing;

mod account_lister;
mod auditor;
mod container_lister;
mod prober;
mod rescue;
mod scheduler;
mod stats;

pub use account_lister::AccountLister;
pub use auditor::Auditor;
pub use container_lister::ContainerLister;
pub use prober::{ObjectProber, ProbeOutcome};
pub use rescue::{ProcessRescueLauncher, RescueDispatcher, RescueLauncher};
pub use scheduler::{Scheduler, WorkerPool};
pub use stats::{StatsReporter, StatsSnapshot};
