//! Two independent bounded worker pools (SPEC_FULL §4.6): container
//! audits and object probes never share a queue, so a burst of slow
//! object probes cannot starve container paging out of workers. Built
//! on `tokio::sync::Semaphore`, the same primitive `garage`'s background
//! worker system uses to bound concurrent work per table without
//! migrating work between queues (SPEC_FULL §9).

use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::sync::{Notify, Semaphore};

use auditor_util::config::RunConfig;

/// A FIFO-ish pool of at most `capacity` concurrently running tasks.
/// `spawn` never blocks the caller; backpressure is applied inside the
/// spawned task, which waits for a permit before doing any work.
pub struct WorkerPool {
	semaphore: Arc<Semaphore>,
	outstanding: Arc<Mutex<usize>>,
	idle: Arc<Notify>,
}

impl WorkerPool {
	pub fn new(capacity: usize) -> Self {
		WorkerPool {
			semaphore: Arc::new(Semaphore::new(capacity.max(1))),
			outstanding: Arc::new(Mutex::new(0)),
			idle: Arc::new(Notify::new()),
		}
	}

	/// Enqueue `fut` without returning a handle; mirrors `spawn_n` from
	/// SPEC_FULL §4.6.
	pub fn spawn<F>(&self, fut: F)
	where
		F: Future<Output = ()> + Send + 'static,
	{
		{
			let mut n = self.outstanding.lock().unwrap();
			*n += 1;
		}
		let semaphore = self.semaphore.clone();
		let outstanding = self.outstanding.clone();
		let idle = self.idle.clone();
		tokio::spawn(async move {
			let _permit = semaphore.acquire().await.expect("worker pool semaphore closed");
			fut.await;
			drop(_permit);
			let mut n = outstanding.lock().unwrap();
			*n -= 1;
			if *n == 0 {
				idle.notify_waiters();
			}
		});
	}

	pub fn is_idle(&self) -> bool {
		*self.outstanding.lock().unwrap() == 0
	}

	/// Blocks until this pool has no queued or running work. Mirrors
	/// `waitall()` from SPEC_FULL §4.6.
	pub async fn quiesce(&self) {
		loop {
			let notified = self.idle.notified();
			if self.is_idle() {
				return;
			}
			notified.await;
		}
	}
}

/// The container pool and object pool together (SPEC_FULL §4.6).
pub struct Scheduler {
	pub container_pool: WorkerPool,
	pub object_pool: WorkerPool,
}

impl Scheduler {
	pub fn new(config: &RunConfig) -> Self {
		Scheduler {
			container_pool: WorkerPool::new(config.container_pool_capacity()),
			object_pool: WorkerPool::new(config.object_pool_capacity()),
		}
	}

	/// Waits until both pools are idle *simultaneously*: a container task
	/// can enqueue object tasks after the object pool first looks idle,
	/// so a single pass over each pool is not enough.
	pub async fn quiesce(&self) {
		loop {
			self.container_pool.quiesce().await;
			self.object_pool.quiesce().await;
			if self.container_pool.is_idle() && self.object_pool.is_idle() {
				return;
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicUsize, Ordering};

	#[tokio::test]
	async fn quiesce_waits_for_spawned_work() {
		let pool = WorkerPool::new(2);
		let counter = Arc::new(AtomicUsize::new(0));
		for _ in 0..10 {
			let counter = counter.clone();
			pool.spawn(async move {
				tokio::task::yield_now().await;
				counter.fetch_add(1, Ordering::SeqCst);
			});
		}
		pool.quiesce().await;
		assert_eq!(counter.load(Ordering::SeqCst), 10);
	}

	#[tokio::test]
	async fn scheduler_quiesce_covers_chained_spawns() {
		let config = RunConfig {
			concurrency: 4,
			ring_dir: "/etc/swift".into(),
			error_file: None,
			delete: false,
			check_all: false,
			thorough: false,
			min_age: None,
			verbose: false,
			ssh_rescue: false,
		};
		let scheduler = Arc::new(Scheduler::new(&config));
		let counter = Arc::new(AtomicUsize::new(0));
		let counter2 = counter.clone();
		let scheduler2 = scheduler.clone();
		scheduler.container_pool.spawn(async move {
			scheduler2.object_pool.spawn(async move {
				counter2.fetch_add(1, Ordering::SeqCst);
			});
		});
		scheduler.quiesce().await;
		assert_eq!(counter.load(Ordering::SeqCst), 1);
	}
}
