//! # pedf
//!
//! Public facade over the PEDF-NP (Partitioned Earliest-Deadline-First,
//! Non-Preemptive) reaction scheduler.
//!
//! [`pedf_sched::Scheduler`] only knows how to hold, order, and hand out
//! reactions — it never runs one itself. [`WorkerPool`] is the piece that
//! turns that into a running system: it owns the scheduler and a fixed
//! set of OS threads, each looping on
//! [`Scheduler::get_ready_reaction`](pedf_sched::Scheduler::get_ready_reaction)
//! and handing the result to a host-supplied execute closure.
//!
//! ```ignore
//! use pedf::{SchedulerConfig, WorkerPool};
//!
//! let pool = WorkerPool::spawn(SchedulerConfig::new().num_workers(4), my_tag_controller, |_worker, reaction| {
//!     // run the reaction's body here
//! });
//! // ... trigger reactions via pool.scheduler().trigger_reaction(...) ...
//! pool.shutdown();
//! ```

pub use pedf_core::{level, precedes, Reaction, ReactionRef, ReactionStatus, SchedError, SchedResult, TagController};
pub use pedf_sched::{Scheduler, SchedulerConfig, SchedulerStats};

use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Owns a [`Scheduler`] and the OS worker threads that drive it.
///
/// Dropping a pool (or calling [`WorkerPool::shutdown`] explicitly) signals
/// every worker to stop and joins its thread.
pub struct WorkerPool<A: TagController + 'static> {
    scheduler: Arc<Scheduler<A>>,
    handles: Vec<JoinHandle<()>>,
}

impl<A: TagController + 'static> WorkerPool<A> {
    /// Build the scheduler from `config` and spawn one named OS thread per
    /// configured worker. Each thread loops: pull a ready reaction, call
    /// `execute(worker_id, &reaction)`, report it done, repeat — until the
    /// scheduler signals it should stop.
    pub fn spawn<F>(config: SchedulerConfig, advancer: A, execute: F) -> Self
    where
        F: Fn(usize, &ReactionRef) + Send + Sync + 'static,
    {
        let scheduler = Arc::new(Scheduler::init(config, advancer));
        let execute = Arc::new(execute);
        let handles = (0..scheduler.num_workers())
            .map(|id| {
                let scheduler = Arc::clone(&scheduler);
                let execute = Arc::clone(&execute);
                thread::Builder::new()
                    .name(format!("pedf-worker-{id}"))
                    .spawn(move || {
                        while let Some(r) = scheduler.get_ready_reaction(id) {
                            execute(id, &r);
                            scheduler.done_with_reaction(id, r);
                        }
                    })
                    .expect("failed to spawn pedf worker thread")
            })
            .collect();
        Self { scheduler, handles }
    }

    /// A shared handle to the underlying scheduler, for triggering
    /// reactions from outside any worker thread.
    pub fn scheduler(&self) -> &Arc<Scheduler<A>> {
        &self.scheduler
    }

    /// Snapshot of current queue depths and idle worker count.
    pub fn stats(&self) -> SchedulerStats {
        self.scheduler.stats()
    }

    /// Signal every worker to stop immediately and block until all of
    /// them exit, regardless of any reactions still queued. For a pool
    /// whose `TagController` will eventually signal stop on its own once
    /// quiescent, use [`WorkerPool::wait`] instead so nothing queued is
    /// dropped early.
    pub fn shutdown(mut self) {
        self.scheduler.shutdown();
        self.join();
    }

    /// Block until every worker thread exits on its own — i.e. until the
    /// `TagController` returns `true` from a fully quiescent dispatch
    /// round. Does not force an early stop.
    pub fn wait(mut self) {
        self.join();
    }

    fn join(&mut self) {
        for h in self.handles.drain(..) {
            let _ = h.join();
        }
    }
}

impl<A: TagController + 'static> Drop for WorkerPool<A> {
    fn drop(&mut self) {
        self.scheduler.shutdown();
        self.join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU8, AtomicUsize};
    use std::sync::Mutex;

    struct TestReaction {
        index: u64,
        chain_id: u64,
        status: AtomicU8,
        affinity: AtomicUsize,
    }

    impl Reaction for TestReaction {
        fn index(&self) -> u64 {
            self.index
        }
        fn chain_id(&self) -> u64 {
            self.chain_id
        }
        fn status_cell(&self) -> &AtomicU8 {
            &self.status
        }
        fn worker_affinity(&self) -> &AtomicUsize {
            &self.affinity
        }
        fn name(&self) -> &str {
            "test"
        }
    }

    /// Signals stop only once at least `target` reactions have completed —
    /// avoids racing a real quiescence check against triggers that have not
    /// been submitted yet (the pool's worker threads start before the test
    /// below gets a chance to call `trigger_reaction`).
    struct StopAfter {
        target: u32,
        done: Arc<Mutex<u32>>,
    }
    impl TagController for StopAfter {
        fn advance_tag(&self) -> bool {
            *self.done.lock().unwrap() >= self.target
        }
    }

    #[test]
    fn pool_runs_triggered_reactions_then_shuts_down() {
        let ran = Arc::new(Mutex::new(0u32));
        let ran2 = Arc::clone(&ran);
        let pool = WorkerPool::spawn(
            SchedulerConfig::new().num_workers(2),
            StopAfter {
                target: 4,
                done: Arc::clone(&ran),
            },
            move |_worker, _r| {
                *ran2.lock().unwrap() += 1;
            },
        );

        for i in 0..4u64 {
            let r: ReactionRef = Arc::new(TestReaction {
                index: i,
                chain_id: 1 << i,
                status: AtomicU8::new(ReactionStatus::Inactive as u8),
                affinity: AtomicUsize::new(0),
            });
            pool.scheduler().trigger_reaction(r, None);
        }

        pool.wait();
        assert_eq!(*ran.lock().unwrap(), 4);
    }
}
