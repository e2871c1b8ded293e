//! The dispatcher: a single scheduling round, the worker-facing API, and
//! the election + parking protocol that drives it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use pedf_core::{Reaction, ReactionRef, ReactionStatus, TagController};

use crate::config::SchedulerConfig;
use crate::pqueue::PriorityQueue;
use crate::precedence::is_blocked;
use crate::vector::DynVector;
use crate::worker::{WorkerSlot, BUSY, IDLE};

/// State protected by the scheduler's single global mutex: `reaction_q`,
/// `executing_q`, `transfer_q`, and the round-robin placement cursor.
struct GlobalState {
    reaction_q: PriorityQueue,
    executing_q: PriorityQueue,
    transfer_q: DynVector<ReactionRef>,
    balancing_index: usize,
}

/// A cheap, lock-protected snapshot of queue depths, for diagnostics.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerStats {
    pub reaction_q_len: usize,
    pub executing_q_len: usize,
    pub transfer_q_len: usize,
    pub idle_workers: usize,
}

/// The PEDF-NP scheduler.
pub struct Scheduler<A: TagController> {
    config: SchedulerConfig,
    workers: Vec<WorkerSlot>,
    global: Mutex<GlobalState>,
    scheduling_in_progress: AtomicBool,
    advancer: A,
}

impl<A: TagController> Scheduler<A> {
    /// Allocate global queues and worker slots. Workers start busy
    /// (`is_idle = 0`) and running (`should_stop = false`) — matching the
    /// teacher's convention that a freshly spawned worker thread is
    /// assumed to enter its loop immediately, not parked.
    pub fn init(config: SchedulerConfig, advancer: A) -> Self {
        config.validate().expect("invalid scheduler configuration");
        let workers = (0..config.num_workers)
            .map(|id| WorkerSlot::new(id, &config))
            .collect();
        let global = GlobalState {
            reaction_q: PriorityQueue::new(config.initial_queue_capacity),
            executing_q: PriorityQueue::new(config.initial_queue_capacity),
            transfer_q: DynVector::with_threshold(
                config.initial_vector_capacity,
                config.shrink_vote_threshold,
            ),
            balancing_index: 0,
        };
        Self {
            config,
            workers,
            global: Mutex::new(global),
            scheduling_in_progress: AtomicBool::new(false),
            advancer,
        }
    }

    pub fn num_workers(&self) -> usize {
        self.workers.len()
    }

    fn debug_log(&self, args: std::fmt::Arguments<'_>) {
        if self.config.debug_logging {
            eprintln!("[pedf-sched] {args}");
        }
    }

    fn worker(&self, id: usize) -> &WorkerSlot {
        &self.workers[id]
    }

    /// Snapshot current queue depths and idle worker count.
    pub fn stats(&self) -> SchedulerStats {
        let g = self.global.lock().unwrap();
        SchedulerStats {
            reaction_q_len: g.reaction_q.len(),
            executing_q_len: g.executing_q.len(),
            transfer_q_len: g.transfer_q.len(),
            idle_workers: self.workers.iter().filter(|w| w.is_idle()).count(),
        }
    }

    // ---- Worker-facing API -------------------------------------------------

    /// Publish a new eligible reaction.
    ///
    /// `worker` is `Some(w)` when called from inside worker `w`'s running
    /// reaction (no global mutex is taken: safe because `w` is currently
    /// non-idle and therefore owns `output_reactions`), or `None` for an
    /// anonymous caller (acquires the global mutex and inserts directly
    /// into `reaction_q`).
    pub fn trigger_reaction(&self, reaction: ReactionRef, worker: Option<usize>) {
        match worker {
            None => {
                let mut g = self.global.lock().unwrap();
                reaction
                    .cas_status(ReactionStatus::Inactive, ReactionStatus::Queued)
                    .unwrap_or_else(|actual| {
                        panic!(
                            "invariant violation: trigger_reaction expected Inactive, observed {actual} for '{}'",
                            reaction.name()
                        )
                    });
                g.reaction_q.insert(reaction);
            }
            Some(w) => {
                reaction
                    .cas_status(ReactionStatus::Inactive, ReactionStatus::Queued)
                    .unwrap_or_else(|actual| {
                        panic!(
                            "invariant violation: trigger_reaction expected Inactive, observed {actual} for '{}'",
                            reaction.name()
                        )
                    });
                reaction.worker_affinity().store(w, Ordering::Relaxed);
                // Safety: called from worker `w`'s own thread while it is
                // busy running a reaction (is_idle == 0), so `w` owns
                // `output_reactions` exclusively.
                unsafe {
                    self.worker(w).output_reactions_owned().push(reaction);
                }
            }
        }
    }

    /// Record that worker `w` has finished executing `reaction`.
    pub fn done_with_reaction(&self, w: usize, reaction: ReactionRef) {
        reaction
            .cas_status(ReactionStatus::Running, ReactionStatus::Inactive)
            .unwrap_or_else(|actual| {
                panic!(
                    "invariant violation: done_with_reaction expected Running, observed {actual} for '{}'",
                    reaction.name()
                )
            });
        // Safety: called from worker `w`'s own thread while busy.
        unsafe {
            self.worker(w).done_reactions_owned().push(reaction);
        }
    }

    /// Return the next reaction for worker `w`, or `None` to terminate.
    pub fn get_ready_reaction(&self, w: usize) -> Option<ReactionRef> {
        loop {
            if self.worker(w).should_stop.load(Ordering::Acquire) {
                return None;
            }

            if let Some(r) = self.worker(w).ready_reactions.lock().unwrap().pop() {
                return Some(r);
            }

            if self.workers.len() > 1 {
                let victim = (w + 1) % self.workers.len();
                if let Some(r) = self.worker(victim).ready_reactions.lock().unwrap().pop() {
                    self.debug_log(format_args!(
                        "worker {w} stole a reaction from worker {victim}"
                    ));
                    return Some(r);
                }
            }

            self.wait_for_work(w);
        }
    }

    /// Mark `w` idle, then either run a dispatcher round (election
    /// winner) or park until signaled (election loser).
    fn wait_for_work(&self, w: usize) {
        let worker = self.worker(w);
        let _ = worker
            .is_idle
            .compare_exchange(BUSY, IDLE, Ordering::Release, Ordering::Relaxed);

        if self
            .scheduling_in_progress
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            self.debug_log(format_args!("worker {w} won the dispatcher election"));
            self.run_dispatch_round();
            // If the round placed work onto `w` itself, notify_worker
            // already flipped this to BUSY; a failed CAS here just means
            // that happened, not an invariant violation.
            let _ = worker
                .is_idle
                .compare_exchange(IDLE, BUSY, Ordering::Release, Ordering::Relaxed);
            self.scheduling_in_progress
                .compare_exchange(true, false, Ordering::Release, Ordering::Relaxed)
                .unwrap_or_else(|_| panic!("invariant violation: election flag was not held by {w}"));
        } else {
            worker.park();
        }
    }

    // ---- Dispatcher round ---------------------------------------

    /// Run one scheduling round. Returns whether the stop tag was reached.
    pub fn run_dispatch_round(&self) -> bool {
        let mut g = self.global.lock().unwrap();

        // 1. Drain worker outputs and retire done reactions.
        let mut any_busy = false;
        for w in &self.workers {
            if w.is_idle() {
                // Safety: `is_idle == 1` was just observed (Acquire) for
                // this worker, so the dispatcher owns its buffers.
                let outputs = unsafe { w.output_reactions_as_dispatcher() };
                for r in outputs.drain_all() {
                    g.reaction_q.insert(r);
                }
                let done = unsafe { w.done_reactions_as_dispatcher() };
                for r in done.drain_all() {
                    if !g.executing_q.remove_by_identity(&r) {
                        panic!(
                            "invariant violation: retiring '{}' that was not in executing_q",
                            r.name()
                        );
                    }
                }
            } else {
                any_busy = true;
            }
        }

        // 2. Possibly advance tag.
        let mut must_stop = false;
        if !any_busy && g.reaction_q.is_empty() && g.executing_q.is_empty() {
            if self.advancer.advance_tag() {
                must_stop = true;
                self.debug_log(format_args!("stop tag reached"));
            }
        }

        // 3. Distribute ready reactions.
        let num_workers = self.workers.len();
        let mut notify_mask = vec![false; num_workers];
        while let Some(r) = g.reaction_q.pop() {
            if is_blocked(r.as_ref(), &g.executing_q, &g.transfer_q) {
                g.transfer_q.push(r);
                continue;
            }
            match self.try_place(&mut g, &r) {
                Some(idx) => {
                    g.executing_q.insert(r);
                    notify_mask[idx] = true;
                }
                None => g.transfer_q.push(r),
            }
        }

        // 4. Return transfer back.
        let mut returned = Vec::with_capacity(g.transfer_q.len());
        while let Some(r) = g.transfer_q.pop() {
            returned.push(r);
        }
        for r in returned {
            g.reaction_q.insert(r);
        }

        // 5. Reset balancing index.
        g.balancing_index = 0;

        drop(g);

        // 6. Notify workers that received work.
        for (idx, placed) in notify_mask.into_iter().enumerate() {
            if placed {
                self.notify_worker(idx);
            }
        }

        // 7. Propagate stop.
        if must_stop {
            for w in &self.workers {
                w.should_stop.store(true, Ordering::Release);
                w.notify_all();
            }
        }

        must_stop
    }

    /// Placement: scan workers circularly from
    /// `max(r.worker_affinity, balancing_index)`, stopping at the first
    /// idle one.
    fn try_place(&self, g: &mut GlobalState, r: &ReactionRef) -> Option<usize> {
        let num_workers = self.workers.len();
        let affinity = r.worker_affinity().load(Ordering::Relaxed);
        let start = affinity.max(g.balancing_index) % num_workers;

        for offset in 0..num_workers {
            let idx = (start + offset) % num_workers;
            let w = &self.workers[idx];
            if w.is_idle() {
                r.cas_status(ReactionStatus::Queued, ReactionStatus::Running)
                    .unwrap_or_else(|actual| {
                        panic!(
                            "invariant violation: placement expected Queued, observed {actual} for '{}'",
                            r.name()
                        )
                    });
                w.ready_reactions.lock().unwrap().insert(r.clone());
                g.balancing_index = (idx + 1) % num_workers;
                return Some(idx);
            }
        }
        None
    }

    /// CAS `is_idle: 1 -> 0` so only the thread that wins the CAS signals
    /// the worker — prevents double-wakes and licenses that worker to
    /// treat its ready queue as its own again.
    fn notify_worker(&self, idx: usize) {
        let w = &self.workers[idx];
        if w.is_idle
            .compare_exchange(IDLE, BUSY, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            w.notify();
        }
    }

    /// Signal every worker to stop, regardless of tag state. Used by
    /// hosts that want to tear the scheduler down early.
    pub fn shutdown(&self) {
        for w in &self.workers {
            w.should_stop.store(true, Ordering::Release);
            w.notify_all();
        }
    }
}
