//! Per-worker handoff state: ready queue, output buffer, done buffer,
//! idle flag, condvar, stop flag.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Condvar, Mutex};

use pedf_core::ReactionRef;

use crate::config::SchedulerConfig;
use crate::handoff::HandoffCell;
use crate::pqueue::PriorityQueue;
use crate::vector::DynVector;

/// `is_idle` values. `0` = busy (worker owns its lock-free buffers), `1`
/// = idle (the scheduler owns them).
pub const BUSY: u8 = 0;
pub const IDLE: u8 = 1;

/// One worker's scheduling state.
pub struct WorkerSlot {
    pub id: usize,

    /// Reactions assigned to this worker, pending execution. Its own
    /// mutex: the dispatcher always takes this mutex during placement
    /// rather than relying on `is_idle` for this particular field.
    pub ready_reactions: Mutex<PriorityQueue>,

    /// Reactions this worker triggered during its current execution and
    /// has not yet published globally. Lock-free: guarded by the
    /// `is_idle` handoff.
    output_reactions: HandoffCell<DynVector<ReactionRef>>,

    /// Reactions this worker has finished and not yet retired from
    /// `executing_q`. Lock-free: guarded by the `is_idle` handoff.
    done_reactions: HandoffCell<DynVector<ReactionRef>>,

    /// `0` = busy, `1` = idle. Published with acquire/release ordering on
    /// every transition so the memory effects of one side's buffer
    /// accesses are visible to the other across the flip.
    pub is_idle: AtomicU8,

    /// Set by the dispatcher at the stop tag.
    pub should_stop: AtomicBool,

    /// Parking primitives. `park_mutex` guards nothing but the condvar
    /// wait itself — the worker's actual queues have their own
    /// synchronization described above.
    park_mutex: Mutex<()>,
    park_cond: Condvar,
}

impl WorkerSlot {
    pub fn new(id: usize, config: &SchedulerConfig) -> Self {
        Self {
            id,
            ready_reactions: Mutex::new(PriorityQueue::new(config.initial_ready_capacity)),
            output_reactions: HandoffCell::new(DynVector::with_threshold(
                config.initial_vector_capacity,
                config.shrink_vote_threshold,
            )),
            done_reactions: HandoffCell::new(DynVector::with_threshold(
                config.initial_vector_capacity,
                config.shrink_vote_threshold,
            )),
            is_idle: AtomicU8::new(BUSY),
            should_stop: AtomicBool::new(false),
            park_mutex: Mutex::new(()),
            park_cond: Condvar::new(),
        }
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        self.is_idle.load(Ordering::Acquire) == IDLE
    }

    /// Worker-side access to `output_reactions`. Caller must be the
    /// worker that owns this slot, and must own `is_idle == 0`.
    ///
    /// # Safety
    /// See [`HandoffCell::get_mut`].
    #[inline]
    pub unsafe fn output_reactions_owned(&self) -> &mut DynVector<ReactionRef> {
        self.output_reactions.get_mut()
    }

    /// Worker-side access to `done_reactions`. Same contract as
    /// [`WorkerSlot::output_reactions_owned`].
    ///
    /// # Safety
    /// See [`HandoffCell::get_mut`].
    #[inline]
    pub unsafe fn done_reactions_owned(&self) -> &mut DynVector<ReactionRef> {
        self.done_reactions.get_mut()
    }

    /// Dispatcher-side access to `output_reactions`. Caller must have
    /// observed `is_idle == 1` (acquire) for this worker just before the
    /// call.
    ///
    /// # Safety
    /// See [`HandoffCell::get_mut`].
    #[inline]
    pub unsafe fn output_reactions_as_dispatcher(&self) -> &mut DynVector<ReactionRef> {
        self.output_reactions.get_mut()
    }

    /// Dispatcher-side access to `done_reactions`. Same contract as
    /// [`WorkerSlot::output_reactions_as_dispatcher`].
    ///
    /// # Safety
    /// See [`HandoffCell::get_mut`].
    #[inline]
    pub unsafe fn done_reactions_as_dispatcher(&self) -> &mut DynVector<ReactionRef> {
        self.done_reactions.get_mut()
    }

    /// Park this worker until signaled or `should_stop` is observed.
    ///
    /// Must only be called after the worker has lost the dispatcher
    /// election (the winner runs a round instead of parking). Re-checks
    /// `is_idle` under the park mutex before waiting: the election
    /// winner's round (and its notify step) can run entirely between this
    /// worker marking itself idle and it reaching the `wait` call below,
    /// which would otherwise be a lost wakeup.
    pub fn park(&self) {
        let guard = self.park_mutex.lock().unwrap();
        if self.should_stop.load(Ordering::Acquire) || !self.is_idle() {
            return;
        }
        let _unused = self.park_cond.wait(guard).unwrap();
    }

    /// Wake this worker if it is parked.
    pub fn notify(&self) {
        let _guard = self.park_mutex.lock().unwrap();
        self.park_cond.notify_one();
    }

    /// Wake this worker unconditionally, e.g. for shutdown.
    pub fn notify_all(&self) {
        let _guard = self.park_mutex.lock().unwrap();
        self.park_cond.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_worker_starts_busy_and_running() {
        let cfg = SchedulerConfig::default();
        let w = WorkerSlot::new(0, &cfg);
        assert!(!w.is_idle());
        assert!(!w.should_stop.load(Ordering::Relaxed));
    }

    struct TestReaction(AtomicU8, std::sync::atomic::AtomicUsize);
    impl pedf_core::Reaction for TestReaction {
        fn index(&self) -> u64 {
            0
        }
        fn chain_id(&self) -> u64 {
            0
        }
        fn status_cell(&self) -> &AtomicU8 {
            &self.0
        }
        fn worker_affinity(&self) -> &std::sync::atomic::AtomicUsize {
            &self.1
        }
        fn name(&self) -> &str {
            "r"
        }
    }

    fn test_reaction() -> ReactionRef {
        use pedf_core::ReactionStatus;
        std::sync::Arc::new(TestReaction(
            AtomicU8::new(ReactionStatus::Inactive as u8),
            std::sync::atomic::AtomicUsize::new(0),
        ))
    }

    #[test]
    fn output_reactions_handoff_is_visible_across_idle_flip() {
        let cfg = SchedulerConfig::default();
        let w = WorkerSlot::new(0, &cfg);

        // Worker pushes while busy.
        unsafe {
            w.output_reactions_owned().push(test_reaction());
        }

        w.is_idle.store(IDLE, Ordering::Release);
        let len = unsafe { w.output_reactions_as_dispatcher().len() };
        assert_eq!(len, 1);
    }
}
