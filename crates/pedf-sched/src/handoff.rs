//! The lock-free handoff cell backing a worker's `output_reactions` /
//! `done_reactions` buffers.
//!
//! An `UnsafeCell` wrapper that hands out exclusive access without ever
//! taking a lock. The "lock" is the `is_idle` atomic published by the
//! worker slot —
//! the dispatcher may call [`HandoffCell::get_mut`] only while it has
//! observed `is_idle == 1` (acquire), and the worker only while it holds
//! `is_idle == 0`. Neither side may call it otherwise; doing so is a
//! safety violation, not a runtime-checked error.

use std::cell::UnsafeCell;

pub struct HandoffCell<T> {
    inner: UnsafeCell<T>,
}

// Safety: access is serialized by the `is_idle` handoff protocol
// documented on `WorkerSlot`, not by any lock this type holds itself.
unsafe impl<T: Send> Send for HandoffCell<T> {}
unsafe impl<T: Send> Sync for HandoffCell<T> {}

impl<T> HandoffCell<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: UnsafeCell::new(value),
        }
    }

    /// Get exclusive access to the contents.
    ///
    /// # Safety
    ///
    /// The caller must currently own the handoff side license: the
    /// dispatcher only while `is_idle == 1` was observed with `Acquire`
    /// ordering for this worker, the worker only while it owns `is_idle
    /// == 0`.
    #[inline]
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn get_mut(&self) -> &mut T {
        &mut *self.inner.get()
    }
}
