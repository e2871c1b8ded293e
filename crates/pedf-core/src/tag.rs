//! The tag-advance collaborator the scheduler consumes but does not own.

/// Host collaborator that advances logical time.
///
/// Implemented by the reactor runtime, not by this crate. Invoked by the
/// dispatcher only while holding the scheduler's global lock, and only
/// when `reaction_q`, `executing_q`, and every idle worker's output
/// buffer are observed empty.
pub trait TagController: Send + Sync {
    /// Advance to the next tag. Returns `true` iff the stop tag has been
    /// reached, in which case the dispatcher will signal every worker to
    /// exit.
    fn advance_tag(&self) -> bool;
}
