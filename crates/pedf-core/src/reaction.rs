//! The reaction record and the CAS-only lifecycle it follows.

use std::fmt;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;

/// Lifecycle state of a reaction within one triggering.
///
/// Transitions are CAS-only: `Inactive -> Queued`, `Queued -> Running`,
/// `Running -> Inactive`. Any other observed value at a transition site is
/// a programming error in the host or the scheduler and is fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReactionStatus {
    Inactive = 0,
    Queued = 1,
    Running = 2,
}

impl From<u8> for ReactionStatus {
    fn from(v: u8) -> Self {
        match v {
            0 => ReactionStatus::Inactive,
            1 => ReactionStatus::Queued,
            2 => ReactionStatus::Running,
            other => panic!("invalid ReactionStatus discriminant: {other}"),
        }
    }
}

impl From<ReactionStatus> for u8 {
    fn from(s: ReactionStatus) -> u8 {
        s as u8
    }
}

impl fmt::Display for ReactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReactionStatus::Inactive => write!(f, "inactive"),
            ReactionStatus::Queued => write!(f, "queued"),
            ReactionStatus::Running => write!(f, "running"),
        }
    }
}

/// Extract the 16-bit level (topological depth) from a packed priority key.
///
/// `LEVEL(index) = index & 0xFFFF`. This is the only decomposition the
/// scheduler performs on `index` — the remaining 48 bits (the deadline)
/// are opaque to it and must never be reordered.
#[inline]
pub const fn level(index: u64) -> u16 {
    (index & 0xFFFF) as u16
}

/// A unit of work the scheduler dispatches to worker threads.
///
/// This is the "opaque entity with fields the scheduler touches" from the
/// design: a host reactor runtime implements this trait on its own
/// reaction type. The scheduler never owns a `Reaction` outright — it
/// holds `Arc<dyn Reaction>` handles ([`ReactionRef`]), which may also be
/// held by the host as the canonical owner for as long as it lives.
pub trait Reaction: Send + Sync {
    /// Packed priority key: top 48 bits deadline, bottom 16 bits level.
    /// Smaller key = higher priority. Must never change after construction.
    fn index(&self) -> u64;

    /// Bitmask identifying the connected component(s) this reaction
    /// belongs to. Two reactions may interact iff their masks overlap.
    fn chain_id(&self) -> u64;

    /// The atomic cell backing [`ReactionStatus`]. Required so the
    /// default CAS helpers below can be implemented once, here, instead
    /// of duplicated by every host type.
    fn status_cell(&self) -> &AtomicU8;

    /// Placement hint: a worker index the dispatcher should try first.
    fn worker_affinity(&self) -> &AtomicUsize;

    /// Opaque diagnostic label, never interpreted by the scheduler.
    fn name(&self) -> &str;

    /// Topological depth, derived from `index`.
    #[inline]
    fn level(&self) -> u16 {
        level(self.index())
    }

    /// Current lifecycle state.
    #[inline]
    fn status(&self) -> ReactionStatus {
        ReactionStatus::from(self.status_cell().load(Ordering::Acquire))
    }

    /// Attempt the CAS transition `from -> to`. Returns the value actually
    /// observed on failure so the caller can report it — any failure here
    /// means two callers raced on the same reaction, which is always a
    /// fatal bug in the caller, never an expected outcome.
    #[inline]
    fn cas_status(&self, from: ReactionStatus, to: ReactionStatus) -> Result<(), ReactionStatus> {
        self.status_cell()
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(ReactionStatus::from)
    }
}

/// A non-owning handle to a reaction, shared between the global queues and
/// worker slots. At most one of `{reaction_q, a worker's ready_reactions,
/// a worker's output_reactions}` ∪ `{transfer_q during a round}` holds a
/// given reaction between `inactive -> queued` and the matching
/// `running -> inactive`.
pub type ReactionRef = Arc<dyn Reaction>;

/// Precedence predicate over two reactions: `a` blocks `b` iff `a` is at a
/// lower level and their chain ids overlap.
#[inline]
pub fn precedes(a: &dyn Reaction, b: &dyn Reaction) -> bool {
    a.level() < b.level() && (a.chain_id() & b.chain_id()) != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestReaction {
        index: u64,
        chain_id: u64,
        status: AtomicU8,
        affinity: AtomicUsize,
        name: &'static str,
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
            self.name
        }
    }

    fn r(index: u64, chain_id: u64, name: &'static str) -> TestReaction {
        TestReaction {
            index,
            chain_id,
            status: AtomicU8::new(ReactionStatus::Inactive as u8),
            affinity: AtomicUsize::new(0),
            name,
        }
    }

    #[test]
    fn level_extracts_low_16_bits() {
        let packed = (42u64 << 16) | 7u64;
        assert_eq!(level(packed), 7);
    }

    #[test]
    fn precedes_requires_lower_level_and_overlap() {
        let a = r(0, 0b11, "A");
        let b = r(1, 0b01, "B");
        let c = r(1, 0b10, "C");
        let d = r(1, 0b100, "D");
        assert!(precedes(&a, &b));
        assert!(precedes(&a, &c));
        assert!(!precedes(&a, &d));
        assert!(!precedes(&b, &a)); // b has higher level than a
    }

    #[test]
    fn status_cas_lifecycle() {
        let x = r(0, 1, "X");
        assert_eq!(x.status(), ReactionStatus::Inactive);
        assert!(x.cas_status(ReactionStatus::Inactive, ReactionStatus::Queued).is_ok());
        assert_eq!(x.status(), ReactionStatus::Queued);
        // Wrong expected value fails and reports the actual one.
        let err = x
            .cas_status(ReactionStatus::Inactive, ReactionStatus::Running)
            .unwrap_err();
        assert_eq!(err, ReactionStatus::Queued);
        assert!(x.cas_status(ReactionStatus::Queued, ReactionStatus::Running).is_ok());
        assert!(x.cas_status(ReactionStatus::Running, ReactionStatus::Inactive).is_ok());
    }
}
