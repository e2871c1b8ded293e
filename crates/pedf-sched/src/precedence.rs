//! The precedence oracle: decides whether a candidate reaction is blocked
//! by anything currently executing or already set aside this round.

use pedf_core::{precedes, Reaction, ReactionRef};

use crate::pqueue::PriorityQueue;
use crate::vector::DynVector;

/// Returns `true` iff some reaction in `executing_q` or `transfer_q`
/// precedes `candidate` (lower level, overlapping chain id).
///
/// Fast path: the head of `executing_q` holds the minimum `index` there.
/// If `candidate.index() <= head.index()`, nothing in `executing_q` can
/// block `candidate`, because `LEVEL(candidate) <= LEVEL(head) <=
/// LEVEL(any)`. `transfer_q` entries are themselves blocked by something
/// in `executing_q`, so transitivity holds and it can be skipped too in
/// that case. The scan below walks `transfer_q` by dereferencing the
/// referenced reactions directly, never by reinterpreting raw storage
/// bytes as a different pointer type.
///
/// Must be called with the global mutex held.
pub fn is_blocked(
    candidate: &dyn Reaction,
    executing_q: &PriorityQueue,
    transfer_q: &DynVector<ReactionRef>,
) -> bool {
    if let Some(head) = executing_q.peek() {
        if candidate.index() <= head.index() {
            return false;
        }
    } else {
        // executing_q empty implies transfer_q is empty too (every
        // transfer_q entry was blocked by something in executing_q).
        return false;
    }

    scan(candidate, executing_q.iter_unordered())
        || scan(candidate, transfer_q.iter())
}

fn scan<'a>(candidate: &dyn Reaction, items: impl Iterator<Item = &'a ReactionRef>) -> bool {
    items.any(|q| precedes(q.as_ref(), candidate))
}
