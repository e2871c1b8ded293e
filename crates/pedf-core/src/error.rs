//! Error types for the PEDF-NP scheduler

use core::fmt;

/// Result type for scheduler operations
pub type SchedResult<T> = Result<T, SchedError>;

/// Errors that can occur in scheduler operations.
///
/// Per the scheduler's error taxonomy, invariant violations are not meant
/// to be recovered from by callers — they are surfaced here mainly so
/// `init`/`validate`-time failures have a typed return; mid-round
/// invariant violations (a status CAS observing the wrong value, a queue
/// that fails to enqueue) panic at the call site instead, matching "print
/// a diagnostic and abort".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedError {
    /// `SchedulerConfig::validate` rejected the configuration.
    InvalidConfig(&'static str),

    /// Worker id passed to a public API call does not exist.
    UnknownWorker(usize),

    /// An invariant the scheduler depends on did not hold. These are only
    /// ever constructed for diagnostics on the `panic!` unwind path that
    /// genuinely aborts the process; they are not meant to be matched on.
    Invariant(&'static str),
}

impl fmt::Display for SchedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedError::InvalidConfig(msg) => write!(f, "invalid scheduler configuration: {msg}"),
            SchedError::UnknownWorker(id) => write!(f, "unknown worker id: {id}"),
            SchedError::Invariant(msg) => write!(f, "scheduler invariant violated: {msg}"),
        }
    }
}

impl std::error::Error for SchedError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = SchedError::UnknownWorker(3);
        assert_eq!(format!("{e}"), "unknown worker id: 3");
    }
}
