//! Scheduler configuration

use pedf_core::{SchedError, SchedResult};

/// Configuration for the PEDF-NP scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Number of worker threads the scheduler dispatches to.
    pub num_workers: usize,

    /// Initial capacity of each worker's `ready_reactions` priority queue.
    pub initial_ready_capacity: usize,

    /// Initial capacity of the global `reaction_q` / `executing_q`
    /// priority queues.
    pub initial_queue_capacity: usize,

    /// Initial capacity of every [`crate::vector::DynVector`] instance
    /// (`transfer_q`, and each worker's `output_reactions` /
    /// `done_reactions`).
    pub initial_vector_capacity: usize,

    /// Consecutive quiescent-and-mostly-empty votes required before a
    /// vector halves its capacity. Exposed here rather than hardcoded so
    /// hosts can tune the memory/churn tradeoff for their workload.
    pub shrink_vote_threshold: u32,

    /// Enable `eprintln!`-based diagnostic tracing.
    pub debug_logging: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        let num_cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);

        Self {
            num_workers: num_cpus,
            initial_ready_capacity: 16,
            initial_queue_capacity: 64,
            initial_vector_capacity: 8,
            shrink_vote_threshold: 15,
            debug_logging: false,
        }
    }
}

impl SchedulerConfig {
    /// Create a new configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of worker threads.
    pub fn num_workers(mut self, n: usize) -> Self {
        self.num_workers = n;
        self
    }

    /// Set the initial capacity of per-worker ready queues.
    pub fn initial_ready_capacity(mut self, n: usize) -> Self {
        self.initial_ready_capacity = n;
        self
    }

    /// Set the initial capacity of the global priority queues.
    pub fn initial_queue_capacity(mut self, n: usize) -> Self {
        self.initial_queue_capacity = n;
        self
    }

    /// Set the initial capacity of transient vectors.
    pub fn initial_vector_capacity(mut self, n: usize) -> Self {
        self.initial_vector_capacity = n;
        self
    }

    /// Set the shrink-vote threshold.
    pub fn shrink_vote_threshold(mut self, n: u32) -> Self {
        self.shrink_vote_threshold = n;
        self
    }

    /// Enable or disable debug logging.
    pub fn debug_logging(mut self, enable: bool) -> Self {
        self.debug_logging = enable;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> SchedResult<()> {
        if self.num_workers == 0 {
            return Err(SchedError::InvalidConfig("num_workers must be at least 1"));
        }
        if self.initial_vector_capacity == 0 {
            return Err(SchedError::InvalidConfig(
                "initial_vector_capacity must be at least 1",
            ));
        }
        if self.shrink_vote_threshold == 0 {
            return Err(SchedError::InvalidConfig(
                "shrink_vote_threshold must be at least 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(SchedulerConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_workers_rejected() {
        let cfg = SchedulerConfig::new().num_workers(0);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn builder_chains() {
        let cfg = SchedulerConfig::new()
            .num_workers(3)
            .initial_ready_capacity(4)
            .shrink_vote_threshold(8);
        assert_eq!(cfg.num_workers, 3);
        assert_eq!(cfg.initial_ready_capacity, 4);
        assert_eq!(cfg.shrink_vote_threshold, 8);
        assert!(cfg.validate().is_ok());
    }
}
