//! # pedf-sched
//!
//! Partitioned Earliest-Deadline-First, non-preemptive reaction scheduler.
//!
//! This crate implements the mechanics only: global queues, per-worker
//! slots, the precedence oracle, and the dispatch round. It knows nothing
//! about *how* a reaction's body runs — that is [`pedf_core::Reaction`]'s
//! job, implemented by the host reactor runtime. [`Scheduler`] is generic
//! over a [`pedf_core::TagController`] so tag advancement stays the host's
//! responsibility too.
#![allow(dead_code)]

mod config;
mod dispatcher;
mod handoff;
mod pqueue;
mod precedence;
mod vector;
mod worker;

pub use config::SchedulerConfig;
pub use dispatcher::{Scheduler, SchedulerStats};
pub use vector::{DynVector, DEFAULT_SHRINK_VOTE_THRESHOLD};
pub use worker::{WorkerSlot, BUSY, IDLE};

pub use pqueue::PriorityQueue;
pub use precedence::is_blocked;
