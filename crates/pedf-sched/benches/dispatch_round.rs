//! Benchmarks the full trigger-to-drain path under varying fan-out and
//! contention shapes: `n` reactions triggered up front, `w` worker
//! threads draining them to completion.

use std::sync::atomic::{AtomicU8, AtomicUsize};
use std::sync::Arc;
use std::thread;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pedf_core::{Reaction, ReactionRef, ReactionStatus, TagController};
use pedf_sched::{Scheduler, SchedulerConfig};

struct BenchReaction {
    index: u64,
    chain_id: u64,
    status: AtomicU8,
    affinity: AtomicUsize,
}

impl Reaction for BenchReaction {
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
        "bench"
    }
}

fn reaction(index: u64, chain_id: u64) -> ReactionRef {
    Arc::new(BenchReaction {
        index,
        chain_id,
        status: AtomicU8::new(ReactionStatus::Inactive as u8),
        affinity: AtomicUsize::new(0),
    })
}

struct StopWhenQuiet;
impl TagController for StopWhenQuiet {
    fn advance_tag(&self) -> bool {
        true
    }
}

fn drain(workers: usize, reactions: impl Iterator<Item = ReactionRef>) {
    let sched = Arc::new(Scheduler::init(
        SchedulerConfig::new().num_workers(workers),
        StopWhenQuiet,
    ));
    for r in reactions {
        sched.trigger_reaction(r, None);
    }
    let handles: Vec<_> = (0..workers)
        .map(|id| {
            let sched = Arc::clone(&sched);
            thread::spawn(move || {
                while let Some(r) = sched.get_ready_reaction(id) {
                    black_box(&r);
                    sched.done_with_reaction(id, r);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
}

/// Independent (non-overlapping chain) reactions: the best case for
/// placement, since nothing ever blocks.
fn bench_independent_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("drain/independent_fanout");
    for &(workers, count) in &[(4usize, 64usize), (8, 256)] {
        group.bench_function(format!("{workers}w_{count}r"), |b| {
            b.iter(|| {
                drain(
                    workers,
                    (0..count).map(|i| reaction(i as u64, 1u64 << (i % 64))),
                )
            });
        });
    }
    group.finish();
}

/// A single overlapping chain: every reaction serializes behind the one
/// before it regardless of worker count.
fn bench_fully_serialized_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("drain/serialized_chain");
    for &count in &[64usize, 256] {
        group.bench_function(format!("{count}r"), |b| {
            b.iter(|| drain(4, (0..count).map(|i| reaction(i as u64, 0b1))));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_independent_fanout,
    bench_fully_serialized_chain
);
criterion_main!(benches);
