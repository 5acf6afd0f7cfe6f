//! Parallel driver for partitioned EDF (spec.md sections 4.7, 5).
//!
//! Partitions the task set, then runs one uniprocessor simulation per
//! processor in its own thread, all sharing a single cooperative
//! cancellation flag. Mirrors the teacher's own `thread::scope` idiom
//! (`main.rs`'s `StatRunner::fmt`) rather than pulling in a thread-pool
//! dependency the teacher never needed.

use crate::partition::{self, Heuristic, Ordering};
use crate::pipeline::{self, PipelineOutcome, SimKind};
use crate::policy::Policy;
use crate::processor::Processor;
use crate::sim::{self, MultiMode, Selector};
use crate::task::TaskSet;

use log::debug;

use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

/// Runs global EDF across `m` cores (spec.md section 4.6 "Global EDF"):
/// single-threaded, since its ready set is inherently shared state (spec.md
/// section 5).
pub fn run_global(tasks: &TaskSet, m: usize) -> PipelineOutcome {
    let mut tasks = tasks.clone();
    let mut log = Vec::new();
    pipeline::run(&mut tasks, m, Policy::Edf, &SimKind::Multiprocessor(MultiMode::GlobalEdf), None, &mut log)
}

/// Runs the EDF(k) hybrid across `m` cores (spec.md section 4.6 "Global
/// EDF(k)"): the `k` highest-utilization tasks get static top priority, the
/// rest are scheduled by absolute deadline, all drawn from one global pool of
/// `m` cores (spec.md section 9 design note 4).
pub fn run_edf_k(tasks: &TaskSet, k: usize, m: usize) -> PipelineOutcome {
    let mut tasks = tasks.clone();
    let mut log = Vec::new();
    let top_k_tasks = sim::top_k_by_utilization(tasks.tasks(), k);
    let mode = MultiMode::EdfK { top_k_tasks };
    pipeline::run(&mut tasks, m, Policy::Edf, &SimKind::Multiprocessor(mode), None, &mut log)
}

/// Runs the partitioned-EDF pipeline for `tasks` across `m` processors.
///
/// At most `workers` processors are simulated concurrently at a time (spec.md
/// section 5: "pool size defaults to the host's logical-core count and is
/// overridable"); each batch is joined via `std::thread::scope` before the
/// next starts, per spec.md section 5's "in-flight futures cancelled after
/// aggregation" rule. The cancellation signal is created fresh for this call
/// and shared across every batch, so a `FALSE` in an early batch short-circuits
/// processors simulated in a later one.
pub fn run_partitioned(
    tasks: &TaskSet,
    m: usize,
    ordering: Ordering,
    heuristic: Heuristic,
    workers: usize,
) -> PipelineOutcome {
    let mut processors: Vec<Processor> = (0..m).map(Processor::new).collect();

    if !partition::partition(tasks.tasks(), &mut processors, ordering, heuristic) {
        debug!("partitioner found no feasible assignment for {m} processors");
        return PipelineOutcome { feasible: false, needs_simulation: false, cannot_tell: false };
    }

    let cancel = AtomicBool::new(false);
    let workers = workers.max(1);

    let mut results = Vec::with_capacity(processors.len());
    for batch in processors.chunks_mut(workers) {
        let batch_results: Vec<PipelineOutcome> = std::thread::scope(|scope| {
            let handles: Vec<_> = batch
                .iter_mut()
                .map(|p| {
                    let cancel = &cancel;
                    scope.spawn(move || run_one_processor(p, cancel))
                })
                .collect();

            // Joining every handle here is the "in-flight futures cancelled
            // after aggregation" rule (spec.md section 5): this batch does
            // not return until every worker in it has observed the flag and
            // stopped on its own.
            handles.into_iter().map(|h| h.join().expect("processor worker panicked")).collect()
        });
        results.extend(batch_results);
    }

    for p in &processors {
        for line in &p.log {
            debug!("{line}");
        }
    }

    let mut aggregate = PipelineOutcome { feasible: true, needs_simulation: false, cannot_tell: false };
    for outcome in results {
        aggregate.feasible &= outcome.feasible;
        aggregate.needs_simulation |= outcome.needs_simulation;
        aggregate.cannot_tell |= outcome.cannot_tell;
    }
    aggregate
}

/// Runs one processor's child task set: the synchronous copy first (spec.md
/// section 4.7 step 2), then the original if the synchronous copy did not
/// already prove feasibility.
///
/// A definite `FALSE` sets `cancel` before returning, so peers still
/// in-flight observe it at their next step boundary (spec.md section 5:
/// the signal is monotonic, false->true at most once per run).
fn run_one_processor(processor: &mut Processor, cancel: &AtomicBool) -> PipelineOutcome {
    let mut synchronous = processor.tasks.synchronized();
    let synchronous_outcome = pipeline::run(
        &mut synchronous,
        1,
        Policy::Edf,
        &SimKind::Uniprocessor(Selector::Edf),
        Some(cancel),
        &mut processor.log,
    );

    if synchronous_outcome.feasible {
        return PipelineOutcome { needs_simulation: synchronous_outcome.needs_simulation, ..synchronous_outcome };
    }

    let mut original = processor.tasks.clone();
    let outcome = pipeline::run(
        &mut original,
        1,
        Policy::Edf,
        &SimKind::Uniprocessor(Selector::Edf),
        Some(cancel),
        &mut processor.log,
    );

    if !outcome.feasible && !outcome.cannot_tell {
        cancel.store(true, AtomicOrdering::Relaxed);
    }

    outcome
}
