//! Analytic feasibility tests: exact shortcuts tried before simulation.

use crate::policy::Policy;
use crate::task::{Classification, DeadlineType, Task, TaskSet};
use crate::timebase;

use num_order::NumOrd;

/// The result of trying the analytic test ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyticOutcome {
    Feasible,
    Infeasible,
    NeedsSimulation,
}

/// `Sigma U_i > m`, tested exactly to avoid floating-point false negatives
/// near the boundary.
fn necessary_utilization_bound(tasks: &TaskSet, m: usize) -> bool {
    tasks.exact_utilization().num_gt(&m)
}

/// A task set of zero or one tasks is trivially feasible once it has
/// cleared the necessary utilization bound.
fn trivial_set(tasks: &TaskSet) -> bool {
    tasks.len() <= 1
}

/// Liu-Layland bound for implicit-deadline fixed-priority uniprocessor
/// scheduling: `Sigma U_i <= n (2^(1/n) - 1)`.
///
/// Applied whenever the regime is synchronous implicit-deadline
/// uniprocessor, independent of the requested policy: RM-feasibility under
/// this bound implies EDF-feasibility for implicit-deadline task sets, so
/// the shortcut is sound regardless of which fixed-priority-family
/// discipline was asked for. The classical bound assumes a critical
/// instant at a simultaneous release, so it does not apply when offsets
/// differ.
fn liu_layland_bound(tasks: &TaskSet) -> bool {
    let n = tasks.len() as f64;
    let bound = n * (2f64.powf(1.0 / n) - 1.0);
    timebase::is_le(tasks.total_utilization(), bound)
}

/// Exact response-time test for deadline-monotonic fixed-priority
/// scheduling, sorted ascending by deadline (the DM priority order).
///
/// Returns `Some(true)` if every task's worst-case response time converges
/// within its deadline, `Some(false)` on the first deadline miss.
fn deadline_monotonic_response_time(tasks: &TaskSet) -> bool {
    let mut by_deadline: Vec<&Task> = tasks.tasks().iter().collect();
    by_deadline.sort_by_key(|t| t.deadline);

    for (i, task) in by_deadline.iter().enumerate() {
        let higher_priority = &by_deadline[..i];
        let mut r = task.computation_time;
        loop {
            let next: u64 = task.computation_time
                + higher_priority
                    .iter()
                    .map(|hp| r.div_ceil(hp.period) * hp.computation_time)
                    .sum::<u64>();

            if next > task.deadline {
                return false;
            }
            if next == r {
                break;
            }
            r = next;
        }
    }

    true
}

/// EDF on an implicit-deadline, synchronous, uniprocessor task set is
/// feasible iff `Sigma U_i <= 1`.
fn edf_implicit_uniprocessor(tasks: &TaskSet, classification: Classification) -> bool {
    classification.is_synchronous
        && classification.deadline_type == DeadlineType::Implicit
        && timebase::is_le(tasks.total_utilization(), 1.0)
}

/// Runs the analytic test ladder in the specified order, returning the
/// first definite answer, or [`AnalyticOutcome::NeedsSimulation`] if none
/// applies.
pub fn analytic_tests(
    tasks: &TaskSet,
    m: usize,
    policy: Policy,
    classification: Classification,
) -> AnalyticOutcome {
    if necessary_utilization_bound(tasks, m) {
        return AnalyticOutcome::Infeasible;
    }

    if trivial_set(tasks) {
        return AnalyticOutcome::Feasible;
    }

    if m == 1
        && classification.is_synchronous
        && classification.deadline_type == DeadlineType::Implicit
        && liu_layland_bound(tasks)
    {
        return AnalyticOutcome::Feasible;
    }

    if m == 1
        && policy == Policy::DeadlineMonotonic
        && classification.deadline_type != DeadlineType::Arbitrary
        && deadline_monotonic_response_time(tasks)
    {
        return AnalyticOutcome::Feasible;
    }

    if m == 1 && policy == Policy::Edf && edf_implicit_uniprocessor(tasks, classification) {
        return AnalyticOutcome::Feasible;
    }

    AnalyticOutcome::NeedsSimulation
}
