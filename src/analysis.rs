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

/// An empty task set is trivially feasible; a single task is feasible iff
/// its own computation time fits within its own deadline — clearing the
/// necessary utilization bound only rules out contention with other tasks,
/// it says nothing about a lone task whose `C` already exceeds its `D`.
fn trivial_set(tasks: &TaskSet) -> Option<bool> {
    match tasks.tasks() {
        [] => Some(true),
        [only] => Some(only.computation_time <= only.deadline),
        _ => None,
    }
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

    if let Some(feasible) = trivial_set(tasks) {
        return if feasible { AnalyticOutcome::Feasible } else { AnalyticOutcome::Infeasible };
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

#[cfg(test)]
mod tests {
    use super::*;

    fn taskset(rows: &[(u64, u64, u64, u64)]) -> TaskSet {
        let tasks = rows
            .iter()
            .enumerate()
            .map(|(i, &(o, c, d, t))| Task::new(i, o, c, d, t))
            .collect();
        TaskSet::new(tasks)
    }

    #[test]
    fn liu_layland_bound_shortcuts_a_feasible_implicit_deadline_set() {
        let mut ts = taskset(&[(0, 1, 4, 4), (0, 2, 6, 6)]);
        let c = ts.classify();
        assert_eq!(analytic_tests(&ts, 1, Policy::Edf, c), AnalyticOutcome::Feasible);
    }

    #[test]
    fn utilization_above_capacity_is_infeasible() {
        let mut ts = taskset(&[(0, 3, 5, 5), (0, 3, 10, 10), (0, 3, 15, 15)]);
        let c = ts.classify();
        assert_eq!(analytic_tests(&ts, 1, Policy::Edf, c), AnalyticOutcome::Infeasible);
    }

    #[test]
    fn deadline_monotonic_response_time_converges_within_deadline() {
        let mut ts = taskset(&[(0, 2, 5, 5), (0, 2, 7, 7)]);
        let c = ts.classify();
        assert_eq!(
            analytic_tests(&ts, 1, Policy::DeadlineMonotonic, c),
            AnalyticOutcome::Feasible
        );
    }

    #[test]
    fn falls_through_to_simulation_when_no_shortcut_applies() {
        let mut ts = taskset(&[(0, 2, 6, 7), (0, 2, 9, 11), (0, 1, 4, 5)]);
        let c = ts.classify();
        assert_eq!(analytic_tests(&ts, 1, Policy::Edf, c), AnalyticOutcome::NeedsSimulation);
    }

    #[test]
    fn asynchronous_set_is_not_shortcut_by_liu_layland() {
        // offsets differ, so the synchronous-only Liu-Layland bound must not fire
        // even though U is comfortably under the bound for n=2.
        let mut ts = taskset(&[(1, 2, 5, 5), (3, 1, 4, 4)]);
        let c = ts.classify();
        assert!(!c.is_synchronous);
        assert_eq!(analytic_tests(&ts, 1, Policy::Edf, c), AnalyticOutcome::NeedsSimulation);
    }

    #[test]
    fn overutilized_constrained_set_is_infeasible_on_the_utilization_bound() {
        let mut ts = taskset(&[(0, 2, 4, 5), (0, 3, 6, 8), (0, 1, 3, 4)]);
        let c = ts.classify();
        assert_eq!(analytic_tests(&ts, 1, Policy::Edf, c), AnalyticOutcome::Infeasible);
    }

    #[test]
    fn trivial_single_task_is_feasible() {
        let mut ts = taskset(&[(0, 1, 4, 4)]);
        let c = ts.classify();
        assert_eq!(analytic_tests(&ts, 1, Policy::Edf, c), AnalyticOutcome::Feasible);
    }

    #[test]
    fn trivial_single_task_with_computation_time_over_its_own_deadline_is_infeasible() {
        let mut ts = taskset(&[(0, 5, 3, 10)]);
        let c = ts.classify();
        assert_eq!(analytic_tests(&ts, 1, Policy::Edf, c), AnalyticOutcome::Infeasible);
    }
}
