//! Runs one task set through the full schedulability pipeline: classify,
//! try the analytic shortcut ladder, else bound a horizon and simulate.

use crate::analysis::{self, AnalyticOutcome};
use crate::interval::{self, IntervalOutcome};
use crate::policy::Policy;
use crate::sim::{self, MultiMode, Selector, SimOutcome};
use crate::task::TaskSet;

use std::sync::atomic::AtomicBool;

/// Outcome of running the pipeline once, already folded to the three
/// booleans the top-level aggregator and exit-code mapping need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOutcome {
    pub feasible: bool,
    pub needs_simulation: bool,
    pub cannot_tell: bool,
}

impl PipelineOutcome {
    const fn analytic(feasible: bool) -> Self {
        Self { feasible, needs_simulation: false, cannot_tell: false }
    }

    const fn simulated(outcome: SimOutcome) -> Self {
        match outcome {
            SimOutcome::True => Self { feasible: true, needs_simulation: true, cannot_tell: false },
            SimOutcome::False => Self { feasible: false, needs_simulation: true, cannot_tell: false },
            SimOutcome::CannotTell => Self { feasible: false, needs_simulation: true, cannot_tell: true },
        }
    }

    const fn budget_exceeded() -> Self {
        Self { feasible: false, needs_simulation: true, cannot_tell: true }
    }
}

/// Which kind of simulation backs the pipeline once no analytic shortcut
/// applies.
pub enum SimKind {
    Uniprocessor(Selector),
    Multiprocessor(MultiMode),
}

/// Classifies `tasks`, tries the analytic ladder, and falls back to
/// selecting a horizon and simulating under `kind`.
///
/// # Panics
///
/// Panics if `tasks` is empty.
pub fn run(
    tasks: &mut TaskSet,
    m: usize,
    policy: Policy,
    kind: &SimKind,
    cancel: Option<&AtomicBool>,
    log: &mut Vec<String>,
) -> PipelineOutcome {
    let classification = tasks.classify();

    match analysis::analytic_tests(tasks, m, policy, classification) {
        AnalyticOutcome::Feasible => return PipelineOutcome::analytic(true),
        AnalyticOutcome::Infeasible => return PipelineOutcome::analytic(false),
        AnalyticOutcome::NeedsSimulation => {}
    }

    let (horizon, step) = match interval::select(tasks, classification, policy) {
        IntervalOutcome::Bounded { horizon, timestep } => (horizon, timestep),
        IntervalOutcome::BudgetExceeded | IntervalOutcome::Overflow => {
            return PipelineOutcome::budget_exceeded();
        }
    };

    let outcome = match kind {
        SimKind::Uniprocessor(selector) => sim::simulate_uniprocessor(
            tasks,
            *selector,
            horizon,
            step,
            classification.is_synchronous,
            policy == Policy::Edf,
            cancel,
            log,
        ),
        SimKind::Multiprocessor(mode) => sim::simulate_multiprocessor(
            tasks,
            m,
            mode,
            horizon,
            step,
            classification.is_synchronous,
            cancel,
            log,
        ),
    };

    PipelineOutcome::simulated(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Task;

    fn taskset(rows: &[(u64, u64, u64, u64)]) -> TaskSet {
        let tasks = rows.iter().enumerate().map(|(i, &(o, c, d, t))| Task::new(i, o, c, d, t)).collect();
        TaskSet::new(tasks)
    }

    #[test]
    fn analytic_shortcut_skips_simulation_entirely() {
        let mut ts = taskset(&[(0, 1, 4, 4), (0, 2, 6, 6)]);
        let mut log = Vec::new();
        let outcome = run(&mut ts, 1, Policy::Edf, &SimKind::Uniprocessor(Selector::Edf), None, &mut log);
        assert_eq!(outcome, PipelineOutcome { feasible: true, needs_simulation: false, cannot_tell: false });
    }

    #[test]
    fn overutilized_set_is_infeasible_without_simulating() {
        let mut ts = taskset(&[(0, 3, 5, 5), (0, 3, 10, 10), (0, 3, 15, 15)]);
        let mut log = Vec::new();
        let outcome = run(&mut ts, 1, Policy::Edf, &SimKind::Uniprocessor(Selector::Edf), None, &mut log);
        assert_eq!(outcome, PipelineOutcome { feasible: false, needs_simulation: false, cannot_tell: false });
    }

    #[test]
    fn falls_through_to_simulation_and_finds_it_feasible() {
        let mut ts = taskset(&[(0, 2, 6, 7), (0, 2, 9, 11), (0, 1, 4, 5)]);
        let mut log = Vec::new();
        let outcome = run(&mut ts, 1, Policy::Edf, &SimKind::Uniprocessor(Selector::Edf), None, &mut log);
        assert!(outcome.feasible);
        assert!(outcome.needs_simulation);
        assert!(!outcome.cannot_tell);
    }

    #[test]
    fn budget_exceeded_is_reported_as_cannot_tell() {
        std::env::set_var("RTSCHED_HORIZON_CEILING", "1");
        let mut ts = taskset(&[(0, 2, 6, 7), (0, 2, 9, 11)]);
        let mut log = Vec::new();
        let outcome = run(&mut ts, 1, Policy::Edf, &SimKind::Uniprocessor(Selector::Edf), None, &mut log);
        assert!(outcome.cannot_tell);
        std::env::remove_var("RTSCHED_HORIZON_CEILING");
    }
}


