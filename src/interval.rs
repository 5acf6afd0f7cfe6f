//! The feasibility-interval selector: picks a sound simulation horizon.

use crate::policy::Policy;
use crate::task::{Classification, DeadlineType, Task, TaskSet};
use crate::timebase::{Time, TimeBaseError};

use std::env;

/// Ceiling on the simulation horizon, past which the selector reports
/// [`IntervalOutcome::BudgetExceeded`] rather than handing the simulator an
/// unreasonably large interval. Overridable via `RTSCHED_HORIZON_CEILING`
/// for test tooling; the default matches the documented budget guard.
pub const HORIZON_CEILING_DEFAULT: Time = 10_000_000;

fn horizon_ceiling() -> Time {
    env::var("RTSCHED_HORIZON_CEILING")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(HORIZON_CEILING_DEFAULT)
}

/// Outcome of selecting a feasibility interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalOutcome {
    /// Horizon and timestep were established; the caller may simulate.
    Bounded { horizon: Time, timestep: Time },
    /// The horizon would exceed the budget guard; the caller should report
    /// `CANNOT_TELL` without ever invoking the simulator.
    BudgetExceeded,
    /// Computing the horizon overflowed `Time`'s range.
    Overflow,
}

fn max_offset(tasks: &[Task]) -> Time {
    tasks.iter().map(|t| t.offset).max().unwrap_or(0)
}

fn max_deadline(tasks: &[Task]) -> Time {
    tasks.iter().map(|t| t.deadline).max().unwrap_or(0)
}

/// Selects the feasibility interval (horizon and timestep) for `tasks`
/// under `classification` and `policy`.
///
/// # Panics
///
/// Panics if `tasks` is empty.
pub fn select(tasks: &TaskSet, classification: Classification, policy: Policy) -> IntervalOutcome {
    assert!(!tasks.is_empty(), "cannot select an interval for an empty task set");

    let hyperperiod = match tasks.hyperperiod() {
        Ok(h) => h,
        Err(TimeBaseError::Overflow) => return IntervalOutcome::Overflow,
    };

    let horizon = if classification.is_synchronous {
        match (classification.deadline_type, policy) {
            (DeadlineType::Implicit | DeadlineType::Constrained, Policy::DeadlineMonotonic) => {
                max_deadline(tasks.tasks())
            }
            _ => hyperperiod,
        }
    } else {
        let max_offset = max_offset(tasks.tasks());
        match hyperperiod.checked_mul(2).and_then(|h2| max_offset.checked_add(h2)) {
            Some(h) => h,
            None => return IntervalOutcome::Overflow,
        }
    };

    if horizon > horizon_ceiling() {
        return IntervalOutcome::BudgetExceeded;
    }

    let timestep = crate::timebase::timestep(
        tasks
            .tasks()
            .iter()
            .flat_map(|t| [t.computation_time, t.period, t.deadline, t.offset]),
    );

    IntervalOutcome::Bounded { horizon, timestep: timestep.max(1) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::classify;

    fn task(id: usize, o: Time, c: Time, d: Time, t: Time) -> Task {
        Task::new(id, o, c, d, t)
    }

    #[test]
    fn synchronous_edf_horizon_is_hyperperiod() {
        let tasks = vec![task(0, 0, 2, 4, 5), task(1, 0, 3, 6, 8)];
        let c = classify(&tasks);
        let ts = TaskSet::new(tasks);
        match select(&ts, c, Policy::Edf) {
            IntervalOutcome::Bounded { horizon, .. } => assert_eq!(horizon, 40),
            other => panic!("expected Bounded, got {other:?}"),
        }
    }

    #[test]
    fn synchronous_dm_horizon_is_max_deadline() {
        let tasks = vec![task(0, 0, 2, 5, 5), task(1, 0, 2, 7, 7)];
        let c = classify(&tasks);
        let ts = TaskSet::new(tasks);
        match select(&ts, c, Policy::DeadlineMonotonic) {
            IntervalOutcome::Bounded { horizon, .. } => assert_eq!(horizon, 7),
            other => panic!("expected Bounded, got {other:?}"),
        }
    }

    #[test]
    fn asynchronous_horizon_is_max_offset_plus_two_hyperperiods() {
        let tasks = vec![task(0, 1, 2, 5, 5), task(1, 3, 1, 4, 4)];
        let c = classify(&tasks);
        let ts = TaskSet::new(tasks);
        match select(&ts, c, Policy::Edf) {
            IntervalOutcome::Bounded { horizon, .. } => assert_eq!(horizon, 3 + 2 * 20),
            other => panic!("expected Bounded, got {other:?}"),
        }
    }

    #[test]
    fn horizon_exceeding_ceiling_is_reported() {
        env::set_var("RTSCHED_HORIZON_CEILING", "10");
        let tasks = vec![task(0, 0, 1, 100, 100)];
        let c = classify(&tasks);
        let ts = TaskSet::new(tasks);
        assert_eq!(select(&ts, c, Policy::Edf), IntervalOutcome::BudgetExceeded);
        env::remove_var("RTSCHED_HORIZON_CEILING");
    }
}
