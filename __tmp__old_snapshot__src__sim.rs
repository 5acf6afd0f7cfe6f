//! Time-stepped discrete-event simulator (spec.md §4.6).
//!
//! Deterministic: the step is chosen upstream (see [`crate::interval`]) so
//! every release and every possible completion lands on a tick. Simulated
//! ticks run over the closed interval `[0, horizon]`; a job still
//! outstanding once that last tick has been processed has necessarily
//! missed its deadline, since the horizon is chosen to bound every
//! deadline in the regime being checked (spec.md §4.3).

use crate::task::{Job, Task, TaskSet};
use crate::timebase::Time;

use itertools::Itertools;

use std::sync::atomic::{AtomicBool, Ordering};

/// Tri-valued outcome of a single simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimOutcome {
    True,
    False,
    CannotTell,
}

/// Closed set of priority functions a uniprocessor simulation can select
/// jobs by (spec.md §9 design note: "re-architect as a closed variant").
///
/// `select` is pure: it returns the index of the job to run without
/// mutating the ready set. Round-robin's rotation is a separate step the
/// simulator applies after scheduling (spec.md §9 design note 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    Edf,
    Dm,
    Rm,
    Rr,
}

impl Selector {
    fn priority_key(self, job: &Job, tasks: &[Task]) -> Time {
        match self {
            Selector::Edf => job.absolute_deadline,
            Selector::Dm => tasks[job.task_id].deadline,
            Selector::Rm => tasks[job.task_id].period,
            Selector::Rr => 0,
        }
    }

    /// Selects the head of the ready set under this discipline, breaking
    /// ties by insertion order (the first-seen minimum). Returns `None` if
    /// `ready` is empty.
    pub fn select(self, ready: &[Job], tasks: &[Task]) -> Option<usize> {
        if ready.is_empty() {
            return None;
        }

        match self {
            Selector::Rr => Some(0),
            _ => ready
                .iter()
                .enumerate()
                .min_by_key(|(_, job)| self.priority_key(job, tasks))
                .map(|(i, _)| i),
        }
    }
}

fn first_missed(ready: &[Job], t: Time) -> Option<usize> {
    ready.iter().position(|job| job.deadline_missed(t))
}

fn log_miss(log: &mut Vec<String>, tasks: &TaskSet, job: &Job, t: Time) {
    log.push(format!(
        "{} missed its deadline at t={t} (released at {})",
        tasks.tasks()[job.task_id].name(),
        job.release_time
    ));
}

/// Uniprocessor simulation (spec.md §4.6 "Per-step protocol").
///
/// `is_edf` gates the synchronous idle-point shortcut: it fires only when
/// the discipline being simulated is EDF (spec.md §9 design note 1: this
/// must read the task set's own classification, never a shared/static flag).
#[allow(clippy::too_many_arguments)]
pub fn simulate_uniprocessor(
    tasks: &TaskSet,
    selector: Selector,
    horizon: Time,
    step: Time,
    is_synchronous: bool,
    is_edf: bool,
    cancel: Option<&AtomicBool>,
    log: &mut Vec<String>,
) -> SimOutcome {
    let mut ready: Vec<Job> = Vec::new();
    let mut t: Time = 0;

    loop {
        if is_synchronous && is_edf && t > 0 && ready.is_empty() {
            return SimOutcome::True;
        }

        if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            return SimOutcome::CannotTell;
        }

        ready.extend(tasks.release_jobs(t));

        if let Some(i) = first_missed(&ready, t) {
            log_miss(log, tasks, &ready[i], t);
            return SimOutcome::False;
        }

        if t > horizon {
            break;
        }

        if let Some(i) = selector.select(&ready, tasks.tasks()) {
            let finished = ready[i].schedule(step);
            if finished {
                ready.remove(i);
            } else if selector == Selector::Rr {
                ready.rotate_left(1);
            }
        }

        t += step;
    }

    if ready.is_empty() {
        SimOutcome::True
    } else {
        log_miss(log, tasks, &ready[0], t);
        SimOutcome::False
    }
}

/// Which jobs carry the EDF(k) hybrid static priority (spec.md §4.6,
/// glossary "EDF(k)"): the `k` highest-utilization tasks, by task id.
pub fn top_k_by_utilization(tasks: &[Task], k: usize) -> Vec<usize> {
    tasks
        .iter()
        .sorted_by(|a, b| b.utilization().partial_cmp(&a.utilization()).unwrap())
        .take(k)
        .map(|t| t.task_id)
        .collect()
}

/// The multiprocessor priority scheme in effect: plain global EDF, or the
/// EDF(k) hybrid (spec.md §9 design note 4: a single global pool of `m`
/// cores, never a per-core pool).
#[derive(Debug, Clone)]
pub enum MultiMode {
    GlobalEdf,
    EdfK { top_k_tasks: Vec<usize> },
}

impl MultiMode {
    /// Sentinel used for EDF(k)'s static-priority jobs: lower than any real
    /// deadline, so it always wins ties against deadline-keyed jobs.
    const STATIC_PRIORITY: i64 = i64::MIN;

    #[allow(clippy::cast_possible_wrap)]
    fn priority_key(&self, job: &Job) -> i64 {
        match self {
            MultiMode::GlobalEdf => job.absolute_deadline as i64,
            MultiMode::EdfK { top_k_tasks } => {
                if top_k_tasks.contains(&job.task_id) {
                    Self::STATIC_PRIORITY
                } else {
                    job.absolute_deadline as i64
                }
            }
        }
    }
}

/// Global-EDF / EDF(k) simulation across `m` identical cores (spec.md §4.6
/// "Multiprocessor variants"): each step, the top `m` ready jobs by combined
/// priority key are selected and all advance together.
#[allow(clippy::too_many_arguments)]
pub fn simulate_multiprocessor(
    tasks: &TaskSet,
    m: usize,
    mode: &MultiMode,
    horizon: Time,
    step: Time,
    is_synchronous: bool,
    cancel: Option<&AtomicBool>,
    log: &mut Vec<String>,
) -> SimOutcome {
    let mut ready: Vec<Job> = Vec::new();
    let mut t: Time = 0;

    loop {
        if is_synchronous && t > 0 && ready.is_empty() {
            return SimOutcome::True;
        }

        if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            return SimOutcome::CannotTell;
        }

        ready.extend(tasks.release_jobs(t));

        if let Some(i) = first_missed(&ready, t) {
            log_miss(log, tasks, &ready[i], t);
            return SimOutcome::False;
        }

        if t > horizon {
            break;
        }

        let selected: Vec<usize> = ready
            .iter()
            .enumerate()
            .sorted_by_key(|(_, job)| mode.priority_key(job))
            .take(m)
            .map(|(i, _)| i)
            .collect();

        let mut finished: Vec<usize> = selected
            .iter()
            .copied()
            .filter(|&i| ready[i].schedule(step))
            .collect();

        // remove back-to-front so earlier indices stay valid
        finished.sort_unstable_by(|a, b| b.cmp(a));
        for i in finished {
            ready.remove(i);
        }

        t += step;
    }

    if ready.is_empty() {
        SimOutcome::True
    } else {
        log_miss(log, tasks, &ready[0], t);
        SimOutcome::False
    }
}
