//! The task model: tasks, jobs, task sets and their derived classification.

use crate::timebase::{self, Time, TimeBaseError};

use dashu::integer::Sign;
use dashu::rational::Relaxed;

use std::fmt;

/// A single periodic task.
///
/// Immutable once created: every field but the derived `utilization` is
/// set at construction and never changes. A task releases jobs at times
/// `O, O+T, O+2T, ...`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Task {
    /// Zero-based identity of the task; also its index in the owning [`TaskSet`].
    pub task_id: usize,
    /// Release offset, `O >= 0`.
    pub offset: Time,
    /// Worst-case computation time, `C > 0`.
    pub computation_time: Time,
    /// Relative deadline, `D > 0`.
    pub deadline: Time,
    /// Period, `T > 0`.
    pub period: Time,
    utilization: f64,
}

impl Task {
    /// Constructs a new task.
    ///
    /// # Panics
    ///
    /// Panics if `computation_time`, `deadline`, or `period` is zero.
    pub fn new(task_id: usize, offset: Time, computation_time: Time, deadline: Time, period: Time) -> Self {
        assert!(computation_time > 0, "computation_time must be positive");
        assert!(deadline > 0, "deadline must be positive");
        assert!(period > 0, "period must be positive");

        Self {
            task_id,
            offset,
            computation_time,
            deadline,
            period,
            utilization: computation_time as f64 / period as f64,
        }
    }

    /// The display name required by the external interface: `Task_<id>`.
    pub fn name(&self) -> String {
        format!("Task_{}", self.task_id)
    }

    /// `U = C / T`, as a 64-bit float.
    ///
    /// Used everywhere a tolerant comparison suffices: the partitioner's
    /// fit tests, the Liu-Layland bound, and display output.
    pub fn utilization(&self) -> f64 {
        self.utilization
    }

    /// `U = C / T`, as an exact rational.
    ///
    /// Used to sum utilizations without accumulating floating-point error,
    /// for the necessary-utilization-bound test (spec.md section 4.4.1).
    pub fn exact_utilization(&self) -> Relaxed {
        Relaxed::from_parts_const(Sign::Positive, self.computation_time.into(), self.period.into())
    }

    /// Whether this task releases a job at time `t`.
    pub fn releases_at(&self, t: Time) -> bool {
        t >= self.offset && (t - self.offset) % self.period == 0
    }

    /// Returns a freshly released job if this task releases one at time `t`.
    pub fn release_job(&self, t: Time) -> Option<Job> {
        self.releases_at(t).then(|| Job::new(self, t))
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{:.3}",
            self.task_id,
            self.name(),
            self.computation_time,
            self.period,
            self.deadline,
            self.offset,
            self.utilization
        )
    }
}

/// An outstanding instance of a [`Task`].
///
/// Created by the task at release time, mutated only by the simulator,
/// destroyed when its remaining computation time reaches zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Job {
    /// Identity of the releasing task; also an index into the owning [`TaskSet`].
    pub task_id: usize,
    /// Time at which this job was released.
    pub release_time: Time,
    /// `r + D_task`.
    pub absolute_deadline: Time,
    /// Remaining computation time; monotonically non-increasing while active.
    pub remaining: Time,
    /// Combined priority key, populated only by EDF(k) (spec.md section 4.6).
    pub priority: Option<i64>,
}

impl Job {
    fn new(task: &Task, release_time: Time) -> Self {
        Self {
            task_id: task.task_id,
            release_time,
            absolute_deadline: release_time + task.deadline,
            remaining: task.computation_time,
            priority: None,
        }
    }

    /// Whether this job has missed its deadline as of time `t`.
    pub fn deadline_missed(&self, t: Time) -> bool {
        t > self.absolute_deadline
    }

    /// Runs this job for `duration` time units, returning whether it finished.
    pub fn schedule(&mut self, duration: Time) -> bool {
        if self.remaining <= duration {
            self.remaining = 0;
            true
        } else {
            self.remaining -= duration;
            false
        }
    }
}

/// The deadline regime of a task set, per the authoritative definition:
/// implicit iff every `D = T`; arbitrary iff some `D > T`; else constrained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineType {
    Implicit,
    Constrained,
    Arbitrary,
}

/// Annotation derived from scanning a task set once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub is_synchronous: bool,
    pub deadline_type: DeadlineType,
}

/// Classifies `tasks`. Idempotent: calling this twice on the same tasks
/// yields identical output.
///
/// # Panics
///
/// Panics if `tasks` is empty.
pub fn classify(tasks: &[Task]) -> Classification {
    assert!(!tasks.is_empty(), "cannot classify an empty task set");

    let is_synchronous = tasks.iter().all(|t| t.offset == 0);

    let deadline_type = if tasks.iter().all(|t| t.deadline == t.period) {
        DeadlineType::Implicit
    } else if tasks.iter().any(|t| t.deadline > t.period) {
        DeadlineType::Arbitrary
    } else {
        DeadlineType::Constrained
    };

    Classification { is_synchronous, deadline_type }
}

/// An ordered collection of tasks, plus fields established by preprocessing.
#[derive(Debug, Clone, Default)]
pub struct TaskSet {
    tasks: Vec<Task>,
    classification: Option<Classification>,
    /// Simulation horizon established by the feasibility-interval selector.
    pub feasibility_interval: Time,
    /// Simulator timestep established alongside `feasibility_interval`.
    pub simulator_timestep: Time,
}

impl TaskSet {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { tasks, classification: None, feasibility_interval: 0, simulator_timestep: 1 }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Looks a task up by its `task_id` rather than its position in
    /// [`TaskSet::tasks`] — position and id coincide for a freshly loaded
    /// file, but diverge once the partitioner splits the original ids across
    /// several smaller per-processor task sets.
    ///
    /// # Panics
    ///
    /// Panics if no task in this set carries `task_id`.
    pub fn task_by_id(&self, task_id: usize) -> &Task {
        self.tasks.iter().find(|t| t.task_id == task_id).expect("job references an unknown task_id")
    }

    pub fn push(&mut self, task: Task) {
        self.classification = None;
        self.tasks.push(task);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Classifies this task set and caches the result. Idempotent.
    ///
    /// # Panics
    ///
    /// Panics if the task set is empty.
    pub fn classify(&mut self) -> Classification {
        let classification = classify(&self.tasks);
        self.classification = Some(classification);
        classification
    }

    /// The cached classification, if [`TaskSet::classify`] has been called.
    pub fn classification(&self) -> Option<Classification> {
        self.classification
    }

    /// Releases every job due at time `t`, in task order.
    pub fn release_jobs(&self, t: Time) -> Vec<Job> {
        self.tasks.iter().filter_map(|task| task.release_job(t)).collect()
    }

    /// A copy of this task set with every offset forced to zero.
    ///
    /// Used by the parallel driver to attempt the cheaper synchronous
    /// schedulability question before the asynchronous one.
    pub fn synchronized(&self) -> TaskSet {
        let tasks = self
            .tasks
            .iter()
            .map(|t| Task::new(t.task_id, 0, t.computation_time, t.deadline, t.period))
            .collect();
        TaskSet::new(tasks)
    }

    /// `LCM` of every task's period.
    pub fn hyperperiod(&self) -> Result<Time, TimeBaseError> {
        timebase::hyperperiod(self.tasks.iter().map(|t| t.period))
    }

    /// `Sigma U_i`, as a 64-bit float. Not used for the necessary-utilization
    /// test (see [`TaskSet::exact_utilization`]); suitable for the
    /// Liu-Layland bound and display output.
    pub fn total_utilization(&self) -> f64 {
        self.tasks.iter().map(Task::utilization).sum()
    }

    /// `Sigma U_i`, as an exact rational, free of floating-point error.
    pub fn exact_utilization(&self) -> Relaxed {
        let mut sum = Relaxed::default();
        for task in &self.tasks {
            sum += task.exact_utilization();
        }
        sum
    }
}

impl fmt::Display for TaskSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TaskSet:")?;
        writeln!(f, "ID\tName\tC\tT\tD\tO\tU")?;
        for task in &self.tasks {
            writeln!(f, "{task}")?;
        }
        Ok(())
    }
}
