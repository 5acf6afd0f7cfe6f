//! Processors: the partitioner's unit of assignment.

use crate::task::{Task, TaskSet};
use crate::timebase;

use std::fmt;

/// One of the `m` identical processors a partitioned run assigns tasks to.
///
/// Capacity is always `1.0`; `load` tracks the sum of assigned tasks'
/// utilizations so the partitioner can test candidates without resumming
/// the child task set on every step.
#[derive(Debug, Clone)]
pub struct Processor {
    pub id: usize,
    pub load: f64,
    pub tasks: TaskSet,
    pub log: Vec<String>,
    pub needs_simulation: bool,
}

impl Processor {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            load: 0.0,
            tasks: TaskSet::default(),
            log: Vec::new(),
            needs_simulation: false,
        }
    }

    /// Whether `task` fits here under tolerant utilization comparison.
    pub fn fits(&self, task: &Task) -> bool {
        timebase::is_le(self.load + task.utilization(), 1.0)
    }

    /// Assigns `task` to this processor, updating `load`.
    pub fn assign(&mut self, task: Task) {
        self.load += task.utilization();
        self.tasks.push(task);
    }

    pub fn log(&mut self, message: impl Into<String>) {
        self.log.push(message.into());
    }
}

impl fmt::Display for Processor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Processor_{} (load={:.3}, tasks={})", self.id, self.load, self.tasks.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: usize, c: u64, t: u64) -> Task {
        Task::new(id, 0, c, t, t)
    }

    #[test]
    fn fits_respects_capacity_with_tolerance() {
        let mut p = Processor::new(0);
        p.assign(task(0, 1, 2));
        assert!(p.fits(&task(1, 1, 2)));
        p.assign(task(1, 1, 2));
        assert!(!p.fits(&task(2, 1, 4)));
    }
}


