//! Bin-packing partitioner: assigns tasks to processors ahead of simulation.

use crate::processor::Processor;
use crate::task::Task;

use clap::ValueEnum;

/// Bin-selection heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Heuristic {
    #[value(name = "ff")]
    FirstFit,
    #[value(name = "nf")]
    NextFit,
    #[value(name = "bf")]
    BestFit,
    #[value(name = "wf")]
    WorstFit,
}

/// Task visitation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Ordering {
    #[value(name = "iu")]
    IncreasingUtilization,
    #[value(name = "du")]
    DecreasingUtilization,
}

/// Partitions `tasks` across `processors` using `heuristic` crossed with
/// `ordering`. Returns `false` if some task had no eligible processor, in
/// which case the caller must treat the overall verdict as infeasible;
/// processors are left with whatever prefix of the assignment succeeded.
pub fn partition(tasks: &[Task], processors: &mut [Processor], ordering: Ordering, heuristic: Heuristic) -> bool {
    let mut sorted: Vec<Task> = tasks.to_vec();
    match ordering {
        Ordering::IncreasingUtilization => {
            sorted.sort_by(|a, b| a.utilization().partial_cmp(&b.utilization()).unwrap())
        }
        Ordering::DecreasingUtilization => {
            sorted.sort_by(|a, b| b.utilization().partial_cmp(&a.utilization()).unwrap())
        }
    }

    let mut next_fit_cursor = 0usize;

    for task in sorted {
        let chosen = match heuristic {
            Heuristic::FirstFit => processors.iter().position(|p| p.fits(&task)),
            Heuristic::NextFit => {
                while next_fit_cursor < processors.len() && !processors[next_fit_cursor].fits(&task) {
                    next_fit_cursor += 1;
                }
                (next_fit_cursor < processors.len()).then_some(next_fit_cursor)
            }
            // Iterator::max_by/min_by return the *last* of equally-ranked
            // elements; the tie rule here is "keep first seen", so the
            // fold below only replaces the incumbent on a strict improvement.
            Heuristic::BestFit => processors
                .iter()
                .enumerate()
                .filter(|(_, p)| p.fits(&task))
                .fold(None, |best: Option<(usize, f64)>, (i, p)| match best {
                    Some((_, load)) if p.load <= load => best,
                    _ => Some((i, p.load)),
                })
                .map(|(i, _)| i),
            Heuristic::WorstFit => processors
                .iter()
                .enumerate()
                .filter(|(_, p)| p.fits(&task))
                .fold(None, |best: Option<(usize, f64)>, (i, p)| match best {
                    Some((_, load)) if p.load >= load => best,
                    _ => Some((i, p.load)),
                })
                .map(|(i, _)| i),
        };

        match chosen {
            Some(i) => processors[i].assign(task),
            None => return false,
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: usize, c: u64, t: u64) -> Task {
        Task::new(id, 0, c, t, t)
    }

    fn procs(n: usize) -> Vec<Processor> {
        (0..n).map(Processor::new).collect()
    }

    #[test]
    fn first_fit_uses_lowest_index_eligible_processor() {
        let tasks = vec![task(0, 6, 10), task(1, 6, 10), task(2, 3, 10)];
        let mut p = procs(2);
        assert!(partition(&tasks, &mut p, Ordering::IncreasingUtilization, Heuristic::FirstFit));
        assert_eq!(p[0].tasks.len() + p[1].tasks.len(), 3);
    }

    #[test]
    fn partition_fails_when_no_processor_has_room() {
        let tasks = vec![task(0, 8, 10), task(1, 8, 10), task(2, 8, 10)];
        let mut p = procs(2);
        assert!(!partition(&tasks, &mut p, Ordering::DecreasingUtilization, Heuristic::BestFit));
    }

    #[test]
    fn best_fit_prefers_fullest_eligible_processor_with_first_seen_tie_break() {
        let mut p = procs(2);
        p[0].assign(task(10, 4, 10));
        p[1].assign(task(11, 4, 10));
        let tasks = vec![task(0, 5, 10)];
        assert!(partition(&tasks, &mut p, Ordering::IncreasingUtilization, Heuristic::BestFit));
        assert_eq!(p[0].tasks.len(), 2);
        assert_eq!(p[1].tasks.len(), 1);
    }

    #[test]
    fn partitioner_never_overloads_a_processor() {
        let tasks = vec![task(0, 3, 10), task(1, 3, 10), task(2, 3, 10), task(3, 3, 10)];
        let mut p = procs(2);
        assert!(partition(&tasks, &mut p, Ordering::IncreasingUtilization, Heuristic::WorstFit));
        for proc in &p {
            assert!(proc.load <= 1.0 + 1e-9);
        }
    }
}


