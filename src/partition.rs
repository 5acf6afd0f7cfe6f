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
