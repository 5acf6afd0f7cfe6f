//! Random task-set generation for property tests (spec.md section 8: "random
//! task sets generated with `U < m`").
//!
//! Utilizations are drawn with Stafford's RandFixedSum so that their sum is
//! exactly the requested normalized utilization, the same algorithm the
//! teacher crate uses for its own statistical task-set generation.

use crate::task::{Task, TaskSet};
use crate::timebase::Time;

use rand::distributions::uniform::SampleRange;
use rand::distributions::Bernoulli;
use rand::seq::SliceRandom;
use rand::Rng;

use std::mem;
use std::ops::RangeInclusive;

/// Generator that implements Stafford's RandFixedSum: produces `length`
/// nonnegative values summing to exactly `s`, uniformly over that simplex.
struct Rfs {
    t: Box<[Box<[Bernoulli]>]>,
    s: f64,
    k: usize,
}

impl Rfs {
    #[allow(clippy::cast_precision_loss, clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    fn new(length: usize, s: f64) -> Self {
        assert!(length > 0, "length must be nonzero");
        assert!((0.0..=length as f64).contains(&s), "s must be between 0 and length");

        let k = (s as usize).clamp(0, length - 1);
        let s = s.clamp(k as f64, (k + 1) as f64);

        let def = Bernoulli::from_ratio(1, 1).unwrap();

        let mut w = vec![0.0; length].into_boxed_slice();
        let mut t =
            (1..length).map(|l| vec![def; l + 1].into_boxed_slice()).collect::<Box<_>>();

        w[0] = f64::MAX;

        let delta = s - k as f64;

        for i in 1..length {
            let mut lastw = 0.0;

            for j in 0..i {
                let coe1 = (j as f64 + delta) / i as f64;
                let coe2 = ((i - j) as f64 - delta) / i as f64;

                let tmp1 = w[j] * coe1;
                let tmp2 = lastw * coe2;

                lastw = mem::replace(&mut w[j], tmp1 + tmp2);

                t[i - 1][j] = Bernoulli::new(if w[j] == 0.0 {
                    (coe1 >= 0.5).into()
                } else {
                    tmp2 / w[j]
                })
                .unwrap();
            }
        }

        Self { t, s, k }
    }

    #[allow(clippy::cast_precision_loss)]
    fn gen(&self) -> Box<[f64]> {
        let length = self.t.len() + 1;

        let mut out = vec![0.0; length].into_boxed_slice();

        let mut sm = 0.0;
        let mut pr = 1.0;

        let mut j = self.k;

        for i in (1..length).rev() {
            let s = self.s - (self.k - j) as f64;
            let e = rand::thread_rng().sample(self.t[i - 1][j]);
            let sx = rand::random::<f64>().powf((i as f64).recip());
            sm += (1.0 - sx) * pr * s / (i + 1) as f64;
            pr *= sx;
            out[length - i] = f64::from(e).mul_add(pr, sm);
            j -= usize::from(e);
        }

        out[0] = (self.s - (self.k - j) as f64).mul_add(pr, sm);
        out.shuffle(&mut rand::thread_rng());

        out
    }
}

/// Generator for random implicit-deadline, synchronous task sets with a
/// fixed total normalized utilization.
pub struct Tasks<R1, R2> {
    util: f64,
    num: R1,
    period: R2,
}

impl<R1, R2> Tasks<R1, R2> {
    /// Constructs a new generator.
    ///
    /// The generated task set has total utilization `norm_util * num_cpus`,
    /// a task count drawn uniformly from `num_tasks`, and periods drawn
    /// uniformly from `period`. Every task has an implicit deadline (`D =
    /// T`) and a zero offset; computation times are derived from the
    /// per-task utilization and period.
    #[allow(clippy::cast_precision_loss)]
    pub fn new(num_cpus: usize, norm_util: f64, num_tasks: R1, period: R2) -> Self {
        Self { util: norm_util * num_cpus as f64, num: num_tasks, period }
    }
}

impl<R1, R2> Tasks<R1, R2>
where
    R1: SampleRange<usize>,
    R2: SampleRange<Time> + Clone,
{
    /// Runs the generator, returning the generated tasks.
    #[allow(clippy::cast_precision_loss, clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    pub fn gen(self) -> TaskSet {
        let Self { util, num, period } = self;

        let n = rand::thread_rng().gen_range(num);
        let utils = Rfs::new(n, util).gen();

        let tasks = IntoIterator::into_iter(utils)
            .enumerate()
            .map(|(id, u)| {
                let period = rand::thread_rng().gen_range(period.clone());
                let computation_time = ((period as f64 * u).ceil() as Time).max(1);
                Task::new(id, 0, computation_time, period, period)
            })
            .collect();

        TaskSet::new(tasks)
    }
}

/// Convenience range used by tests that just need "a handful of tasks".
pub const DEFAULT_TASK_COUNT: RangeInclusive<usize> = 2..=16;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_task_set_has_implicit_deadlines() {
        let ts = Tasks::new(1, 0.5, 3..=3, 10..=100).gen();
        assert_eq!(ts.len(), 3);
        for task in ts.tasks() {
            assert_eq!(task.deadline, task.period);
            assert_eq!(task.offset, 0);
        }
    }

    #[test]
    fn generated_utilization_is_close_to_requested() {
        let ts = Tasks::new(2, 0.3, 8..=8, 100..=1000).gen();
        assert!((ts.total_utilization() - 0.6).abs() < 0.15);
    }
}


