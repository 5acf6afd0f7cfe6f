//! Aggregates per-path pipeline outcomes into the overall verdict and maps
//! it to the process exit-code contract.

use crate::pipeline::PipelineOutcome;

/// The overall schedulability verdict once every path (global run, or every
/// processor under a partitioning) has been folded together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Verdict {
    feasible: bool,
    needs_simulation: bool,
    cannot_tell: bool,
}

impl Verdict {
    /// The identity element: folding this with any outcome yields that
    /// outcome unchanged.
    pub const fn new() -> Self {
        Self { feasible: true, needs_simulation: false, cannot_tell: false }
    }

    /// Folds one more path's outcome in. A single `CANNOT_TELL` or
    /// infeasible path poisons the whole verdict; `needs_simulation` is
    /// sticky so the caller can tell whether the result rests on simulation
    /// anywhere along the way.
    pub fn fold(&mut self, outcome: PipelineOutcome) {
        self.feasible &= outcome.feasible;
        self.needs_simulation |= outcome.needs_simulation;
        self.cannot_tell |= outcome.cannot_tell;
    }

    /// Maps the aggregated verdict to the 0-4 exit-code contract (spec.md
    /// section 4.7): `cannot_tell` is indeterminate and wins regardless of
    /// the feasible/needs_simulation bits; otherwise those two bits select
    /// among the four schedulability codes.
    ///
    /// # Panics
    ///
    /// Panics on the structurally impossible combination of `cannot_tell`
    /// together with `feasible`: a path that returned `CANNOT_TELL` always
    /// also reports `feasible = false` (see [`PipelineOutcome::simulated`]),
    /// so this combination can only arise from a caller building a
    /// `Verdict` by hand instead of folding real outcomes.
    pub fn exit_code(&self) -> u8 {
        match (self.feasible, self.needs_simulation, self.cannot_tell) {
            (true, _, true) => unreachable!("cannot_tell implies infeasible"),
            (_, _, true) => 4,
            (true, true, false) => 0,
            (true, false, false) => 1,
            (false, true, false) => 2,
            (false, false, false) => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(feasible: bool, needs_simulation: bool, cannot_tell: bool) -> PipelineOutcome {
        PipelineOutcome { feasible, needs_simulation, cannot_tell }
    }

    #[test]
    fn analytically_feasible_path_exits_one() {
        let mut v = Verdict::new();
        v.fold(outcome(true, false, false));
        assert_eq!(v.exit_code(), 1);
    }

    #[test]
    fn simulated_feasible_path_exits_zero() {
        let mut v = Verdict::new();
        v.fold(outcome(true, true, false));
        assert_eq!(v.exit_code(), 0);
    }

    #[test]
    fn a_cannot_tell_path_poisons_the_whole_verdict() {
        let mut v = Verdict::new();
        v.fold(outcome(true, true, false));
        v.fold(outcome(false, true, true));
        assert_eq!(v.exit_code(), 4);
    }

    #[test]
    fn simulated_infeasible_path_exits_two() {
        let mut v = Verdict::new();
        v.fold(outcome(true, false, false));
        v.fold(outcome(false, true, false));
        assert_eq!(v.exit_code(), 2);
    }

    #[test]
    fn analytically_infeasible_path_exits_three() {
        let mut v = Verdict::new();
        v.fold(outcome(false, false, false));
        assert_eq!(v.exit_code(), 3);
    }

    #[test]
    fn analytic_infeasible_beats_a_later_feasible_path() {
        let mut v = Verdict::new();
        v.fold(outcome(false, false, false));
        v.fold(outcome(true, false, false));
        assert_eq!(v.exit_code(), 3);
    }
}


