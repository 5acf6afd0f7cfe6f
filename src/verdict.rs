//! Aggregates per-path pipeline outcomes into the overall verdict and maps
//! it to the process exit-code contract.

use crate::pipeline::PipelineOutcome;

/// The overall schedulability verdict once every path (global run, or every
/// processor under a partitioning) has been folded together.
///
/// `any_false` and `cannot_tell` are tracked separately rather than folded
/// into a single `feasible` bit: spec.md section 4.7 orders the aggregation
/// rules "any FALSE ⇒ INFEASIBLE; *else* any CANNOT_TELL ⇒ INDETERMINATE",
/// so a worker that misses a deadline must win over a peer that was merely
/// cancelled before it could finish, not be swallowed by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Verdict {
    needs_simulation: bool,
    /// Set by a path that is definitely infeasible (analytically, or by a
    /// simulation that witnessed a deadline miss) — never by `CANNOT_TELL`.
    any_false: bool,
    cannot_tell: bool,
}

impl Verdict {
    /// The identity element: folding this with any outcome yields that
    /// outcome unchanged.
    pub const fn new() -> Self {
        Self { needs_simulation: false, any_false: false, cannot_tell: false }
    }

    /// Folds one more path's outcome in. A definite `FALSE` is sticky and
    /// takes precedence over any `CANNOT_TELL` among the other paths;
    /// `needs_simulation` is sticky so the caller can tell whether the
    /// result rests on simulation anywhere along the way.
    pub fn fold(&mut self, outcome: PipelineOutcome) {
        self.needs_simulation |= outcome.needs_simulation;
        if outcome.cannot_tell {
            self.cannot_tell = true;
        } else if !outcome.feasible {
            self.any_false = true;
        }
    }

    /// Maps the aggregated verdict to the 0-4 exit-code contract (spec.md
    /// section 4.7): a definite `FALSE` among the folded paths wins and
    /// selects between codes 2 and 3 regardless of any `CANNOT_TELL` also
    /// present; only once no path is definitely infeasible does `CANNOT_TELL`
    /// take over and select code 4; otherwise every path was `TRUE` and the
    /// remaining bit selects between codes 0 and 1.
    pub fn exit_code(&self) -> u8 {
        match (self.any_false, self.cannot_tell, self.needs_simulation) {
            (true, _, true) => 2,
            (true, _, false) => 3,
            (false, true, _) => 4,
            (false, false, true) => 0,
            (false, false, false) => 1,
        }
    }

    /// Collapses this verdict back into a single [`PipelineOutcome`], for a
    /// caller (the partitioned driver) that aggregates several processors'
    /// outcomes into one before handing it up to the next level of folding.
    /// Reuses the same FALSE-wins-over-CANNOT_TELL precedence as `fold`
    /// rather than re-deriving it, so the two can't drift out of sync.
    pub fn into_outcome(self) -> PipelineOutcome {
        if self.any_false {
            PipelineOutcome { feasible: false, needs_simulation: self.needs_simulation, cannot_tell: false }
        } else {
            PipelineOutcome {
                feasible: !self.cannot_tell,
                needs_simulation: self.needs_simulation,
                cannot_tell: self.cannot_tell,
            }
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

    /// spec.md section 4.7: a definite FALSE wins over a peer's CANNOT_TELL,
    /// exactly the partitioned scenario where one worker witnesses a
    /// deadline miss and cancels its in-flight peers.
    #[test]
    fn a_definite_false_wins_over_a_peers_cannot_tell() {
        let mut v = Verdict::new();
        v.fold(outcome(false, true, false));
        v.fold(outcome(false, true, true));
        assert_eq!(v.exit_code(), 2);
    }

    /// Same, but the FALSE arrived after the CANNOT_TELL was folded in.
    #[test]
    fn a_definite_false_wins_over_an_earlier_cannot_tell() {
        let mut v = Verdict::new();
        v.fold(outcome(false, true, true));
        v.fold(outcome(false, true, false));
        assert_eq!(v.exit_code(), 2);
    }
}
