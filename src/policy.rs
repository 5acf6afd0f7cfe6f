//! Scheduling disciplines a task set can be analyzed or simulated under.

use std::fmt;

/// A scheduling discipline.
///
/// The compiled CLI only ever constructs [`Policy::Edf`] (every variant it
/// exposes — global, partitioned, EDF(k) — is EDF-family), but the library
/// exercises the full set: `DeadlineMonotonic` drives the exact
/// response-time test, and `RoundRobin` has no applicable analytic
/// shortcut and always falls through to simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    RoundRobin,
    Edf,
    DeadlineMonotonic,
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Policy::RoundRobin => "round-robin",
            Policy::Edf => "EDF",
            Policy::DeadlineMonotonic => "deadline-monotonic",
        };
        f.write_str(name)
    }
}
