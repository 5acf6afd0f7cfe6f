//! Integer time-base primitives and tolerant floating comparisons.

use thiserror::Error;

/// Type of time instants and durations.
///
/// As in the task model, this is left as an integral quantity; all
/// arithmetic in this module operates in terms of non-negative multiples
/// of some implicit unit.
pub type Time = u64;

/// Tolerance used by the `is_*` family below.
pub const EPSILON: f64 = 1e-15;

/// Errors that can occur while computing hyperperiods or timesteps.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TimeBaseError {
    /// The hyperperiod (LCM of all periods) does not fit in a `Time`.
    #[error("hyperperiod overflowed while folding task periods")]
    Overflow,
}

fn gcd(a: Time, b: Time) -> Time {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

fn lcm(a: Time, b: Time) -> Result<Time, TimeBaseError> {
    if a == 0 || b == 0 {
        return Ok(0);
    }

    let g = gcd(a, b);
    (a / g).checked_mul(b).ok_or(TimeBaseError::Overflow)
}

/// Computes the hyperperiod (LCM) of a list of periods.
///
/// # Panics
///
/// Panics if `periods` is empty.
pub fn hyperperiod(periods: impl IntoIterator<Item = Time>) -> Result<Time, TimeBaseError> {
    let mut periods = periods.into_iter();
    let first = periods.next().expect("hyperperiod requires at least one period");

    periods.try_fold(first, lcm)
}

/// Computes the simulator timestep as the GCD of every task's `C`, `T`, `D`, `O`.
///
/// # Panics
///
/// Panics if `values` is empty.
pub fn timestep(values: impl IntoIterator<Item = Time>) -> Time {
    let mut values = values.into_iter();
    let first = values.next().expect("timestep requires at least one value");

    values.fold(first, gcd)
}

/// Tolerant `a >= b`.
pub fn is_ge(a: f64, b: f64) -> bool {
    a > b || (a - b).abs() <= EPSILON
}

/// Tolerant `a > b`.
pub fn is_gt(a: f64, b: f64) -> bool {
    a > b && (a - b).abs() > EPSILON
}

/// Tolerant `a <= b`.
pub fn is_le(a: f64, b: f64) -> bool {
    a < b || (a - b).abs() <= EPSILON
}

/// Tolerant `a < b`.
pub fn is_lt(a: f64, b: f64) -> bool {
    a < b && (a - b).abs() > EPSILON
}

/// Tolerant `a == b`.
pub fn is_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= EPSILON
}
