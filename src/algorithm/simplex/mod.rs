//! # The simplex method
//!
//! Two interchangeable solvers share this module: the primal solver working on the full
//! tableau and the revised solver working through basis inverse maintenance. Both follow the
//! two phase method, select pivots with Dantzig's rule and the smallest-index ratio test, and
//! must agree on objective value, solution and iteration count for any feasible bounded
//! problem.
use std::time::Duration;

use crate::algorithm::tableau::{RatioCandidate, Tableau};

pub mod primal;
pub mod revised;

/// Phase one is declared infeasible when the artificial objective exceeds this at optimality.
///
/// Chosen an order of magnitude looser than the integrality tolerance so that accumulated
/// elimination error on well scaled problems does not produce spurious infeasibility.
pub const PHASE_ONE_TOLERANCE: f64 = 1e-7;

/// The two phases of the simplex method.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    One,
    Two,
}

/// The record of one simplex iteration, for step by step replay.
///
/// Appended to the solve's iteration log after each pivot; never mutated afterwards.
#[derive(Clone, Debug)]
pub struct SimplexIteration {
    /// Tableau iteration counter after this pivot.
    pub iteration: usize,
    /// Phase this pivot belongs to.
    pub phase: Phase,
    /// Name of the entering variable.
    pub entering: String,
    /// Name of the leaving variable.
    pub leaving: String,
    /// All rows that were eligible in the ratio test.
    pub ratio_candidates: Vec<RatioCandidate>,
    /// The row the ratio test selected.
    pub chosen_row: usize,
    /// Objective value after the pivot, in the model's direction of optimization.
    pub objective_value: f64,
    /// Snapshot of the tableau after the pivot.
    pub tableau: Tableau,
    /// Time since the start of the solve.
    pub elapsed: Duration,
}

/// How a run of pivots on one objective ended.
#[derive(Debug, Eq, PartialEq)]
pub(crate) enum PhaseOutcome {
    /// All reduced costs nonnegative.
    Optimal,
    /// An improving column without a blocking row.
    Unbounded,
    /// The pivot ceiling was hit.
    IterationLimit,
}
