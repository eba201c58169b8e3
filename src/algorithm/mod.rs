//! # Algorithms
//!
//! The solving machinery: canonical form construction, the tableau pivot engine, two simplex
//! solvers and three integer solvers. All of them implement the [`Solver`] capability and are
//! selected by the caller through [`SolverKind`]; none of them inspects types at runtime.
use std::error::Error;
use std::fmt;

use crate::algorithm::branch_and_bound::knapsack::KnapsackSolver;
use crate::algorithm::branch_and_bound::node::SearchTree;
use crate::algorithm::branch_and_bound::BranchAndBoundSolver;
use crate::algorithm::cutting_plane::{CuttingPlane, CuttingPlaneSolver};
use crate::algorithm::options::SolveOptions;
use crate::algorithm::simplex::primal::PrimalSimplexSolver;
use crate::algorithm::simplex::revised::RevisedSimplexSolver;
use crate::algorithm::simplex::SimplexIteration;
use crate::algorithm::tableau::{PivotError, Tableau};
use crate::data::model::{Model, ModelError};
use crate::data::solution::{IntegerSolution, Solution};

pub mod branch_and_bound;
pub mod canonical;
pub mod cutting_plane;
pub mod options;
pub mod simplex;
pub mod tableau;

/// The one capability every solver provides.
///
/// A solve owns its tableau, node arena and cut list exclusively, runs to completion (or to a
/// ceiling) on the calling thread and returns an immutable result.
pub trait Solver {
    /// Solve the given model.
    ///
    /// # Return value
    ///
    /// A `SolverResult` for every run that terminates regularly, including infeasible,
    /// unbounded and ceiling-limited runs.
    ///
    /// # Errors
    ///
    /// A `SolveError` only for structural failures: a malformed model, an invalid pivot, or a
    /// solver applied to a model outside its scope.
    fn solve(&self, model: &Model) -> Result<SolverResult, SolveError>;
}

/// The five solver variants a caller can select.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SolverKind {
    /// Two phase primal simplex on the full tableau.
    PrimalSimplex,
    /// Revised simplex through basis inverse maintenance.
    RevisedSimplex,
    /// General branch and bound for integer programs.
    BranchAndBound,
    /// Branch and bound specialized to binary knapsack problems.
    KnapsackBranchAndBound,
    /// Gomory cutting planes.
    CuttingPlane,
}

/// Instantiate the solver of the given kind.
#[must_use]
pub fn solver_for(kind: SolverKind, options: SolveOptions) -> Box<dyn Solver> {
    match kind {
        SolverKind::PrimalSimplex => Box::new(PrimalSimplexSolver::new(options)),
        SolverKind::RevisedSimplex => Box::new(RevisedSimplexSolver::new(options)),
        SolverKind::BranchAndBound => Box::new(BranchAndBoundSolver::new(options)),
        SolverKind::KnapsackBranchAndBound => Box::new(KnapsackSolver::new(options)),
        SolverKind::CuttingPlane => Box::new(CuttingPlaneSolver::new(options)),
    }
}

/// How a solve terminated.
///
/// The last three variants are soft limits: the result still carries the best solution reached,
/// explicitly flagged as not proven optimal.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SolveStatus {
    /// An optimal solution was found and proven.
    Optimal,
    /// No feasible point exists.
    Infeasible,
    /// The objective improves without limit.
    Unbounded,
    /// The simplex iteration ceiling was reached.
    MaxIterationsReached,
    /// The branch and bound node ceiling was reached.
    MaxNodesReached,
    /// The cutting plane loop stopped improving.
    Stalled,
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SolveStatus::Optimal => write!(f, "optimal"),
            SolveStatus::Infeasible => write!(f, "infeasible"),
            SolveStatus::Unbounded => write!(f, "unbounded"),
            SolveStatus::MaxIterationsReached => write!(f, "iteration limit reached"),
            SolveStatus::MaxNodesReached => write!(f, "node limit reached"),
            SolveStatus::Stalled => write!(f, "stalled"),
        }
    }
}

/// The immutable record of one solve, consumed by presentation and analysis layers.
#[derive(Clone, Debug)]
pub struct SolverResult {
    /// Whether an optimum was found and proven.
    pub success: bool,
    /// How the solve terminated.
    pub status: SolveStatus,
    /// The solution in original problem terms, when one exists.
    pub solution: Option<Solution>,
    /// The best integer feasible solution, for integer solves.
    pub incumbent: Option<IntegerSolution>,
    /// One record per simplex pivot, for step by step replay.
    pub iterations: Vec<SimplexIteration>,
    /// The tableau before the first pivot.
    pub initial_tableau: Option<Tableau>,
    /// The tableau the solve ended on, input to sensitivity and duality analysis.
    pub final_tableau: Option<Tableau>,
    /// The branch and bound tree, for tree visualization. Empty for other solvers.
    pub tree: Option<SearchTree>,
    /// All accepted cutting planes, in generation order. Empty for other solvers.
    pub cuts: Vec<CuttingPlane>,
    /// Human readable remarks gathered during the solve.
    pub warnings: Vec<String>,
}

impl SolverResult {
    /// An empty result shell for the given termination status.
    pub(crate) fn of_status(status: SolveStatus) -> Self {
        Self {
            success: status == SolveStatus::Optimal,
            status,
            solution: None,
            incumbent: None,
            iterations: Vec::new(),
            initial_tableau: None,
            final_tableau: None,
            tree: None,
            cuts: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Objective value of the reported solution, if any.
    #[must_use]
    pub fn objective_value(&self) -> Option<f64> {
        self.solution.as_ref().map(Solution::objective_value)
    }
}

/// A structural failure that aborts a solve.
///
/// Soft limits and infeasible or unbounded outcomes are not errors; they are statuses on a
/// regular `SolverResult`.
#[derive(Debug, PartialEq)]
pub enum SolveError {
    /// The model is malformed.
    Model(ModelError),
    /// A pivot could not be performed.
    Pivot(PivotError),
    /// The selected solver does not apply to this model.
    ///
    /// The contained `String` tells the caller which requirement failed and which solver to use
    /// instead.
    NotApplicable(String),
    /// Numerical trouble that the engine cannot recover from.
    NumericalInstability(String),
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SolveError::Model(error) => error.fmt(f),
            SolveError::Pivot(error) => error.fmt(f),
            SolveError::NotApplicable(reason) => {
                write!(f, "solver not applicable: {}", reason)
            }
            SolveError::NumericalInstability(reason) => {
                write!(f, "numerical instability: {}", reason)
            }
        }
    }
}

impl Error for SolveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SolveError::Model(error) => Some(error),
            SolveError::Pivot(error) => Some(error),
            SolveError::NotApplicable(_) | SolveError::NumericalInstability(_) => None,
        }
    }
}

impl From<ModelError> for SolveError {
    fn from(error: ModelError) -> Self {
        SolveError::Model(error)
    }
}

impl From<PivotError> for SolveError {
    fn from(error: PivotError) -> Self {
        SolveError::Pivot(error)
    }
}
