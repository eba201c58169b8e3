//! # denselp
//!
//! A dense linear and integer programming engine built for explainability: every solve can be
//! replayed step by step from its [`algorithm::SolverResult`], which carries the iteration
//! log, tableau snapshots, the branch and bound tree and the cut list next to the solution.
//!
//! Problems are described as a [`data::model::Model`] and handed to one of five solvers
//! implementing the [`algorithm::Solver`] trait: primal simplex, revised simplex, general
//! branch and bound, knapsack branch and bound, and Gomory cutting planes.
//!
//! ```
//! use denselp::algorithm::options::SolveOptions;
//! use denselp::algorithm::{solver_for, SolveStatus, SolverKind};
//! use denselp::data::elements::{Objective, Relation, SignRestriction};
//! use denselp::data::model::{Constraint, Model};
//!
//! // max 3x1 + 2x2 s.t. x1 + x2 <= 4, 2x1 + x2 <= 6.
//! let model = Model::new(
//!     Objective::Maximize,
//!     vec![
//!         ("x1".to_string(), 3.0, SignRestriction::NonNegative),
//!         ("x2".to_string(), 2.0, SignRestriction::NonNegative),
//!     ],
//!     vec![
//!         Constraint::new(
//!             "c1",
//!             vec![("x1".to_string(), 1.0), ("x2".to_string(), 1.0)],
//!             Relation::Less,
//!             4.0,
//!         ),
//!         Constraint::new(
//!             "c2",
//!             vec![("x1".to_string(), 2.0), ("x2".to_string(), 1.0)],
//!             Relation::Less,
//!             6.0,
//!         ),
//!     ],
//! )
//! .unwrap();
//!
//! let solver = solver_for(SolverKind::PrimalSimplex, SolveOptions::default());
//! let result = solver.solve(&model).unwrap();
//!
//! assert_eq!(result.status, SolveStatus::Optimal);
//! assert!((result.objective_value().unwrap() - 10.0).abs() < 1e-6);
//! assert_eq!(result.iterations.len(), 2);
//! ```
#![warn(missing_docs)]

pub mod algorithm;
pub mod data;

#[cfg(test)]
mod tests;
