//! # Branch and bound
//!
//! The general integer solver and its knapsack specialization. Both explore a tree of
//! subproblems kept in a [`node::SearchTree`] arena, fathom nodes by bound, infeasibility or
//! integrality, and report the best integer solution found together with the full tree.
//!
//! The general solver relaxes integrality, solves each node's relaxation with the primal
//! simplex method and branches on the variable whose fractional part lies closest to one half.
//! Nodes are explored best-first by their parent's bound.
use log::debug;

use crate::algorithm::branch_and_bound::node::{
    BranchDecision, BranchDirection, FathomReason, SearchTree,
};
use crate::algorithm::options::SolveOptions;
use crate::algorithm::simplex::primal::PrimalSimplexSolver;
use crate::algorithm::{SolveError, SolveStatus, Solver, SolverResult};
use crate::data::elements::Objective;
use crate::data::model::{Constraint, Model};
use crate::data::solution::{IntegerSolution, Solution};

pub mod knapsack;
pub mod node;

/// Branch and bound over linear programming relaxations.
pub struct BranchAndBoundSolver {
    options: SolveOptions,
}

impl BranchAndBoundSolver {
    /// Create a new instance with the given options.
    #[must_use]
    pub fn new(options: SolveOptions) -> Self {
        Self { options }
    }

    /// The integer variable whose relaxation value is most fractional, with its value.
    ///
    /// Most fractional means the fractional part closest to one half; among equally fractional
    /// variables the one registered first wins. `None` when the solution is integral.
    fn branching_variable<'a>(
        &self,
        model: &'a Model,
        solution: &Solution,
    ) -> Option<(&'a str, f64)> {
        let mut best: Option<(&str, f64, f64)> = None;
        for variable in model.integer_variables() {
            let value = solution.value(variable.name());
            if self.options.is_integral(value) {
                continue;
            }
            let distance = (value - value.floor() - 0.5).abs();
            match best {
                Some((_, _, existing)) if distance >= existing => {}
                _ => best = Some((variable.name(), value, distance)),
            }
        }

        best.map(|(name, value, _)| (name, value))
    }

    /// Whether `bound` can still beat the incumbent.
    fn can_improve(&self, bound: f64, incumbent: &IntegerSolution, objective: Objective) -> bool {
        match objective {
            Objective::Maximize => {
                bound > incumbent.objective_value() + self.options.improvement_tolerance
            }
            Objective::Minimize => {
                bound < incumbent.objective_value() - self.options.improvement_tolerance
            }
        }
    }

    /// Gap between the best remaining bound and the incumbent, relative to the incumbent.
    ///
    /// Falls back to the absolute gap when the incumbent objective is too close to zero to
    /// divide by.
    fn optimality_gap(bound: f64, incumbent: f64) -> f64 {
        let absolute = (bound - incumbent).abs();
        if incumbent.abs() > 1e-9 {
            absolute / incumbent.abs()
        } else {
            absolute
        }
    }

    /// Pop the frontier entry with the best parent bound.
    fn pop_best(frontier: &mut Vec<(usize, f64)>, objective: Objective) -> Option<usize> {
        let best = frontier
            .iter()
            .enumerate()
            .reduce(|left, right| {
                if objective.is_improvement(right.1 .1, left.1 .1) {
                    right
                } else {
                    left
                }
            })
            .map(|(position, _)| position)?;
        Some(frontier.swap_remove(best).0)
    }

    fn assemble(
        status: SolveStatus,
        incumbent: Option<IntegerSolution>,
        tree: SearchTree,
        root_relaxation: Option<SolverResult>,
        warnings: Vec<String>,
    ) -> SolverResult {
        let mut result = SolverResult::of_status(status);
        result.solution = incumbent
            .as_ref()
            .map(|incumbent| incumbent.solution().clone());
        result.incumbent = incumbent;
        result.tree = Some(tree);
        result.warnings = warnings;
        if let Some(root) = root_relaxation {
            result.iterations = root.iterations;
            result.initial_tableau = root.initial_tableau;
            result.final_tableau = root.final_tableau;
        }
        result
    }
}

impl Solver for BranchAndBoundSolver {
    fn solve(&self, model: &Model) -> Result<SolverResult, SolveError> {
        if model.integer_variables().next().is_none() {
            return Err(SolveError::NotApplicable(
                "the model has no integer variables; use a simplex solver".to_string(),
            ));
        }

        let objective = model.objective();
        let relaxation_solver = PrimalSimplexSolver::new(self.options);
        let mut tree = SearchTree::new();
        let root = tree.add_root();
        let mut models = vec![model.clone()];
        // Entries carry the parent's bound; the root has none and goes first anyway.
        let mut frontier = vec![(root, objective.worst_value())];
        let mut incumbent: Option<IntegerSolution> = None;
        let mut root_relaxation = None;
        let mut warnings = Vec::new();

        while let Some(index) = Self::pop_best(&mut frontier, objective) {
            if tree.len() > self.options.max_nodes {
                let remaining_bound = frontier
                    .iter()
                    .map(|&(_, bound)| bound)
                    .fold(None, |best: Option<f64>, bound| match best {
                        Some(existing) if !objective.is_improvement(bound, existing) => best,
                        _ => Some(bound),
                    });
                if let (Some(incumbent), Some(bound)) = (&incumbent, remaining_bound) {
                    warnings.push(format!(
                        "node limit reached with relative optimality gap at most {:e}",
                        Self::optimality_gap(bound, incumbent.objective_value()),
                    ));
                } else {
                    warnings.push("node limit reached before the search finished".to_string());
                }
                return Ok(Self::assemble(
                    SolveStatus::MaxNodesReached,
                    incumbent,
                    tree,
                    root_relaxation,
                    warnings,
                ));
            }

            let relaxed = relaxation_solver.solve(&models[index])?;
            let status = relaxed.status;
            if index == root {
                root_relaxation = Some(relaxed.clone());
            }
            match status {
                SolveStatus::Infeasible => {
                    tree.fathom(index, FathomReason::Infeasibility);
                    continue;
                }
                SolveStatus::Unbounded => {
                    debug!("relaxation of node {} is unbounded", index);
                    return Ok(Self::assemble(
                        SolveStatus::Unbounded,
                        incumbent,
                        tree,
                        root_relaxation,
                        warnings,
                    ));
                }
                SolveStatus::MaxIterationsReached => {
                    warnings.push(format!(
                        "relaxation of node {} hit the iteration limit; its bound is not proven",
                        index,
                    ));
                }
                _ => {}
            }
            let Some(solution) = relaxed.solution else {
                tree.fathom(index, FathomReason::Infeasibility);
                continue;
            };
            let bound = solution.objective_value();
            tree.set_relaxation(index, bound, solution.clone());

            if let Some(incumbent) = &incumbent {
                if !self.can_improve(bound, incumbent, objective) {
                    tree.fathom(index, FathomReason::Bound);
                    continue;
                }
            }

            match self.branching_variable(model, &solution) {
                None => {
                    let candidate = IntegerSolution::new(solution, true, index);
                    tree.fathom(index, FathomReason::Integrality);
                    let improves = incumbent
                        .as_ref()
                        .map_or(true, |best| candidate.is_better_than(best, objective));
                    if improves {
                        debug!(
                            "node {} improves the incumbent to {}",
                            index,
                            candidate.objective_value(),
                        );
                        incumbent = Some(candidate);
                    }
                }
                Some((variable, value)) => {
                    let splits = [
                        (BranchDirection::Down, value.floor()),
                        (BranchDirection::Up, value.floor() + 1_f64),
                    ];
                    for (direction, split_bound) in splits {
                        let child = tree.add_child(
                            index,
                            BranchDecision {
                                variable: variable.to_string(),
                                direction,
                                bound: split_bound,
                            },
                        );
                        let constraint = Constraint::new(
                            format!("branch{}", child),
                            vec![(variable.to_string(), 1_f64)],
                            direction.relation(),
                            split_bound,
                        );
                        let derived = models[index].with_extra_constraints([constraint])?;
                        models.push(derived);
                        frontier.push((child, bound));
                    }
                    tree.complete(index);
                }
            }
        }

        let status = if incumbent.is_some() {
            SolveStatus::Optimal
        } else {
            SolveStatus::Infeasible
        };
        debug!(
            "search finished as {} after {} nodes",
            status,
            tree.len(),
        );
        Ok(Self::assemble(
            status,
            incumbent,
            tree,
            root_relaxation,
            warnings,
        ))
    }
}

#[cfg(test)]
mod test {
    use crate::algorithm::branch_and_bound::node::NodeStatus;
    use crate::algorithm::branch_and_bound::BranchAndBoundSolver;
    use crate::algorithm::options::SolveOptions;
    use crate::algorithm::{SolveError, SolveStatus, Solver};
    use crate::data::elements::{Objective, Relation, SignRestriction};
    use crate::data::model::{Constraint, Model};
    use crate::tests::{assert_approx, problem_1, problem_2};

    /// max 5x + 4y s.t. 6x + 4y <= 24, x + 2y <= 6, both integer.
    ///
    /// The relaxation optimum (3, 1.5) with bound 21 is fractional; the integer optimum is 20
    /// at (4, 0).
    fn small_integer_model() -> Model {
        Model::new(
            Objective::Maximize,
            vec![
                ("x".to_string(), 5_f64, SignRestriction::Integer),
                ("y".to_string(), 4_f64, SignRestriction::Integer),
            ],
            vec![
                Constraint::new(
                    "c1",
                    vec![("x".to_string(), 6_f64), ("y".to_string(), 4_f64)],
                    Relation::Less,
                    24_f64,
                ),
                Constraint::new(
                    "c2",
                    vec![("x".to_string(), 1_f64), ("y".to_string(), 2_f64)],
                    Relation::Less,
                    6_f64,
                ),
            ],
        )
        .unwrap()
    }

    #[test]
    fn finds_integer_optimum() {
        let solver = BranchAndBoundSolver::new(SolveOptions::default());
        let result = solver.solve(&small_integer_model()).unwrap();

        assert_eq!(result.status, SolveStatus::Optimal);
        let incumbent = result.incumbent.unwrap();
        assert_approx(incumbent.objective_value(), 20_f64);
        assert_approx(incumbent.solution().value("x"), 4_f64);
        assert_approx(incumbent.solution().value("y"), 0_f64);
        // The fractional root forces at least one branching step.
        let tree = result.tree.unwrap();
        assert!(tree.len() > 1);
        assert_eq!(tree.node(0).status, NodeStatus::Completed);
    }

    #[test]
    fn incumbent_never_exceeds_root_bound() {
        let solver = BranchAndBoundSolver::new(SolveOptions::default());
        let result = solver.solve(&problem_2::model()).unwrap();

        assert_eq!(result.status, SolveStatus::Optimal);
        let incumbent = result.incumbent.unwrap();
        assert_approx(incumbent.objective_value(), problem_2::optimal_objective());
        let root_bound = result.tree.unwrap().node(0).bound.unwrap();
        assert!(incumbent.objective_value() <= root_bound + 1e-6);
    }

    #[test]
    fn continuous_models_are_rejected() {
        let solver = BranchAndBoundSolver::new(SolveOptions::default());
        let result = solver.solve(&problem_1::model());

        assert!(matches!(result, Err(SolveError::NotApplicable(_))));
    }

    #[test]
    fn infeasible_integer_program() {
        // 2x = 3 has no integer solution.
        let model = Model::new(
            Objective::Maximize,
            vec![("x".to_string(), 1_f64, SignRestriction::Integer)],
            vec![Constraint::new(
                "parity",
                vec![("x".to_string(), 2_f64)],
                Relation::Equal,
                3_f64,
            )],
        )
        .unwrap();

        let solver = BranchAndBoundSolver::new(SolveOptions::default());
        let result = solver.solve(&model).unwrap();

        assert_eq!(result.status, SolveStatus::Infeasible);
        assert!(result.incumbent.is_none());
    }

    #[test]
    fn gap_is_relative_to_the_incumbent() {
        assert_approx(BranchAndBoundSolver::optimality_gap(21_f64, 20_f64), 0.05_f64);
        assert_approx(BranchAndBoundSolver::optimality_gap(18_f64, -20_f64), 1.9_f64);
        // Incumbent at zero: the absolute gap is reported instead.
        assert_approx(BranchAndBoundSolver::optimality_gap(0.5_f64, 0_f64), 0.5_f64);
    }

    #[test]
    fn node_ceiling_is_soft() {
        let options = SolveOptions {
            max_nodes: 1,
            ..SolveOptions::default()
        };
        let solver = BranchAndBoundSolver::new(options);
        let result = solver.solve(&problem_2::model()).unwrap();

        assert_eq!(result.status, SolveStatus::MaxNodesReached);
        assert!(!result.success);
        assert!(!result.warnings.is_empty());
    }
}
