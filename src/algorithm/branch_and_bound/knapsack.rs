//! # Branch and bound specialized to the binary knapsack
//!
//! For models that are a pure knapsack (one `<=` capacity constraint, all variables binary
//! with nonnegative values and weights) the relaxation bound does not need a simplex solve:
//! ranking items by value per unit of weight and filling greedily until one item no longer
//! fits gives the exact linear relaxation optimum. Branching fixes that split item in or out.
//! Weightless items never compete for capacity; they rank first and are always packed.
use itertools::Itertools;
use log::debug;

use crate::algorithm::branch_and_bound::node::{
    BranchDecision, BranchDirection, FathomReason, SearchTree,
};
use crate::algorithm::options::SolveOptions;
use crate::algorithm::{SolveError, SolveStatus, Solver, SolverResult};
use crate::data::elements::{Objective, Relation, SignRestriction};
use crate::data::model::Model;
use crate::data::solution::{IntegerSolution, Solution};

const WEIGHT_TOLERANCE: f64 = 1e-9;

/// Best-first branch and bound with greedy fractional bounds.
pub struct KnapsackSolver {
    options: SolveOptions,
}

struct Item {
    name: String,
    value: f64,
    weight: f64,
}

/// Outcome of the greedy bound computation for one node.
enum Bound {
    /// The fixed items alone exceed the capacity.
    Infeasible,
    /// The greedy filling is integral; `completion` includes the fixed items.
    Integral { value: f64, completion: Vec<bool> },
    /// Item `split_item` only fits partially; `bound` is the relaxation optimum.
    Fractional {
        bound: f64,
        split_item: usize,
        completion: Vec<bool>,
        fraction: f64,
    },
}

impl KnapsackSolver {
    /// Create a new instance with the given options.
    #[must_use]
    pub fn new(options: SolveOptions) -> Self {
        Self { options }
    }

    /// Check the model is a pure binary knapsack and extract items and capacity.
    fn items(model: &Model) -> Result<(Vec<Item>, f64), SolveError> {
        let not_applicable = |reason: &str| {
            SolveError::NotApplicable(format!(
                "{}; use the general branch and bound solver",
                reason,
            ))
        };

        if model.objective() != Objective::Maximize {
            return Err(not_applicable("knapsack problems maximize their value"));
        }
        let [constraint] = model.constraints() else {
            return Err(not_applicable(
                "a knapsack has exactly one capacity constraint",
            ));
        };
        if constraint.relation() != Relation::Less {
            return Err(not_applicable("the capacity constraint must be of type <="));
        }
        let capacity = constraint.rhs();
        if capacity < 0_f64 {
            return Err(not_applicable("the capacity must be nonnegative"));
        }

        let items = model
            .variables()
            .iter()
            .map(|variable| {
                if variable.restriction() != SignRestriction::Binary {
                    return Err(not_applicable("all variables must be binary"));
                }
                if variable.cost() < 0_f64 {
                    return Err(not_applicable("all item values must be nonnegative"));
                }
                let weight = constraint.coefficient(variable.name());
                if weight < 0_f64 {
                    return Err(not_applicable("all item weights must be nonnegative"));
                }
                Ok(Item {
                    name: variable.name().to_string(),
                    value: variable.cost(),
                    weight,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok((items, capacity))
    }

    /// Item indices by value per unit of weight, best first. Weightless items rank first.
    ///
    /// The sort is stable, so items of equal ratio keep their registration order and the
    /// exploration is deterministic.
    fn ranking(items: &[Item]) -> Vec<usize> {
        (0..items.len())
            .sorted_by(|&a, &b| {
                let ratio = |i: usize| {
                    let item = &items[i];
                    if item.weight <= WEIGHT_TOLERANCE {
                        f64::INFINITY
                    } else {
                        item.value / item.weight
                    }
                };
                ratio(b).total_cmp(&ratio(a))
            })
            .collect()
    }

    /// Greedy fractional bound for a node's fixed item assignment.
    fn bound(items: &[Item], ranking: &[usize], fixed: &[Option<bool>], capacity: f64) -> Bound {
        let mut completion: Vec<bool> = fixed
            .iter()
            .map(|assignment| assignment == &Some(true))
            .collect();
        let mut weight = 0_f64;
        let mut value = 0_f64;
        for (item, included) in items.iter().zip(&completion) {
            if *included {
                weight += item.weight;
                value += item.value;
            }
        }
        if weight > capacity + WEIGHT_TOLERANCE {
            return Bound::Infeasible;
        }

        let mut remaining = capacity - weight;
        for &i in ranking {
            if fixed[i].is_some() {
                continue;
            }
            let item = &items[i];
            if item.weight <= remaining + WEIGHT_TOLERANCE {
                completion[i] = true;
                remaining -= item.weight;
                value += item.value;
            } else if remaining > WEIGHT_TOLERANCE {
                let fraction = remaining / item.weight;
                return Bound::Fractional {
                    bound: value + fraction * item.value,
                    split_item: i,
                    completion,
                    fraction,
                };
            } else {
                // Capacity exhausted exactly; everything further stays out.
                break;
            }
        }

        Bound::Integral { value, completion }
    }

    fn solution_of(items: &[Item], completion: &[bool], value: f64) -> Solution {
        Solution::new(
            value,
            items
                .iter()
                .zip(completion)
                .map(|(item, &included)| {
                    (item.name.clone(), if included { 1_f64 } else { 0_f64 })
                })
                .collect(),
        )
    }

    fn assemble(
        status: SolveStatus,
        incumbent: Option<IntegerSolution>,
        tree: SearchTree,
        warnings: Vec<String>,
    ) -> SolverResult {
        let mut result = SolverResult::of_status(status);
        result.solution = incumbent
            .as_ref()
            .map(|incumbent| incumbent.solution().clone());
        result.incumbent = incumbent;
        result.tree = Some(tree);
        result.warnings = warnings;
        result
    }
}

impl Solver for KnapsackSolver {
    fn solve(&self, model: &Model) -> Result<SolverResult, SolveError> {
        let (items, capacity) = Self::items(model)?;
        let ranking = Self::ranking(&items);

        let mut tree = SearchTree::new();
        let root = tree.add_root();
        let mut fixed: Vec<Vec<Option<bool>>> = vec![vec![None; items.len()]];
        let mut frontier = vec![(root, f64::INFINITY)];
        let mut incumbent: Option<IntegerSolution> = None;
        let mut warnings = Vec::new();

        while let Some(position) = frontier
            .iter()
            .enumerate()
            .max_by(|left, right| left.1 .1.total_cmp(&right.1 .1))
            .map(|(position, _)| position)
        {
            let (index, _) = frontier.swap_remove(position);
            if tree.len() > self.options.max_nodes {
                warnings.push("node limit reached before the search finished".to_string());
                return Ok(Self::assemble(
                    SolveStatus::MaxNodesReached,
                    incumbent,
                    tree,
                    warnings,
                ));
            }

            match Self::bound(&items, &ranking, &fixed[index], capacity) {
                Bound::Infeasible => tree.fathom(index, FathomReason::Infeasibility),
                Bound::Integral { value, completion } => {
                    let solution = Self::solution_of(&items, &completion, value);
                    tree.set_relaxation(index, value, solution.clone());
                    tree.fathom(index, FathomReason::Integrality);
                    let candidate = IntegerSolution::new(solution, true, index);
                    let improves = incumbent.as_ref().map_or(true, |best| {
                        candidate.is_better_than(best, Objective::Maximize)
                    });
                    if improves {
                        debug!("node {} improves the incumbent to {}", index, value);
                        incumbent = Some(candidate);
                    }
                }
                Bound::Fractional {
                    bound,
                    split_item,
                    completion,
                    fraction,
                } => {
                    let mut relaxation_values: Vec<(String, f64)> = items
                        .iter()
                        .zip(&completion)
                        .map(|(item, &included)| {
                            (item.name.clone(), if included { 1_f64 } else { 0_f64 })
                        })
                        .collect();
                    relaxation_values[split_item].1 = fraction;
                    tree.set_relaxation(index, bound, Solution::new(bound, relaxation_values));

                    let cannot_improve = incumbent.as_ref().is_some_and(|best| {
                        bound <= best.objective_value() + self.options.improvement_tolerance
                    });
                    if cannot_improve {
                        tree.fathom(index, FathomReason::Bound);
                        continue;
                    }

                    for (direction, included) in
                        [(BranchDirection::Down, false), (BranchDirection::Up, true)]
                    {
                        let child = tree.add_child(
                            index,
                            BranchDecision {
                                variable: items[split_item].name.clone(),
                                direction,
                                bound: if included { 1_f64 } else { 0_f64 },
                            },
                        );
                        let mut assignment = fixed[index].clone();
                        assignment[split_item] = Some(included);
                        fixed.push(assignment);
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
        debug!("search finished as {} after {} nodes", status, tree.len());
        Ok(Self::assemble(status, incumbent, tree, warnings))
    }
}

#[cfg(test)]
mod test {
    use crate::algorithm::branch_and_bound::knapsack::KnapsackSolver;
    use crate::algorithm::options::SolveOptions;
    use crate::algorithm::{SolveError, SolveStatus, Solver};
    use crate::data::elements::{Objective, Relation, SignRestriction};
    use crate::data::model::{Constraint, Model};
    use crate::tests::{assert_approx, problem_1, problem_2};

    #[test]
    fn solves_the_six_item_knapsack() {
        let solver = KnapsackSolver::new(SolveOptions::default());
        let result = solver.solve(&problem_2::model()).unwrap();

        assert_eq!(result.status, SolveStatus::Optimal);
        let incumbent = result.incumbent.unwrap();
        assert_approx(incumbent.objective_value(), problem_2::optimal_objective());
        // All values are 0 or 1 and the capacity holds.
        let weight: f64 = incumbent
            .solution()
            .values()
            .iter()
            .zip(problem_2::WEIGHTS)
            .map(|(&(_, value), weight)| {
                assert!(value == 0_f64 || value == 1_f64);
                value * weight
            })
            .sum();
        assert!(weight <= problem_2::CAPACITY);
        // The fractional root bound forces branching.
        assert!(result.tree.unwrap().len() > 1);
    }

    #[test]
    fn rejects_non_knapsack_models() {
        let solver = KnapsackSolver::new(SolveOptions::default());

        // Continuous variables.
        assert!(matches!(
            solver.solve(&problem_1::model()),
            Err(SolveError::NotApplicable(_)),
        ));

        // More than one constraint.
        let two_constraints = Model::new(
            Objective::Maximize,
            vec![("x".to_string(), 1_f64, SignRestriction::Binary)],
            vec![
                Constraint::new(
                    "c1",
                    vec![("x".to_string(), 1_f64)],
                    Relation::Less,
                    1_f64,
                ),
                Constraint::new(
                    "c2",
                    vec![("x".to_string(), 1_f64)],
                    Relation::Less,
                    2_f64,
                ),
            ],
        )
        .unwrap();
        let result = solver.solve(&two_constraints);
        let Err(SolveError::NotApplicable(reason)) = result else {
            panic!("expected a NotApplicable error");
        };
        assert!(reason.contains("exactly one capacity constraint"));
    }

    #[test]
    fn weightless_items_are_always_packed() {
        // "bonus" does not appear in the capacity row, so its weight is zero; the optimum is
        // bonus + light = 9, found after actual branching on the fractional split.
        let model = Model::new(
            Objective::Maximize,
            vec![
                ("bonus".to_string(), 5_f64, SignRestriction::Binary),
                ("heavy".to_string(), 3_f64, SignRestriction::Binary),
                ("light".to_string(), 4_f64, SignRestriction::Binary),
            ],
            vec![Constraint::new(
                "capacity",
                vec![("heavy".to_string(), 2_f64), ("light".to_string(), 3_f64)],
                Relation::Less,
                4_f64,
            )],
        )
        .unwrap();

        let solver = KnapsackSolver::new(SolveOptions::default());
        let result = solver.solve(&model).unwrap();

        assert_eq!(result.status, SolveStatus::Optimal);
        let incumbent = result.incumbent.unwrap();
        assert_approx(incumbent.objective_value(), 9_f64);
        assert_approx(incumbent.solution().value("bonus"), 1_f64);
        assert_approx(incumbent.solution().value("heavy"), 0_f64);
        assert_approx(incumbent.solution().value("light"), 1_f64);
        assert!(result.tree.unwrap().len() > 1);
    }

    #[test]
    fn all_items_fitting_needs_no_branching() {
        let model = Model::new(
            Objective::Maximize,
            vec![
                ("x".to_string(), 1_f64, SignRestriction::Binary),
                ("y".to_string(), 2_f64, SignRestriction::Binary),
            ],
            vec![Constraint::new(
                "capacity",
                vec![("x".to_string(), 1_f64), ("y".to_string(), 1_f64)],
                Relation::Less,
                5_f64,
            )],
        )
        .unwrap();

        let solver = KnapsackSolver::new(SolveOptions::default());
        let result = solver.solve(&model).unwrap();

        assert_eq!(result.status, SolveStatus::Optimal);
        assert_approx(result.incumbent.unwrap().objective_value(), 3_f64);
        assert_eq!(result.tree.unwrap().len(), 1);
    }
}
