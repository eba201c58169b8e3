//! Both integer solvers must prove the same optimum on the six item knapsack, with real
//! branching and cutting work rather than a trivial root-only solve.
use denselp::algorithm::branch_and_bound::BranchAndBoundSolver;
use denselp::algorithm::cutting_plane::CuttingPlaneSolver;
use denselp::algorithm::options::SolveOptions;
use denselp::algorithm::{SolveStatus, Solver, SolverResult};
use denselp::data::elements::{Objective, Relation, SignRestriction};
use denselp::data::model::{Constraint, Model};
use denselp::data::solution::Solution;

const VALUES: [f64; 6] = [2_f64, 3_f64, 3_f64, 5_f64, 2_f64, 4_f64];
const WEIGHTS: [f64; 6] = [11_f64, 8_f64, 6_f64, 14_f64, 10_f64, 10_f64];
const CAPACITY: f64 = 40_f64;
const OPTIMUM: f64 = 15_f64;

fn assert_approx(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() <= 1e-6,
        "expected {} within 1e-6, got {}",
        expected,
        actual,
    );
}

fn knapsack_model() -> Model {
    let names = ["a", "b", "c", "d", "e", "f"];
    Model::new(
        Objective::Maximize,
        names
            .iter()
            .zip(VALUES)
            .map(|(name, value)| (name.to_string(), value, SignRestriction::Binary))
            .collect(),
        vec![Constraint::new(
            "capacity",
            names
                .iter()
                .zip(WEIGHTS)
                .map(|(name, weight)| (name.to_string(), weight))
                .collect(),
            Relation::Less,
            CAPACITY,
        )],
    )
    .unwrap()
}

fn assert_binary_and_within_capacity(solution: &Solution) {
    let names = ["a", "b", "c", "d", "e", "f"];
    let weight: f64 = names
        .iter()
        .zip(WEIGHTS)
        .map(|(name, weight)| {
            let value = solution.value(name);
            assert!(
                value.abs() <= 1e-6 || (value - 1_f64).abs() <= 1e-6,
                "{} = {} is not binary",
                name,
                value,
            );
            value * weight
        })
        .sum();
    assert!(weight <= CAPACITY + 1e-6);
}

#[test]
fn branch_and_bound_proves_the_knapsack_optimum() {
    let solver = BranchAndBoundSolver::new(SolveOptions::default());
    let result = solver.solve(&knapsack_model()).unwrap();

    assert_eq!(result.status, SolveStatus::Optimal);
    assert!(result.success);
    let incumbent = result.incumbent.as_ref().unwrap();
    assert_approx(incumbent.objective_value(), OPTIMUM);
    assert!(incumbent.is_feasible());
    assert_binary_and_within_capacity(incumbent.solution());

    // The fractional root relaxation forces actual branching.
    let tree = result.tree.as_ref().unwrap();
    assert!(tree.len() > 1);
    let statistics = tree.statistics();
    assert_eq!(statistics.nr_nodes, tree.len());
    assert_eq!(statistics.nr_active, 0);

    // No node's relaxation bound is exceeded by the incumbent.
    let root_bound = tree.node(0).bound.unwrap();
    assert!(incumbent.objective_value() <= root_bound + 1e-6);
}

#[test]
fn cutting_planes_prove_the_knapsack_optimum() {
    let solver = CuttingPlaneSolver::new(SolveOptions::default());
    let result = solver.solve(&knapsack_model()).unwrap();

    assert_eq!(result.status, SolveStatus::Optimal);
    let incumbent = result.incumbent.as_ref().unwrap();
    assert_approx(incumbent.objective_value(), OPTIMUM);
    assert_binary_and_within_capacity(incumbent.solution());

    // Real cutting work happened: cuts were added and more than one simplex pivot ran.
    assert!(!result.cuts.is_empty());
    assert!(result.iterations.len() > 1);
    assert_cuts_hold(&result, incumbent.solution());
}

/// Every cut was violated when generated and holds for the reported integer solution.
fn assert_cuts_hold(result: &SolverResult, integer_solution: &Solution) {
    for cut in &result.cuts {
        assert!(cut.violation > 0_f64, "cut {} was not violated", cut.name);
        let lhs: f64 = cut
            .coefficients
            .iter()
            .map(|(name, coefficient)| coefficient * integer_solution.value(name))
            .sum();
        assert!(
            lhs >= cut.rhs - 1e-6,
            "cut {} cuts off the integer solution: {} < {}",
            cut.name,
            lhs,
            cut.rhs,
        );
    }
}

#[test]
fn both_solvers_agree() {
    let branch = BranchAndBoundSolver::new(SolveOptions::default())
        .solve(&knapsack_model())
        .unwrap();
    let cutting = CuttingPlaneSolver::new(SolveOptions::default())
        .solve(&knapsack_model())
        .unwrap();

    assert_eq!(branch.status, SolveStatus::Optimal);
    assert_eq!(cutting.status, SolveStatus::Optimal);
    assert_approx(
        branch.incumbent.unwrap().objective_value(),
        cutting.incumbent.unwrap().objective_value(),
    );
}

#[test]
fn branching_constraints_never_leak_into_the_input() {
    let model = knapsack_model();
    let before = model.nr_constraints();
    BranchAndBoundSolver::new(SolveOptions::default())
        .solve(&model)
        .unwrap();
    CuttingPlaneSolver::new(SolveOptions::default())
        .solve(&model)
        .unwrap();

    assert_eq!(model.nr_constraints(), before);
}
