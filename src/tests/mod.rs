//! # Shared fixture problems for tests inside the crate.
//!
//! Convention for function names:
//!
//! * `fn model()`: the problem as a validated `Model`
//! * `fn optimal_objective()`: the known optimum
//!
//! `problem_1` is a two variable LP solved in exactly two pivots, `problem_2` a six item
//! binary knapsack that forces actual branching.
pub mod problem_1;
pub mod problem_2;

/// Compare two floating point values at the tolerance the engine reports solutions with.
pub fn assert_approx(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() <= 1e-6,
        "expected {} within 1e-6, got {}",
        expected,
        actual,
    );
}
