//! Six item binary knapsack.
//!
//! max 2a + 3b + 3c + 5d + 2e + 4f subject to 11a + 8b + 6c + 14d + 10e + 10f <= 40, all
//! variables binary. The optimum is 15 and neither branch and bound nor cutting planes can
//! prove it at the root, so both must do real work.
use crate::data::elements::{Objective, Relation, SignRestriction};
use crate::data::model::{Constraint, Model};

/// Item values in registration order.
pub const VALUES: [f64; 6] = [2_f64, 3_f64, 3_f64, 5_f64, 2_f64, 4_f64];
/// Item weights in registration order.
pub const WEIGHTS: [f64; 6] = [11_f64, 8_f64, 6_f64, 14_f64, 10_f64, 10_f64];
/// Knapsack capacity.
pub const CAPACITY: f64 = 40_f64;

/// The problem as a validated `Model`.
pub fn model() -> Model {
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

/// The known optimal objective value.
pub fn optimal_objective() -> f64 {
    15_f64
}
