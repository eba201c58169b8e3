//! Simple linear program.
//!
//! max 3x1 + 2x2 subject to x1 + x2 <= 4 and 2x1 + x2 <= 6, both variables nonnegative.
//! The optimum x1 = 2, x2 = 2 with objective 10 is reached in exactly two pivots from the
//! slack basis.
use crate::data::elements::{Objective, Relation, SignRestriction};
use crate::data::model::{Constraint, Model};

/// The problem as a validated `Model`.
pub fn model() -> Model {
    Model::new(
        Objective::Maximize,
        vec![
            ("x1".to_string(), 3_f64, SignRestriction::NonNegative),
            ("x2".to_string(), 2_f64, SignRestriction::NonNegative),
        ],
        vec![
            Constraint::new(
                "c1",
                vec![("x1".to_string(), 1_f64), ("x2".to_string(), 1_f64)],
                Relation::Less,
                4_f64,
            ),
            Constraint::new(
                "c2",
                vec![("x1".to_string(), 2_f64), ("x2".to_string(), 1_f64)],
                Relation::Less,
                6_f64,
            ),
        ],
    )
    .unwrap()
}

/// The known optimal objective value.
pub fn optimal_objective() -> f64 {
    10_f64
}
