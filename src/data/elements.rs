//! # Building blocks to describe optimization problems.
use std::fmt;
use std::ops::Neg;
use std::ops::Not;

use num_traits::One;

/// Direction of optimization.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Objective {
    Maximize,
    Minimize,
}

impl Objective {
    /// Convert the optimization direction into a sign factor.
    ///
    /// The engine normalizes problems to maximization; minimization problems have their costs
    /// multiplied by this factor on the way in and their objective value multiplied by it on the
    /// way out.
    #[must_use]
    pub fn factor<F: One + Neg<Output = F>>(self) -> F {
        match self {
            Objective::Maximize => F::one(),
            Objective::Minimize => -F::one(),
        }
    }

    /// Whether `candidate` is a strictly better objective value than `incumbent`.
    #[must_use]
    pub fn is_improvement(self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Objective::Maximize => candidate > incumbent,
            Objective::Minimize => candidate < incumbent,
        }
    }

    /// The worst possible objective value for this direction.
    ///
    /// Used to seed incumbent comparisons.
    #[must_use]
    pub fn worst_value(self) -> f64 {
        match self {
            Objective::Maximize => f64::NEG_INFINITY,
            Objective::Minimize => f64::INFINITY,
        }
    }
}

impl Default for Objective {
    fn default() -> Self {
        Objective::Maximize
    }
}

/// A `Relation` is a type of (in)equality relating a linear form to a right-hand side.
#[allow(missing_docs)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Relation {
    Less,
    Equal,
    Greater,
}

impl Not for Relation {
    type Output = Self;

    /// The relation after both sides of the (in)equality are negated.
    fn not(self) -> Self::Output {
        match self {
            Relation::Less => Relation::Greater,
            Relation::Equal => Relation::Equal,
            Relation::Greater => Relation::Less,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Relation::Less => write!(f, "<="),
            Relation::Equal => write!(f, "="),
            Relation::Greater => write!(f, ">="),
        }
    }
}

/// Sign restriction (or integrality requirement) of a single variable.
///
/// The first three variants describe continuous variables; the last two additionally restrict
/// the variable to integer values. Simplex solvers ignore integrality and solve the continuous
/// relaxation; the integer solvers enforce it through branching or cutting.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SignRestriction {
    /// x >= 0.
    NonNegative,
    /// x <= 0. Represented internally by negating the column.
    NonPositive,
    /// No sign restriction. Represented internally as the difference of two nonnegative
    /// variables.
    Unrestricted,
    /// x >= 0 and integral.
    Integer,
    /// x in {0, 1}.
    Binary,
}

impl SignRestriction {
    /// Whether a solution must take an integral value for this variable.
    #[must_use]
    pub fn requires_integrality(self) -> bool {
        matches!(self, SignRestriction::Integer | SignRestriction::Binary)
    }
}

#[cfg(test)]
mod test {
    use crate::data::elements::{Objective, Relation, SignRestriction};

    #[test]
    fn objective_factor() {
        assert_eq!(Objective::Maximize.factor::<f64>(), 1_f64);
        assert_eq!(Objective::Minimize.factor::<f64>(), -1_f64);
    }

    #[test]
    fn improvement() {
        assert!(Objective::Maximize.is_improvement(2_f64, 1_f64));
        assert!(!Objective::Maximize.is_improvement(1_f64, 1_f64));
        assert!(Objective::Minimize.is_improvement(1_f64, 2_f64));
        assert!(Objective::Maximize.is_improvement(0_f64, Objective::Maximize.worst_value()));
    }

    #[test]
    fn relation_negation() {
        assert_eq!(!Relation::Less, Relation::Greater);
        assert_eq!(!Relation::Equal, Relation::Equal);
        assert_eq!(!Relation::Greater, Relation::Less);
    }

    #[test]
    fn integrality() {
        assert!(SignRestriction::Integer.requires_integrality());
        assert!(SignRestriction::Binary.requires_integrality());
        assert!(!SignRestriction::NonNegative.requires_integrality());
        assert!(!SignRestriction::Unrestricted.requires_integrality());
    }
}
