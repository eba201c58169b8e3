//! # Representation of solutions
//!
//! Value assignments derived from a solved tableau or an integer search, named as in the
//! original problem. These are the payloads a presentation or analysis layer reads; they are
//! immutable once produced.
use crate::data::elements::Objective;

/// A full solution to a continuous problem.
///
/// Contains a value for every variable of the originating model, including variables that were
/// substituted away during canonicalization (negated and split variables are reported in their
/// original form).
#[derive(Clone, Debug, PartialEq)]
pub struct Solution {
    objective_value: f64,
    solution_values: Vec<(String, f64)>,
}

impl Solution {
    /// Create a new `Solution` instance.
    #[must_use]
    pub fn new(objective_value: f64, solution_values: Vec<(String, f64)>) -> Self {
        Self {
            objective_value,
            solution_values,
        }
    }

    /// Value of the objective function for this solution.
    #[must_use]
    pub fn objective_value(&self) -> f64 {
        self.objective_value
    }

    /// (variable name, solution value) tuples, named as in the original problem.
    #[must_use]
    pub fn values(&self) -> &[(String, f64)] {
        &self.solution_values
    }

    /// Value of the named variable, zero when absent.
    #[must_use]
    pub fn value(&self, variable: &str) -> f64 {
        self.solution_values
            .iter()
            .find(|(name, _)| name == variable)
            .map_or(0_f64, |&(_, value)| value)
    }
}

/// An integer-feasible solution found during branching or cutting.
#[derive(Clone, Debug, PartialEq)]
pub struct IntegerSolution {
    solution: Solution,
    feasible: bool,
    /// Identity of the origin: a node index for branch and bound, an iteration index for
    /// cutting planes.
    origin: usize,
}

impl IntegerSolution {
    /// Create a new `IntegerSolution` instance.
    #[must_use]
    pub fn new(solution: Solution, feasible: bool, origin: usize) -> Self {
        Self {
            solution,
            feasible,
            origin,
        }
    }

    /// The value assignment and its objective value.
    #[must_use]
    pub fn solution(&self) -> &Solution {
        &self.solution
    }

    /// Objective value of this solution.
    #[must_use]
    pub fn objective_value(&self) -> f64 {
        self.solution.objective_value()
    }

    /// Whether this solution satisfies all constraints and integrality requirements.
    #[must_use]
    pub fn is_feasible(&self) -> bool {
        self.feasible
    }

    /// Node or iteration index this solution originates from.
    #[must_use]
    pub fn origin(&self) -> usize {
        self.origin
    }

    /// Whether this solution is strictly better than `other` under the given objective sense.
    #[must_use]
    pub fn is_better_than(&self, other: &Self, objective: Objective) -> bool {
        objective.is_improvement(self.objective_value(), other.objective_value())
    }
}

#[cfg(test)]
mod test {
    use crate::data::elements::Objective;
    use crate::data::solution::{IntegerSolution, Solution};

    #[test]
    fn lookup() {
        let solution = Solution::new(10_f64, vec![("x1".to_string(), 2_f64)]);
        assert_eq!(solution.value("x1"), 2_f64);
        assert_eq!(solution.value("x2"), 0_f64);
    }

    #[test]
    fn betterness_follows_objective_sense() {
        let better = IntegerSolution::new(Solution::new(3_f64, Vec::new()), true, 0);
        let worse = IntegerSolution::new(Solution::new(1_f64, Vec::new()), true, 1);

        assert!(better.is_better_than(&worse, Objective::Maximize));
        assert!(!better.is_better_than(&worse, Objective::Minimize));
        assert!(worse.is_better_than(&better, Objective::Minimize));
    }
}
