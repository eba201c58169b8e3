//! # Problem descriptions
//!
//! A `Model` is the validated, immutable description of a linear or integer program: an
//! objective, named variables with sign restrictions and ordered constraints. Models are
//! produced by an external parser or built programmatically; the solvers never mutate them.
//! Branching and cutting derive new models with extra constraints instead.
use std::collections::HashMap;
use std::error::Error;
use std::fmt;

use crate::data::elements::{Objective, Relation, SignRestriction};

/// A single decision variable.
///
/// The `index` is a stable ordinal used for column ordering in the canonical form; it equals the
/// position of the variable in the order of registration.
#[derive(Clone, Debug, PartialEq)]
pub struct Variable {
    name: String,
    cost: f64,
    restriction: SignRestriction,
    index: usize,
}

impl Variable {
    /// Name of this variable, unique within its model.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Coefficient of this variable in the objective function.
    #[must_use]
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Sign restriction of this variable.
    #[must_use]
    pub fn restriction(&self) -> SignRestriction {
        self.restriction
    }

    /// Stable ordinal for column ordering.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }
}

/// A single linear constraint.
///
/// Variables absent from the coefficient mapping have coefficient zero.
#[derive(Clone, Debug, PartialEq)]
pub struct Constraint {
    name: String,
    coefficients: Vec<(String, f64)>,
    relation: Relation,
    rhs: f64,
}

impl Constraint {
    /// Create a new constraint.
    ///
    /// # Arguments
    ///
    /// * `name`: Identifier used in transformation logs and error messages.
    /// * `coefficients`: (variable name, coefficient) pairs. Names must be unique; uniqueness is
    ///   checked when the constraint is added to a `Model`.
    /// * `relation`: Type of (in)equality.
    /// * `rhs`: Right-hand side value.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        coefficients: Vec<(String, f64)>,
        relation: Relation,
        rhs: f64,
    ) -> Self {
        Self {
            name: name.into(),
            coefficients,
            relation,
            rhs,
        }
    }

    /// Name of this constraint.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The (variable name, coefficient) pairs of this constraint.
    #[must_use]
    pub fn coefficients(&self) -> &[(String, f64)] {
        &self.coefficients
    }

    /// Coefficient of the named variable, zero when absent.
    #[must_use]
    pub fn coefficient(&self, variable: &str) -> f64 {
        self.coefficients
            .iter()
            .find(|(name, _)| name == variable)
            .map_or(0_f64, |&(_, value)| value)
    }

    /// Type of (in)equality.
    #[must_use]
    pub fn relation(&self) -> Relation {
        self.relation
    }

    /// Right-hand side value.
    #[must_use]
    pub fn rhs(&self) -> f64 {
        self.rhs
    }
}

/// A validated linear or integer program.
///
/// Invariant: every coefficient key in every constraint references a variable present in the
/// model. This is checked on construction; afterwards the model is immutable.
#[derive(Clone, Debug, PartialEq)]
pub struct Model {
    objective: Objective,
    variables: Vec<Variable>,
    variable_index: HashMap<String, usize>,
    constraints: Vec<Constraint>,
}

impl Model {
    /// Create a new model, validating cross references.
    ///
    /// # Arguments
    ///
    /// * `objective`: Direction of optimization.
    /// * `variables`: (name, objective coefficient, sign restriction) triples. The position in
    ///   this collection becomes the variable's stable index.
    /// * `constraints`: Ordered constraints.
    ///
    /// # Errors
    ///
    /// A `ModelError` if a variable name appears twice, a constraint references an unknown
    /// variable, or a constraint repeats a coefficient key.
    pub fn new(
        objective: Objective,
        variables: Vec<(String, f64, SignRestriction)>,
        constraints: Vec<Constraint>,
    ) -> Result<Self, ModelError> {
        let mut variable_index = HashMap::with_capacity(variables.len());
        let variables = variables
            .into_iter()
            .enumerate()
            .map(|(index, (name, cost, restriction))| {
                if variable_index.insert(name.clone(), index).is_some() {
                    return Err(ModelError::DuplicateVariable(name));
                }
                Ok(Variable {
                    name,
                    cost,
                    restriction,
                    index,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        for constraint in &constraints {
            let mut seen = HashMap::with_capacity(constraint.coefficients().len());
            for (name, _) in constraint.coefficients() {
                if !variable_index.contains_key(name) {
                    return Err(ModelError::UnknownVariable {
                        constraint: constraint.name().to_string(),
                        variable: name.clone(),
                    });
                }
                if seen.insert(name.as_str(), ()).is_some() {
                    return Err(ModelError::DuplicateCoefficient {
                        constraint: constraint.name().to_string(),
                        variable: name.clone(),
                    });
                }
            }
        }

        Ok(Self {
            objective,
            variables,
            variable_index,
            constraints,
        })
    }

    /// Direction of optimization.
    #[must_use]
    pub fn objective(&self) -> Objective {
        self.objective
    }

    /// All variables, ordered by index.
    #[must_use]
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Look a variable up by name.
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variable_index.get(name).map(|&i| &self.variables[i])
    }

    /// All constraints, in registration order.
    #[must_use]
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Number of variables.
    #[must_use]
    pub fn nr_variables(&self) -> usize {
        self.variables.len()
    }

    /// Number of constraints.
    #[must_use]
    pub fn nr_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Variables that must take integral values in a solution.
    pub fn integer_variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables
            .iter()
            .filter(|variable| variable.restriction().requires_integrality())
    }

    /// Derive a new model with extra constraints appended.
    ///
    /// Used by the integer solvers for branching constraints and cutting planes; the original
    /// model is left untouched.
    ///
    /// # Errors
    ///
    /// A `ModelError` if an extra constraint references an unknown variable.
    pub fn with_extra_constraints(
        &self,
        extra: impl IntoIterator<Item = Constraint>,
    ) -> Result<Self, ModelError> {
        let mut constraints = self.constraints.clone();
        constraints.extend(extra);
        Self::new(
            self.objective,
            self.variables
                .iter()
                .map(|v| (v.name().to_string(), v.cost(), v.restriction()))
                .collect(),
            constraints,
        )
    }
}

/// A logical inconsistency in a problem description.
///
/// Created during model construction or canonical form building; solvers surface it to the
/// caller verbatim.
#[derive(Debug, PartialEq, Eq)]
pub enum ModelError {
    /// The same variable name was registered twice.
    DuplicateVariable(String),
    /// A constraint references a variable the model does not contain.
    UnknownVariable {
        /// Name of the offending constraint.
        constraint: String,
        /// The unknown variable name.
        variable: String,
    },
    /// A constraint lists the same variable twice.
    DuplicateCoefficient {
        /// Name of the offending constraint.
        constraint: String,
        /// The repeated variable name.
        variable: String,
    },
    /// The model has no variables.
    NoVariables,
    /// The model has no constraints.
    NoConstraints,
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ModelError::DuplicateVariable(name) => {
                write!(f, "variable \"{}\" is defined more than once", name)
            }
            ModelError::UnknownVariable {
                constraint,
                variable,
            } => write!(
                f,
                "constraint \"{}\" references unknown variable \"{}\"",
                constraint, variable,
            ),
            ModelError::DuplicateCoefficient {
                constraint,
                variable,
            } => write!(
                f,
                "constraint \"{}\" lists variable \"{}\" more than once",
                constraint, variable,
            ),
            ModelError::NoVariables => write!(f, "the model has no variables"),
            ModelError::NoConstraints => write!(f, "the model has no constraints"),
        }
    }
}

impl Error for ModelError {}

#[cfg(test)]
mod test {
    use crate::data::elements::{Objective, Relation, SignRestriction};
    use crate::data::model::{Constraint, Model, ModelError};

    fn variables() -> Vec<(String, f64, SignRestriction)> {
        vec![
            ("x1".to_string(), 3_f64, SignRestriction::NonNegative),
            ("x2".to_string(), 2_f64, SignRestriction::NonNegative),
        ]
    }

    #[test]
    fn valid_model() {
        let model = Model::new(
            Objective::Maximize,
            variables(),
            vec![Constraint::new(
                "c1",
                vec![("x1".to_string(), 1_f64), ("x2".to_string(), 1_f64)],
                Relation::Less,
                4_f64,
            )],
        )
        .unwrap();

        assert_eq!(model.nr_variables(), 2);
        assert_eq!(model.nr_constraints(), 1);
        assert_eq!(model.variable("x1").unwrap().index(), 0);
        assert_eq!(model.variable("x2").unwrap().cost(), 2_f64);
        assert_eq!(model.constraints()[0].coefficient("x2"), 1_f64);
        assert_eq!(model.constraints()[0].coefficient("x9"), 0_f64);
    }

    #[test]
    fn unknown_variable() {
        let result = Model::new(
            Objective::Maximize,
            variables(),
            vec![Constraint::new(
                "c1",
                vec![("x3".to_string(), 1_f64)],
                Relation::Less,
                4_f64,
            )],
        );

        assert_eq!(
            result.unwrap_err(),
            ModelError::UnknownVariable {
                constraint: "c1".to_string(),
                variable: "x3".to_string(),
            },
        );
    }

    #[test]
    fn duplicate_variable() {
        let mut duplicated = variables();
        duplicated.push(("x1".to_string(), 1_f64, SignRestriction::Binary));
        let result = Model::new(Objective::Maximize, duplicated, Vec::new());

        assert_eq!(
            result.unwrap_err(),
            ModelError::DuplicateVariable("x1".to_string()),
        );
    }

    #[test]
    fn extra_constraints_leave_original_untouched() {
        let model = Model::new(
            Objective::Maximize,
            variables(),
            vec![Constraint::new(
                "c1",
                vec![("x1".to_string(), 1_f64)],
                Relation::Less,
                4_f64,
            )],
        )
        .unwrap();

        let branched = model
            .with_extra_constraints(vec![Constraint::new(
                "branch",
                vec![("x2".to_string(), 1_f64)],
                Relation::Greater,
                1_f64,
            )])
            .unwrap();

        assert_eq!(model.nr_constraints(), 1);
        assert_eq!(branched.nr_constraints(), 2);
    }
}
