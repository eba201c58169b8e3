//! # Canonical form construction
//!
//! Transforms a `Model` into the standard equality-constraint, nonnegative-variable form the
//! simplex tableau is initialized from. Every transformation is recorded as a readable step so
//! a solve can be replayed from the original problem statement.
//!
//! The rules follow the textbook recipe: a `<=` constraint receives a slack variable, a `>=`
//! constraint a surplus and an artificial variable, an `=` constraint an artificial variable.
//! Nonpositive variables are negated, unrestricted variables split into a difference of two
//! nonnegative ones, and binary variables receive an upper bound row. Rows with a negative
//! right-hand side are negated first so that the initial basis is feasible for phase one.
use std::collections::HashMap;

use crate::data::elements::{Objective, Relation, SignRestriction};
use crate::data::model::{Model, ModelError};
use crate::data::solution::Solution;
use crate::algorithm::tableau::Tableau;

/// What a canonical column stands for in terms of the original problem.
#[derive(Clone, Debug, PartialEq)]
pub enum ColumnRole {
    /// The column value equals `factor` times the original variable value.
    Variable {
        /// Original variable name.
        name: String,
        /// `1` for a direct representation, `-1` for a negated nonpositive variable.
        factor: f64,
    },
    /// Positive part of a split unrestricted variable.
    SplitPositive {
        /// Original variable name.
        name: String,
    },
    /// Negative part of a split unrestricted variable.
    SplitNegative {
        /// Original variable name.
        name: String,
    },
    /// Slack of a `<=` row.
    Slack {
        /// Constraint row index (1-based, as in the tableau).
        row: usize,
    },
    /// Surplus of a `>=` row.
    Surplus {
        /// Constraint row index (1-based, as in the tableau).
        row: usize,
    },
    /// Artificial variable of a `>=` or `=` row.
    Artificial {
        /// Constraint row index (1-based, as in the tableau).
        row: usize,
    },
}

/// A `Model` rewritten into standard form, with the bookkeeping to translate back.
///
/// Invariant: artificial columns are the trailing structural columns of the tableau, so that
/// stripping them after phase one keeps all other column indices stable.
#[derive(Clone, Debug)]
pub struct CanonicalForm {
    tableau: Tableau,
    /// Phase two costs per structural column, in the maximization convention.
    costs: Vec<f64>,
    roles: Vec<ColumnRole>,
    column_of: HashMap<String, usize>,
    slacks: Vec<String>,
    surpluses: Vec<String>,
    artificials: Vec<String>,
    artificial_columns: Vec<usize>,
    /// Structural coefficients and right-hand side of each constraint row, after sign flips,
    /// indexed by row - 1. Used to substitute added variables out of cutting planes.
    row_data: Vec<(Vec<f64>, f64)>,
    steps: Vec<String>,
    objective: Objective,
}

impl CanonicalForm {
    /// The initial tableau for this problem.
    #[must_use]
    pub fn tableau(&self) -> &Tableau {
        &self.tableau
    }

    /// Phase two costs per column, maximization convention. Zero for all added variables.
    #[must_use]
    pub fn costs(&self) -> &[f64] {
        &self.costs
    }

    /// Phase one costs: minimize the sum of artificial variables, expressed as maximization.
    #[must_use]
    pub fn phase_one_costs(&self) -> Vec<f64> {
        let mut costs = vec![0_f64; self.costs.len()];
        for &j in &self.artificial_columns {
            costs[j] = -1_f64;
        }
        costs
    }

    /// What each canonical column stands for.
    #[must_use]
    pub fn roles(&self) -> &[ColumnRole] {
        &self.roles
    }

    /// Canonical column of a variable represented by a single column.
    ///
    /// Split (unrestricted) variables occupy two columns and are not part of this mapping.
    #[must_use]
    pub fn column_of(&self, variable: &str) -> Option<usize> {
        self.column_of.get(variable).copied()
    }

    /// Names of the added slack variables.
    #[must_use]
    pub fn slacks(&self) -> &[String] {
        &self.slacks
    }

    /// Names of the added surplus variables.
    #[must_use]
    pub fn surpluses(&self) -> &[String] {
        &self.surpluses
    }

    /// Names of the added artificial variables.
    #[must_use]
    pub fn artificials(&self) -> &[String] {
        &self.artificials
    }

    /// Columns of the artificial variables. Always the trailing structural columns.
    #[must_use]
    pub fn artificial_columns(&self) -> &[usize] {
        &self.artificial_columns
    }

    /// Structural coefficients and right-hand side of constraint row `row`, after sign flips.
    #[must_use]
    pub fn row_data(&self, row: usize) -> (&[f64], f64) {
        let (coefficients, rhs) = &self.row_data[row - 1];
        (coefficients, *rhs)
    }

    /// Ordered, human readable descriptions of every transformation applied.
    #[must_use]
    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    /// Original direction of optimization.
    #[must_use]
    pub fn objective(&self) -> Objective {
        self.objective
    }

    /// Number of structural (non-added) columns.
    #[must_use]
    pub fn nr_variable_columns(&self) -> usize {
        self.roles
            .iter()
            .filter(|role| {
                matches!(
                    role,
                    ColumnRole::Variable { .. }
                        | ColumnRole::SplitPositive { .. }
                        | ColumnRole::SplitNegative { .. }
                )
            })
            .count()
    }

    /// Translate a canonical variable assignment back into original problem terms.
    ///
    /// # Arguments
    ///
    /// * `model`: The model this canonical form was built from.
    /// * `canonical_values`: (canonical column name, value) pairs as extracted from a tableau.
    /// * `objective_value`: Objective value in the maximization convention.
    ///
    /// # Return value
    ///
    /// A `Solution` with one value per model variable and the objective value in the model's
    /// own direction of optimization.
    #[must_use]
    pub fn restore_solution(
        &self,
        model: &Model,
        canonical_values: &[(String, f64)],
        objective_value: f64,
    ) -> Solution {
        let by_name: HashMap<&str, f64> = canonical_values
            .iter()
            .map(|(name, value)| (name.as_str(), *value))
            .collect();
        let lookup = |name: &str| by_name.get(name).copied().unwrap_or(0_f64);

        let values = model
            .variables()
            .iter()
            .map(|variable| {
                let name = variable.name();
                let value = match variable.restriction() {
                    SignRestriction::NonPositive => -lookup(&negated_name(name)),
                    SignRestriction::Unrestricted => {
                        lookup(&split_positive_name(name)) - lookup(&split_negative_name(name))
                    }
                    _ => lookup(name),
                };
                (name.to_string(), value)
            })
            .collect();

        let sign: f64 = self.objective.factor();
        Solution::new(sign * objective_value, values)
    }
}

fn negated_name(variable: &str) -> String {
    format!("{}_neg", variable)
}

fn split_positive_name(variable: &str) -> String {
    format!("{}_pos", variable)
}

fn split_negative_name(variable: &str) -> String {
    format!("{}_neg", variable)
}

/// Builds the canonical form of a `Model`.
pub struct CanonicalFormBuilder<'a> {
    model: &'a Model,
}

impl<'a> CanonicalFormBuilder<'a> {
    /// Create a builder for the given model.
    #[must_use]
    pub fn new(model: &'a Model) -> Self {
        Self { model }
    }

    /// Construct the canonical form.
    ///
    /// # Errors
    ///
    /// A `ModelError` when the model has no variables or no constraints. Unknown variable
    /// references are impossible here; `Model` construction already rejects them.
    pub fn build(self) -> Result<CanonicalForm, ModelError> {
        let model = self.model;
        if model.nr_variables() == 0 {
            return Err(ModelError::NoVariables);
        }
        if model.nr_constraints() == 0 {
            return Err(ModelError::NoConstraints);
        }

        let mut steps = Vec::new();
        let mut roles = Vec::new();
        let mut column_names = Vec::new();
        let mut column_of = HashMap::new();
        // Variable columns and the terms mapping each variable onto them.
        let mut terms_of: HashMap<&str, Vec<(usize, f64)>> = HashMap::new();
        for variable in model.variables() {
            let name = variable.name();
            match variable.restriction() {
                SignRestriction::NonNegative
                | SignRestriction::Integer
                | SignRestriction::Binary => {
                    column_of.insert(name.to_string(), column_names.len());
                    terms_of.insert(name, vec![(column_names.len(), 1_f64)]);
                    roles.push(ColumnRole::Variable {
                        name: name.to_string(),
                        factor: 1_f64,
                    });
                    column_names.push(name.to_string());
                }
                SignRestriction::NonPositive => {
                    let internal = negated_name(name);
                    steps.push(format!(
                        "variable \"{}\" is nonpositive: substituted by -{}",
                        name, internal,
                    ));
                    column_of.insert(name.to_string(), column_names.len());
                    terms_of.insert(name, vec![(column_names.len(), -1_f64)]);
                    roles.push(ColumnRole::Variable {
                        name: name.to_string(),
                        factor: -1_f64,
                    });
                    column_names.push(internal);
                }
                SignRestriction::Unrestricted => {
                    let positive = split_positive_name(name);
                    let negative = split_negative_name(name);
                    steps.push(format!(
                        "variable \"{}\" is unrestricted: substituted by {} - {}",
                        name, positive, negative,
                    ));
                    terms_of.insert(
                        name,
                        vec![
                            (column_names.len(), 1_f64),
                            (column_names.len() + 1, -1_f64),
                        ],
                    );
                    roles.push(ColumnRole::SplitPositive {
                        name: name.to_string(),
                    });
                    roles.push(ColumnRole::SplitNegative {
                        name: name.to_string(),
                    });
                    column_names.push(positive);
                    column_names.push(negative);
                }
            }
        }
        let nr_variable_columns = column_names.len();

        // Constraint rows over the variable columns, with nonnegative right-hand sides.
        let mut row_data: Vec<(Vec<f64>, f64)> = Vec::new();
        let mut relations = Vec::new();
        for constraint in model.constraints() {
            let mut coefficients = vec![0_f64; nr_variable_columns];
            for (variable, &coefficient) in constraint
                .coefficients()
                .iter()
                .map(|(name, value)| (name, value))
            {
                for &(column, factor) in &terms_of[variable.as_str()] {
                    coefficients[column] += factor * coefficient;
                }
            }
            let mut rhs = constraint.rhs();
            let mut relation = constraint.relation();
            if rhs < 0_f64 {
                for value in &mut coefficients {
                    *value = -*value;
                }
                rhs = -rhs;
                relation = !relation;
                steps.push(format!(
                    "constraint \"{}\" has a negative right-hand side: negated both sides",
                    constraint.name(),
                ));
            }
            row_data.push((coefficients, rhs));
            relations.push((constraint.name().to_string(), relation));
        }

        // Binary variables are bounded above by one through an extra row.
        for variable in model.variables() {
            if variable.restriction() == SignRestriction::Binary {
                let mut coefficients = vec![0_f64; nr_variable_columns];
                coefficients[column_of[variable.name()]] = 1_f64;
                row_data.push((coefficients, 1_f64));
                relations.push((format!("bound_{}", variable.name()), Relation::Less));
                steps.push(format!(
                    "variable \"{}\" is binary: added bound row {} <= 1",
                    variable.name(),
                    variable.name(),
                ));
            }
        }

        // Slack and surplus columns in row order, artificial columns after them so that they
        // can be stripped without disturbing other indices.
        let nr_rows = row_data.len();
        let mut slack_of = vec![None; nr_rows];
        let mut surplus_of = vec![None; nr_rows];
        let mut slacks = Vec::new();
        let mut surpluses = Vec::new();
        for (index, (name, relation)) in relations.iter().enumerate() {
            match relation {
                Relation::Less => {
                    let slack = format!("slack{}", slacks.len() + 1);
                    steps.push(format!(
                        "constraint \"{}\": added slack variable \"{}\"",
                        name, slack,
                    ));
                    slack_of[index] = Some(column_names.len());
                    roles.push(ColumnRole::Slack { row: index + 1 });
                    column_names.push(slack.clone());
                    slacks.push(slack);
                }
                Relation::Greater => {
                    let surplus = format!("surplus{}", surpluses.len() + 1);
                    steps.push(format!(
                        "constraint \"{}\": added surplus variable \"{}\"",
                        name, surplus,
                    ));
                    surplus_of[index] = Some(column_names.len());
                    roles.push(ColumnRole::Surplus { row: index + 1 });
                    column_names.push(surplus.clone());
                    surpluses.push(surplus);
                }
                Relation::Equal => {}
            }
        }
        let mut artificial_of = vec![None; nr_rows];
        let mut artificials = Vec::new();
        let mut artificial_columns = Vec::new();
        for (index, (name, relation)) in relations.iter().enumerate() {
            if matches!(relation, Relation::Greater | Relation::Equal) {
                let artificial = format!("artificial{}", artificials.len() + 1);
                steps.push(format!(
                    "constraint \"{}\": added artificial variable \"{}\"",
                    name, artificial,
                ));
                artificial_of[index] = Some(column_names.len());
                artificial_columns.push(column_names.len());
                roles.push(ColumnRole::Artificial { row: index + 1 });
                column_names.push(artificial.clone());
                artificials.push(artificial);
            }
        }

        let nr_columns = column_names.len() + 1;
        column_names.push("rhs".to_string());

        // Phase two costs, maximization convention. Added variables cost nothing.
        let sign: f64 = model.objective().factor();
        let mut costs = vec![0_f64; nr_columns - 1];
        for variable in model.variables() {
            for &(column, factor) in &terms_of[variable.name()] {
                costs[column] = sign * factor * variable.cost();
            }
        }

        let mut rows = Vec::with_capacity(nr_rows + 1);
        let mut objective_row = vec![0_f64; nr_columns];
        for (j, &cost) in costs.iter().enumerate() {
            objective_row[j] = -cost;
        }
        rows.push(objective_row);

        let mut basis = Vec::with_capacity(nr_rows);
        for (index, (coefficients, rhs)) in row_data.iter().enumerate() {
            let mut row = vec![0_f64; nr_columns];
            row[..nr_variable_columns].copy_from_slice(coefficients);
            if let Some(column) = slack_of[index] {
                row[column] = 1_f64;
            }
            if let Some(column) = surplus_of[index] {
                row[column] = -1_f64;
            }
            if let Some(column) = artificial_of[index] {
                row[column] = 1_f64;
            }
            row[nr_columns - 1] = *rhs;
            rows.push(row);

            // The initial basis: slack where available, artificial otherwise.
            match (slack_of[index], artificial_of[index]) {
                (Some(column), _) => basis.push(column),
                (None, Some(column)) => basis.push(column),
                (None, None) => unreachable!("every row received a slack or an artificial"),
            }
        }

        let tableau = Tableau::new(rows, column_names, basis);

        Ok(CanonicalForm {
            tableau,
            costs,
            roles,
            column_of,
            slacks,
            surpluses,
            artificials,
            artificial_columns,
            row_data,
            steps,
            objective: model.objective(),
        })
    }
}
