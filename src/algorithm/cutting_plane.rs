//! # Gomory cutting planes
//!
//! Solves the linear relaxation, derives valid inequalities from tableau rows whose basic
//! integer variable took a fractional value, adds them to the working model and re-solves.
//! The fractional parts of a row's coefficients become the cut's coefficients after the added
//! slack and surplus variables are substituted back out; the result is scaled to integer
//! coefficients and its right-hand side rounded up, so that the slack of every accepted cut is
//! again integral and later rounds stay valid.
//!
//! Cuts touching a continuous or split variable cannot be rounded and are discarded; when no
//! valid violated cut exists, or the objective stops moving, the solve reports the best found
//! solution as stalled rather than looping forever.
use itertools::Itertools;
use log::debug;

use crate::algorithm::canonical::{CanonicalForm, CanonicalFormBuilder, ColumnRole};
use crate::algorithm::options::SolveOptions;
use crate::algorithm::simplex::primal::PrimalSimplexSolver;
use crate::algorithm::simplex::SimplexIteration;
use crate::algorithm::tableau::Tableau;
use crate::algorithm::{SolveError, SolveStatus, Solver, SolverResult};
use crate::data::elements::Relation;
use crate::data::model::{Constraint, Model};
use crate::data::solution::{IntegerSolution, Solution};

/// Coefficients below this magnitude count as zero in a cut.
const NEGLIGIBLE: f64 = 1e-9;
/// Largest multiplier tried when scaling a cut to integer coefficients.
const MAX_SCALE: usize = 1024;

/// A valid inequality separating a fractional relaxation solution.
#[derive(Clone, Debug, PartialEq)]
pub struct CuttingPlane {
    /// Constraint name under which the cut was added to the working model.
    pub name: String,
    /// (variable name, coefficient) pairs over original integer variables.
    pub coefficients: Vec<(String, f64)>,
    /// Always `>=`; cuts bound the feasible region from below after substitution.
    pub relation: Relation,
    /// Right-hand side, rounded up to the nearest integer the left-hand side can reach.
    pub rhs: f64,
    /// The fractional basic variable whose tableau row produced this cut.
    pub source: String,
    /// By how much the generating solution violated the cut.
    pub violation: f64,
    /// Round in which the cut was generated.
    pub iteration: usize,
}

/// Iterated Gomory cut generation over primal simplex relaxations.
pub struct CuttingPlaneSolver {
    options: SolveOptions,
}

/// The fractional part in `[0, 1)`, with values negligibly close to an integer snapped to zero.
fn fractional_part(value: f64) -> f64 {
    let fraction = value - value.floor();
    if fraction < NEGLIGIBLE || fraction > 1_f64 - NEGLIGIBLE {
        0_f64
    } else {
        fraction
    }
}

impl CuttingPlaneSolver {
    /// Create a new instance with the given options.
    #[must_use]
    pub fn new(options: SolveOptions) -> Self {
        Self { options }
    }

    /// Whether all integer variables of `model` are integral in `solution`.
    fn is_integral(&self, model: &Model, solution: &Solution) -> bool {
        model
            .integer_variables()
            .all(|variable| self.options.is_integral(solution.value(variable.name())))
    }

    /// Derive up to the configured number of cuts from the solved tableau.
    ///
    /// Rows are tried in order of their right-hand side's fractional part's distance to one
    /// half, closest first; rows that do not yield a valid violated cut are skipped without
    /// counting against the cap.
    fn derive_cuts(
        &self,
        model: &Model,
        canonical: &CanonicalForm,
        tableau: &Tableau,
        solution: &Solution,
        round: usize,
        nr_existing: usize,
    ) -> Vec<CuttingPlane> {
        let eligible = (1..tableau.nr_rows())
            .filter_map(|row| {
                let basic = canonical.roles().get(tableau.basis()[row - 1])?;
                let ColumnRole::Variable { name, .. } = basic else {
                    return None;
                };
                if !model
                    .variable(name)
                    .is_some_and(|variable| variable.restriction().requires_integrality())
                {
                    return None;
                }
                let fraction = fractional_part(tableau.rhs(row));
                if fraction <= self.options.integrality_tolerance
                    || fraction >= 1_f64 - self.options.integrality_tolerance
                {
                    return None;
                }
                Some((row, name.clone(), (fraction - 0.5).abs()))
            })
            .sorted_by(|a, b| a.2.total_cmp(&b.2));

        let mut cuts = Vec::new();
        for (row, source, _) in eligible {
            if cuts.len() >= self.options.max_cuts_per_iteration {
                break;
            }
            let Some((coefficients, rhs, violation)) =
                self.cut_from_row(model, canonical, tableau, solution, row)
            else {
                continue;
            };
            let name = format!("cut{}", nr_existing + cuts.len() + 1);
            debug!(
                "round {}: cut {} from row {} (basic {}), violation {:e}",
                round, name, row, source, violation,
            );
            cuts.push(CuttingPlane {
                name,
                coefficients,
                relation: Relation::Greater,
                rhs,
                source,
                violation,
                iteration: round,
            });
        }

        cuts
    }

    /// The Gomory cut of one tableau row, in original variable terms.
    ///
    /// Returns `None` when the row does not produce a valid cut: when it touches a continuous,
    /// split or artificial column, cannot be scaled to integer coefficients, loses all its
    /// coefficients, or is not violated by the generating solution.
    fn cut_from_row(
        &self,
        model: &Model,
        canonical: &CanonicalForm,
        tableau: &Tableau,
        solution: &Solution,
        row: usize,
    ) -> Option<(Vec<(String, f64)>, f64, f64)> {
        let nr_variable_columns = canonical.nr_variable_columns();
        let mut accumulated = vec![0_f64; nr_variable_columns];
        let mut rhs = fractional_part(tableau.rhs(row));

        for column in (0..tableau.nr_columns() - 1).filter(|&j| !tableau.is_basic(j)) {
            let fraction = fractional_part(tableau.value(row, column));
            if fraction == 0_f64 {
                continue;
            }
            match &canonical.roles()[column] {
                ColumnRole::Variable { .. }
                | ColumnRole::SplitPositive { .. }
                | ColumnRole::SplitNegative { .. } => accumulated[column] += fraction,
                ColumnRole::Slack { row: source_row } => {
                    // slack = rhs - coefficients . x
                    let (coefficients, row_rhs) = canonical.row_data(*source_row);
                    for (value, &coefficient) in accumulated.iter_mut().zip(coefficients) {
                        *value -= fraction * coefficient;
                    }
                    rhs -= fraction * row_rhs;
                }
                ColumnRole::Surplus { row: source_row } => {
                    // surplus = coefficients . x - rhs
                    let (coefficients, row_rhs) = canonical.row_data(*source_row);
                    for (value, &coefficient) in accumulated.iter_mut().zip(coefficients) {
                        *value += fraction * coefficient;
                    }
                    rhs += fraction * row_rhs;
                }
                ColumnRole::Artificial { .. } => return None,
            }
        }

        // Map structural columns back to original variables; the rounding step below is only
        // valid when every remaining term belongs to an integer variable.
        let mut terms = Vec::new();
        for (column, &value) in accumulated.iter().enumerate() {
            if value.abs() <= NEGLIGIBLE {
                continue;
            }
            match &canonical.roles()[column] {
                ColumnRole::Variable { name, factor }
                    if model
                        .variable(name)
                        .is_some_and(|v| v.restriction().requires_integrality()) =>
                {
                    terms.push((name.clone(), value * factor));
                }
                _ => return None,
            }
        }
        if terms.is_empty() {
            return None;
        }

        let scale = Self::integer_scale(terms.iter().map(|&(_, value)| value))?;
        for (_, value) in &mut terms {
            *value = (*value * scale).round();
        }
        // Integer left-hand side: the right-hand side can be rounded up.
        let rhs = (rhs * scale - NEGLIGIBLE).ceil();

        let lhs: f64 = terms
            .iter()
            .map(|(name, value)| value * solution.value(name))
            .sum();
        if lhs >= rhs - NEGLIGIBLE {
            return None;
        }

        Some((terms, rhs, rhs - lhs))
    }

    /// The smallest multiplier turning all values into integers, if one exists.
    fn integer_scale(values: impl Iterator<Item = f64> + Clone) -> Option<f64> {
        (1..=MAX_SCALE).map(|scale| scale as f64).find(|scale| {
            values
                .clone()
                .all(|value| (value * scale - (value * scale).round()).abs() <= 1e-6)
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        status: SolveStatus,
        solution: Option<Solution>,
        incumbent: Option<IntegerSolution>,
        cuts: Vec<CuttingPlane>,
        iterations: Vec<SimplexIteration>,
        initial_tableau: Option<Tableau>,
        final_tableau: Option<Tableau>,
        warnings: Vec<String>,
    ) -> SolverResult {
        let mut result = SolverResult::of_status(status);
        result.solution = solution;
        result.incumbent = incumbent;
        result.cuts = cuts;
        result.iterations = iterations;
        result.initial_tableau = initial_tableau;
        result.final_tableau = final_tableau;
        result.warnings = warnings;
        result
    }
}

impl Solver for CuttingPlaneSolver {
    fn solve(&self, model: &Model) -> Result<SolverResult, SolveError> {
        if model.integer_variables().next().is_none() {
            return Err(SolveError::NotApplicable(
                "the model has no integer variables; use a simplex solver".to_string(),
            ));
        }

        let relaxation_solver = PrimalSimplexSolver::new(self.options);
        let mut current = model.clone();
        let mut cuts: Vec<CuttingPlane> = Vec::new();
        let mut iterations = Vec::new();
        let mut initial_tableau = None;
        let mut warnings = Vec::new();
        let mut objective_history: Vec<f64> = Vec::new();
        let mut last: Option<(Solution, Tableau)> = None;

        for round in 0..self.options.max_cut_iterations {
            let canonical = CanonicalFormBuilder::new(&current).build()?;
            let relaxed = relaxation_solver.solve_canonical(&current, &canonical)?;
            if initial_tableau.is_none() {
                initial_tableau = relaxed.initial_tableau;
            }
            iterations.extend(relaxed.iterations);
            warnings.extend(relaxed.warnings);

            if matches!(
                relaxed.status,
                SolveStatus::Infeasible | SolveStatus::Unbounded | SolveStatus::MaxIterationsReached
            ) {
                return Ok(Self::assemble(
                    relaxed.status,
                    relaxed.solution,
                    None,
                    cuts,
                    iterations,
                    initial_tableau,
                    relaxed.final_tableau,
                    warnings,
                ));
            }
            let (Some(solution), Some(tableau)) = (relaxed.solution, relaxed.final_tableau) else {
                return Err(SolveError::NumericalInstability(
                    "the relaxation reported optimality without a solution".to_string(),
                ));
            };

            if self.is_integral(model, &solution) {
                debug!(
                    "round {}: relaxation is integral at {}, done",
                    round,
                    solution.objective_value(),
                );
                let incumbent = IntegerSolution::new(solution.clone(), true, round);
                return Ok(Self::assemble(
                    SolveStatus::Optimal,
                    Some(solution),
                    Some(incumbent),
                    cuts,
                    iterations,
                    initial_tableau,
                    Some(tableau),
                    warnings,
                ));
            }

            objective_history.push(solution.objective_value());
            let window = self.options.stagnation_window;
            if objective_history.len() >= window {
                let recent = &objective_history[objective_history.len() - window..];
                let spread = recent.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b))
                    - recent.iter().fold(f64::INFINITY, |a, &b| a.min(b));
                if spread <= self.options.improvement_tolerance {
                    warnings.push(format!(
                        "objective unchanged over the last {} rounds; best found is not proven optimal",
                        window,
                    ));
                    return Ok(Self::assemble(
                        SolveStatus::Stalled,
                        Some(solution),
                        None,
                        cuts,
                        iterations,
                        initial_tableau,
                        Some(tableau),
                        warnings,
                    ));
                }
            }

            let new_cuts =
                self.derive_cuts(model, &canonical, &tableau, &solution, round, cuts.len());
            if new_cuts.is_empty() {
                warnings.push(
                    "no valid violated cut could be generated; best found is not proven optimal"
                        .to_string(),
                );
                return Ok(Self::assemble(
                    SolveStatus::Stalled,
                    Some(solution),
                    None,
                    cuts,
                    iterations,
                    initial_tableau,
                    Some(tableau),
                    warnings,
                ));
            }

            current = current.with_extra_constraints(new_cuts.iter().map(|cut| {
                Constraint::new(
                    cut.name.clone(),
                    cut.coefficients.clone(),
                    cut.relation,
                    cut.rhs,
                )
            }))?;
            cuts.extend(new_cuts);
            last = Some((solution, tableau));
        }

        warnings.push(format!(
            "cut generation stopped after {} rounds without reaching integrality",
            self.options.max_cut_iterations,
        ));
        let (solution, final_tableau) = match last {
            Some((solution, tableau)) => (Some(solution), Some(tableau)),
            None => (None, None),
        };
        Ok(Self::assemble(
            SolveStatus::MaxIterationsReached,
            solution,
            None,
            cuts,
            iterations,
            initial_tableau,
            final_tableau,
            warnings,
        ))
    }
}

#[cfg(test)]
mod test {
    use crate::algorithm::cutting_plane::{fractional_part, CuttingPlaneSolver};
    use crate::algorithm::options::SolveOptions;
    use crate::algorithm::{SolveError, SolveStatus, Solver};
    use crate::data::elements::{Objective, Relation, SignRestriction};
    use crate::data::model::{Constraint, Model};
    use crate::tests::{assert_approx, problem_1};

    #[test]
    fn fractional_parts() {
        assert_approx(fractional_part(1.5_f64), 0.5_f64);
        assert_approx(fractional_part(-1.25_f64), 0.75_f64);
        assert_approx(fractional_part(3_f64), 0_f64);
        assert_approx(fractional_part(3_f64 - 1e-12), 0_f64);
    }

    #[test]
    fn continuous_models_are_rejected() {
        let solver = CuttingPlaneSolver::new(SolveOptions::default());
        let result = solver.solve(&problem_1::model());

        assert!(matches!(result, Err(SolveError::NotApplicable(_))));
    }

    #[test]
    fn integral_relaxation_needs_no_cuts() {
        // max x s.t. x <= 3: the relaxation optimum is already integral.
        let model = Model::new(
            Objective::Maximize,
            vec![("x".to_string(), 1_f64, SignRestriction::Integer)],
            vec![Constraint::new(
                "cap",
                vec![("x".to_string(), 1_f64)],
                Relation::Less,
                3_f64,
            )],
        )
        .unwrap();

        let solver = CuttingPlaneSolver::new(SolveOptions::default());
        let result = solver.solve(&model).unwrap();

        assert_eq!(result.status, SolveStatus::Optimal);
        assert!(result.cuts.is_empty());
        let incumbent = result.incumbent.unwrap();
        assert_eq!(incumbent.origin(), 0);
        assert_approx(incumbent.objective_value(), 3_f64);
    }

    #[test]
    fn one_cut_rounds_the_relaxation_down() {
        // max x s.t. 2x <= 3: the relaxation gives x = 1.5, one cut forces x <= 1.
        let model = Model::new(
            Objective::Maximize,
            vec![("x".to_string(), 1_f64, SignRestriction::Integer)],
            vec![Constraint::new(
                "cap",
                vec![("x".to_string(), 2_f64)],
                Relation::Less,
                3_f64,
            )],
        )
        .unwrap();

        let solver = CuttingPlaneSolver::new(SolveOptions::default());
        let result = solver.solve(&model).unwrap();

        assert_eq!(result.status, SolveStatus::Optimal);
        let incumbent = result.incumbent.unwrap();
        assert_approx(incumbent.objective_value(), 1_f64);
        assert_eq!(incumbent.origin(), 1);

        // The slack of 2x + s = 3 was substituted out: 0.5 s >= 0.5 became -x >= -1.
        assert_eq!(result.cuts.len(), 1);
        let cut = &result.cuts[0];
        assert_eq!(cut.source, "x");
        assert_eq!(cut.relation, Relation::Greater);
        assert_eq!(cut.coefficients, vec![("x".to_string(), -1_f64)]);
        assert_approx(cut.rhs, -1_f64);
        assert_approx(cut.violation, 0.5_f64);
        assert_eq!(cut.iteration, 0);
    }

    #[test]
    fn stalls_when_no_cut_is_derivable() {
        // The fractional row mixes the integer x with the continuous z, so the rounding step
        // is invalid and the cut is discarded.
        let model = Model::new(
            Objective::Maximize,
            vec![
                ("x".to_string(), 1_f64, SignRestriction::Integer),
                ("z".to_string(), 0_f64, SignRestriction::NonNegative),
            ],
            vec![Constraint::new(
                "cap",
                vec![("x".to_string(), 2_f64), ("z".to_string(), 3_f64)],
                Relation::Less,
                3_f64,
            )],
        )
        .unwrap();

        let solver = CuttingPlaneSolver::new(SolveOptions::default());
        let result = solver.solve(&model).unwrap();

        assert_eq!(result.status, SolveStatus::Stalled);
        assert!(!result.success);
        assert!(result.cuts.is_empty());
        assert_approx(result.solution.unwrap().objective_value(), 1.5_f64);
        assert!(result
            .warnings
            .iter()
            .any(|warning| warning.contains("no valid violated cut")));
    }
}
