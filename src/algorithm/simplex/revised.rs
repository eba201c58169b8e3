//! # The revised simplex solver
//!
//! The same two phase method as the primal solver, expressed through basis matrix operations:
//! the constraint matrix is kept in its original form and only the basis inverse and the basic
//! values are updated per pivot, by exactly the row operations a full tableau pivot would
//! perform. Entering and leaving selection share the primal solver's semantics, so both
//! solvers visit the same bases in the same order and must agree on the result.
use std::time::Instant;

use log::debug;

use crate::algorithm::canonical::{CanonicalForm, CanonicalFormBuilder};
use crate::algorithm::options::SolveOptions;
use crate::algorithm::simplex::{Phase, PhaseOutcome, SimplexIteration, PHASE_ONE_TOLERANCE};
use crate::algorithm::tableau::{
    RatioCandidate, Tableau, TableauStatus, COST_TOLERANCE, PIVOT_TOLERANCE,
};
use crate::algorithm::{SolveError, SolveStatus, Solver, SolverResult};
use crate::data::model::Model;

/// Two phase simplex through basis inverse maintenance.
pub struct RevisedSimplexSolver {
    options: SolveOptions,
}

/// The matrix state of a revised simplex run.
///
/// `a` and `b` stay as built by the canonical form; `inverse` and `basic_values` carry the
/// current basis. The invariant `basic_values = inverse * b` is maintained by `update`.
struct BasisState {
    /// Constraint matrix, row major, without the right-hand side column.
    a: Vec<Vec<f64>>,
    /// Original right-hand sides.
    b: Vec<f64>,
    /// Column names, without the right-hand side.
    names: Vec<String>,
    /// Column basic in each row.
    basis: Vec<usize>,
    /// The basis inverse.
    inverse: Vec<Vec<f64>>,
    /// Values of the basic variables, in row order.
    basic_values: Vec<f64>,
    /// Number of pivots performed.
    iteration: usize,
}

impl BasisState {
    /// Start from the canonical form's initial basis, which is an identity submatrix.
    fn new(canonical: &CanonicalForm) -> Self {
        let tableau = canonical.tableau();
        let m = tableau.nr_rows() - 1;
        let n = tableau.nr_columns() - 1;

        let a = (1..=m)
            .map(|row| (0..n).map(|j| tableau.value(row, j)).collect())
            .collect();
        let b: Vec<f64> = (1..=m).map(|row| tableau.rhs(row)).collect();
        let basic_values = b.clone();
        let inverse = (0..m)
            .map(|i| {
                let mut row = vec![0_f64; m];
                row[i] = 1_f64;
                row
            })
            .collect();

        Self {
            a,
            b,
            names: tableau.column_names()[..n].to_vec(),
            basis: tableau.basis().to_vec(),
            inverse,
            basic_values,
            iteration: 0,
        }
    }

    fn nr_rows(&self) -> usize {
        self.a.len()
    }

    fn nr_columns(&self) -> usize {
        self.names.len()
    }

    /// The price vector `y = c_B * B^-1`.
    fn prices(&self, costs: &[f64]) -> Vec<f64> {
        (0..self.nr_rows())
            .map(|i| {
                self.basis
                    .iter()
                    .enumerate()
                    .map(|(k, &basic)| costs[basic] * self.inverse[k][i])
                    .sum()
            })
            .collect()
    }

    /// Reduced cost of column `j`: its cost minus the price-out through the basis.
    fn reduced_cost(&self, j: usize, costs: &[f64], prices: &[f64]) -> f64 {
        let priced_out: f64 = (0..self.nr_rows()).map(|i| prices[i] * self.a[i][j]).sum();
        costs[j] - priced_out
    }

    /// The nonbasic column with the most positive reduced cost, smallest index on ties.
    ///
    /// Mirrors `Tableau::select_entering_column`: a tableau stores the negated reduced cost in
    /// its objective row, so "most negative objective coefficient" and "most positive reduced
    /// cost" select the same column.
    fn select_entering(&self, costs: &[f64], prices: &[f64]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for j in (0..self.nr_columns()).filter(|&j| !self.basis.contains(&j)) {
            let reduced = self.reduced_cost(j, costs, prices);
            if reduced <= COST_TOLERANCE {
                continue;
            }
            match best {
                Some((_, existing)) if reduced <= existing => {}
                _ => best = Some((j, reduced)),
            }
        }

        best.map(|(j, _)| j)
    }

    /// The pivot column in the current basis: `B^-1 * A_j`.
    fn pivot_column(&self, j: usize) -> Vec<f64> {
        (0..self.nr_rows())
            .map(|i| {
                (0..self.nr_rows())
                    .map(|k| self.inverse[i][k] * self.a[k][j])
                    .sum()
            })
            .collect()
    }

    /// The identical ratio test as the full tableau: smallest ratio, smallest row on ties.
    fn select_leaving(&self, column: &[f64]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, &coefficient) in column.iter().enumerate() {
            if coefficient <= PIVOT_TOLERANCE {
                continue;
            }
            let ratio = self.basic_values[i] / coefficient;
            match best {
                Some((_, existing)) if ratio >= existing => {}
                _ => best = Some((i, ratio)),
            }
        }

        best.map(|(i, _)| i)
    }

    /// Ratio test detail for the iteration log, with 1-based tableau row indices.
    fn ratio_candidates(&self, column: &[f64]) -> Vec<RatioCandidate> {
        column
            .iter()
            .enumerate()
            .filter_map(|(i, &coefficient)| {
                if coefficient <= PIVOT_TOLERANCE {
                    return None;
                }
                Some(RatioCandidate {
                    row: i + 1,
                    basic: self.names[self.basis[i]].clone(),
                    coefficient,
                    ratio: self.basic_values[i] / coefficient,
                })
            })
            .collect()
    }

    /// Bring `entering` into the basis at `row`, by the row operations of a tableau pivot
    /// applied to the basis inverse and the basic values.
    fn update(&mut self, row: usize, entering: usize, column: &[f64]) -> (String, String) {
        let leaving = self.names[self.basis[row]].clone();
        let pivot_value = column[row];

        for value in &mut self.inverse[row] {
            *value /= pivot_value;
        }
        self.basic_values[row] /= pivot_value;

        for i in 0..self.nr_rows() {
            if i == row {
                continue;
            }
            let factor = column[i];
            if factor == 0_f64 {
                continue;
            }
            for k in 0..self.nr_rows() {
                let subtracted = factor * self.inverse[row][k];
                self.inverse[i][k] -= subtracted;
            }
            let subtracted = factor * self.basic_values[row];
            self.basic_values[i] -= subtracted;
        }

        self.basis[row] = entering;
        self.iteration += 1;

        (self.names[entering].clone(), leaving)
    }

    /// Objective value of the current basis, maximization convention.
    fn objective_value(&self, costs: &[f64]) -> f64 {
        self.basis
            .iter()
            .zip(&self.basic_values)
            .map(|(&basic, &value)| costs[basic] * value)
            .sum()
    }

    /// Materialize the full tableau of the current basis, for the audit trail.
    fn snapshot(&self, costs: &[f64]) -> Tableau {
        let prices = self.prices(costs);
        let n = self.nr_columns();
        let mut rows = Vec::with_capacity(self.nr_rows() + 1);

        let mut objective_row: Vec<f64> = (0..n)
            .map(|j| -self.reduced_cost(j, costs, &prices))
            .collect();
        objective_row.push(self.objective_value(costs));
        rows.push(objective_row);

        for i in 0..self.nr_rows() {
            let mut row: Vec<f64> = (0..n)
                .map(|j| {
                    (0..self.nr_rows())
                        .map(|k| self.inverse[i][k] * self.a[k][j])
                        .sum()
                })
                .collect();
            row.push(self.basic_values[i]);
            rows.push(row);
        }

        let mut names = self.names.clone();
        names.push("rhs".to_string());
        let mut tableau = Tableau::new(rows, names, self.basis.clone());
        tableau.set_iteration(self.iteration);
        tableau
    }

    /// Drop the trailing artificial columns once phase one is done.
    fn drop_trailing_columns(&mut self, nr: usize) {
        let keep = self.nr_columns() - nr;
        debug_assert!(self.basis.iter().all(|&j| j < keep));

        for row in &mut self.a {
            row.truncate(keep);
        }
        self.names.truncate(keep);
    }

    /// Remove a linearly dependent constraint row and rebuild the basis inverse.
    fn remove_row(&mut self, row: usize) -> Result<(), SolveError> {
        self.a.remove(row);
        self.b.remove(row);
        self.basis.remove(row);
        self.basic_values.remove(row);

        let m = self.nr_rows();
        let basis_matrix: Vec<Vec<f64>> = (0..m)
            .map(|i| self.basis.iter().map(|&j| self.a[i][j]).collect())
            .collect();
        self.inverse = invert(basis_matrix).ok_or_else(|| {
            SolveError::NumericalInstability(
                "basis became singular after removing a redundant row".to_string(),
            )
        })?;
        self.basic_values = (0..m)
            .map(|i| (0..m).map(|k| self.inverse[i][k] * self.b[k]).sum())
            .collect();

        Ok(())
    }
}

/// Invert a square matrix by Gauss-Jordan elimination.
fn invert(mut matrix: Vec<Vec<f64>>) -> Option<Vec<Vec<f64>>> {
    let m = matrix.len();
    let mut inverse: Vec<Vec<f64>> = (0..m)
        .map(|i| {
            let mut row = vec![0_f64; m];
            row[i] = 1_f64;
            row
        })
        .collect();

    for column in 0..m {
        let pivot_row = (column..m)
            .max_by(|&a, &b| {
                matrix[a][column]
                    .abs()
                    .total_cmp(&matrix[b][column].abs())
            })
            .filter(|&row| matrix[row][column].abs() > PIVOT_TOLERANCE)?;
        matrix.swap(column, pivot_row);
        inverse.swap(column, pivot_row);

        let pivot_value = matrix[column][column];
        for value in &mut matrix[column] {
            *value /= pivot_value;
        }
        for value in &mut inverse[column] {
            *value /= pivot_value;
        }
        for row in 0..m {
            if row == column {
                continue;
            }
            let factor = matrix[row][column];
            if factor == 0_f64 {
                continue;
            }
            for k in 0..m {
                let subtracted = factor * matrix[column][k];
                matrix[row][k] -= subtracted;
                let subtracted = factor * inverse[column][k];
                inverse[row][k] -= subtracted;
            }
        }
    }

    Some(inverse)
}

impl RevisedSimplexSolver {
    /// Create a new instance with the given options.
    #[must_use]
    pub fn new(options: SolveOptions) -> Self {
        Self { options }
    }

    fn pivot_loop(
        &self,
        state: &mut BasisState,
        costs: &[f64],
        phase: Phase,
        sign: f64,
        started: Instant,
        iterations: &mut Vec<SimplexIteration>,
        warnings: &mut Vec<String>,
    ) -> PhaseOutcome {
        loop {
            if iterations.len() >= self.options.max_iterations {
                return PhaseOutcome::IterationLimit;
            }
            let prices = state.prices(costs);
            let Some(entering) = state.select_entering(costs, &prices) else {
                return PhaseOutcome::Optimal;
            };
            let column = state.pivot_column(entering);
            let candidates = state.ratio_candidates(&column);
            let Some(row) = state.select_leaving(&column) else {
                return PhaseOutcome::Unbounded;
            };
            if state.basic_values[row].abs() <= PIVOT_TOLERANCE {
                warnings.push(format!(
                    "degenerate pivot at iteration {}: no objective progress",
                    state.iteration + 1,
                ));
            }
            let (entering_name, leaving_name) = state.update(row, entering, &column);
            iterations.push(SimplexIteration {
                iteration: state.iteration,
                phase,
                entering: entering_name,
                leaving: leaving_name,
                ratio_candidates: candidates,
                chosen_row: row + 1,
                objective_value: sign * state.objective_value(costs),
                tableau: state.snapshot(costs),
                elapsed: started.elapsed(),
            });
        }
    }

    /// Exchange basic artificials against structural columns and strip the artificial part.
    fn remove_artificials(
        &self,
        state: &mut BasisState,
        canonical: &CanonicalForm,
        warnings: &mut Vec<String>,
    ) -> Result<(), SolveError> {
        for &artificial in canonical.artificial_columns() {
            let Some(row) = state.basis.iter().position(|&b| b == artificial) else {
                continue;
            };
            let replacement = (0..state.nr_columns()).find(|&j| {
                !canonical.artificial_columns().contains(&j) && !state.basis.contains(&j) && {
                    let column = state.pivot_column(j);
                    column[row].abs() > PIVOT_TOLERANCE
                }
            });
            match replacement {
                Some(j) => {
                    let column = state.pivot_column(j);
                    state.update(row, j, &column);
                }
                None => {
                    warnings.push(format!(
                        "constraint row {} is redundant and was dropped",
                        row + 1,
                    ));
                    state.remove_row(row)?;
                }
            }
        }
        state.drop_trailing_columns(canonical.artificial_columns().len());

        Ok(())
    }

    fn limited_result(
        &self,
        model: &Model,
        canonical: &CanonicalForm,
        state: &BasisState,
        costs: &[f64],
        initial_tableau: Tableau,
        iterations: Vec<SimplexIteration>,
        mut warnings: Vec<String>,
    ) -> SolverResult {
        warnings.push(format!(
            "stopped after {} iterations without proving optimality",
            iterations.len(),
        ));
        let final_tableau = state.snapshot(costs);
        // During phase one `costs` are the artificial prices; report the extracted point's
        // true objective, not the artificial sum.
        let extracted = final_tableau.extract_solution();
        let objective_value = canonical
            .costs()
            .iter()
            .zip(&extracted)
            .map(|(cost, (_, value))| cost * value)
            .sum();
        let solution = canonical.restore_solution(model, &extracted, objective_value);
        let mut result = SolverResult::of_status(SolveStatus::MaxIterationsReached);
        result.solution = Some(solution);
        result.iterations = iterations;
        result.initial_tableau = Some(initial_tableau);
        result.final_tableau = Some(final_tableau);
        result.warnings = warnings;
        result
    }
}

impl Solver for RevisedSimplexSolver {
    fn solve(&self, model: &Model) -> Result<SolverResult, SolveError> {
        let canonical = CanonicalFormBuilder::new(model).build()?;
        let mut state = BasisState::new(&canonical);
        let initial_tableau = canonical.tableau().clone();
        let started = Instant::now();
        let sign: f64 = canonical.objective().factor();
        let mut iterations = Vec::new();
        let mut warnings = Vec::new();

        if !canonical.artificial_columns().is_empty() {
            let phase_one_costs = canonical.phase_one_costs();
            let outcome = self.pivot_loop(
                &mut state,
                &phase_one_costs,
                Phase::One,
                sign,
                started,
                &mut iterations,
                &mut warnings,
            );
            match outcome {
                PhaseOutcome::Optimal => {
                    let artificial_sum = -state.objective_value(&phase_one_costs);
                    if artificial_sum > PHASE_ONE_TOLERANCE {
                        debug!(
                            "phase one ended with artificial sum {:e}: infeasible",
                            artificial_sum,
                        );
                        let mut final_tableau = state.snapshot(&phase_one_costs);
                        final_tableau.set_status(TableauStatus::Infeasible);
                        let mut result = SolverResult::of_status(SolveStatus::Infeasible);
                        result.iterations = iterations;
                        result.initial_tableau = Some(initial_tableau);
                        result.final_tableau = Some(final_tableau);
                        result.warnings = warnings;
                        return Ok(result);
                    }
                    self.remove_artificials(&mut state, &canonical, &mut warnings)?;
                }
                PhaseOutcome::Unbounded => {
                    return Err(SolveError::NumericalInstability(
                        "the phase one objective is bounded but no blocking row was found"
                            .to_string(),
                    ));
                }
                PhaseOutcome::IterationLimit => {
                    return Ok(self.limited_result(
                        model,
                        &canonical,
                        &state,
                        &phase_one_costs,
                        initial_tableau,
                        iterations,
                        warnings,
                    ));
                }
            }
        }

        let costs = &canonical.costs()[..state.nr_columns()];
        let outcome = self.pivot_loop(
            &mut state,
            costs,
            Phase::Two,
            sign,
            started,
            &mut iterations,
            &mut warnings,
        );
        match outcome {
            PhaseOutcome::Optimal => {
                let mut final_tableau = state.snapshot(costs);
                final_tableau.set_status(TableauStatus::Optimal);
                let solution = canonical.restore_solution(
                    model,
                    &final_tableau.extract_solution(),
                    final_tableau.objective_value(),
                );
                debug!(
                    "optimal after {} iterations, objective {}",
                    iterations.len(),
                    solution.objective_value(),
                );
                let mut result = SolverResult::of_status(SolveStatus::Optimal);
                result.solution = Some(solution);
                result.iterations = iterations;
                result.initial_tableau = Some(initial_tableau);
                result.final_tableau = Some(final_tableau);
                result.warnings = warnings;
                Ok(result)
            }
            PhaseOutcome::Unbounded => {
                let mut final_tableau = state.snapshot(costs);
                final_tableau.set_status(TableauStatus::Unbounded);
                let mut result = SolverResult::of_status(SolveStatus::Unbounded);
                result.iterations = iterations;
                result.initial_tableau = Some(initial_tableau);
                result.final_tableau = Some(final_tableau);
                result.warnings = warnings;
                Ok(result)
            }
            PhaseOutcome::IterationLimit => Ok(self.limited_result(
                model,
                &canonical,
                &state,
                costs,
                initial_tableau,
                iterations,
                warnings,
            )),
        }
    }
}
