//! # The primal simplex solver
//!
//! Two phase primal simplex on the full dense tableau. Phase one maximizes the negated sum of
//! artificial variables to find a basic feasible solution; phase two optimizes the true
//! objective from there. Every pivot is recorded for replay.
use std::time::Instant;

use log::debug;

use crate::algorithm::canonical::{CanonicalForm, CanonicalFormBuilder};
use crate::algorithm::options::SolveOptions;
use crate::algorithm::simplex::{Phase, PhaseOutcome, SimplexIteration, PHASE_ONE_TOLERANCE};
use crate::algorithm::tableau::{Tableau, TableauStatus, PIVOT_TOLERANCE};
use crate::algorithm::{SolveError, SolveStatus, Solver, SolverResult};
use crate::data::model::Model;

/// Two phase primal simplex over the full tableau.
pub struct PrimalSimplexSolver {
    options: SolveOptions,
}

impl PrimalSimplexSolver {
    /// Create a new instance with the given options.
    #[must_use]
    pub fn new(options: SolveOptions) -> Self {
        Self { options }
    }

    /// Solve a problem whose canonical form was already built.
    ///
    /// The integer solvers use this entry point to keep the canonical bookkeeping of each
    /// relaxation they solve.
    pub(crate) fn solve_canonical(
        &self,
        model: &Model,
        canonical: &CanonicalForm,
    ) -> Result<SolverResult, SolveError> {
        let mut tableau = canonical.tableau().clone();
        let initial_tableau = tableau.clone();
        let started = Instant::now();
        let mut iterations = Vec::new();
        let mut warnings = Vec::new();

        if !canonical.artificial_columns().is_empty() {
            tableau.reprice(&canonical.phase_one_costs());
            let outcome = self.pivot_loop(
                &mut tableau,
                Phase::One,
                canonical,
                started,
                &mut iterations,
                &mut warnings,
            )?;
            match outcome {
                PhaseOutcome::Optimal => {
                    let artificial_sum = -tableau.objective_value();
                    if artificial_sum > PHASE_ONE_TOLERANCE {
                        debug!(
                            "phase one ended with artificial sum {:e}: infeasible",
                            artificial_sum,
                        );
                        tableau.set_status(TableauStatus::Infeasible);
                        let mut result = SolverResult::of_status(SolveStatus::Infeasible);
                        result.iterations = iterations;
                        result.initial_tableau = Some(initial_tableau);
                        result.final_tableau = Some(tableau);
                        result.warnings = warnings;
                        return Ok(result);
                    }
                    self.remove_artificials(&mut tableau, canonical, &mut warnings)?;
                    tableau.reprice(&canonical.costs()[..tableau.nr_columns() - 1]);
                }
                PhaseOutcome::Unbounded => {
                    return Err(SolveError::NumericalInstability(
                        "the phase one objective is bounded but no blocking row was found"
                            .to_string(),
                    ));
                }
                PhaseOutcome::IterationLimit => {
                    return Ok(self.iteration_limit_result(
                        model,
                        canonical,
                        tableau,
                        initial_tableau,
                        iterations,
                        warnings,
                    ));
                }
            }
        }

        let outcome = self.pivot_loop(
            &mut tableau,
            Phase::Two,
            canonical,
            started,
            &mut iterations,
            &mut warnings,
        )?;
        match outcome {
            PhaseOutcome::Optimal => {
                tableau.set_status(TableauStatus::Optimal);
                let solution = canonical.restore_solution(
                    model,
                    &tableau.extract_solution(),
                    tableau.objective_value(),
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
                result.final_tableau = Some(tableau);
                result.warnings = warnings;
                Ok(result)
            }
            PhaseOutcome::Unbounded => {
                tableau.set_status(TableauStatus::Unbounded);
                let mut result = SolverResult::of_status(SolveStatus::Unbounded);
                result.iterations = iterations;
                result.initial_tableau = Some(initial_tableau);
                result.final_tableau = Some(tableau);
                result.warnings = warnings;
                Ok(result)
            }
            PhaseOutcome::IterationLimit => Ok(self.iteration_limit_result(
                model,
                canonical,
                tableau,
                initial_tableau,
                iterations,
                warnings,
            )),
        }
    }

    /// Pivot until the current objective is optimal, unbounded or the ceiling is hit.
    fn pivot_loop(
        &self,
        tableau: &mut Tableau,
        phase: Phase,
        canonical: &CanonicalForm,
        started: Instant,
        iterations: &mut Vec<SimplexIteration>,
        warnings: &mut Vec<String>,
    ) -> Result<PhaseOutcome, SolveError> {
        let sign: f64 = canonical.objective().factor();
        loop {
            if iterations.len() >= self.options.max_iterations {
                return Ok(PhaseOutcome::IterationLimit);
            }
            let Some(column) = tableau.select_entering_column() else {
                return Ok(PhaseOutcome::Optimal);
            };
            let candidates = tableau.ratio_candidates(column);
            let Some(row) = tableau.select_leaving_row(column) else {
                return Ok(PhaseOutcome::Unbounded);
            };
            if tableau.rhs(row).abs() <= PIVOT_TOLERANCE {
                warnings.push(format!(
                    "degenerate pivot at iteration {}: no objective progress",
                    tableau.iteration() + 1,
                ));
            }
            let record = tableau.pivot(row, column)?;
            iterations.push(SimplexIteration {
                iteration: record.iteration,
                phase,
                entering: record.entering,
                leaving: record.leaving,
                ratio_candidates: candidates,
                chosen_row: row,
                objective_value: sign * tableau.objective_value(),
                tableau: tableau.clone(),
                elapsed: started.elapsed(),
            });
        }
    }

    /// Drive leftover artificial variables out of the basis and strip their columns.
    ///
    /// An artificial stuck in the basis at zero level is exchanged against any nonbasic,
    /// non-artificial column with a usable element in its row; when no such column exists the
    /// row is linearly dependent on the others and is removed.
    fn remove_artificials(
        &self,
        tableau: &mut Tableau,
        canonical: &CanonicalForm,
        warnings: &mut Vec<String>,
    ) -> Result<(), SolveError> {
        for &artificial in canonical.artificial_columns() {
            let Some(position) = tableau.basis().iter().position(|&b| b == artificial) else {
                continue;
            };
            let row = position + 1;
            let replacement = (0..tableau.nr_columns() - 1).find(|&j| {
                !canonical.artificial_columns().contains(&j)
                    && !tableau.is_basic(j)
                    && tableau.value(row, j).abs() > PIVOT_TOLERANCE
            });
            match replacement {
                Some(column) => {
                    // Zero level basis change: the artificial sits at value zero.
                    tableau.pivot(row, column)?;
                }
                None => {
                    warnings.push(format!(
                        "constraint row {} is redundant and was dropped",
                        row,
                    ));
                    tableau.remove_row(row);
                }
            }
        }
        tableau.remove_columns(canonical.artificial_columns());

        Ok(())
    }

    fn iteration_limit_result(
        &self,
        model: &Model,
        canonical: &CanonicalForm,
        tableau: Tableau,
        initial_tableau: Tableau,
        iterations: Vec<SimplexIteration>,
        mut warnings: Vec<String>,
    ) -> SolverResult {
        warnings.push(format!(
            "stopped after {} iterations without proving optimality",
            iterations.len(),
        ));
        // The ceiling can be hit while the tableau is still priced to the phase one objective;
        // report the extracted point's true objective, not the artificial sum.
        let extracted = tableau.extract_solution();
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
        result.final_tableau = Some(tableau);
        result.warnings = warnings;
        result
    }
}

impl Solver for PrimalSimplexSolver {
    fn solve(&self, model: &Model) -> Result<SolverResult, SolveError> {
        let canonical = CanonicalFormBuilder::new(model).build()?;
        self.solve_canonical(model, &canonical)
    }
}
