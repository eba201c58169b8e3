//! # The dense tableau and its pivot engine
//!
//! A `Tableau` is the matrix representation of a linear program in a basis: row zero is the
//! objective row, rows `1..m` are constraint rows and the last column is the right-hand side.
//! The pivot operation is the only mutator; everything else reads. Both simplex solvers and,
//! through them, the integer solvers drive their iterations through this type.
use std::error::Error;
use std::fmt;

use log::trace;

/// Smallest pivot element magnitude considered numerically safe.
pub const PIVOT_TOLERANCE: f64 = 1e-10;
/// Reduced costs above this (negated) threshold are treated as nonnegative, i.e. optimal.
pub const COST_TOLERANCE: f64 = 1e-9;

/// State of a tableau, advanced by the solver driving it.
///
/// The variants are mutually exclusive by construction; there is exactly one status at any
/// moment.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TableauStatus {
    /// More pivots may improve the objective.
    Continuing,
    /// All reduced costs are nonnegative.
    Optimal,
    /// No feasible point exists.
    Infeasible,
    /// The objective improves without limit.
    Unbounded,
    /// The solve was aborted by a structural failure.
    Error,
}

/// The record of one performed pivot.
///
/// Appended to the iteration log by the solvers; never mutated after creation.
#[derive(Clone, Debug, PartialEq)]
pub struct PivotRecord {
    /// Constraint row pivoted on.
    pub row: usize,
    /// Column brought into the basis.
    pub column: usize,
    /// Value of the pivot element before normalization.
    pub pivot_element: f64,
    /// Name of the entering variable.
    pub entering: String,
    /// Name of the leaving variable.
    pub leaving: String,
    /// Iteration counter after this pivot.
    pub iteration: usize,
}

/// One row considered by the ratio test.
#[derive(Clone, Debug, PartialEq)]
pub struct RatioCandidate {
    /// Constraint row index.
    pub row: usize,
    /// Name of the variable currently basic in that row.
    pub basic: String,
    /// Coefficient of the entering column in that row.
    pub coefficient: f64,
    /// Right-hand side divided by the coefficient.
    pub ratio: f64,
}

/// A pivot request that cannot be performed.
#[derive(Debug, PartialEq)]
pub enum PivotError {
    /// The row index does not name a constraint row.
    RowOutOfRange {
        /// Requested row.
        row: usize,
        /// Number of rows in the tableau, objective row included.
        nr_rows: usize,
    },
    /// The column index does not name a structural column.
    ColumnOutOfRange {
        /// Requested column.
        column: usize,
        /// Number of columns in the tableau, right-hand side included.
        nr_columns: usize,
    },
    /// The pivot element is too close to zero to divide by.
    NearZeroPivot {
        /// Requested row.
        row: usize,
        /// Requested column.
        column: usize,
        /// The offending element value.
        element: f64,
    },
}

impl fmt::Display for PivotError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PivotError::RowOutOfRange { row, nr_rows } => write!(
                f,
                "pivot row {} is not a constraint row (tableau has {} rows)",
                row, nr_rows,
            ),
            PivotError::ColumnOutOfRange { column, nr_columns } => write!(
                f,
                "pivot column {} is not a structural column (tableau has {} columns)",
                column, nr_columns,
            ),
            PivotError::NearZeroPivot {
                row,
                column,
                element,
            } => write!(
                f,
                "pivot element {:e} at ({}, {}) is below the {:e} tolerance",
                element, row, column, PIVOT_TOLERANCE,
            ),
        }
    }
}

impl Error for PivotError {}

/// A linear program in a basis, stored densely.
///
/// Invariants maintained by the pivot operation:
///
/// * `rows[0]` holds the reduced costs of the current basis (maximization convention), its last
///   element the current objective value;
/// * `basis[i]` is the column basic in constraint row `i + 1` and that column is a unit column;
/// * constraint right-hand sides stay nonnegative as long as pivots follow the ratio test.
#[derive(Clone, Debug, PartialEq)]
pub struct Tableau {
    /// Row zero is the objective row, the last column the right-hand side.
    rows: Vec<Vec<f64>>,
    /// One name per column; the last column is named "rhs".
    column_names: Vec<String>,
    /// Column basic in row `i + 1`.
    basis: Vec<usize>,
    /// Number of pivots performed on this tableau.
    iteration: usize,
    status: TableauStatus,
}

impl Tableau {
    /// Create a new tableau from raw parts.
    ///
    /// Used by the canonical form builder; the dimensions must already be consistent.
    #[must_use]
    pub(crate) fn new(rows: Vec<Vec<f64>>, column_names: Vec<String>, basis: Vec<usize>) -> Self {
        debug_assert!(rows.len() >= 2);
        debug_assert!(rows.iter().all(|row| row.len() == column_names.len()));
        debug_assert_eq!(basis.len(), rows.len() - 1);
        debug_assert!(basis.iter().all(|&j| j < column_names.len() - 1));

        Self {
            rows,
            column_names,
            basis,
            iteration: 0,
            status: TableauStatus::Continuing,
        }
    }

    /// Number of rows, objective row included.
    #[must_use]
    pub fn nr_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns, right-hand side included.
    #[must_use]
    pub fn nr_columns(&self) -> usize {
        self.column_names.len()
    }

    /// Element at (`row`, `column`).
    #[must_use]
    pub fn value(&self, row: usize, column: usize) -> f64 {
        self.rows[row][column]
    }

    /// Right-hand side of a row.
    #[must_use]
    pub fn rhs(&self, row: usize) -> f64 {
        self.rows[row][self.nr_columns() - 1]
    }

    /// Objective value of the current basis, in the maximization convention.
    #[must_use]
    pub fn objective_value(&self) -> f64 {
        self.rhs(0)
    }

    /// All column names, ordered; the last one names the right-hand side.
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Name of a column.
    #[must_use]
    pub fn column_name(&self, column: usize) -> &str {
        &self.column_names[column]
    }

    /// Index of the named column, if present.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_names.iter().position(|n| n == name)
    }

    /// Columns basic in rows `1..m`, in row order.
    #[must_use]
    pub fn basis(&self) -> &[usize] {
        &self.basis
    }

    /// Names of the basic variables, in row order.
    #[must_use]
    pub fn basic_variable_names(&self) -> Vec<&str> {
        self.basis
            .iter()
            .map(|&j| self.column_names[j].as_str())
            .collect()
    }

    /// Whether the column is basic in some row.
    #[must_use]
    pub fn is_basic(&self, column: usize) -> bool {
        self.basis.contains(&column)
    }

    /// Number of pivots performed so far.
    #[must_use]
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> TableauStatus {
        self.status
    }

    pub(crate) fn set_status(&mut self, status: TableauStatus) {
        self.status = status;
    }

    /// Align the counter of a reconstructed tableau with the solve that produced it.
    pub(crate) fn set_iteration(&mut self, iteration: usize) {
        self.iteration = iteration;
    }

    /// Perform one pivot: the only mutator of the tableau matrix.
    ///
    /// Normalizes the pivot row, eliminates the pivot column from every other row, replaces the
    /// basic variable at `row` and increments the iteration counter.
    ///
    /// # Arguments
    ///
    /// * `row`: Constraint row, `1 <= row < nr_rows`.
    /// * `column`: Structural column, `column < nr_columns - 1`.
    ///
    /// # Errors
    ///
    /// A `PivotError` when the indices are out of range or the pivot element's magnitude is
    /// below `PIVOT_TOLERANCE`; the tableau is left untouched in that case.
    pub fn pivot(&mut self, row: usize, column: usize) -> Result<PivotRecord, PivotError> {
        if row < 1 || row >= self.nr_rows() {
            return Err(PivotError::RowOutOfRange {
                row,
                nr_rows: self.nr_rows(),
            });
        }
        if column >= self.nr_columns() - 1 {
            return Err(PivotError::ColumnOutOfRange {
                column,
                nr_columns: self.nr_columns(),
            });
        }
        let pivot_element = self.rows[row][column];
        if pivot_element.abs() <= PIVOT_TOLERANCE {
            return Err(PivotError::NearZeroPivot {
                row,
                column,
                element: pivot_element,
            });
        }

        for value in &mut self.rows[row] {
            *value /= pivot_element;
        }
        // Exactly a unit column afterwards, elimination below relies on it
        self.rows[row][column] = 1_f64;

        for other in 0..self.nr_rows() {
            if other == row {
                continue;
            }
            let factor = self.rows[other][column];
            if factor == 0_f64 {
                continue;
            }
            for j in 0..self.nr_columns() {
                let subtracted = factor * self.rows[row][j];
                self.rows[other][j] -= subtracted;
            }
            self.rows[other][column] = 0_f64;
        }

        let entering = self.column_names[column].clone();
        let leaving = self.column_names[self.basis[row - 1]].clone();
        self.basis[row - 1] = column;
        self.iteration += 1;

        trace!(
            "pivot {}: {} enters, {} leaves at row {}",
            self.iteration, entering, leaving, row,
        );

        Ok(PivotRecord {
            row,
            column,
            pivot_element,
            entering,
            leaving,
            iteration: self.iteration,
        })
    }

    /// Column selection for the primal simplex method: Dantzig's rule.
    ///
    /// # Return value
    ///
    /// The nonbasic column with the most negative objective row coefficient, or `None` when all
    /// reduced costs are at least `-COST_TOLERANCE`, which makes the current basis optimal.
    /// Among equally negative coefficients the smallest column index wins.
    #[must_use]
    pub fn select_entering_column(&self) -> Option<usize> {
        let mut smallest: Option<(usize, f64)> = None;
        for j in (0..self.nr_columns() - 1).filter(|&j| !self.is_basic(j)) {
            let cost = self.rows[0][j];
            if cost >= -COST_TOLERANCE {
                continue;
            }
            match smallest {
                Some((_, existing)) if cost >= existing => {}
                _ => smallest = Some((j, cost)),
            }
        }

        smallest.map(|(j, _)| j)
    }

    /// Row selection for the primal simplex method: the minimum ratio test.
    ///
    /// Ties are broken by the smallest row index only. No anti-cycling rule is applied, so
    /// degenerate problems can in principle cycle; see the crate documentation.
    ///
    /// # Return value
    ///
    /// The constraint row minimizing `rhs / coefficient` over rows with coefficient above
    /// `PIVOT_TOLERANCE`, or `None` when no row has a positive coefficient, in which case the
    /// problem is unbounded in this direction.
    #[must_use]
    pub fn select_leaving_row(&self, entering_column: usize) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for row in 1..self.nr_rows() {
            let coefficient = self.rows[row][entering_column];
            if coefficient <= PIVOT_TOLERANCE {
                continue;
            }
            let ratio = self.rhs(row) / coefficient;
            match best {
                Some((_, existing)) if ratio >= existing => {}
                _ => best = Some((row, ratio)),
            }
        }

        best.map(|(row, _)| row)
    }

    /// All rows eligible for the ratio test on `entering_column`, for the iteration log.
    #[must_use]
    pub fn ratio_candidates(&self, entering_column: usize) -> Vec<RatioCandidate> {
        (1..self.nr_rows())
            .filter_map(|row| {
                let coefficient = self.rows[row][entering_column];
                if coefficient <= PIVOT_TOLERANCE {
                    return None;
                }
                Some(RatioCandidate {
                    row,
                    basic: self.column_names[self.basis[row - 1]].clone(),
                    coefficient,
                    ratio: self.rhs(row) / coefficient,
                })
            })
            .collect()
    }

    /// The full variable assignment of the current basis.
    ///
    /// Basic variables read their value from the right-hand side column, all other variables
    /// are zero. Values are keyed by canonical column name; undoing canonicalization
    /// substitutions is the canonical form's responsibility.
    #[must_use]
    pub fn extract_solution(&self) -> Vec<(String, f64)> {
        (0..self.nr_columns() - 1)
            .map(|j| {
                let value = self
                    .basis
                    .iter()
                    .position(|&basic| basic == j)
                    .map_or(0_f64, |i| self.rhs(i + 1));
                (self.column_names[j].clone(), value)
            })
            .collect()
    }

    /// Replace the objective row by reduced costs of `costs` under the current basis.
    ///
    /// Sets row zero to `-costs` and eliminates all basic columns from it, which restores the
    /// canonical form for a new objective. Used at the phase switch of the two phase method.
    pub(crate) fn reprice(&mut self, costs: &[f64]) {
        debug_assert_eq!(costs.len(), self.nr_columns() - 1);

        for j in 0..self.nr_columns() - 1 {
            self.rows[0][j] = -costs[j];
        }
        let last = self.nr_columns() - 1;
        self.rows[0][last] = 0_f64;

        for (i, &basic) in self.basis.clone().iter().enumerate() {
            let cost = costs[basic];
            if cost == 0_f64 {
                continue;
            }
            for j in 0..self.nr_columns() {
                let added = cost * self.rows[i + 1][j];
                self.rows[0][j] += added;
            }
        }
    }

    /// Drop the given columns from the tableau.
    ///
    /// Used after phase one to strip artificial columns. None of the removed columns may be
    /// basic.
    pub(crate) fn remove_columns(&mut self, columns: &[usize]) {
        debug_assert!(columns.iter().all(|j| !self.is_basic(*j)));
        debug_assert!(columns.windows(2).all(|w| w[0] < w[1]));

        for row in &mut self.rows {
            for &j in columns.iter().rev() {
                row.remove(j);
            }
        }
        for &j in columns.iter().rev() {
            self.column_names.remove(j);
        }
        for basic in &mut self.basis {
            *basic -= columns.iter().filter(|&&j| j < *basic).count();
        }
    }

    /// Drop a constraint row found to be redundant.
    pub(crate) fn remove_row(&mut self, row: usize) {
        debug_assert!(row >= 1 && row < self.nr_rows());

        self.rows.remove(row);
        self.basis.remove(row - 1);
    }
}

#[cfg(test)]
mod test {
    use crate::algorithm::tableau::{PivotError, Tableau, TableauStatus};

    /// max 3x1 + 2x2 s.t. x1 + x2 <= 4, 2x1 + x2 <= 6 in slack basis.
    fn small_tableau() -> Tableau {
        Tableau::new(
            vec![
                vec![-3_f64, -2_f64, 0_f64, 0_f64, 0_f64],
                vec![1_f64, 1_f64, 1_f64, 0_f64, 4_f64],
                vec![2_f64, 1_f64, 0_f64, 1_f64, 6_f64],
            ],
            vec![
                "x1".to_string(),
                "x2".to_string(),
                "slack1".to_string(),
                "slack2".to_string(),
                "rhs".to_string(),
            ],
            vec![2, 3],
        )
    }

    #[test]
    fn entering_column_is_most_negative() {
        let tableau = small_tableau();
        assert_eq!(tableau.select_entering_column(), Some(0));
    }

    #[test]
    fn leaving_row_is_minimum_ratio() {
        let tableau = small_tableau();
        // Ratios 4/1 and 6/2, the second row wins.
        assert_eq!(tableau.select_leaving_row(0), Some(2));
    }

    #[test]
    fn ratio_tie_broken_by_smallest_row() {
        let tableau = Tableau::new(
            vec![
                vec![-1_f64, 0_f64, 0_f64, 0_f64],
                vec![1_f64, 1_f64, 0_f64, 2_f64],
                vec![1_f64, 0_f64, 1_f64, 2_f64],
            ],
            vec![
                "x1".to_string(),
                "slack1".to_string(),
                "slack2".to_string(),
                "rhs".to_string(),
            ],
            vec![1, 2],
        );

        assert_eq!(tableau.select_leaving_row(0), Some(1));
    }

    #[test]
    fn pivot_updates_basis_and_matrix() {
        let mut tableau = small_tableau();
        let record = tableau.pivot(2, 0).unwrap();

        assert_eq!(record.entering, "x1");
        assert_eq!(record.leaving, "slack2");
        assert_eq!(record.pivot_element, 2_f64);
        assert_eq!(tableau.iteration(), 1);
        assert_eq!(tableau.basis(), &[2, 0]);
        // Pivot column is a unit column.
        assert_eq!(tableau.value(0, 0), 0_f64);
        assert_eq!(tableau.value(1, 0), 0_f64);
        assert_eq!(tableau.value(2, 0), 1_f64);
        // Objective moved by 3 * 3.
        assert_eq!(tableau.objective_value(), 9_f64);
    }

    #[test]
    fn pivot_rejects_bad_requests() {
        let mut tableau = small_tableau();
        assert_eq!(
            tableau.pivot(0, 0),
            Err(PivotError::RowOutOfRange { row: 0, nr_rows: 3 }),
        );
        assert_eq!(
            tableau.pivot(1, 4),
            Err(PivotError::ColumnOutOfRange {
                column: 4,
                nr_columns: 5,
            }),
        );

        // A zero element cannot be pivoted on.
        let result = tableau.pivot(1, 3);
        assert!(matches!(result, Err(PivotError::NearZeroPivot { .. })));
        // Failed pivots leave the tableau untouched.
        assert_eq!(tableau.iteration(), 0);
        assert_eq!(tableau, small_tableau());
    }

    #[test]
    fn solution_extraction() {
        let mut tableau = small_tableau();
        tableau.pivot(2, 0).unwrap();
        let solution = tableau.extract_solution();

        assert_eq!(
            solution,
            vec![
                ("x1".to_string(), 3_f64),
                ("x2".to_string(), 0_f64),
                ("slack1".to_string(), 1_f64),
                ("slack2".to_string(), 0_f64),
            ],
        );
    }

    #[test]
    fn reprice_restores_reduced_costs() {
        let mut tableau = small_tableau();
        tableau.pivot(2, 0).unwrap();
        tableau.reprice(&[3_f64, 2_f64, 0_f64, 0_f64]);

        // Basic column x1 must have reduced cost zero again.
        assert_eq!(tableau.value(0, 0), 0_f64);
        assert_eq!(tableau.objective_value(), 9_f64);
        assert_eq!(tableau.status(), TableauStatus::Continuing);
    }

    #[test]
    fn column_removal_remaps_basis() {
        let mut tableau = small_tableau();
        tableau.pivot(2, 0).unwrap();
        // x2 and slack2 are nonbasic now.
        tableau.remove_columns(&[1, 3]);

        assert_eq!(tableau.nr_columns(), 3);
        assert_eq!(tableau.basic_variable_names(), vec!["slack1", "x1"]);
    }
}
