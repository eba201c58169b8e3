//! # Solver options
//!
//! Iteration ceilings and tolerances shared by all solvers. The defaults are sized for the
//! dense, in-memory problems this engine targets; callers tune them per solve.

/// Ceilings and tolerances for a single solve invocation.
///
/// Ceilings are soft limits: hitting one never aborts the solve, it produces a result carrying
/// the best solution found so far and a status flagging it as not proven optimal.
#[derive(Clone, Copy, Debug)]
pub struct SolveOptions {
    /// Maximum number of simplex pivots per tableau run.
    pub max_iterations: usize,
    /// Maximum number of branch and bound nodes processed.
    pub max_nodes: usize,
    /// Maximum number of cutting plane rounds.
    pub max_cut_iterations: usize,
    /// Number of consecutive cutting plane rounds without meaningful objective improvement
    /// after which the cutting plane solver stops.
    pub stagnation_window: usize,
    /// Maximum number of cuts added per cutting plane round.
    pub max_cuts_per_iteration: usize,
    /// A value within this distance of an integer counts as integral.
    pub integrality_tolerance: f64,
    /// Minimum objective improvement per cutting plane round that counts as progress.
    pub improvement_tolerance: f64,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            max_iterations: 1_000,
            max_nodes: 10_000,
            max_cut_iterations: 50,
            stagnation_window: 5,
            max_cuts_per_iteration: 3,
            integrality_tolerance: 1e-6,
            improvement_tolerance: 1e-7,
        }
    }
}

impl SolveOptions {
    /// Whether `value` is integral within the configured tolerance.
    #[must_use]
    pub fn is_integral(&self, value: f64) -> bool {
        (value - value.round()).abs() <= self.integrality_tolerance
    }
}

#[cfg(test)]
mod test {
    use crate::algorithm::options::SolveOptions;

    #[test]
    fn integrality_check() {
        let options = SolveOptions::default();
        assert!(options.is_integral(2_f64));
        assert!(options.is_integral(2_f64 + 1e-7));
        assert!(!options.is_integral(2.5_f64));
    }
}
