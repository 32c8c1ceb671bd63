use crate::core::model::SolverSpec;

pub const DEFAULT_TOLERANCE: f64 = 1e-8;
pub const DEFAULT_MAX_ITERATIONS: usize = 50;

/// Termination settings for the Newton iteration.
///
/// Convergence is declared when the residual infinity norm drops below
/// `tolerance`; exceeding `max_iterations` without converging is an error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvergenceCriteria {
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for ConvergenceCriteria {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl ConvergenceCriteria {
    /// Engine defaults overridden by whatever the model file specifies.
    pub fn from_spec(spec: &SolverSpec) -> Self {
        let defaults = Self::default();
        Self {
            tolerance: spec.tolerance.unwrap_or(defaults.tolerance),
            max_iterations: spec.max_iterations.unwrap_or(defaults.max_iterations),
        }
    }
}
