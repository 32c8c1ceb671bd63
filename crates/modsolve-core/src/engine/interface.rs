//! The abstract model/solver boundary.
//!
//! Clients (the CLI harness, the workflows) program exclusively against the
//! traits in this module. Concrete model types are created through the
//! factory functions and handed out as boxed trait objects, so the calling
//! code never depends on how a model is represented or solved.

use super::error::{EngineError, SolverError};
use super::models::{DaeModel, NlModel};
use std::path::Path;

/// The kinds of static problems the engine can host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaticProblem {
    /// A system of nonlinear algebraic equations.
    Nle,
}

/// The kinds of dynamic problems the engine can host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DynamicProblem {
    /// A semi-explicit differential-algebraic system.
    Dae,
}

/// Diagnostics for a successful solve or step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SolveStats {
    /// Newton iterations spent (summed over stages for multi-stage steps).
    pub iterations: usize,
    /// Residual infinity norm at convergence.
    pub residual_norm: f64,
}

/// The model surface of the interface: initialization, output symbols, and
/// parameter access.
///
/// Output symbols are the named quantities a model exposes as result values;
/// indices index into the model's symbol table and stay valid for the
/// lifetime of the initialized model.
pub trait Model {
    /// Loads and compiles the model definition at `path`.
    fn init_from_file(&mut self, path: &Path) -> Result<(), EngineError>;

    /// The model's name, once initialized.
    fn name(&self) -> Option<&str>;

    /// Indices of the model's output symbols. Empty before initialization.
    fn output_symbol_indices(&self) -> Vec<usize>;

    /// Names of the symbols at `indices`.
    fn output_symbol_names(&self, indices: &[usize]) -> Result<Vec<String>, EngineError>;

    /// Current values of the symbols at `indices`.
    fn output_symbol_values(&self, indices: &[usize]) -> Result<Vec<f64>, EngineError>;

    /// Index of the named parameter, or `None` if no parameter has that name.
    fn parameter_index(&self, name: &str) -> Option<usize>;

    /// Current values of the parameters at `indices`.
    fn parameter_values(&self, indices: &[usize]) -> Result<Vec<f64>, EngineError>;

    /// Overwrites the parameters at `indices` with `values`.
    fn set_parameter_values(&mut self, indices: &[usize], values: &[f64])
    -> Result<(), EngineError>;
}

/// The solver surface of a static model.
pub trait StaticSolver {
    /// Solves the model's equations for its unknowns at the current
    /// parameter values.
    fn solve(&mut self) -> Result<SolveStats, SolverError>;
}

/// The solver surface of a dynamic model.
pub trait DynamicSolver {
    /// Restores the initial conditions, re-solves the algebraic subsystem for
    /// consistency, and positions the solver at `t0`. Parameter values are
    /// preserved.
    fn reset(&mut self, t0: f64) -> Result<(), SolverError>;

    /// Advances the simulation by one step of the current step size.
    fn step(&mut self) -> Result<SolveStats, SolverError>;

    /// The current step size, or 0.0 when the model file specified none.
    fn step_size(&self) -> f64;

    /// Sets the step size for subsequent steps.
    fn set_step_size(&mut self, dt: f64) -> Result<(), SolverError>;

    /// The solver's current simulation time.
    fn time(&self) -> f64;
}

/// A static model together with its solver.
pub trait RealStaticModel: Model + StaticSolver {
    /// The model's solver interface, or `None` before initialization.
    fn solver_interface(&mut self) -> Option<&mut dyn StaticSolver>;
}

/// A dynamic model together with its solver.
pub trait RealDynamicModel: Model + DynamicSolver {
    /// The model's solver interface, or `None` before initialization.
    fn solver_interface(&mut self) -> Option<&mut dyn DynamicSolver>;
}

/// Creates an empty static model for the given problem kind; initialize it
/// with [`Model::init_from_file`].
pub fn create_real_static_model(problem: StaticProblem) -> Box<dyn RealStaticModel> {
    match problem {
        StaticProblem::Nle => Box::new(NlModel::new()),
    }
}

/// Creates an empty dynamic model for the given problem kind; initialize it
/// with [`Model::init_from_file`].
pub fn create_real_dynamic_model(problem: DynamicProblem) -> Box<dyn RealDynamicModel> {
    match problem {
        DynamicProblem::Dae => Box::new(DaeModel::new()),
    }
}
