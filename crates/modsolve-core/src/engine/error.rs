use crate::core::io::dmodl::DmodlError;
use crate::core::model::ModelKind;
use std::path::PathBuf;
use thiserror::Error;

/// Failures of the numerical solvers behind the solver interface.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("model is not initialized; call init_from_file first")]
    NotInitialized,

    #[error("dynamic solver was not reset before stepping")]
    NotReset,

    #[error("step size must be positive (got {0})")]
    InvalidStepSize(f64),

    #[error("Jacobian is singular; cannot take a Newton step")]
    SingularJacobian,

    #[error("residual evaluation produced a non-finite value at iteration {iteration}")]
    NonFiniteResidual { iteration: usize },

    #[error("failed to converge after {iterations} iterations (residual norm {residual_norm:.3e})")]
    Convergence {
        iterations: usize,
        residual_norm: f64,
    },
}

/// Failures of the model surface of the interface.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to read model file '{path}': {source}", path = path.display())]
    ModelFile {
        path: PathBuf,
        #[source]
        source: DmodlError,
    },

    #[error("model '{name}' is a {found} model, but a {expected} model was requested",
        found = found.label(), expected = expected.label())]
    ProblemMismatch {
        name: String,
        expected: ModelKind,
        found: ModelKind,
    },

    #[error("model is not initialized; call init_from_file first")]
    NotInitialized,

    #[error("model defines no output symbols")]
    NoOutputs,

    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),

    #[error("symbol index {0} is out of range")]
    SymbolOutOfRange(usize),

    #[error("symbol index {0} is not a parameter")]
    NotAParameter(usize),

    #[error("{indices} indices given for {values} values")]
    LengthMismatch { indices: usize, values: usize },

    #[error(transparent)]
    Solver(#[from] SolverError),
}
