use super::equations::Equation;
use super::symbols::{SymbolKind, SymbolTable};
use crate::core::expr::Expr;
use thiserror::Error;

/// The kind of problem a model poses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    /// Static model: a system of nonlinear algebraic equations.
    Nle,
    /// Dynamic model: a semi-explicit differential-algebraic system.
    Dae,
}

impl ModelKind {
    pub fn label(&self) -> &'static str {
        match self {
            ModelKind::Nle => "static (NLE)",
            ModelKind::Dae => "dynamic (DAE)",
        }
    }
}

/// One-step integration schemes for dynamic models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntegrationMethod {
    /// Implicit first-order; robust default for stiff systems.
    #[default]
    BackwardEuler,
    /// Implicit second-order.
    Trapezoidal,
    /// Explicit fourth-order Runge–Kutta with an algebraic re-solve per stage.
    Rk4,
}

impl IntegrationMethod {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "backward-euler" => Some(IntegrationMethod::BackwardEuler),
            "trapezoidal" => Some(IntegrationMethod::Trapezoidal),
            "rk4" => Some(IntegrationMethod::Rk4),
            _ => None,
        }
    }
}

/// Solver settings carried by a model file's `[solver]` section.
///
/// All fields are optional; the engine fills in its own defaults. A missing
/// step size is significant: the dynamic solver reports it as 0.0 so clients
/// can detect it and choose their own (the harness warns and uses 0.001).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SolverSpec {
    pub step_size: Option<f64>,
    pub method: Option<IntegrationMethod>,
    pub tolerance: Option<f64>,
    pub max_iterations: Option<usize>,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("model defines no equations")]
    NoEquations,

    #[error("static (NLE) models cannot contain differential equations")]
    DifferentialInStatic,

    #[error("static (NLE) models cannot declare state symbols")]
    StateInStatic,

    #[error("dynamic (DAE) models must declare at least one state")]
    NoStates,

    #[error("state '{0}' has no differential equation")]
    MissingDifferential(String),

    #[error("state '{0}' has more than one differential equation")]
    DuplicateDifferential(String),

    #[error("'der' target '{0}' is not a state symbol")]
    DerTargetNotState(String),

    #[error("{residuals} algebraic equation(s) for {unknowns} unknown(s)")]
    CountMismatch { residuals: usize, unknowns: usize },

    #[error("model defines no output symbols")]
    NoOutputs,

    #[error("non-positive step size {0} in solver section")]
    InvalidStepSize(f64),

    #[error("non-positive tolerance {0} in solver section")]
    InvalidTolerance(f64),
}

/// A validated, compiled model.
///
/// Construction partitions the symbols by kind and the equations by form and
/// checks the structural invariants, so the solvers can assume a square,
/// well-posed system: for NLE models #residuals == #unknowns and no states;
/// for DAE models exactly one differential equation per state and
/// #residuals == #unknowns.
#[derive(Debug, Clone)]
pub struct ModelSystem {
    name: String,
    kind: ModelKind,
    symbols: SymbolTable,
    solver: SolverSpec,
    outputs: Vec<usize>,
    states: Vec<usize>,
    unknowns: Vec<usize>,
    parameters: Vec<usize>,
    /// Differential right-hand sides, aligned with `states`.
    derivatives: Vec<Expr>,
    residuals: Vec<Expr>,
}

impl ModelSystem {
    /// Builds and validates a model from its parts.
    ///
    /// `outputs` is the list of symbol indices exposed as output symbols;
    /// `None` selects every non-parameter symbol in declaration order.
    pub fn new(
        name: String,
        kind: ModelKind,
        symbols: SymbolTable,
        equations: Vec<Equation>,
        outputs: Option<Vec<usize>>,
        solver: SolverSpec,
    ) -> Result<Self, ModelError> {
        if equations.is_empty() {
            return Err(ModelError::NoEquations);
        }
        if let Some(dt) = solver.step_size
            && dt <= 0.0
        {
            return Err(ModelError::InvalidStepSize(dt));
        }
        if let Some(tol) = solver.tolerance
            && tol <= 0.0
        {
            return Err(ModelError::InvalidTolerance(tol));
        }

        let states = symbols.indices_of_kind(SymbolKind::State);
        let unknowns = symbols.indices_of_kind(SymbolKind::Unknown);
        let parameters = symbols.indices_of_kind(SymbolKind::Parameter);

        let mut derivative_slots: Vec<Option<Expr>> = vec![None; states.len()];
        let mut residuals = Vec::new();

        for equation in equations {
            match equation {
                Equation::Differential { state, rhs } => {
                    if kind == ModelKind::Nle {
                        return Err(ModelError::DifferentialInStatic);
                    }
                    let name_of = |i: usize| {
                        symbols
                            .get(i)
                            .map(|s| s.name.clone())
                            .unwrap_or_else(|| format!("#{}", i))
                    };
                    let Some(slot) = states.iter().position(|&s| s == state) else {
                        return Err(ModelError::DerTargetNotState(name_of(state)));
                    };
                    if derivative_slots[slot].is_some() {
                        return Err(ModelError::DuplicateDifferential(name_of(state)));
                    }
                    derivative_slots[slot] = Some(rhs);
                }
                Equation::Residual(expr) => residuals.push(expr),
            }
        }

        match kind {
            ModelKind::Nle => {
                if !states.is_empty() {
                    return Err(ModelError::StateInStatic);
                }
            }
            ModelKind::Dae => {
                if states.is_empty() {
                    return Err(ModelError::NoStates);
                }
            }
        }

        let mut derivatives = Vec::with_capacity(states.len());
        for (slot, rhs) in derivative_slots.into_iter().enumerate() {
            match rhs {
                Some(expr) => derivatives.push(expr),
                None => {
                    let state = states[slot];
                    let name = symbols
                        .get(state)
                        .map(|s| s.name.clone())
                        .unwrap_or_else(|| format!("#{}", state));
                    return Err(ModelError::MissingDifferential(name));
                }
            }
        }

        if residuals.len() != unknowns.len() {
            return Err(ModelError::CountMismatch {
                residuals: residuals.len(),
                unknowns: unknowns.len(),
            });
        }

        let outputs = match outputs {
            Some(indices) => indices,
            None => symbols
                .iter()
                .filter(|(_, s)| s.kind != SymbolKind::Parameter)
                .map(|(i, _)| i)
                .collect(),
        };
        if outputs.is_empty() {
            return Err(ModelError::NoOutputs);
        }

        Ok(Self {
            name,
            kind,
            symbols,
            solver,
            outputs,
            states,
            unknowns,
            parameters,
            derivatives,
            residuals,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn solver(&self) -> &SolverSpec {
        &self.solver
    }

    pub fn outputs(&self) -> &[usize] {
        &self.outputs
    }

    pub fn state_indices(&self) -> &[usize] {
        &self.states
    }

    pub fn unknown_indices(&self) -> &[usize] {
        &self.unknowns
    }

    pub fn parameter_indices(&self) -> &[usize] {
        &self.parameters
    }

    /// Differential right-hand sides, aligned with [`Self::state_indices`].
    pub fn derivatives(&self) -> &[Expr] {
        &self.derivatives
    }

    pub fn residuals(&self) -> &[Expr] {
        &self.residuals
    }

    /// The start value of every symbol, in declaration order.
    pub fn initial_values(&self) -> Vec<f64> {
        self.symbols.initial_values()
    }
}
