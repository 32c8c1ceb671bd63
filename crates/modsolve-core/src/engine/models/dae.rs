use super::LoadedModel;
use crate::core::model::{IntegrationMethod, ModelKind};
use crate::engine::config::ConvergenceCriteria;
use crate::engine::error::{EngineError, SolverError};
use crate::engine::integrator::{self, DaeProblem};
use crate::engine::interface::{DynamicSolver, Model, RealDynamicModel, SolveStats};
use std::path::Path;
use tracing::debug;

/// A dynamic differential-algebraic model.
///
/// Created empty by the factory; `init_from_file` compiles the model and
/// configures the stepper from the file's solver section. The client must
/// `reset` before stepping; `reset` restores the initial conditions and
/// re-solves the algebraic subsystem so the first step starts consistent.
#[derive(Debug, Default)]
pub struct DaeModel {
    loaded: Option<LoadedModel>,
    method: IntegrationMethod,
    criteria: ConvergenceCriteria,
    step_size: Option<f64>,
    t: f64,
    armed: bool,
}

impl DaeModel {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_problem<T>(
        loaded: &mut LoadedModel,
        f: impl FnOnce(&DaeProblem, &mut [f64]) -> T,
    ) -> T {
        let LoadedModel { system, values } = loaded;
        let problem = DaeProblem {
            states: system.state_indices(),
            unknowns: system.unknown_indices(),
            derivatives: system.derivatives(),
            residuals: system.residuals(),
        };
        f(&problem, values)
    }
}

impl Model for DaeModel {
    fn init_from_file(&mut self, path: &Path) -> Result<(), EngineError> {
        let loaded = LoadedModel::load(path, ModelKind::Dae)?;
        let spec = loaded.system.solver();
        self.method = spec.method.unwrap_or_default();
        self.criteria = ConvergenceCriteria::from_spec(spec);
        self.step_size = spec.step_size;
        self.t = 0.0;
        self.armed = false;
        self.loaded = Some(loaded);
        Ok(())
    }

    fn name(&self) -> Option<&str> {
        self.loaded.as_ref().map(|m| m.system.name())
    }

    fn output_symbol_indices(&self) -> Vec<usize> {
        self.loaded
            .as_ref()
            .map(|m| m.system.outputs().to_vec())
            .unwrap_or_default()
    }

    fn output_symbol_names(&self, indices: &[usize]) -> Result<Vec<String>, EngineError> {
        let loaded = self.loaded.as_ref().ok_or(EngineError::NotInitialized)?;
        loaded.symbol_names(indices)
    }

    fn output_symbol_values(&self, indices: &[usize]) -> Result<Vec<f64>, EngineError> {
        let loaded = self.loaded.as_ref().ok_or(EngineError::NotInitialized)?;
        loaded.symbol_values(indices)
    }

    fn parameter_index(&self, name: &str) -> Option<usize> {
        self.loaded.as_ref().and_then(|m| m.parameter_index(name))
    }

    fn parameter_values(&self, indices: &[usize]) -> Result<Vec<f64>, EngineError> {
        let loaded = self.loaded.as_ref().ok_or(EngineError::NotInitialized)?;
        loaded.parameter_values(indices)
    }

    fn set_parameter_values(
        &mut self,
        indices: &[usize],
        values: &[f64],
    ) -> Result<(), EngineError> {
        let loaded = self.loaded.as_mut().ok_or(EngineError::NotInitialized)?;
        loaded.set_parameter_values(indices, values)
    }
}

impl DynamicSolver for DaeModel {
    fn reset(&mut self, t0: f64) -> Result<(), SolverError> {
        let criteria = self.criteria;
        let loaded = self.loaded.as_mut().ok_or(SolverError::NotInitialized)?;
        loaded.restore_initial_state();
        Self::with_problem(loaded, |problem, values| {
            integrator::solve_algebraic(problem, values, t0, &criteria)
        })?;
        self.t = t0;
        self.armed = true;
        debug!("Dynamic solver reset to t = {}.", t0);
        Ok(())
    }

    fn step(&mut self) -> Result<SolveStats, SolverError> {
        let h = self.step_size.unwrap_or(0.0);
        if h <= 0.0 {
            return Err(SolverError::InvalidStepSize(h));
        }
        if !self.armed {
            return Err(SolverError::NotReset);
        }
        let (t, method, criteria) = (self.t, self.method, self.criteria);
        let loaded = self.loaded.as_mut().ok_or(SolverError::NotInitialized)?;
        let stats = Self::with_problem(loaded, |problem, values| {
            integrator::step(problem, values, t, h, method, &criteria)
        })?;
        self.t = t + h;
        Ok(stats)
    }

    fn step_size(&self) -> f64 {
        self.step_size.unwrap_or(0.0)
    }

    fn set_step_size(&mut self, dt: f64) -> Result<(), SolverError> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(SolverError::InvalidStepSize(dt));
        }
        self.step_size = Some(dt);
        Ok(())
    }

    fn time(&self) -> f64 {
        self.t
    }
}

impl RealDynamicModel for DaeModel {
    fn solver_interface(&mut self) -> Option<&mut dyn DynamicSolver> {
        self.loaded.is_some().then_some(self as &mut dyn DynamicSolver)
    }
}
