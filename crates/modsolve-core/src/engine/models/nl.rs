use super::LoadedModel;
use crate::core::model::ModelKind;
use crate::engine::config::ConvergenceCriteria;
use crate::engine::error::{EngineError, SolverError};
use crate::engine::interface::{Model, RealStaticModel, SolveStats, StaticSolver};
use crate::engine::newton;
use nalgebra::DVector;
use std::path::Path;
use tracing::debug;

/// A static nonlinear-equation model.
///
/// Created empty by the factory; `init_from_file` compiles the model and
/// arms the solver. Each `solve` runs Newton on the unknowns at the current
/// parameter values, so a client can solve, adjust parameters, and solve
/// again to study the effect.
#[derive(Debug, Default)]
pub struct NlModel {
    loaded: Option<LoadedModel>,
    criteria: ConvergenceCriteria,
}

impl NlModel {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Model for NlModel {
    fn init_from_file(&mut self, path: &Path) -> Result<(), EngineError> {
        let loaded = LoadedModel::load(path, ModelKind::Nle)?;
        self.criteria = ConvergenceCriteria::from_spec(loaded.system.solver());
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

impl StaticSolver for NlModel {
    fn solve(&mut self) -> Result<SolveStats, SolverError> {
        let criteria = self.criteria;
        let loaded = self.loaded.as_mut().ok_or(SolverError::NotInitialized)?;
        let system = &loaded.system;
        let unknowns = system.unknown_indices();
        let residuals = system.residuals();

        let mut scratch = loaded.values.clone();
        let mut x = DVector::from_iterator(unknowns.len(), unknowns.iter().map(|&i| scratch[i]));

        let stats = newton::solve(
            &mut x,
            |x, r| {
                for (k, &i) in unknowns.iter().enumerate() {
                    scratch[i] = x[k];
                }
                for (m, residual) in residuals.iter().enumerate() {
                    r[m] = residual.eval(&scratch, 0.0);
                }
            },
            &criteria,
        )?;

        for (k, &i) in unknowns.iter().enumerate() {
            loaded.values[i] = x[k];
        }
        debug!(
            "Static solve converged in {} iteration(s), residual norm {:.3e}.",
            stats.iterations, stats.residual_norm
        );
        Ok(stats)
    }
}

impl RealStaticModel for NlModel {
    fn solver_interface(&mut self) -> Option<&mut dyn StaticSolver> {
        self.loaded.is_some().then_some(self as &mut dyn StaticSolver)
    }
}
