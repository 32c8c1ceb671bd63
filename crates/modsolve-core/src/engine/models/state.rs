use crate::core::io::dmodl::DmodlFile;
use crate::core::io::traits::ModelFile;
use crate::core::model::{ModelKind, ModelSystem, SymbolKind};
use crate::engine::error::EngineError;
use std::path::Path;
use tracing::info;

/// An initialized model: the compiled system plus the current value of every
/// symbol. Shared by the concrete model types, which layer their solver state
/// on top.
#[derive(Debug, Clone)]
pub(crate) struct LoadedModel {
    pub system: ModelSystem,
    pub values: Vec<f64>,
}

impl LoadedModel {
    pub fn load(path: &Path, expected: ModelKind) -> Result<Self, EngineError> {
        let system = DmodlFile::read_from_path(path).map_err(|source| EngineError::ModelFile {
            path: path.to_path_buf(),
            source,
        })?;
        if system.kind() != expected {
            return Err(EngineError::ProblemMismatch {
                name: system.name().to_string(),
                expected,
                found: system.kind(),
            });
        }
        let values = system.initial_values();
        info!(
            "Loaded {} model '{}' from {:?} ({} symbol(s), {} output(s)).",
            system.kind().label(),
            system.name(),
            path,
            values.len(),
            system.outputs().len()
        );
        Ok(Self { system, values })
    }

    pub fn symbol_names(&self, indices: &[usize]) -> Result<Vec<String>, EngineError> {
        indices
            .iter()
            .map(|&i| {
                self.system
                    .symbols()
                    .get(i)
                    .map(|s| s.name.clone())
                    .ok_or(EngineError::SymbolOutOfRange(i))
            })
            .collect()
    }

    pub fn symbol_values(&self, indices: &[usize]) -> Result<Vec<f64>, EngineError> {
        indices
            .iter()
            .map(|&i| {
                self.values
                    .get(i)
                    .copied()
                    .ok_or(EngineError::SymbolOutOfRange(i))
            })
            .collect()
    }

    pub fn parameter_index(&self, name: &str) -> Option<usize> {
        let index = self.system.symbols().index_of(name)?;
        let symbol = self.system.symbols().get(index)?;
        (symbol.kind == SymbolKind::Parameter).then_some(index)
    }

    pub fn parameter_values(&self, indices: &[usize]) -> Result<Vec<f64>, EngineError> {
        indices
            .iter()
            .map(|&i| {
                self.require_parameter(i)?;
                Ok(self.values[i])
            })
            .collect()
    }

    pub fn set_parameter_values(
        &mut self,
        indices: &[usize],
        values: &[f64],
    ) -> Result<(), EngineError> {
        if indices.len() != values.len() {
            return Err(EngineError::LengthMismatch {
                indices: indices.len(),
                values: values.len(),
            });
        }
        for &i in indices {
            self.require_parameter(i)?;
        }
        for (&i, &value) in indices.iter().zip(values) {
            self.values[i] = value;
        }
        Ok(())
    }

    fn require_parameter(&self, index: usize) -> Result<(), EngineError> {
        let symbol = self
            .system
            .symbols()
            .get(index)
            .ok_or(EngineError::SymbolOutOfRange(index))?;
        if symbol.kind != SymbolKind::Parameter {
            return Err(EngineError::NotAParameter(index));
        }
        Ok(())
    }

    /// Restores every non-parameter symbol to its start value.
    pub fn restore_initial_state(&mut self) {
        for (i, symbol) in self.system.symbols().iter() {
            if symbol.kind != SymbolKind::Parameter {
                self.values[i] = symbol.start;
            }
        }
    }
}
