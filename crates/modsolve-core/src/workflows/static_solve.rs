use crate::engine::error::EngineError;
use crate::engine::interface::{Model, RealStaticModel, StaticSolver};
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::info;

/// A one-parameter perturbation applied between the two solves.
#[derive(Debug, Clone, PartialEq)]
pub struct Perturbation {
    /// Name of the parameter to perturb.
    pub parameter: String,
    /// Offset added to the parameter's current value.
    pub delta: f64,
}

/// A labeled block of named values, one per report section.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueBlock {
    pub label: String,
    pub names: Vec<String>,
    pub values: Vec<f64>,
}

/// The result of a static solve run: the report sections in output order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticReport {
    pub blocks: Vec<ValueBlock>,
}

/// Runs the static driver against an initialized model.
///
/// Solves the model and records its output symbols; with a perturbation,
/// additionally records the parameter before and after the offset is applied
/// and the outputs of a second solve at the perturbed value.
pub fn run(
    model: &mut dyn RealStaticModel,
    perturbation: Option<&Perturbation>,
    reporter: &ProgressReporter,
) -> Result<StaticReport, EngineError> {
    let out_indices = model.output_symbol_indices();
    if out_indices.is_empty() {
        return Err(EngineError::NoOutputs);
    }
    let out_names = model.output_symbol_names(&out_indices)?;

    if model.solver_interface().is_none() {
        return Err(EngineError::NotInitialized);
    }

    let mut report = StaticReport::default();

    let perturbed = match perturbation {
        None => None,
        Some(perturbation) => {
            let index = model
                .parameter_index(&perturbation.parameter)
                .ok_or_else(|| EngineError::UnknownParameter(perturbation.parameter.clone()))?;
            let values = model.parameter_values(&[index])?;
            report.blocks.push(ValueBlock {
                label: "Initial param values:".to_string(),
                names: vec![perturbation.parameter.clone()],
                values: values.clone(),
            });
            Some((index, perturbation.parameter.clone(), values[0] + perturbation.delta))
        }
    };

    reporter.report(Progress::PhaseStart {
        name: "Initial solve",
    });
    model.solve()?;
    reporter.report(Progress::PhaseFinish);

    report.blocks.push(ValueBlock {
        label: "Output symbols for initial solution:".to_string(),
        names: out_names.clone(),
        values: model.output_symbol_values(&out_indices)?,
    });

    let Some((index, name, new_value)) = perturbed else {
        info!("Static solve completed (without param manipulations).");
        return Ok(report);
    };

    model.set_parameter_values(&[index], &[new_value])?;
    report.blocks.push(ValueBlock {
        label: "Updated param values:".to_string(),
        names: vec![name],
        values: vec![new_value],
    });

    reporter.report(Progress::PhaseStart {
        name: "Perturbed solve",
    });
    model.solve()?;
    reporter.report(Progress::PhaseFinish);

    report.blocks.push(ValueBlock {
        label: "Output symbols for solution with updated params:".to_string(),
        names: out_names,
        values: model.output_symbol_values(&out_indices)?,
    });

    info!("Static solve completed.");
    Ok(report)
}
