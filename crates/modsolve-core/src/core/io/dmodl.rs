use crate::core::expr::{self, BinaryOp, Expr, ExprError};
use crate::core::io::traits::ModelFile;
use crate::core::model::{
    Equation, IntegrationMethod, ModelError, ModelKind, ModelSystem, SolverSpec, SymbolError,
    SymbolKind, SymbolTable,
};
use serde::Deserialize;
use std::io::{self, BufRead};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DmodlError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unknown model kind '{0}' (expected 'nle' or 'dae')")]
    UnknownModelKind(String),

    #[error("symbol '{name}' has unknown kind '{kind}' (expected 'parameter', 'state' or 'unknown')")]
    UnknownSymbolKind { name: String, kind: String },

    #[error(transparent)]
    Symbol(#[from] SymbolError),

    #[error("parameter '{0}' must declare a 'value'")]
    MissingParameterValue(String),

    #[error("symbol '{0}' is a parameter; use 'value' instead of 'start'")]
    StartOnParameter(String),

    #[error("symbol '{0}' is not a parameter; use 'start' instead of 'value'")]
    ValueOnNonParameter(String),

    #[error("unknown integration method '{0}' (expected 'backward-euler', 'trapezoidal' or 'rk4')")]
    UnknownMethod(String),

    #[error("equation {index} ({side}): {source}")]
    Expr {
        index: usize,
        side: &'static str,
        source: ExprError,
    },

    #[error("equation {index}: unknown symbol '{name}' in der(...)")]
    UnknownDerTarget { index: usize, name: String },

    #[error("unknown output symbol '{0}'")]
    UnknownOutput(String),

    #[error("invalid model structure: {0}")]
    Invalid(#[from] ModelError),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawModel {
    model: RawHeader,
    solver: Option<RawSolver>,
    #[serde(default)]
    symbols: Vec<RawSymbol>,
    #[serde(default)]
    equations: Vec<RawEquation>,
    outputs: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawHeader {
    name: String,
    kind: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct RawSolver {
    step_size: Option<f64>,
    method: Option<String>,
    tolerance: Option<f64>,
    max_iterations: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSymbol {
    name: String,
    kind: String,
    value: Option<f64>,
    start: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEquation {
    lhs: String,
    rhs: String,
}

/// The TOML model file format.
///
/// ```toml
/// [model]
/// name = "decay"
/// kind = "dae"
///
/// [solver]
/// step-size = 0.001
/// method = "rk4"
///
/// [[symbols]]
/// name = "tau"
/// kind = "parameter"
/// value = 2.0
///
/// [[symbols]]
/// name = "x"
/// kind = "state"
/// start = 1.0
///
/// [[equations]]
/// lhs = "der(x)"
/// rhs = "-x / tau"
///
/// outputs = ["x"]
/// ```
pub struct DmodlFile;

impl ModelFile for DmodlFile {
    type Error = DmodlError;

    fn read_from(reader: &mut impl BufRead) -> Result<ModelSystem, Self::Error> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        let raw: RawModel = toml::from_str(&content)?;

        let kind = match raw.model.kind.as_str() {
            "nle" => ModelKind::Nle,
            "dae" => ModelKind::Dae,
            other => return Err(DmodlError::UnknownModelKind(other.to_string())),
        };

        let symbols = build_symbols(&raw.symbols)?;
        let equations = build_equations(&raw.equations, &symbols, kind)?;

        let outputs = match raw.outputs {
            None => None,
            Some(names) => {
                let mut indices = Vec::with_capacity(names.len());
                for name in names {
                    let index = symbols
                        .index_of(&name)
                        .ok_or(DmodlError::UnknownOutput(name))?;
                    indices.push(index);
                }
                Some(indices)
            }
        };

        let solver = build_solver_spec(raw.solver)?;

        Ok(ModelSystem::new(
            raw.model.name,
            kind,
            symbols,
            equations,
            outputs,
            solver,
        )?)
    }
}

fn build_symbols(raw: &[RawSymbol]) -> Result<SymbolTable, DmodlError> {
    let mut table = SymbolTable::new();
    for symbol in raw {
        let kind = match symbol.kind.as_str() {
            "parameter" => SymbolKind::Parameter,
            "state" => SymbolKind::State,
            "unknown" => SymbolKind::Unknown,
            other => {
                return Err(DmodlError::UnknownSymbolKind {
                    name: symbol.name.clone(),
                    kind: other.to_string(),
                });
            }
        };
        let start = match kind {
            SymbolKind::Parameter => {
                if symbol.start.is_some() {
                    return Err(DmodlError::StartOnParameter(symbol.name.clone()));
                }
                symbol
                    .value
                    .ok_or_else(|| DmodlError::MissingParameterValue(symbol.name.clone()))?
            }
            SymbolKind::State | SymbolKind::Unknown => {
                if symbol.value.is_some() {
                    return Err(DmodlError::ValueOnNonParameter(symbol.name.clone()));
                }
                symbol.start.unwrap_or(0.0)
            }
        };
        table.insert(&symbol.name, kind, start)?;
    }
    Ok(table)
}

fn build_equations(
    raw: &[RawEquation],
    symbols: &SymbolTable,
    kind: ModelKind,
) -> Result<Vec<Equation>, DmodlError> {
    let allow_time = kind == ModelKind::Dae;
    let resolve = |name: &str| symbols.index_of(name);
    let mut equations = Vec::with_capacity(raw.len());

    for (index, equation) in raw.iter().enumerate() {
        let rhs = expr::parse(&equation.rhs, &resolve, allow_time).map_err(|source| {
            DmodlError::Expr {
                index,
                side: "rhs",
                source,
            }
        })?;

        if let Some(target) = der_target(&equation.lhs) {
            let state = symbols
                .index_of(target)
                .ok_or_else(|| DmodlError::UnknownDerTarget {
                    index,
                    name: target.to_string(),
                })?;
            equations.push(Equation::Differential { state, rhs });
        } else {
            let lhs = expr::parse(&equation.lhs, &resolve, allow_time).map_err(|source| {
                DmodlError::Expr {
                    index,
                    side: "lhs",
                    source,
                }
            })?;
            let residual = Expr::Binary(BinaryOp::Sub, Box::new(lhs), Box::new(rhs));
            equations.push(Equation::Residual(residual));
        }
    }

    Ok(equations)
}

/// Recognizes a left-hand side of the form `der(name)` and returns `name`.
fn der_target(lhs: &str) -> Option<&str> {
    let rest = lhs.trim().strip_prefix("der")?.trim_start();
    let inner = rest.strip_prefix('(')?.strip_suffix(')')?.trim();
    if inner.is_empty() {
        return None;
    }
    Some(inner)
}

fn build_solver_spec(raw: Option<RawSolver>) -> Result<SolverSpec, DmodlError> {
    let Some(raw) = raw else {
        return Ok(SolverSpec::default());
    };
    let method = match raw.method {
        None => None,
        Some(name) => Some(
            IntegrationMethod::from_name(&name).ok_or(DmodlError::UnknownMethod(name))?,
        ),
    };
    Ok(SolverSpec {
        step_size: raw.step_size,
        method,
        tolerance: raw.tolerance,
        max_iterations: raw.max_iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn read(content: &str) -> Result<ModelSystem, DmodlError> {
        DmodlFile::read_from(&mut content.as_bytes())
    }

    const DECAY_DAE: &str = r#"
        [model]
        name = "decay"
        kind = "dae"

        [solver]
        step-size = 0.01
        method = "rk4"
        tolerance = 1e-10
        max-iterations = 25

        [[symbols]]
        name = "tau"
        kind = "parameter"
        value = 2.0

        [[symbols]]
        name = "x"
        kind = "state"
        start = 1.0

        [[equations]]
        lhs = "der(x)"
        rhs = "-x / tau"

        outputs = ["x"]
    "#;

    #[test]
    fn parses_a_complete_dynamic_model() {
        let system = read(DECAY_DAE).unwrap();
        assert_eq!(system.name(), "decay");
        assert_eq!(system.kind(), ModelKind::Dae);
        assert_eq!(system.state_indices(), &[1]);
        assert_eq!(system.parameter_indices(), &[0]);
        assert_eq!(system.outputs(), &[1]);
        assert_eq!(system.solver().step_size, Some(0.01));
        assert_eq!(system.solver().method, Some(IntegrationMethod::Rk4));
        assert_eq!(system.solver().tolerance, Some(1e-10));
        assert_eq!(system.solver().max_iterations, Some(25));
        assert_eq!(system.initial_values(), vec![2.0, 1.0]);
    }

    #[test]
    fn parses_a_static_model_with_default_outputs() {
        let system = read(
            r#"
            [model]
            name = "line"
            kind = "nle"

            [[symbols]]
            name = "b"
            kind = "parameter"
            value = 3.0

            [[symbols]]
            name = "x"
            kind = "unknown"
            start = 0.5

            [[equations]]
            lhs = "2 * x"
            rhs = "b"
        "#,
        )
        .unwrap();
        assert_eq!(system.kind(), ModelKind::Nle);
        assert_eq!(system.residuals().len(), 1);
        assert_eq!(system.outputs(), &[1]);
    }

    #[test]
    fn reads_from_a_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("decay.dmodl");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(DECAY_DAE.as_bytes()).unwrap();

        let system = DmodlFile::read_from_path(&path).unwrap();
        assert_eq!(system.name(), "decay");
    }

    #[test]
    fn missing_file_surfaces_as_io_error() {
        let err = DmodlFile::read_from_path("/nonexistent/model.dmodl").unwrap_err();
        assert!(matches!(err, DmodlError::Io(_)));
    }

    #[test]
    fn unknown_model_kind_is_rejected() {
        let err = read("[model]\nname = \"m\"\nkind = \"ode\"\n").unwrap_err();
        assert!(matches!(err, DmodlError::UnknownModelKind(k) if k == "ode"));
    }

    #[test]
    fn unknown_symbol_kind_is_rejected() {
        let err = read(
            r#"
            [model]
            name = "m"
            kind = "nle"

            [[symbols]]
            name = "x"
            kind = "variable"
        "#,
        )
        .unwrap_err();
        assert!(matches!(err, DmodlError::UnknownSymbolKind { name, kind }
            if name == "x" && kind == "variable"));
    }

    #[test]
    fn parameter_without_value_is_rejected() {
        let err = read(
            r#"
            [model]
            name = "m"
            kind = "nle"

            [[symbols]]
            name = "p"
            kind = "parameter"
        "#,
        )
        .unwrap_err();
        assert!(matches!(err, DmodlError::MissingParameterValue(n) if n == "p"));
    }

    #[test]
    fn start_on_a_parameter_is_rejected() {
        let err = read(
            r#"
            [model]
            name = "m"
            kind = "nle"

            [[symbols]]
            name = "p"
            kind = "parameter"
            start = 1.0
        "#,
        )
        .unwrap_err();
        assert!(matches!(err, DmodlError::StartOnParameter(n) if n == "p"));
    }

    #[test]
    fn unknown_identifier_in_equation_is_reported_with_position() {
        let err = read(
            r#"
            [model]
            name = "m"
            kind = "nle"

            [[symbols]]
            name = "x"
            kind = "unknown"

            [[equations]]
            lhs = "x"
            rhs = "y + 1"
        "#,
        )
        .unwrap_err();
        assert!(matches!(err, DmodlError::Expr { index: 0, side: "rhs", .. }));
    }

    #[test]
    fn der_of_undeclared_symbol_is_rejected() {
        let err = read(
            r#"
            [model]
            name = "m"
            kind = "dae"

            [[symbols]]
            name = "x"
            kind = "state"

            [[equations]]
            lhs = "der(z)"
            rhs = "1"
        "#,
        )
        .unwrap_err();
        assert!(matches!(err, DmodlError::UnknownDerTarget { index: 0, name } if name == "z"));
    }

    #[test]
    fn unknown_output_name_is_rejected() {
        let err = read(
            r#"
            [model]
            name = "m"
            kind = "nle"

            [[symbols]]
            name = "x"
            kind = "unknown"

            [[equations]]
            lhs = "x"
            rhs = "1"

            outputs = ["missing"]
        "#,
        )
        .unwrap_err();
        assert!(matches!(err, DmodlError::UnknownOutput(n) if n == "missing"));
    }

    #[test]
    fn time_in_a_static_model_is_rejected() {
        let err = read(
            r#"
            [model]
            name = "m"
            kind = "nle"

            [[symbols]]
            name = "x"
            kind = "unknown"

            [[equations]]
            lhs = "x"
            rhs = "t"
        "#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DmodlError::Expr {
                source: ExprError::TimeNotAllowed,
                ..
            }
        ));
    }

    #[test]
    fn structural_validation_errors_pass_through() {
        // One unknown, two residual equations.
        let err = read(
            r#"
            [model]
            name = "m"
            kind = "nle"

            [[symbols]]
            name = "x"
            kind = "unknown"

            [[equations]]
            lhs = "x"
            rhs = "1"

            [[equations]]
            lhs = "x"
            rhs = "2"
        "#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DmodlError::Invalid(ModelError::CountMismatch {
                residuals: 2,
                unknowns: 1
            })
        ));
    }

    #[test]
    fn unknown_top_level_keys_are_rejected() {
        let err = read("[model]\nname = \"m\"\nkind = \"nle\"\n[extra]\nx = 1\n").unwrap_err();
        assert!(matches!(err, DmodlError::Toml(_)));
    }
}

