use crate::error::{CliError, Result};
use modsolve::workflows::simulate::ParameterEvent;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A suite file: a shared output folder spec plus an ordered list of cases.
///
/// ```toml
/// out-dir = "./Res"
///
/// [[case]]
/// type = "static"
/// input = "models/PF_PV_03.dmodl"
/// param = "P3_inj"
/// param-delta = -0.8
///
/// [[case]]
/// type = "dynamic"
/// input = "models/FreqReg_01.dmodl"
/// t-final = 20.0
/// param = "P_l"
/// events = [{ time = 0.5, value = -10.0 }, { time = 10.0, value = -1.0 }]
/// ```
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct SuiteConfig {
    #[serde(default)]
    pub out_dir: String,
    #[serde(default, rename = "case")]
    pub cases: Vec<SuiteCase>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SuiteCase {
    Static(StaticCase),
    Dynamic(DynamicCase),
}

impl SuiteCase {
    pub fn input(&self) -> &Path {
        match self {
            SuiteCase::Static(case) => &case.input,
            SuiteCase::Dynamic(case) => &case.input,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StaticCase {
    pub input: PathBuf,
    pub param: Option<String>,
    #[serde(default = "default_param_delta")]
    pub param_delta: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DynamicCase {
    pub input: PathBuf,
    pub t_final: f64,
    pub param: Option<String>,
    #[serde(default)]
    pub events: Vec<EventSpec>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventSpec {
    pub time: f64,
    pub value: f64,
}

impl From<EventSpec> for ParameterEvent {
    fn from(spec: EventSpec) -> Self {
        ParameterEvent {
            time: spec.time,
            value: spec.value,
        }
    }
}

fn default_param_delta() -> f64 {
    -0.5
}

impl SuiteConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading suite configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_mixed_suite() {
        let config: SuiteConfig = toml::from_str(
            r#"
            out-dir = "~Res"

            [[case]]
            type = "static"
            input = "a.dmodl"
            param = "P3_inj"
            param-delta = -0.8

            [[case]]
            type = "dynamic"
            input = "b.dmodl"
            t-final = 20.0
            param = "P_l"
            events = [{ time = 0.5, value = -10.0 }, { time = 10.0, value = -1.0 }]

            [[case]]
            type = "dynamic"
            input = "c.dmodl"
            t-final = 0.5
        "#,
        )
        .unwrap();

        assert_eq!(config.out_dir, "~Res");
        assert_eq!(config.cases.len(), 3);
        match &config.cases[0] {
            SuiteCase::Static(case) => {
                assert_eq!(case.input, PathBuf::from("a.dmodl"));
                assert_eq!(case.param.as_deref(), Some("P3_inj"));
                assert_eq!(case.param_delta, -0.8);
            }
            other => panic!("expected a static case, got {:?}", other),
        }
        match &config.cases[1] {
            SuiteCase::Dynamic(case) => {
                assert_eq!(case.t_final, 20.0);
                assert_eq!(case.events.len(), 2);
                assert_eq!(case.events[0].time, 0.5);
                assert_eq!(case.events[0].value, -10.0);
            }
            other => panic!("expected a dynamic case, got {:?}", other),
        }
        match &config.cases[2] {
            SuiteCase::Dynamic(case) => {
                assert_eq!(case.param, None);
                assert!(case.events.is_empty());
            }
            other => panic!("expected a dynamic case, got {:?}", other),
        }
    }

    #[test]
    fn param_delta_defaults_when_omitted() {
        let config: SuiteConfig = toml::from_str(
            r#"
            [[case]]
            type = "static"
            input = "a.dmodl"
            param = "P"
        "#,
        )
        .unwrap();
        match &config.cases[0] {
            SuiteCase::Static(case) => assert_eq!(case.param_delta, -0.5),
            other => panic!("expected a static case, got {:?}", other),
        }
    }

    #[test]
    fn unknown_case_type_is_rejected() {
        let result: std::result::Result<SuiteConfig, _> = toml::from_str(
            r#"
            [[case]]
            type = "transient"
            input = "a.dmodl"
        "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn out_dir_defaults_to_empty() {
        let config: SuiteConfig = toml::from_str("").unwrap();
        assert_eq!(config.out_dir, "");
        assert!(config.cases.is_empty());
    }
}
