use crate::engine::error::EngineError;
use crate::engine::interface::{DynamicSolver, Model, RealDynamicModel};
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::{debug, info, warn};

/// Tolerance when comparing step times against event times.
pub const EVENT_TIME_EPS: f64 = 1e-6;

/// Step size used when the model file does not specify one.
pub const DEFAULT_STEP_SIZE: f64 = 0.001;

/// A scheduled change of the simulated parameter's value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterEvent {
    /// Simulation time at which the new value takes effect.
    pub time: f64,
    /// Absolute value assigned to the parameter.
    pub value: f64,
}

/// A dynamic simulation request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scenario {
    /// Integrate while the step time is <= this value.
    pub t_final: f64,
    /// Parameter the events apply to; `None` runs without interaction.
    pub parameter: Option<String>,
    /// Events applied to `parameter`, each firing once.
    pub events: Vec<ParameterEvent>,
}

/// The collected output trajectory of a simulation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeries {
    /// Output symbol names, one per value column.
    pub names: Vec<String>,
    /// Rows of (time, output values).
    pub rows: Vec<(f64, Vec<f64>)>,
}

/// Runs the dynamic driver against an initialized model.
///
/// Mirrors the classic interactive loop: check the step size (falling back to
/// [`DEFAULT_STEP_SIZE`] with a warning when the model specifies none), reset
/// to t = 0, record the initial outputs, then step to `t_final`, applying each
/// parameter event at the first step time at or past its schedule.
pub fn run(
    model: &mut dyn RealDynamicModel,
    scenario: &Scenario,
    reporter: &ProgressReporter,
) -> Result<TimeSeries, EngineError> {
    if model.solver_interface().is_none() {
        return Err(EngineError::NotInitialized);
    }

    let parameter_index = match &scenario.parameter {
        None => None,
        Some(name) => Some(
            model
                .parameter_index(name)
                .ok_or_else(|| EngineError::UnknownParameter(name.clone()))?,
        ),
    };

    let mut dt = model.step_size();
    if dt <= 0.0 {
        warn!(
            "Model does not specify a step size; falling back to {}.",
            DEFAULT_STEP_SIZE
        );
        dt = DEFAULT_STEP_SIZE;
        model.set_step_size(dt)?;
    }

    reporter.report(Progress::PhaseStart {
        name: "Consistent initialization",
    });
    model.reset(0.0)?;
    reporter.report(Progress::PhaseFinish);

    let out_indices = model.output_symbol_indices();
    if out_indices.is_empty() {
        return Err(EngineError::NoOutputs);
    }
    let names = model.output_symbol_names(&out_indices)?;

    let mut series = TimeSeries {
        names,
        rows: Vec::new(),
    };
    series
        .rows
        .push((0.0, model.output_symbol_values(&out_indices)?));

    let total_steps = (scenario.t_final / dt).floor() as u64 + 1;
    reporter.report(Progress::StepLoopStart { total_steps });

    let mut fired = vec![false; scenario.events.len()];
    let mut t = 0.0;
    while t <= scenario.t_final {
        t += dt;

        if let Some(index) = parameter_index {
            for (event, fired) in scenario.events.iter().zip(fired.iter_mut()) {
                if !*fired && t + EVENT_TIME_EPS >= event.time {
                    debug!(
                        "Applying parameter event at t = {}: value {}.",
                        t, event.value
                    );
                    model.set_parameter_values(&[index], &[event.value])?;
                    *fired = true;
                }
            }
        }

        model.step()?;
        series
            .rows
            .push((t, model.output_symbol_values(&out_indices)?));
        reporter.report(Progress::StepAdvanced);
    }

    reporter.report(Progress::StepLoopFinish);
    info!(
        "Simulation completed: {} row(s) over {} s.",
        series.rows.len(),
        scenario.t_final
    );
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::interface::{DynamicProblem, create_real_dynamic_model};
    use std::io::Write;
    use tempfile::TempDir;

    // First-order lag toward the load parameter, dt specified by the model.
    const LAG_DAE: &str = r#"
        [model]
        name = "lag"
        kind = "dae"

        [solver]
        step-size = 0.01
        method = "backward-euler"

        [[symbols]]
        name = "P_l"
        kind = "parameter"
        value = 0.0

        [[symbols]]
        name = "x"
        kind = "state"
        start = 0.0

        [[equations]]
        lhs = "der(x)"
        rhs = "(P_l - x) / 0.2"

        outputs = ["x"]
    "#;

    const NO_DT_DAE: &str = r#"
        [model]
        name = "decay"
        kind = "dae"

        [[symbols]]
        name = "x"
        kind = "state"
        start = 1.0

        [[equations]]
        lhs = "der(x)"
        rhs = "-x"
    "#;

    fn write_model(content: &str) -> (TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.dmodl");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn collects_the_initial_row_and_one_row_per_step() {
        // An exactly representable step size keeps the row count deterministic.
        let model_text = LAG_DAE.replace("step-size = 0.01", "step-size = 0.125");
        let (_dir, path) = write_model(&model_text);
        let mut model = create_real_dynamic_model(DynamicProblem::Dae);
        model.init_from_file(&path).unwrap();

        let scenario = Scenario {
            t_final: 1.0,
            ..Default::default()
        };
        let series = run(model.as_mut(), &scenario, &ProgressReporter::new()).unwrap();

        assert_eq!(series.names, vec!["x".to_string()]);
        // t = 0 plus 9 steps of 0.125 (the loop runs while t <= t_final, so
        // the 1.0 step itself is taken and one more lands at 1.125).
        assert_eq!(series.rows.len(), 10);
        assert_eq!(series.rows[0].0, 0.0);
        assert_eq!(series.rows[0].1, vec![0.0]);
    }

    #[test]
    fn default_step_size_is_applied_when_the_model_has_none() {
        let (_dir, path) = write_model(NO_DT_DAE);
        let mut model = create_real_dynamic_model(DynamicProblem::Dae);
        model.init_from_file(&path).unwrap();
        assert_eq!(model.step_size(), 0.0);

        let scenario = Scenario {
            t_final: 0.01,
            ..Default::default()
        };
        run(model.as_mut(), &scenario, &ProgressReporter::new()).unwrap();
        assert_eq!(model.step_size(), DEFAULT_STEP_SIZE);
    }

    #[test]
    fn events_fire_once_and_redirect_the_trajectory() {
        let (_dir, path) = write_model(LAG_DAE);
        let mut model = create_real_dynamic_model(DynamicProblem::Dae);
        model.init_from_file(&path).unwrap();

        let scenario = Scenario {
            t_final: 3.0,
            parameter: Some("P_l".to_string()),
            events: vec![
                ParameterEvent {
                    time: 0.5,
                    value: -10.0,
                },
                ParameterEvent {
                    time: 2.0,
                    value: -1.0,
                },
            ],
        };
        let series = run(model.as_mut(), &scenario, &ProgressReporter::new()).unwrap();

        let x_at = |t: f64| {
            series
                .rows
                .iter()
                .find(|(rt, _)| (rt - t).abs() < 1e-9)
                .map(|(_, v)| v[0])
                .unwrap()
        };
        // Before the first event the state still rests at zero.
        assert!(x_at(0.4).abs() < 1e-9);
        // Well after the first event it tracks -10 ...
        assert!((x_at(1.9) + 10.0).abs() < 0.1);
        // ... and after the second event it relaxes toward -1.
        assert!((x_at(3.0) + 1.0).abs() < 0.1);
    }

    #[test]
    fn event_between_step_times_fires_at_the_next_step() {
        let (_dir, path) = write_model(LAG_DAE);
        let mut model = create_real_dynamic_model(DynamicProblem::Dae);
        model.init_from_file(&path).unwrap();

        // 0.015 is not a step time for dt = 0.01; the event must land at 0.02.
        let scenario = Scenario {
            t_final: 0.1,
            parameter: Some("P_l".to_string()),
            events: vec![ParameterEvent {
                time: 0.015,
                value: 1.0,
            }],
        };
        let series = run(model.as_mut(), &scenario, &ProgressReporter::new()).unwrap();

        let rows = &series.rows;
        assert!(rows[1].1[0].abs() < 1e-12, "no drive before the event");
        assert!(rows[2].1[0] > 0.0, "drive visible at the firing step");
    }

    #[test]
    fn unknown_event_parameter_is_rejected() {
        let (_dir, path) = write_model(LAG_DAE);
        let mut model = create_real_dynamic_model(DynamicProblem::Dae);
        model.init_from_file(&path).unwrap();

        let scenario = Scenario {
            t_final: 1.0,
            parameter: Some("missing".to_string()),
            events: vec![],
        };
        let err = run(model.as_mut(), &scenario, &ProgressReporter::new()).unwrap_err();
        assert!(matches!(err, EngineError::UnknownParameter(name) if name == "missing"));
    }

    #[test]
    fn uninitialized_model_is_rejected() {
        let mut model = create_real_dynamic_model(DynamicProblem::Dae);
        let scenario = Scenario::default();
        let err = run(model.as_mut(), &scenario, &ProgressReporter::new()).unwrap_err();
        assert!(matches!(err, EngineError::NotInitialized));
    }
}
