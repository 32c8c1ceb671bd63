use crate::cli::SimulateArgs;
use crate::error::{CliError, Result};
use crate::utils::parser;
use crate::utils::progress::CliProgressHandler;
use crate::{paths, table};
use modsolve::engine::interface::{DynamicProblem, Model, create_real_dynamic_model};
use modsolve::engine::progress::ProgressReporter;
use modsolve::workflows::simulate::{self, ParameterEvent, Scenario};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// The classic interaction schedule, used when a parameter is named but no
/// events are given: raise the load tenfold at t = 0.5 s, lower it at 10 s.
const DEFAULT_EVENTS: [ParameterEvent; 2] = [
    ParameterEvent {
        time: 0.5,
        value: -10.0,
    },
    ParameterEvent {
        time: 10.0,
        value: -1.0,
    },
];

pub fn run(args: &SimulateArgs) -> Result<()> {
    let mut events = Vec::with_capacity(args.events.len());
    for spec in &args.events {
        events.push(parser::parse_event(spec).map_err(|e| CliError::Argument(e.to_string()))?);
    }

    let out_path = execute(
        &args.input,
        &args.out_dir,
        args.problem.into(),
        args.t_final,
        args.param.as_deref(),
        events,
    )?;
    println!("✓ Results written to: {}", out_path.display());
    Ok(())
}

/// Runs one dynamic case end to end and returns the result file path.
pub(crate) fn execute(
    input: &Path,
    out_dir: &str,
    problem: DynamicProblem,
    t_final: f64,
    param: Option<&str>,
    mut events: Vec<ParameterEvent>,
) -> Result<PathBuf> {
    if t_final <= 0.0 {
        return Err(CliError::Argument(format!(
            "final time must be positive (got {})",
            t_final
        )));
    }

    let (in_path, out_path) = paths::resolve_io_paths(input, out_dir)?;

    info!("Creating dynamic model for problem {:?}.", problem);
    let mut model = create_real_dynamic_model(problem);
    model.init_from_file(&in_path)?;

    if param.is_some() && events.is_empty() {
        info!("No events given; using the default interaction schedule.");
        events = DEFAULT_EVENTS.to_vec();
    }

    let scenario = Scenario {
        t_final,
        parameter: param.map(str::to_string),
        events,
    };

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let series = simulate::run(model.as_mut(), &scenario, &reporter)?;

    let mut writer = BufWriter::new(File::create(&out_path)?);
    table::write_time_series(&mut writer, &series)?;
    writer.flush()?;

    info!(
        "Simulation results ({} row(s)) written to {:?}.",
        series.rows.len(),
        out_path
    );
    Ok(out_path)
}
