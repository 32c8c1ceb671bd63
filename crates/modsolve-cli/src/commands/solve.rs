use crate::cli::SolveArgs;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use crate::{paths, table};
use modsolve::engine::interface::{Model, StaticProblem, create_real_static_model};
use modsolve::engine::progress::ProgressReporter;
use modsolve::workflows::static_solve::{self, Perturbation};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

pub fn run(args: &SolveArgs) -> Result<()> {
    let out_path = execute(
        &args.input,
        &args.out_dir,
        args.problem.into(),
        args.param.as_deref(),
        args.param_delta,
    )?;
    println!("✓ Results written to: {}", out_path.display());
    Ok(())
}

/// Runs one static case end to end and returns the result file path.
pub(crate) fn execute(
    input: &Path,
    out_dir: &str,
    problem: StaticProblem,
    param: Option<&str>,
    param_delta: f64,
) -> Result<PathBuf> {
    let (in_path, out_path) = paths::resolve_io_paths(input, out_dir)?;

    info!("Creating static model for problem {:?}.", problem);
    let mut model = create_real_static_model(problem);
    model.init_from_file(&in_path)?;

    let perturbation = param.map(|name| Perturbation {
        parameter: name.to_string(),
        delta: param_delta,
    });

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let report = static_solve::run(model.as_mut(), perturbation.as_ref(), &reporter)?;

    let mut writer = BufWriter::new(File::create(&out_path)?);
    table::write_static_report(&mut writer, &report)?;
    writer.flush()?;

    info!("Static results written to {:?}.", out_path);
    Ok(out_path)
}
