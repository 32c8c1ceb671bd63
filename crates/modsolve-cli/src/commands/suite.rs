use crate::cli::SuiteArgs;
use crate::commands::{simulate, solve};
use crate::config::{SuiteCase, SuiteConfig};
use crate::error::{CliError, Result};
use modsolve::engine::interface::{DynamicProblem, StaticProblem};
use tracing::{error, info};

/// Runs every case in the suite file in order. A failing case is reported and
/// the remaining cases still run; the command fails if any case failed.
pub fn run(args: &SuiteArgs) -> Result<()> {
    let config = SuiteConfig::from_file(&args.config)?;
    let total = config.cases.len();
    if total == 0 {
        return Err(CliError::Config(
            "suite file defines no cases".to_string(),
        ));
    }

    info!("Running {} suite case(s).", total);
    let mut failed = 0;

    for (number, case) in config.cases.iter().enumerate() {
        let number = number + 1;
        println!("[{}/{}] {}", number, total, case.input().display());

        let result = match case {
            SuiteCase::Static(case) => solve::execute(
                &case.input,
                &config.out_dir,
                StaticProblem::Nle,
                case.param.as_deref(),
                case.param_delta,
            ),
            SuiteCase::Dynamic(case) => simulate::execute(
                &case.input,
                &config.out_dir,
                DynamicProblem::Dae,
                case.t_final,
                case.param.as_deref(),
                case.events.iter().copied().map(Into::into).collect(),
            ),
        };

        match result {
            Ok(out_path) => println!("  ✓ Results written to: {}", out_path.display()),
            Err(e) => {
                error!("Suite case {} ({:?}) failed: {}", number, case.input(), e);
                eprintln!("  ✗ Case failed: {}", e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        Err(CliError::Suite { failed, total })
    } else {
        Ok(())
    }
}
