use clap::{Args, Parser, Subcommand, ValueEnum};
use modsolve::engine::interface::{DynamicProblem, StaticProblem};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "modsolve CLI - Solve static (NLE) and dynamic (DAE) equation-based models and write tabulated results.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Solve a static model, optionally perturbing one parameter between two solves.
    Solve(SolveArgs),
    /// Integrate a dynamic model over time, optionally firing parameter events.
    Simulate(SimulateArgs),
    /// Run a batch of solve/simulate cases described by a TOML suite file.
    Suite(SuiteArgs),
}

const OUT_DIR_HELP: &str = "Output folder spec: a path, or prefixed with \
'~' (home directory), ':' (input file's directory) or '.' (current directory). \
Empty writes next to the input file";

/// Arguments for the `solve` subcommand.
#[derive(Args, Debug)]
pub struct SolveArgs {
    /// Path to the model file. Environment variables ($VAR, ${VAR}) are expanded.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    #[arg(short, long, default_value = "", value_name = "SPEC", help = OUT_DIR_HELP)]
    pub out_dir: String,

    /// The static problem kind to instantiate.
    #[arg(long, value_enum, default_value = "nle", value_name = "KIND")]
    pub problem: StaticProblemKind,

    /// Parameter to perturb after the initial solve.
    #[arg(short, long, value_name = "NAME")]
    pub param: Option<String>,

    /// Offset added to the perturbed parameter before the second solve.
    #[arg(
        long,
        value_name = "FLOAT",
        default_value_t = -0.5,
        allow_negative_numbers = true
    )]
    pub param_delta: f64,
}

/// Arguments for the `simulate` subcommand.
#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Path to the model file. Environment variables ($VAR, ${VAR}) are expanded.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    #[arg(short, long, default_value = "", value_name = "SPEC", help = OUT_DIR_HELP)]
    pub out_dir: String,

    /// The dynamic problem kind to instantiate.
    #[arg(long, value_enum, default_value = "dae", value_name = "KIND")]
    pub problem: DynamicProblemKind,

    /// Final simulation time in seconds.
    #[arg(short, long, value_name = "FLOAT")]
    pub t_final: f64,

    /// Parameter the events apply to.
    #[arg(short, long, value_name = "NAME")]
    pub param: Option<String>,

    /// Parameter event as TIME=VALUE (e.g. '0.5=-10'). May be repeated.
    /// Defaults to '0.5=-10' and '10=-1' when --param is given.
    #[arg(long = "event", value_name = "T=V")]
    pub events: Vec<String>,
}

/// Arguments for the `suite` subcommand.
#[derive(Args, Debug)]
pub struct SuiteArgs {
    /// Path to the suite configuration file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StaticProblemKind {
    /// Nonlinear equation system.
    Nle,
}

impl From<StaticProblemKind> for StaticProblem {
    fn from(kind: StaticProblemKind) -> Self {
        match kind {
            StaticProblemKind::Nle => StaticProblem::Nle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DynamicProblemKind {
    /// Differential-algebraic equation system.
    Dae,
}

impl From<DynamicProblemKind> for DynamicProblem {
    fn from(kind: DynamicProblemKind) -> Self {
        match kind {
            DynamicProblemKind::Dae => DynamicProblem::Dae,
        }
    }
}
