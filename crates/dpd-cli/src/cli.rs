use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Mesoscale Dynamics Group",
    version,
    about = "dpdtarget - run target-and-decorator scenarios over mesoscale particle systems and manage their checkpoints.",
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
    /// Run a scenario: load beads, execute timed commands and decorations, write results.
    Run(RunArgs),
    /// Restore a checkpoint against a bead table and list its targets.
    Inspect(InspectArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the scenario file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Restore targets and decorations from this checkpoint before running.
    #[arg(short, long, value_name = "PATH")]
    pub restore: Option<PathBuf>,

    /// Override the number of steps from the scenario file.
    #[arg(short = 'n', long, value_name = "INT")]
    pub steps: Option<u64>,

    /// Override the timestep from the scenario file.
    #[arg(short = 't', long, value_name = "FLOAT")]
    pub timestep: Option<f64>,

    /// Override the number of the first integrated step.
    #[arg(long, value_name = "INT")]
    pub first_step: Option<u64>,

    /// Override where the final checkpoint is written.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Override the directory that receives one CSV file per measurement.
    #[arg(long, value_name = "DIR")]
    pub samples_dir: Option<PathBuf>,
}

/// Arguments for the `inspect` subcommand.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Path to the checkpoint to restore.
    #[arg(required = true, value_name = "CHECKPOINT")]
    pub checkpoint: PathBuf,

    /// Bead table (CSV) the checkpoint refers to.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub beads: PathBuf,
}
