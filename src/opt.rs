use std::path::PathBuf;

use clap::Parser;

use jetsub::config::Preset;
use jetsub::export::ExportFormat;

#[derive(Debug, Parser)]
#[command(
    name = "jetsub",
    about = "Fill jet substructure observables from simulated collider events"
)]
pub struct Opt {
    /// Verbosity level: 'off', 'error', 'warn', 'info', 'debug', 'trace'
    #[arg(short, long, default_value = "info")]
    pub verbosity: String,

    /// Built-in analysis, e.g. 'alice-2021-angularity'
    #[arg(short, long, conflicts_with = "config", required_unless_present = "config")]
    pub preset: Option<Preset>,

    /// Analysis configuration in TOML format
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Total cross section of the event sample in pb
    #[arg(short = 'x', long)]
    pub cross_section: f64,

    /// Output file
    #[arg(short, long, default_value = "jetsub.yoda")]
    pub output: PathBuf,

    /// Output format, by default guessed from the output file extension
    #[arg(short, long)]
    pub format: Option<ExportFormat>,

    /// Event files with one JSON event record per line
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}
