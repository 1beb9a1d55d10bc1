//! Jet substructure observables for simulated collider events.
//!
//! # How to use
//!
//!     jetsub --preset alice-2021-angularity --cross-section XS EVENTFILE
//!
//! Each line of the event file is a JSON record with the event weight
//! and the outgoing particles, e.g.
//!
//!     {"weight": 1.0, "particles": [{"id": 211, "p": [E, px, py, pz]}]}
//!
//! The resulting histograms are written in the YODA format. Custom
//! analyses can be set up in a TOML file passed with `--config`.
mod opt;

use anyhow::{bail, Context, Result};
use clap::Parser;
use env_logger::Env;
use log::{debug, info};

use jetsub::analysis::{Analysis, EventOutcome, RunInfo};
use jetsub::config::AnalysisConfig;
use jetsub::export::{export, ExportFormat};
use jetsub::import::import;

use crate::opt::Opt;

fn main() -> Result<()> {
    let opt = Opt::parse();

    let env = Env::default().filter_or("JETSUB_LOG", opt.verbosity.as_str());
    env_logger::init_from_env(env);

    let config = match (&opt.preset, &opt.config) {
        (Some(preset), _) => preset.config(),
        (None, Some(file)) => AnalysisConfig::from_toml_file(file)?,
        (None, None) => bail!("Either a preset or a configuration file is required"),
    };
    info!("Running analysis {}", config.name);
    let mut analysis = Analysis::new(config).context("Invalid analysis configuration")?;

    let mut events = Vec::new();
    for file in &opt.files {
        debug!("Importing events from {:?}", file);
        import(file, &mut events)?;
    }
    info!("Read {} events", events.len());

    let mut sum_of_weights = 0.;
    let mut nvetoed = 0;
    for event in &events {
        sum_of_weights += event.weight;
        if analysis.analyze_event(event) == EventOutcome::Vetoed {
            nvetoed += 1;
        }
    }
    debug!("{nvetoed} events without candidate jets");

    let run = RunInfo {
        cross_section: opt.cross_section,
        sum_of_weights,
    };
    let results = analysis.finalize(&run)?;
    let format = opt
        .format
        .unwrap_or_else(|| ExportFormat::from_path(&opt.output));
    info!("Writing {} histograms to {:?}", results.histos.len(), opt.output);
    export(&opt.output, &results, format)
}
