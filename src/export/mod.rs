mod yoda;

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::{analysis::Results, export::yoda::export_yoda};

#[derive(
    Display,
    EnumString,
    EnumIter,
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    Deserialize,
    Serialize,
)]
#[strum(ascii_case_insensitive)]
pub enum ExportFormat {
    #[default]
    #[strum(serialize = "yoda")]
    Yoda,
    #[strum(serialize = "json")]
    Json,
}

impl ExportFormat {
    /// Guess the format from the file extension, defaulting to YODA
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
            .unwrap_or_default()
    }
}

pub fn export(path: &Path, results: &Results, format: ExportFormat) -> Result<()> {
    use ExportFormat::*;
    let out = File::create(path)
        .with_context(|| format!("Failed to open {path:?}"))?;
    let mut out = BufWriter::new(out);
    let res = match format {
        Yoda => export_yoda(&mut out, results),
        Json => serde_json::to_writer_pretty(&mut out, results).map_err(Into::into),
    };
    res.and_then(|_| out.flush().map_err(Into::into))
        .with_context(|| format!("Failed to write {path:?}"))
}
