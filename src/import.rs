use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, trace};

use crate::event::{Event, EventRecord};

/// Read events from a file with one JSON event record per line
///
/// Empty lines are skipped.
pub fn import(filename: &Path, events: &mut Vec<Event>) -> Result<()> {
    let file = File::open(filename)
        .with_context(|| format!("Failed to open {filename:?}"))?;
    let nevents = events.len();
    import_json_lines(BufReader::new(file), events)
        .with_context(|| format!("Failed to import {filename:?}"))?;
    debug!("Read {} events from {filename:?}", events.len() - nevents);
    Ok(())
}

pub fn import_json_lines<R: BufRead>(
    reader: R,
    events: &mut Vec<Event>,
) -> Result<()> {
    for (nline, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        trace!("Parsing event in line {}", nline + 1);
        let record: EventRecord = serde_json::from_str(&line)
            .with_context(|| format!("Invalid event in line {}", nline + 1))?;
        events.push(record.into());
    }
    Ok(())
}
