use crate::core::CycleTimestamp;
use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Cycle progress of an experiment (`progress.json`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    #[serde(rename = "DTG")]
    pub dtg: String,
    #[serde(rename = "DTGBEG")]
    pub dtgbeg: String,
}

impl ProgressRecord {
    pub fn new(dtg: CycleTimestamp, dtgbeg: CycleTimestamp) -> Self {
        Self {
            dtg: dtg.format(),
            dtgbeg: dtgbeg.format(),
        }
    }

    /// Reads a progress record
    ///
    /// # Errors
    ///
    /// `Error::MalformedProgress` when the file is not a progress record.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| Error::MalformedProgress {
            value: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// The current and first cycle of the record
    pub fn cycles(&self) -> Result<(CycleTimestamp, CycleTimestamp)> {
        Ok((
            CycleTimestamp::parse(&self.dtg)?,
            CycleTimestamp::parse(&self.dtgbeg)?,
        ))
    }
}

/// Post-processing progress (`progressPP.json`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostProcessingProgress {
    #[serde(rename = "DTGPP")]
    pub dtgpp: String,
}

/// Path of a progress file, namespaced by stream when one is given
///
/// `progress_file(dir, "progress", Some("b"))` is `<dir>/progress_stream_b.json`.
pub fn progress_file(dir: &Path, base: &str, stream: Option<&str>) -> PathBuf {
    match stream.filter(|s| !s.is_empty()) {
        Some(stream) => dir.join(format!("{base}_stream_{stream}.json")),
        None => dir.join(format!("{base}.json")),
    }
}

/// Writes a record as indented JSON
pub fn write_progress<T: Serialize>(path: &Path, record: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(record)?;
    fs::write(path, text)?;
    Ok(())
}
