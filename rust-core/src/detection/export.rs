//! Spike-rate CSV export

use std::path::{Path, PathBuf};

use super::params::float_repr;
use crate::error::Result;

/// Result of the best-effort export step
#[derive(Debug, Clone, PartialEq)]
pub enum ExportOutcome {
    /// Export switched off in the configuration
    Disabled,

    /// File written at this path
    Written(PathBuf),

    /// Writing failed; the in-memory results are still valid
    Failed(String),
}

/// Write one CSV row holding a rate per channel
///
/// # Returns
/// Path of the written file
pub fn write_rates(directory: &Path, file_name: &str, rates: &[f64]) -> Result<PathBuf> {
    let path = directory.join(file_name);
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(&path)?;
    writer.write_record(rates.iter().map(|&r| float_repr(r)))?;
    writer.flush()?;
    Ok(path)
}

/// Export without failing: errors are logged and returned as an outcome
pub fn export_rates(directory: Option<&Path>, file_name: &str, rates: &[f64]) -> ExportOutcome {
    let Some(directory) = directory else {
        return ExportOutcome::Disabled;
    };

    match write_rates(directory, file_name, rates) {
        Ok(path) => {
            log::info!("spike rates written to {}", path.display());
            ExportOutcome::Written(path)
        }
        Err(e) => {
            log::warn!("could not export spike rates to {}: {}", file_name, e);
            ExportOutcome::Failed(e.to_string())
        }
    }
}
