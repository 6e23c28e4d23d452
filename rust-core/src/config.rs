//! YAML workbench configuration

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::detection::SpikeParameters;
use crate::error::{Result, WorkbenchError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkbenchConfig {
    /// Sampling rate of ingested acquisitions (Hz)
    pub sampling_rate: f64,

    /// Mains band-stop edges (Hz)
    pub supply_band: [f64; 2],
    pub supply_filter_order: usize,
    pub bandpass_order: usize,

    /// Workspace receiving the detector outputs
    pub output_workspace: String,
    pub export: ExportConfig,

    /// Initial detector parameters
    pub detection: SpikeParameters,

    /// Default filter for the CLI logger, overridden by `RUST_LOG`
    pub log_level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub enabled: bool,
    pub directory: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: PathBuf::from("."),
        }
    }
}

impl Default for WorkbenchConfig {
    fn default() -> Self {
        Self {
            sampling_rate: 512.0,
            supply_band: [48.0, 52.0],
            supply_filter_order: 5,
            bandpass_order: 4,
            output_workspace: "Algorithm output".to_string(),
            export: ExportConfig::default(),
            detection: SpikeParameters::default(),
            log_level: "info".to_string(),
        }
    }
}

impl WorkbenchConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.sampling_rate.is_finite() && self.sampling_rate > 0.0) {
            return Err(WorkbenchError::invalid(format!(
                "sampling_rate must be positive, got {}",
                self.sampling_rate
            )));
        }
        let [low, high] = self.supply_band;
        if !(low > 0.0 && low < high) {
            return Err(WorkbenchError::invalid(format!(
                "supply_band must be increasing and positive, got [{}, {}]",
                low, high
            )));
        }
        if self.supply_filter_order == 0 || self.bandpass_order == 0 {
            return Err(WorkbenchError::invalid("filter orders must be at least 1"));
        }
        if self.output_workspace.is_empty() {
            return Err(WorkbenchError::invalid("output_workspace must not be empty"));
        }
        self.detection.validate()
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<WorkbenchConfig> {
    let text = fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&text)?)
}

pub fn save_config<P: AsRef<Path>>(config: &WorkbenchConfig, path: P) -> Result<()> {
    let yaml = serde_yaml::to_string(config)?;
    fs::write(path, yaml)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workbench.yaml");

        let mut config = WorkbenchConfig::default();
        config.sampling_rate = 1000.0;
        config.detection.window = 50;
        config.export.enabled = false;
        save_config(&config, &path).unwrap();

        assert_eq!(load_config(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: WorkbenchConfig =
            serde_yaml::from_str("sampling_rate: 256.0\ndetection:\n  hmt_larger: 4.0\n").unwrap();
        assert_eq!(config.sampling_rate, 256.0);
        assert_eq!(config.detection.hmt_larger, 4.0);
        assert_eq!(config.detection.window, 25);
        assert_eq!(config.output_workspace, "Algorithm output");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = WorkbenchConfig::default();
        config.supply_band = [52.0, 48.0];
        assert!(config.validate().is_err());

        let mut config = WorkbenchConfig::default();
        config.sampling_rate = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, WorkbenchError::Io(_)));
    }
}
