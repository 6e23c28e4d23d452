//! Acquisition ingestion
//!
//! A reader hands over a `(channels, samples)` matrix plus optional channel
//! names; the registry receives one workspace holding one signal.

use std::path::Path;

use ndarray::Array2;

use crate::data::store::first_duplicate;
use crate::data::{Payload, WorkspaceKind, WorkspaceRegistry};
use crate::error::{Result, WorkbenchError};

/// Raw recording as delivered by a file reader
#[derive(Debug, Clone)]
pub struct Acquisition {
    /// Short name of the source, usually the file stem
    pub source_name: String,

    /// One row per channel
    pub data: Array2<f64>,

    /// Defaults to `CH1..CHn` when absent
    pub channel_names: Option<Vec<String>>,
}

impl Acquisition {
    pub fn new(source_name: &str, data: Array2<f64>) -> Self {
        Self {
            source_name: source_name.to_string(),
            data,
            channel_names: None,
        }
    }

    pub fn with_channel_names(mut self, names: Vec<String>) -> Self {
        self.channel_names = Some(names);
        self
    }

    /// Name of the signal the acquisition is stored under
    pub fn signal_name(&self) -> String {
        format!("Original Signal ({})", self.source_name)
    }

    /// Channel names, generated when none were supplied
    pub fn resolved_channel_names(&self) -> Result<Vec<String>> {
        let rows = self.data.nrows();
        match &self.channel_names {
            Some(names) if names.len() != rows => Err(WorkbenchError::AcquisitionShape {
                rows,
                names: names.len(),
            }),
            Some(names) => match first_duplicate(names) {
                Some(dup) => Err(WorkbenchError::DuplicateChannel(dup.to_string())),
                None => Ok(names.clone()),
            },
            None => Ok((1..=rows).map(|n| format!("CH{}", n)).collect()),
        }
    }
}

/// File stem of `path`, e.g. `"patient01"` for `/data/patient01.csv`
pub fn source_name_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Create `workspace` and store the acquisition in it
///
/// # Returns
/// Name of the created signal
pub fn import_acquisition(
    registry: &mut WorkspaceRegistry<Payload>,
    workspace: &str,
    acquisition: &Acquisition,
) -> Result<String> {
    let channels = acquisition.resolved_channel_names()?;
    let signal = acquisition.signal_name();
    if registry.contains(workspace) {
        return Err(WorkbenchError::WorkspaceExists(workspace.to_string()));
    }

    let payloads: Vec<Payload> = acquisition
        .data
        .rows()
        .into_iter()
        .map(|row| Payload::from(row.to_owned()))
        .collect();

    registry.create_workspace(workspace, WorkspaceKind::Normal)?;
    registry.add_channels(workspace, &channels)?;
    registry.add_signal(workspace, &signal, payloads, &channels)?;

    log::info!(
        "imported '{}' into '{}': {} channels x {} samples",
        acquisition.source_name,
        workspace,
        channels.len(),
        acquisition.data.ncols()
    );
    Ok(signal)
}

/// Read a CSV matrix with one channel per row
///
/// A leading non-numeric field on every row is taken as the channel name.
/// Rows must have the same number of samples.
pub fn read_csv_acquisition(path: &Path) -> Result<Acquisition> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut names = Vec::new();
    let mut values = Vec::new();
    let mut width: Option<usize> = None;

    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let mut fields = record.iter().peekable();
        if let Some(first) = fields.peek() {
            if first.parse::<f64>().is_err() {
                names.push(first.to_string());
                fields.next();
            }
        }

        let row: Vec<f64> = fields
            .map(|f| {
                f.parse::<f64>().map_err(|_| {
                    WorkbenchError::invalid(format!("row {}: '{}' is not a number", line + 1, f))
                })
            })
            .collect::<Result<_>>()?;

        match width {
            None => width = Some(row.len()),
            Some(w) if w != row.len() => {
                return Err(WorkbenchError::invalid(format!(
                    "row {} has {} samples, expected {}",
                    line + 1,
                    row.len(),
                    w
                )))
            }
            Some(_) => {}
        }
        values.extend(row);
    }

    let width = width.unwrap_or(0);
    let rows = if width == 0 { 0 } else { values.len() / width };
    let data = Array2::from_shape_vec((rows, width), values)
        .map_err(|e| WorkbenchError::invalid(e.to_string()))?;

    let mut acquisition = Acquisition::new(&source_name_from_path(path), data);
    if !names.is_empty() {
        acquisition = acquisition.with_channel_names(names);
    }
    Ok(acquisition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_default_channel_names() {
        let acquisition = Acquisition::new("rec", Array2::zeros((3, 4)));
        assert_eq!(
            acquisition.resolved_channel_names().unwrap(),
            vec!["CH1", "CH2", "CH3"]
        );
        assert_eq!(acquisition.signal_name(), "Original Signal (rec)");
    }

    #[test]
    fn test_import_populates_workspace() {
        let mut registry = WorkspaceRegistry::new(Some(512.0));
        let acquisition = Acquisition::new("rec", array![[1.0, 2.0], [3.0, 4.0]]);

        let signal = import_acquisition(&mut registry, "Sandbox", &acquisition).unwrap();
        let store = registry.store("Sandbox").unwrap();

        assert_eq!(store.channels(), &["CH1".to_string(), "CH2".to_string()]);
        assert_eq!(store.get("CH2", &signal), Some(&Payload::from(vec![3.0, 4.0])));
    }

    #[test]
    fn test_name_count_mismatch() {
        let mut registry: WorkspaceRegistry<Payload> = WorkspaceRegistry::new(None);
        let acquisition = Acquisition::new("rec", Array2::zeros((2, 4)))
            .with_channel_names(vec!["A".to_string()]);

        let err = import_acquisition(&mut registry, "Sandbox", &acquisition).unwrap_err();
        assert!(matches!(err, WorkbenchError::AcquisitionShape { rows: 2, names: 1 }));
        assert!(!registry.contains("Sandbox"));
    }

    #[test]
    fn test_repeated_channel_names() {
        let mut registry: WorkspaceRegistry<Payload> = WorkspaceRegistry::new(None);
        let acquisition = Acquisition::new("rec", Array2::zeros((3, 4))).with_channel_names(vec![
            "A".to_string(),
            "B".to_string(),
            "A".to_string(),
        ]);

        let err = import_acquisition(&mut registry, "Sandbox", &acquisition).unwrap_err();
        assert!(matches!(err, WorkbenchError::DuplicateChannel(ref ch) if ch == "A"));
        assert!(!registry.contains("Sandbox"));
    }

    #[test]
    fn test_csv_with_name_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patient01.csv");
        std::fs::write(&path, "LA1,1.0,2.0,3.0\nLA2,4.0,5.0,6.0\n").unwrap();

        let acquisition = read_csv_acquisition(&path).unwrap();
        assert_eq!(acquisition.source_name, "patient01");
        assert_eq!(acquisition.data.dim(), (2, 3));
        assert_eq!(acquisition.data[[1, 2]], 6.0);
        assert_eq!(
            acquisition.channel_names,
            Some(vec!["LA1".to_string(), "LA2".to_string()])
        );
    }

    #[test]
    fn test_csv_ragged_rows_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "1,2,3\n4,5\n").unwrap();
        assert!(read_csv_acquisition(&path).is_err());
    }
}
