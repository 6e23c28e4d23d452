//! Python bindings for the workbench session

use numpy::{IntoPyArray, PyArray1, PyReadonlyArray2};
use pyo3::exceptions::PyKeyError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::config::{load_config, WorkbenchConfig};
use crate::data::{Orientation, Payload, Selection};
use crate::detection::{ExportOutcome, SpikeParameters};
use crate::ingest::Acquisition;
use crate::workbench::Workbench;

/// Workbench session exposed to Python
#[pyclass(name = "Workbench", unsendable)]
pub struct PyWorkbench {
    workbench: Workbench,
}

fn parameters_to_dict<'py>(py: Python<'py>, params: &SpikeParameters) -> PyResult<&'py PyDict> {
    let dict = PyDict::new(py);
    dict.set_item("remove_offset", params.remove_offset)?;
    dict.set_item("remove_supply", params.remove_supply)?;
    dict.set_item("bpf_lowcut", params.bpf_lowcut)?;
    dict.set_item("bpf_highcut", params.bpf_highcut)?;
    dict.set_item("window", params.window)?;
    dict.set_item("prev_seconds", params.prev_seconds)?;
    dict.set_item("hmt_larger", params.hmt_larger)?;
    dict.set_item("hmt_larger_mean", params.hmt_larger_mean)?;
    Ok(dict)
}

#[pymethods]
impl PyWorkbench {
    /// Create a new workbench
    ///
    /// Args:
    ///     config_path: Optional YAML configuration file
    #[new]
    #[pyo3(signature = (config_path=None))]
    fn new(config_path: Option<&str>) -> PyResult<Self> {
        let config = match config_path {
            Some(path) => load_config(path)?,
            None => WorkbenchConfig::default(),
        };
        Ok(Self {
            workbench: Workbench::new(config)?,
        })
    }

    /// Clear every workspace and load a recording into "Sandbox"
    ///
    /// Args:
    ///     source_name: Name used in the signal label
    ///     data: Array shaped (channels, samples)
    ///     channel_names: Optional names, CH1..CHn by default
    ///
    /// Returns:
    ///     Name of the created signal
    #[pyo3(signature = (source_name, data, channel_names=None))]
    fn open_acquisition(
        &mut self,
        source_name: &str,
        data: PyReadonlyArray2<f64>,
        channel_names: Option<Vec<String>>,
    ) -> PyResult<String> {
        let mut acquisition = Acquisition::new(source_name, data.as_array().to_owned());
        if let Some(names) = channel_names {
            acquisition = acquisition.with_channel_names(names);
        }
        Ok(self.workbench.open_acquisition(&acquisition)?)
    }

    /// Run the spike detector
    ///
    /// Args:
    ///     workspace: Source workspace
    ///     signal: Source signal
    ///     channels: Channels to analyse, all channels holding the signal by default
    ///     parameters: Dict of parameter overrides on top of the last used ones
    ///     progress: Optional callable receiving a percentage per channel
    ///
    /// Returns:
    ///     Dict with channels, rates, mask location and export path
    #[pyo3(signature = (workspace, signal, channels=None, parameters=None, progress=None))]
    fn detect_spikes<'py>(
        &mut self,
        py: Python<'py>,
        workspace: &str,
        signal: &str,
        channels: Option<Vec<String>>,
        parameters: Option<&PyDict>,
        progress: Option<PyObject>,
    ) -> PyResult<&'py PyDict> {
        let channels = match channels {
            Some(channels) => channels,
            None => {
                let store = self.workbench.registry().store(workspace)?;
                store
                    .channels()
                    .iter()
                    .filter(|ch| store.get(ch, signal).is_some())
                    .cloned()
                    .collect()
            }
        };

        let mut params = self
            .workbench
            .session()
            .parameters_or(&self.workbench.config().detection);
        if let Some(overrides) = parameters {
            for (key, value) in overrides.iter() {
                let key: &str = key.extract()?;
                match key {
                    "remove_offset" => params.remove_offset = value.extract()?,
                    "remove_supply" => params.remove_supply = value.extract()?,
                    "bpf_lowcut" => params.bpf_lowcut = value.extract()?,
                    "bpf_highcut" => params.bpf_highcut = value.extract()?,
                    "window" => params.window = value.extract()?,
                    "prev_seconds" => params.prev_seconds = value.extract()?,
                    "hmt_larger" => params.hmt_larger = value.extract()?,
                    "hmt_larger_mean" => params.hmt_larger_mean = value.extract()?,
                    other => {
                        return Err(PyKeyError::new_err(format!("unknown parameter '{}'", other)))
                    }
                }
            }
        }

        let selection = Selection::new().with(workspace, signal, &channels);
        let mut report_progress = |percent: u8| {
            if let Some(callback) = &progress {
                if let Err(e) = callback.call1(py, (percent,)) {
                    log::warn!("progress callback failed: {}", e);
                }
            }
        };
        let report = self
            .workbench
            .detect_spikes(&selection, Some(params), &mut report_progress)?;

        let result = PyDict::new(py);
        result.set_item("channels", report.channels.clone())?;
        result.set_item("rates", PyArray1::from_vec(py, report.rates.clone()))?;
        result.set_item("mask_workspace", &report.mask.0)?;
        result.set_item("mask_signal", &report.mask.1)?;
        match &report.export {
            ExportOutcome::Written(path) => {
                result.set_item("export_path", path.display().to_string())?
            }
            _ => result.set_item("export_path", py.None())?,
        }
        result.set_item("parameters", parameters_to_dict(py, &report.parameters)?)?;
        Ok(result)
    }

    /// Payload of one cell
    ///
    /// Returns:
    ///     1-D array, 2-D array, or (frequencies, times, magnitude) tuple
    fn signal(&self, py: Python<'_>, workspace: &str, signal: &str, channel: &str) -> PyResult<PyObject> {
        let store = self.workbench.registry().store(workspace)?;
        let payload = store.get(channel, signal).ok_or_else(|| {
            PyKeyError::new_err(format!("no '{}' on {} in '{}'", signal, channel, workspace))
        })?;

        Ok(match payload {
            Payload::Series(series) => series.clone().into_pyarray(py).to_object(py),
            Payload::Matrix(matrix) => matrix.clone().into_pyarray(py).to_object(py),
            Payload::TimeFrequency(tf) => (
                tf.frequencies.clone().into_pyarray(py),
                tf.times.clone().into_pyarray(py),
                tf.magnitude.clone().into_pyarray(py),
            )
                .to_object(py),
        })
    }

    /// Workspace names in creation order
    fn workspaces(&self) -> Vec<String> {
        self.workbench.registry().workspace_names().to_vec()
    }

    /// Structure of one workspace
    ///
    /// Args:
    ///     workspace: Workspace name
    ///     by_channel: Key by channel instead of by signal
    ///
    /// Returns:
    ///     Dict mapping signal to channels (or channel to signals)
    #[pyo3(signature = (workspace, by_channel=false))]
    fn structure<'py>(&self, py: Python<'py>, workspace: &str, by_channel: bool) -> PyResult<&'py PyDict> {
        let orientation = if by_channel {
            Orientation::ByChannel
        } else {
            Orientation::BySignal
        };
        let store = self.workbench.registry().store(workspace)?;
        let dict = PyDict::new(py);
        for (key, members) in store.structure(orientation) {
            dict.set_item(key, members)?;
        }
        Ok(dict)
    }

    /// Parameters of the previous detector run, None before the first run
    fn last_parameters<'py>(&self, py: Python<'py>) -> PyResult<Option<&'py PyDict>> {
        self.workbench
            .session()
            .last_parameters()
            .map(|params| parameters_to_dict(py, params))
            .transpose()
    }
}
