//! PyO3 bindings for Python integration

use pyo3::exceptions::{PyIOError, PyKeyError, PyValueError};
use pyo3::prelude::*;

use crate::error::WorkbenchError;

mod filter_bindings;
mod workbench_bindings;

impl From<WorkbenchError> for PyErr {
    fn from(err: WorkbenchError) -> PyErr {
        match err {
            WorkbenchError::UnknownWorkspace(_)
            | WorkbenchError::UnknownSignal { .. }
            | WorkbenchError::UnknownChannel(_) => PyKeyError::new_err(err.to_string()),
            WorkbenchError::Io(_) | WorkbenchError::Csv(_) => PyIOError::new_err(err.to_string()),
            _ => PyValueError::new_err(err.to_string()),
        }
    }
}

/// Python module definition
#[pymodule]
fn ecog_workbench(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<workbench_bindings::PyWorkbench>()?;
    m.add_class::<filter_bindings::PyTransferFunction>()?;
    m.add_function(wrap_pyfunction!(filter_bindings::design_filter, m)?)?;
    m.add_function(wrap_pyfunction!(filter_bindings::filter_signal, m)?)?;

    Ok(())
}
