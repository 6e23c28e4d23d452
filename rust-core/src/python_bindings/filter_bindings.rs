//! Python bindings for IIR filter design

use numpy::{PyArray1, PyReadonlyArray1};
use pyo3::prelude::*;

use crate::filters::{lfilter, FilterBand, FilterFamily, IirDesign, TransferFunction};

/// Designed digital filter exposed to Python
#[pyclass(name = "TransferFunction")]
#[derive(Clone)]
pub struct PyTransferFunction {
    tf: TransferFunction,
}

#[pymethods]
impl PyTransferFunction {
    /// Numerator coefficients
    #[getter]
    fn b<'py>(&self, py: Python<'py>) -> &'py PyArray1<f64> {
        PyArray1::from_slice(py, &self.tf.b)
    }

    /// Denominator coefficients, a[0] == 1
    #[getter]
    fn a<'py>(&self, py: Python<'py>) -> &'py PyArray1<f64> {
        PyArray1::from_slice(py, &self.tf.a)
    }

    /// Magnitude (dB) and unwrapped phase (rad)
    ///
    /// Args:
    ///     sample_rate: Sampling rate in Hz
    ///     frequencies: Frequencies in Hz, an even grid over [0, fs/2) when omitted
    ///     n_points: Grid size used without explicit frequencies
    ///
    /// Returns:
    ///     Tuple (frequencies, magnitude_db, phase)
    #[pyo3(signature = (sample_rate, frequencies=None, n_points=512))]
    fn response<'py>(
        &self,
        py: Python<'py>,
        sample_rate: f64,
        frequencies: Option<PyReadonlyArray1<f64>>,
        n_points: usize,
    ) -> PyResult<(&'py PyArray1<f64>, &'py PyArray1<f64>, &'py PyArray1<f64>)> {
        let response = match frequencies {
            Some(freqs) => self
                .tf
                .frequency_response(&freqs.as_array().to_vec(), sample_rate),
            None => self.tf.frequency_response_grid(n_points, sample_rate),
        };
        Ok((
            PyArray1::from_vec(py, response.frequencies),
            PyArray1::from_vec(py, response.magnitude_db),
            PyArray1::from_vec(py, response.phase),
        ))
    }

    fn __repr__(&self) -> String {
        format!("TransferFunction(b={:?}, a={:?})", self.tf.b, self.tf.a)
    }
}

/// Design a Butterworth or Bessel filter
/// 
/// Args:
///     family: "butterworth" / "butter" or "bessel"
///     kind: "lowpass", "highpass", "bandpass" or "bandstop"
///     order: Filter order
///     edges: Band edges in Hz (one for low/high-pass, two otherwise)
///     sample_rate: Sampling rate in Hz
/// 
/// Returns:
///     TransferFunction with b and a coefficients
#[pyfunction]
#[pyo3(signature = (family, kind, order, edges, sample_rate=512.0))]
pub fn design_filter(
    family: &str,
    kind: &str,
    order: usize,
    edges: Vec<f64>,
    sample_rate: f64,
) -> PyResult<PyTransferFunction> {
    let design = IirDesign {
        family: family.parse::<FilterFamily>()?,
        order,
        band: FilterBand::from_edges(kind, &edges)?,
    };
    Ok(PyTransferFunction {
        tf: design.design(sample_rate)?,
    })
}

/// Single-pass filtering with zero initial state
#[pyfunction]
pub fn filter_signal<'py>(
    py: Python<'py>,
    tf: &PyTransferFunction,
    signal: PyReadonlyArray1<f64>,
) -> PyResult<&'py PyArray1<f64>> {
    let input = signal.as_array().to_vec();
    Ok(PyArray1::from_vec(py, lfilter(&tf.tf, &input)?))
}
