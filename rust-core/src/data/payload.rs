//! Numeric payloads held in a signal store cell

use ndarray::{Array1, Array2};

/// Coarse shape of a cell value
///
/// Every channel of one signal must hold the same shape class; the store
/// rejects writes that would mix them.
pub trait ShapeClass {
    fn shape_class(&self) -> &'static str;
}

/// Explicit-axis time-frequency magnitude (e.g. STFT output)
#[derive(Debug, Clone, PartialEq)]
pub struct TimeFrequency {
    /// Frequency axis in Hz, one entry per magnitude row
    pub frequencies: Array1<f64>,

    /// Time axis in samples, one entry per magnitude column
    pub times: Array1<f64>,

    /// Magnitude matrix shaped (frequencies, times)
    pub magnitude: Array2<f64>,
}

/// One (channel, signal) value
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Sample values over the recording
    Series(Array1<f64>),

    /// 2-D magnitude matrix (e.g. a scalogram, scales x samples)
    Matrix(Array2<f64>),

    /// Frequency axis, time axis and magnitude matrix
    TimeFrequency(TimeFrequency),
}

impl Payload {
    pub fn as_series(&self) -> Option<&Array1<f64>> {
        match self {
            Payload::Series(series) => Some(series),
            _ => None,
        }
    }

    pub fn as_matrix(&self) -> Option<&Array2<f64>> {
        match self {
            Payload::Matrix(matrix) => Some(matrix),
            _ => None,
        }
    }

    pub fn as_time_frequency(&self) -> Option<&TimeFrequency> {
        match self {
            Payload::TimeFrequency(tf) => Some(tf),
            _ => None,
        }
    }

    /// Number of samples along the time axis
    pub fn time_len(&self) -> usize {
        match self {
            Payload::Series(series) => series.len(),
            Payload::Matrix(matrix) => matrix.ncols(),
            Payload::TimeFrequency(tf) => tf.times.len(),
        }
    }
}

impl ShapeClass for Payload {
    fn shape_class(&self) -> &'static str {
        match self {
            Payload::Series(_) => "1-D series",
            Payload::Matrix(_) => "2-D matrix",
            Payload::TimeFrequency(_) => "time-frequency",
        }
    }
}

impl From<Vec<f64>> for Payload {
    fn from(samples: Vec<f64>) -> Self {
        Payload::Series(Array1::from(samples))
    }
}

impl From<Array1<f64>> for Payload {
    fn from(samples: Array1<f64>) -> Self {
        Payload::Series(samples)
    }
}

impl From<Array2<f64>> for Payload {
    fn from(matrix: Array2<f64>) -> Self {
        Payload::Matrix(matrix)
    }
}

impl From<TimeFrequency> for Payload {
    fn from(tf: TimeFrequency) -> Self {
        Payload::TimeFrequency(tf)
    }
}
