//! Short-time Fourier magnitude
//!
//! Frames follow the usual zero-boundary convention: the series is extended
//! by `nperseg/2` zeros on both ends and zero-padded at the tail to a whole
//! number of hops, so the first frame is centred on sample 0.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::fft::FftEngine;
use super::windowing::AnalysisWindow;
use crate::data::TimeFrequency;
use crate::error::{Result, WorkbenchError};
use crate::filters::windows::WindowType;

/// STFT configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StftConfig {
    /// Segment length in samples
    pub nperseg: usize,

    /// Samples shared by consecutive segments, must be < nperseg
    pub noverlap: usize,

    /// Analysis window (periodic)
    pub window: WindowType,

    /// Rows above this frequency (Hz) are dropped
    pub max_frequency: f64,
}

impl Default for StftConfig {
    fn default() -> Self {
        Self {
            nperseg: 100,
            noverlap: 50,
            window: WindowType::Hann,
            max_frequency: 50.0,
        }
    }
}

/// Compute |STFT| of one series
///
/// # Arguments
/// * `signal` - Input series
/// * `sample_rate` - Sampling rate in Hz
/// * `config` - Segmenting parameters
///
/// # Returns
/// Frequency axis (Hz), time axis (samples) and magnitude (frequencies x frames)
pub fn stft_magnitude(signal: &[f64], sample_rate: f64, config: &StftConfig) -> Result<TimeFrequency> {
    if signal.is_empty() {
        return Err(WorkbenchError::invalid("STFT of an empty series"));
    }
    if config.nperseg == 0 {
        return Err(WorkbenchError::invalid("nperseg must be positive"));
    }

    let mut nperseg = config.nperseg;
    if nperseg > signal.len() {
        log::warn!(
            "nperseg = {} is greater than input length = {}, using nperseg = {}",
            nperseg,
            signal.len(),
            signal.len()
        );
        nperseg = signal.len();
    }
    if config.noverlap >= nperseg {
        return Err(WorkbenchError::invalid(format!(
            "noverlap ({}) must be less than nperseg ({})",
            config.noverlap, nperseg
        )));
    }
    let step = nperseg - config.noverlap;

    // Zero boundary on both ends, then pad to a whole number of hops
    let half = nperseg / 2;
    let mut extended = vec![0.0; half];
    extended.extend_from_slice(signal);
    extended.extend(std::iter::repeat(0.0).take(half));
    let excess = (extended.len() - nperseg) % step;
    if excess != 0 {
        extended.extend(std::iter::repeat(0.0).take(step - excess));
    }
    let n_frames = (extended.len() - nperseg) / step + 1;

    let mut engine = FftEngine::new(nperseg);
    let all_frequencies = engine.frequency_axis_hz(sample_rate);
    let n_rows = all_frequencies
        .iter()
        .take_while(|&&f| f <= config.max_frequency)
        .count();

    let window = AnalysisWindow::periodic(config.window, nperseg);
    let mut segment = vec![0.0; nperseg];
    let mut magnitude = Array2::<f64>::zeros((n_rows, n_frames));

    for frame in 0..n_frames {
        let start = frame * step;
        window.apply_into(&extended[start..start + nperseg], &mut segment);
        let spectrum = engine.compute_spectrum(&segment)?;
        for (row, bin) in spectrum.iter().take(n_rows).enumerate() {
            magnitude[[row, frame]] = bin.norm() * window.scale();
        }
    }

    let times: Array1<f64> = (0..n_frames).map(|frame| (frame * step) as f64).collect();
    Ok(TimeFrequency {
        frequencies: Array1::from(all_frequencies[..n_rows].to_vec()),
        times,
        magnitude,
    })
}
