//! Applying windows to segments before the FFT

use crate::filters::windows::{WindowType, generate_periodic_window};

/// Periodic analysis window with its amplitude scale
#[derive(Debug, Clone)]
pub struct AnalysisWindow {
    coefficients: Vec<f64>,
    scale: f64,
}

impl AnalysisWindow {
    /// Build a periodic window of `length` samples
    ///
    /// The scale is `1 / sum(w)`, so a full-scale sinusoid on a bin centre
    /// reads as half its amplitude in the one-sided spectrum.
    pub fn periodic(window_type: WindowType, length: usize) -> Self {
        let coefficients = generate_periodic_window(window_type, length);
        let sum: f64 = coefficients.iter().sum();
        let scale = if sum != 0.0 { 1.0 / sum } else { 1.0 };
        Self { coefficients, scale }
    }

    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Multiply `segment` by the window into `out`
    pub fn apply_into(&self, segment: &[f64], out: &mut [f64]) {
        for ((o, &s), &w) in out.iter_mut().zip(segment).zip(&self.coefficients) {
            *o = s * w;
        }
    }
}
