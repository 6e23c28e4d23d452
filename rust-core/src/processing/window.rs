//! Windowize-then-fill driver
//!
//! A series of length L is cut into `floor(L/W)` non-overlapping windows of
//! W samples; trailing samples that do not fill a window are dropped. Each
//! window is reduced to one scalar, which is either kept as is (reduced form)
//! or broadcast back over its window (filled form, length `floor(L/W)*W`).

use serde::{Deserialize, Serialize};

use super::progress::{Progress, ProgressSteps};
use crate::error::{Result, WorkbenchError};

/// Scalar summary of one window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reduction {
    /// Mean
    Average,

    /// Σx²
    Energy,

    /// Σx² / W
    Power,

    /// max − min
    PeakToPeak,

    /// Σ(x − mean)² / W (population)
    Variance,

    /// −Σ x·ln|x|
    Entropy,

    /// (Σd³ / W) / (Σd² / (W − 1)^{3/2}), d = x − mean
    Skewness,
}

impl Reduction {
    /// Display name, also used as the default output signal name
    pub fn name(&self) -> &'static str {
        match self {
            Reduction::Average => "Average",
            Reduction::Energy => "Energy",
            Reduction::Power => "Power",
            Reduction::PeakToPeak => "Peak-to-peak",
            Reduction::Variance => "Variance",
            Reduction::Entropy => "Entropy",
            Reduction::Skewness => "Skewness",
        }
    }

    /// Reduce one window; the result may be non-finite
    pub fn reduce(&self, window: &[f64]) -> f64 {
        let w = window.len() as f64;
        let mean = || window.iter().sum::<f64>() / w;
        let sum_sq = || window.iter().map(|x| x * x).sum::<f64>();

        match self {
            Reduction::Average => mean(),
            Reduction::Energy => sum_sq(),
            Reduction::Power => sum_sq() / w,
            Reduction::PeakToPeak => {
                let max = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let min = window.iter().copied().fold(f64::INFINITY, f64::min);
                max - min
            }
            Reduction::Variance => {
                let m = mean();
                window.iter().map(|x| (x - m).powi(2)).sum::<f64>() / w
            }
            Reduction::Entropy => -window.iter().map(|x| x * x.abs().ln()).sum::<f64>(),
            Reduction::Skewness => {
                let m = mean();
                let cubed: f64 = window.iter().map(|x| (x - m).powi(3)).sum();
                let squared: f64 = window.iter().map(|x| (x - m).powi(2)).sum();
                (cubed / w) / (squared / (w - 1.0).powf(1.5))
            }
        }
    }
}

/// A reduction applied over fixed windows of `window` samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowedOperator {
    pub reduction: Reduction,
    pub window: usize,
}

impl WindowedOperator {
    pub fn new(reduction: Reduction, window: usize) -> Result<Self> {
        if window == 0 {
            return Err(WorkbenchError::invalid("window length must be at least 1 sample"));
        }
        Ok(Self { reduction, window })
    }

    /// Number of whole windows in a series of `len` samples
    pub fn window_count(&self, len: usize) -> usize {
        if self.window == 0 {
            0
        } else {
            len / self.window
        }
    }

    /// One scalar per whole window
    ///
    /// Non-finite results (log of zero in the entropy, a zero spread in the
    /// skewness) are replaced by 0.0 and logged.
    pub fn reduce(&self, series: &[f64]) -> Vec<f64> {
        let count = self.window_count(series.len());
        let mut degenerate = 0usize;

        let values = series
            .chunks_exact(self.window.max(1))
            .take(count)
            .map(|chunk| {
                let value = self.reduction.reduce(chunk);
                if value.is_finite() {
                    value
                } else {
                    degenerate += 1;
                    0.0
                }
            })
            .collect();

        if degenerate > 0 {
            log::warn!(
                "{}: {} of {} windows gave a non-finite result, substituted 0.0",
                self.reduction.name(),
                degenerate,
                count
            );
        }
        values
    }

    /// Reduce, then broadcast each scalar back over its window
    pub fn apply(&self, series: &[f64]) -> Vec<f64> {
        fill_back(&self.reduce(series), self.window)
    }

    /// Apply to every channel, reporting progress after each one
    pub fn apply_all(&self, channels: &[&[f64]], progress: &mut dyn Progress) -> Vec<Vec<f64>> {
        let mut steps = ProgressSteps::new(channels.len());
        channels
            .iter()
            .map(|series| {
                let out = self.apply(series);
                steps.advance(progress);
                out
            })
            .collect()
    }
}

/// Repeat each value `window` times
pub fn fill_back(values: &[f64], window: usize) -> Vec<f64> {
    values
        .iter()
        .flat_map(|&v| std::iter::repeat(v).take(window))
        .collect()
}
