//! Spike detector parameter record

use serde::{Deserialize, Serialize};

use crate::error::{Result, WorkbenchError};

/// Settings of one detector invocation
///
/// Captured when the detector runs and echoed back so the next run can
/// start from the same values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpikeParameters {
    /// Subtract each channel's mean first
    pub remove_offset: bool,

    /// Apply the mains band-stop filter
    pub remove_supply: bool,

    /// Band-pass lower edge (Hz)
    pub bpf_lowcut: f64,

    /// Band-pass upper edge (Hz)
    pub bpf_highcut: f64,

    /// Window length in samples
    pub window: usize,

    /// Length of the trailing baseline in seconds
    pub prev_seconds: f64,

    /// Required ratio over the trailing baseline mean
    pub hmt_larger: f64,

    /// Required ratio over the channel mean
    pub hmt_larger_mean: f64,
}

impl Default for SpikeParameters {
    fn default() -> Self {
        Self {
            remove_offset: true,
            remove_supply: true,
            bpf_lowcut: 8.0,
            bpf_highcut: 30.0,
            window: 25,
            prev_seconds: 5.0,
            hmt_larger: 3.0,
            hmt_larger_mean: 2.0,
        }
    }
}

impl SpikeParameters {
    pub fn validate(&self) -> Result<()> {
        if self.window == 0 {
            return Err(WorkbenchError::invalid("window must be at least 1 sample"));
        }
        if !(self.prev_seconds.is_finite() && self.prev_seconds >= 0.0) {
            return Err(WorkbenchError::invalid(format!(
                "prev_seconds must be a non-negative number, got {}",
                self.prev_seconds
            )));
        }
        if !self.hmt_larger.is_finite() || !self.hmt_larger_mean.is_finite() {
            return Err(WorkbenchError::invalid("threshold ratios must be finite"));
        }
        Ok(())
    }

    /// Number of trailing windows forming the baseline, `floor(prev_seconds * fs / window)`
    pub fn prev_windows(&self, sample_rate: f64) -> usize {
        if self.window == 0 {
            return 0;
        }
        let windows = self.prev_seconds * sample_rate / self.window as f64;
        if windows.is_finite() && windows > 0.0 {
            windows.floor() as usize
        } else {
            0
        }
    }

    /// `<window>_<prev_seconds>_<hmt_larger>.csv`, floats spelled by [`float_repr`]
    pub fn export_file_name(&self) -> String {
        format!(
            "{}_{}_{}.csv",
            self.window,
            float_repr(self.prev_seconds),
            float_repr(self.hmt_larger)
        )
    }
}

/// Shortest round-trip spelling of `value` in the `5.0` / `1e-05` / `1e+16` / `nan` style
///
/// Debug formatting already picks the same digits and switches to exponent form
/// at the same magnitudes; only the exponent and NaN spellings differ.
pub fn float_repr(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    let debug = format!("{:?}", value);
    match debug.split_once('e') {
        Some((mantissa, exponent)) => match exponent.parse::<i32>() {
            Ok(exp) => {
                let sign = if exp < 0 { '-' } else { '+' };
                format!("{}e{}{:02}", mantissa, sign, exp.abs())
            }
            Err(_) => debug,
        },
        None => debug,
    }
}
