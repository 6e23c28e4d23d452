//! Window functions for spectral analysis

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::str::FromStr;

use crate::error::WorkbenchError;

const BLACKMAN: [f64; 3] = [0.42, 0.5, 0.08];
const FLATTOP: [f64; 5] = [0.21557895, 0.41663158, 0.277263158, 0.083578947, 0.006947368];
const BLACKMAN_HARRIS: [f64; 4] = [0.35875, 0.48829, 0.14128, 0.01168];
const NUTTALL: [f64; 4] = [0.3635819, 0.4891775, 0.1365995, 0.0106411];

/// Window function types
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowType {
    /// Hann window: w[n] = 0.5 - 0.5*cos(2πn/(M-1))
    Hann,

    /// Hamming window: w[n] = 0.54 - 0.46*cos(2πn/(M-1))
    Hamming,

    /// Blackman window: w[n] = 0.42 - 0.5*cos(2πn/(M-1)) + 0.08*cos(4πn/(M-1))
    Blackman,

    /// Bartlett window: w[n] = 1 - |2n/(M-1) - 1|, zero endpoints
    Bartlett,

    /// Triangle without zero endpoints
    Triang,

    /// Rectangular window (no windowing)
    Rectangular,

    /// 5-term cosine sum with a flat passband
    Flattop,

    /// Piecewise cubic (de la Vallée Poussin)
    Parzen,

    Bohman,

    /// Minimum 4-term Blackman-Harris
    BlackmanHarris,

    /// Nuttall's minimum 4-term cosine sum
    Nuttall,

    /// Modified Bartlett-Hann
    BartHann,

    /// Kaiser window with shape parameter beta
    Kaiser(f64),

    /// Gaussian window with standard deviation in samples
    Gaussian(f64),
}

impl FromStr for WindowType {
    type Err = WorkbenchError;

    /// Parse a window name; Kaiser and Gaussian take their parameter after a
    /// colon or comma, e.g. `"kaiser:8.6"` or `"gaussian,7"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let (name, param) = match lower.split_once(|c| c == ':' || c == ',') {
            Some((name, param)) => (name.trim(), Some(param.trim())),
            None => (lower.as_str(), None),
        };
        let parameter = |what: &str| -> Result<f64, WorkbenchError> {
            param
                .ok_or_else(|| WorkbenchError::invalid(format!("window '{}' needs {}", name, what)))?
                .parse::<f64>()
                .map_err(|_| WorkbenchError::invalid(format!("invalid {} for window '{}'", what, name)))
        };

        let window = match name {
            "hann" | "hanning" => WindowType::Hann,
            "hamming" => WindowType::Hamming,
            "blackman" => WindowType::Blackman,
            "bartlett" => WindowType::Bartlett,
            "triang" | "triangle" | "triangular" => WindowType::Triang,
            "rectangular" | "boxcar" => WindowType::Rectangular,
            "flattop" => WindowType::Flattop,
            "parzen" => WindowType::Parzen,
            "bohman" => WindowType::Bohman,
            "blackmanharris" => WindowType::BlackmanHarris,
            "nuttall" => WindowType::Nuttall,
            "barthann" => WindowType::BartHann,
            "kaiser" => WindowType::Kaiser(parameter("beta")?),
            "gaussian" => {
                let std = parameter("std")?;
                if !(std > 0.0) {
                    return Err(WorkbenchError::invalid("gaussian std must be positive"));
                }
                WindowType::Gaussian(std)
            }
            other => return Err(WorkbenchError::invalid(format!("unknown window '{}'", other))),
        };
        if param.is_some() && !matches!(window, WindowType::Kaiser(_) | WindowType::Gaussian(_)) {
            return Err(WorkbenchError::invalid(format!("window '{}' takes no parameter", name)));
        }
        Ok(window)
    }
}

/// Σ (-1)^k a_k cos(2πkn/(M-1))
fn general_cosine(a: &[f64], n: f64, m: f64) -> f64 {
    a.iter()
        .enumerate()
        .map(|(k, &ak)| {
            let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
            sign * ak * (2.0 * PI * k as f64 * n / (m - 1.0)).cos()
        })
        .sum()
}

/// Modified Bessel function of the first kind, order zero (power series)
fn bessel_i0(x: f64) -> f64 {
    let quarter_sq = x * x / 4.0;
    let mut term = 1.0;
    let mut sum = 1.0;
    for k in 1..500 {
        term *= quarter_sq / (k as f64 * k as f64);
        sum += term;
        if term < sum * 1e-17 {
            break;
        }
    }
    sum
}

/// Generate symmetric window coefficients
///
/// # Arguments
/// * `window_type` - Type of window function
/// * `length` - Number of samples (M)
///
/// # Returns
/// Vector of window coefficients w[n] for n = 0..M-1
pub fn generate_window(window_type: WindowType, length: usize) -> Vec<f64> {
    if length <= 1 {
        return vec![1.0; length];
    }

    let m = length as f64;
    let half = (m - 1.0) / 2.0;
    (0..length)
        .map(|i| {
            let n = i as f64;
            let x = n / (m - 1.0);
            match window_type {
                WindowType::Hann => 0.5 - 0.5 * (2.0 * PI * x).cos(),
                WindowType::Hamming => 0.54 - 0.46 * (2.0 * PI * x).cos(),
                WindowType::Blackman => general_cosine(&BLACKMAN, n, m),
                WindowType::Bartlett => 1.0 - (2.0 * x - 1.0).abs(),
                WindowType::Triang => {
                    let denom = if length % 2 == 1 { m + 1.0 } else { m };
                    1.0 - (2.0 * n - (m - 1.0)).abs() / denom
                }
                WindowType::Rectangular => 1.0,
                WindowType::Flattop => general_cosine(&FLATTOP, n, m),
                WindowType::Parzen => {
                    let d = (n - half).abs();
                    let r = d / (m / 2.0);
                    if d <= half / 2.0 {
                        1.0 - 6.0 * r * r + 6.0 * r * r * r
                    } else {
                        2.0 * (1.0 - r).powi(3)
                    }
                }
                WindowType::Bohman => {
                    if i == 0 || i == length - 1 {
                        0.0
                    } else {
                        let f = (2.0 * x - 1.0).abs();
                        (1.0 - f) * (PI * f).cos() + (PI * f).sin() / PI
                    }
                }
                WindowType::BlackmanHarris => general_cosine(&BLACKMAN_HARRIS, n, m),
                WindowType::Nuttall => general_cosine(&NUTTALL, n, m),
                WindowType::BartHann => {
                    let f = (x - 0.5).abs();
                    0.62 - 0.48 * f + 0.38 * (2.0 * PI * f).cos()
                }
                WindowType::Kaiser(beta) => {
                    let r = (n - half) / half;
                    bessel_i0(beta * (1.0 - r * r).max(0.0).sqrt()) / bessel_i0(beta)
                }
                WindowType::Gaussian(std) => {
                    let d = n - half;
                    (-(d * d) / (2.0 * std * std)).exp()
                }
            }
        })
        .collect()
}

/// Generate a periodic window for FFT use
///
/// Equivalent to the symmetric window of length M+1 with its last sample
/// dropped, so that overlapping frames sum smoothly.
pub fn generate_periodic_window(window_type: WindowType, length: usize) -> Vec<f64> {
    if length <= 1 {
        return vec![1.0; length];
    }
    let mut window = generate_window(window_type, length + 1);
    window.truncate(length);
    window
}
