//! Continuous wavelet transform with the Ricker (Mexican hat) wavelet
//!
//! Each scale is an FFT convolution of the series with a sampled wavelet,
//! cropped to the centred "same" part.

use ndarray::Array2;
use rustfft::{num_complex::Complex, FftPlanner};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::{Result, WorkbenchError};

/// Inclusive integer range of wavelet widths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CwtConfig {
    pub min_scale: usize,
    pub max_scale: usize,
}

impl Default for CwtConfig {
    fn default() -> Self {
        Self {
            min_scale: 1,
            max_scale: 30,
        }
    }
}

/// Ricker wavelet sampled at `points` positions centred on zero
///
/// `A (1 - x²/a²) exp(-x²/2a²)` with `A = 2 / (sqrt(3a) π^¼)`.
pub fn ricker(points: usize, a: f64) -> Vec<f64> {
    let amplitude = 2.0 / ((3.0 * a).sqrt() * PI.powf(0.25));
    let wsq = a * a;
    let centre = (points as f64 - 1.0) / 2.0;
    (0..points)
        .map(|n| {
            let xsq = (n as f64 - centre).powi(2);
            amplitude * (1.0 - xsq / wsq) * (-xsq / (2.0 * wsq)).exp()
        })
        .collect()
}

/// |CWT| of one series, shaped (scales, samples)
pub fn cwt_magnitude(signal: &[f64], config: &CwtConfig) -> Result<Array2<f64>> {
    if config.min_scale == 0 || config.min_scale > config.max_scale {
        return Err(WorkbenchError::invalid(format!(
            "scale range {}..={} must be non-empty and start at 1 or above",
            config.min_scale, config.max_scale
        )));
    }

    let len = signal.len();
    let n_scales = config.max_scale - config.min_scale + 1;
    let mut output = Array2::<f64>::zeros((n_scales, len));
    if len == 0 {
        return Ok(output);
    }

    let mut planner = FftPlanner::<f64>::new();
    for (row, width) in (config.min_scale..=config.max_scale).enumerate() {
        let points = (10 * width).min(len);
        let wavelet = ricker(points, width as f64);
        let same = convolve_same(&mut planner, signal, &wavelet);
        for (dst, value) in output.row_mut(row).iter_mut().zip(same) {
            *dst = value.abs();
        }
    }
    Ok(output)
}

/// Linear convolution via zero-padded FFTs, centred to `signal.len()` samples
fn convolve_same(planner: &mut FftPlanner<f64>, signal: &[f64], kernel: &[f64]) -> Vec<f64> {
    let full_len = signal.len() + kernel.len() - 1;
    let fft_size = full_len.next_power_of_two();
    let fft = planner.plan_fft_forward(fft_size);
    let ifft = planner.plan_fft_inverse(fft_size);

    let to_complex = |data: &[f64]| -> Vec<Complex<f64>> {
        let mut buffer = vec![Complex::new(0.0, 0.0); fft_size];
        for (dst, &src) in buffer.iter_mut().zip(data) {
            *dst = Complex::new(src, 0.0);
        }
        buffer
    };

    let mut x = to_complex(signal);
    let mut h = to_complex(kernel);
    fft.process(&mut x);
    fft.process(&mut h);
    for (xi, hi) in x.iter_mut().zip(&h) {
        *xi *= hi;
    }
    ifft.process(&mut x);

    // rustfft leaves the inverse unnormalised
    let norm = 1.0 / fft_size as f64;
    let start = (kernel.len() - 1) / 2;
    x[start..start + signal.len()]
        .iter()
        .map(|c| c.re * norm)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn direct_same(signal: &[f64], kernel: &[f64]) -> Vec<f64> {
        let full_len = signal.len() + kernel.len() - 1;
        let mut full = vec![0.0; full_len];
        for (i, &s) in signal.iter().enumerate() {
            for (j, &k) in kernel.iter().enumerate() {
                full[i + j] += s * k;
            }
        }
        let start = (kernel.len() - 1) / 2;
        full[start..start + signal.len()].to_vec()
    }

    #[test]
    fn test_ricker_peak_and_symmetry() {
        let wavelet = ricker(11, 1.0);
        let amplitude = 2.0 / (3f64.sqrt() * PI.powf(0.25));

        assert!((wavelet[5] - amplitude).abs() < 1e-12);
        assert!((wavelet[0] - wavelet[10]).abs() < 1e-12);
        // Zero crossing at |x| = a
        assert!(wavelet[4].abs() < 1e-12);
    }

    #[test]
    fn test_fft_convolution_matches_direct() {
        let signal: Vec<f64> = (0..37).map(|i| ((i * 7) % 11) as f64 - 5.0).collect();
        let kernel = ricker(10, 2.0);

        let mut planner = FftPlanner::new();
        let fast = convolve_same(&mut planner, &signal, &kernel);
        let slow = direct_same(&signal, &kernel);

        for (f, s) in fast.iter().zip(slow.iter()) {
            assert!((f - s).abs() < 1e-9);
        }
    }

    #[test]
    fn test_cwt_shape_and_kernel_clamp() {
        let signal = vec![1.0; 20];
        let out = cwt_magnitude(&signal, &CwtConfig { min_scale: 1, max_scale: 5 }).unwrap();

        assert_eq!(out.dim(), (5, 20));
        assert!(out.iter().all(|v| *v >= 0.0));
    }

    #[test]
    fn test_invalid_scales() {
        assert!(cwt_magnitude(&[1.0], &CwtConfig { min_scale: 0, max_scale: 3 }).is_err());
        assert!(cwt_magnitude(&[1.0], &CwtConfig { min_scale: 4, max_scale: 3 }).is_err());
    }
}
