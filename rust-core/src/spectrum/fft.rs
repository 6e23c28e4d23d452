//! FFT engine using realfft for real-valued signals

use num_complex::Complex64;
use realfft::{RealFftPlanner, RealToComplex};
use std::sync::Arc;

use crate::error::{Result, WorkbenchError};

/// FFT engine for real-valued signals
pub struct FftEngine {
    /// FFT size (number of samples)
    fft_size: usize,

    /// Real FFT processor
    r2c: Arc<dyn RealToComplex<f64>>,

    /// Reusable input buffer
    input_buffer: Vec<f64>,

    /// Reusable output buffer (complex spectrum)
    output_buffer: Vec<Complex64>,
}

impl FftEngine {
    /// Create new FFT engine
    ///
    /// # Arguments
    /// * `fft_size` - FFT size (number of samples)
    pub fn new(fft_size: usize) -> Self {
        let mut planner = RealFftPlanner::<f64>::new();
        let r2c = planner.plan_fft_forward(fft_size);

        let input_buffer = r2c.make_input_vec();
        let output_buffer = r2c.make_output_vec();

        Self {
            fft_size,
            r2c,
            input_buffer,
            output_buffer,
        }
    }

    /// Compute the one-sided complex spectrum
    ///
    /// # Arguments
    /// * `signal` - Input signal (zero-padded or truncated to fft_size)
    ///
    /// # Returns
    /// X[k] for k = 0..=fft_size/2
    pub fn compute_spectrum(&mut self, signal: &[f64]) -> Result<&[Complex64]> {
        let copy_len = signal.len().min(self.fft_size);
        self.input_buffer[..copy_len].copy_from_slice(&signal[..copy_len]);
        self.input_buffer[copy_len..].fill(0.0);

        self.r2c
            .process(&mut self.input_buffer, &mut self.output_buffer)
            .map_err(|e| WorkbenchError::invalid(format!("FFT processing failed: {}", e)))?;

        Ok(&self.output_buffer)
    }

    /// Compute FFT and return magnitude spectrum |X[k]|
    pub fn compute_magnitude(&mut self, signal: &[f64]) -> Result<Vec<f64>> {
        Ok(self.compute_spectrum(signal)?.iter().map(|c| c.norm()).collect())
    }

    /// Get FFT size
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Get number of frequency bins (fft_size/2 + 1 for real FFT)
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// Frequency axis in Hz for the given sampling rate
    pub fn frequency_axis_hz(&self, sample_rate: f64) -> Vec<f64> {
        (0..self.num_bins())
            .map(|bin| bin as f64 * sample_rate / self.fft_size as f64)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_fft_dc_signal() {
        let mut fft = FftEngine::new(1024);

        let signal = vec![1.0; 100];
        let spectrum = fft.compute_magnitude(&signal).unwrap();

        // DC bin carries the sum of the samples
        assert!((spectrum[0] - 100.0).abs() < 1e-9);
        assert!(spectrum[10] < 100.0);
    }

    #[test]
    fn test_fft_sine_wave() {
        let mut fft = FftEngine::new(512);

        // 32 Hz at fs = 512 lands exactly on bin 32
        let signal: Vec<f64> = (0..512)
            .map(|n| (2.0 * PI * 32.0 * n as f64 / 512.0).sin())
            .collect();

        let spectrum = fft.compute_magnitude(&signal).unwrap();
        let (peak_bin, &peak_mag) = spectrum
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .unwrap();

        assert_eq!(peak_bin, 32);
        assert!((peak_mag - 256.0).abs() < 1e-6);
    }

    #[test]
    fn test_frequency_axis() {
        let fft = FftEngine::new(100);
        let freqs = fft.frequency_axis_hz(512.0);

        assert_eq!(freqs.len(), 51);
        assert_eq!(freqs[0], 0.0);
        assert!((freqs[1] - 5.12).abs() < 1e-12);
        assert!((freqs[50] - 256.0).abs() < 1e-10);
    }
}
