//! IIR filtering with direct form II transposed state
//!
//! Single forward pass with zero initial conditions, so block output equals
//! `scipy.signal.lfilter(b, a, x)`.

use super::design::TransferFunction;
use crate::error::{Result, WorkbenchError};

/// Stateful IIR filter processor
pub struct IirFilter {
    /// Numerator coefficients, normalised by a[0]
    b: Vec<f64>,

    /// Denominator coefficients, normalised by a[0]
    a: Vec<f64>,

    /// Delay line; the last slot stays zero so the update loop can always
    /// read z[i + 1]
    state: Vec<f64>,
}

impl IirFilter {
    /// Create a filter from transfer function coefficients
    ///
    /// # Arguments
    /// * `tf` - Coefficients b, a; `a[0]` must be non-zero
    pub fn new(tf: &TransferFunction) -> Result<Self> {
        let a0 = tf.a.first().copied().unwrap_or(0.0);
        if a0 == 0.0 || tf.b.is_empty() {
            return Err(WorkbenchError::invalid(
                "transfer function needs b coefficients and a[0] != 0",
            ));
        }

        let order = tf.a.len().max(tf.b.len());
        let mut b = vec![0.0; order];
        let mut a = vec![0.0; order];
        for (dst, src) in b.iter_mut().zip(&tf.b) {
            *dst = src / a0;
        }
        for (dst, src) in a.iter_mut().zip(&tf.a) {
            *dst = src / a0;
        }

        Ok(Self {
            b,
            a,
            state: vec![0.0; order],
        })
    }

    /// Process single sample
    ///
    /// # Arguments
    /// * `input` - Input sample x[n]
    ///
    /// # Returns
    /// Filtered output sample y[n]
    #[inline]
    pub fn process_sample(&mut self, input: f64) -> f64 {
        let n = self.b.len();
        let output = self.b[0] * input + self.state[0];

        // z[i] = b[i+1]*x - a[i+1]*y + z[i+1]
        for i in 0..n - 1 {
            self.state[i] = self.b[i + 1] * input - self.a[i + 1] * output + self.state[i + 1];
        }

        output
    }

    /// Process a block of samples
    ///
    /// # Returns
    /// Filtered output samples (same length as input)
    pub fn process_block(&mut self, input: &[f64]) -> Vec<f64> {
        input.iter().map(|&x| self.process_sample(x)).collect()
    }

    /// Reset filter state (clear delay line)
    pub fn reset(&mut self) {
        self.state.fill(0.0);
    }

    /// Filter order (length of the longer coefficient vector minus one)
    pub fn order(&self) -> usize {
        self.b.len() - 1
    }
}

/// Filter a whole series from rest
pub fn lfilter(tf: &TransferFunction, input: &[f64]) -> Result<Vec<f64>> {
    let mut filter = IirFilter::new(tf)?;
    Ok(filter.process_block(input))
}
