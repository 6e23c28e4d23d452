//! Trend removal

use serde::{Deserialize, Serialize};

/// What to subtract from a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetrendKind {
    /// Subtract the mean (DC offset)
    Constant,

    /// Subtract the least-squares straight line
    Linear,
}

pub fn detrend(input: &[f64], kind: DetrendKind) -> Vec<f64> {
    if input.is_empty() {
        return Vec::new();
    }

    let n = input.len() as f64;
    let mean = input.iter().sum::<f64>() / n;

    match kind {
        DetrendKind::Constant => input.iter().map(|x| x - mean).collect(),
        DetrendKind::Linear => {
            let t_mean = (n - 1.0) / 2.0;
            let (mut sxy, mut sxx) = (0.0, 0.0);
            for (i, &x) in input.iter().enumerate() {
                let dt = i as f64 - t_mean;
                sxy += dt * (x - mean);
                sxx += dt * dt;
            }
            let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };

            input
                .iter()
                .enumerate()
                .map(|(i, &x)| x - (mean + slope * (i as f64 - t_mean)))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_detrend_zero_mean() {
        let output = detrend(&[1.0, 2.0, 3.0, 6.0], DetrendKind::Constant);
        let expected = [-2.0, -1.0, 0.0, 3.0];
        for (o, e) in output.iter().zip(expected.iter()) {
            assert!((o - e).abs() < 1e-12);
        }
    }

    #[test]
    fn test_linear_detrend_removes_ramp() {
        let ramp: Vec<f64> = (0..10).map(|i| 3.0 + 0.5 * i as f64).collect();
        let output = detrend(&ramp, DetrendKind::Linear);
        assert!(output.iter().all(|x| x.abs() < 1e-12));
    }

    #[test]
    fn test_single_sample() {
        assert_eq!(detrend(&[4.0], DetrendKind::Linear), vec![0.0]);
        assert!(detrend(&[], DetrendKind::Constant).is_empty());
    }
}
