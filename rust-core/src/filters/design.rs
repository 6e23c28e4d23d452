//! IIR filter design using analog prototypes and the bilinear transform
//!
//! Route: analog low-pass prototype (Butterworth or phase-normalised Bessel)
//! → frequency transformation on pre-warped edges → bilinear transform →
//! transfer function coefficients.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::str::FromStr;

use crate::error::{Result, WorkbenchError};

/// Analog prototype family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterFamily {
    /// Maximally flat magnitude
    Butterworth,

    /// Maximally flat group delay, phase-normalised
    Bessel,
}

impl FromStr for FilterFamily {
    type Err = WorkbenchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "butter" | "butterworth" => Ok(FilterFamily::Butterworth),
            "bessel" => Ok(FilterFamily::Bessel),
            other => Err(WorkbenchError::invalid(format!("unknown filter family '{}'", other))),
        }
    }
}

/// Band type with its edges in Hz
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterBand {
    Lowpass(f64),
    Highpass(f64),
    Bandpass(f64, f64),
    Bandstop(f64, f64),
}

impl FilterBand {
    /// Build a band from a type name and one or two edges
    pub fn from_edges(kind: &str, edges: &[f64]) -> Result<Self> {
        match (kind.to_ascii_lowercase().as_str(), edges) {
            ("lowpass", [f]) => Ok(FilterBand::Lowpass(*f)),
            ("highpass", [f]) => Ok(FilterBand::Highpass(*f)),
            ("bandpass", [lo, hi]) => Ok(FilterBand::Bandpass(*lo, *hi)),
            ("bandstop", [lo, hi]) => Ok(FilterBand::Bandstop(*lo, *hi)),
            (kind, edges) => Err(WorkbenchError::invalid(format!(
                "band '{}' cannot take {} edge(s)",
                kind,
                edges.len()
            ))),
        }
    }

    fn edges(&self) -> Vec<f64> {
        match *self {
            FilterBand::Lowpass(f) | FilterBand::Highpass(f) => vec![f],
            FilterBand::Bandpass(lo, hi) | FilterBand::Bandstop(lo, hi) => vec![lo, hi],
        }
    }
}

/// IIR filter specification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IirDesign {
    pub family: FilterFamily,
    pub order: usize,
    pub band: FilterBand,
}

/// Digital transfer function b(z)/a(z), coefficients in descending powers of z
#[derive(Debug, Clone, PartialEq)]
pub struct TransferFunction {
    pub b: Vec<f64>,
    pub a: Vec<f64>,
}

/// Magnitude and unwrapped phase sampled at a set of frequencies
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyResponse {
    /// Frequencies in Hz
    pub frequencies: Vec<f64>,

    /// 20*log10(|H|)
    pub magnitude_db: Vec<f64>,

    /// Unwrapped phase in radians
    pub phase: Vec<f64>,
}

/// Zeros, poles and gain of an analog or digital system
struct Zpk {
    z: Vec<Complex64>,
    p: Vec<Complex64>,
    k: f64,
}

impl IirDesign {
    pub fn butterworth(order: usize, band: FilterBand) -> Self {
        Self {
            family: FilterFamily::Butterworth,
            order,
            band,
        }
    }

    pub fn bessel(order: usize, band: FilterBand) -> Self {
        Self {
            family: FilterFamily::Bessel,
            order,
            band,
        }
    }

    /// Design the digital filter for sampling rate `fs`
    ///
    /// # Arguments
    /// * `fs` - Sampling rate in Hz; band edges are normalised by `fs/2`
    ///
    /// # Returns
    /// Transfer function with `a[0] == 1`
    pub fn design(&self, fs: f64) -> Result<TransferFunction> {
        if self.order == 0 {
            return Err(WorkbenchError::invalid("filter order must be at least 1"));
        }
        if !(fs > 0.0) {
            return Err(WorkbenchError::invalid(format!("sampling rate {} must be positive", fs)));
        }

        let nyquist = fs / 2.0;
        let wn: Vec<f64> = self.band.edges().iter().map(|f| f / nyquist).collect();
        if wn.iter().any(|w| !(*w > 0.0 && *w < 1.0)) {
            return Err(WorkbenchError::invalid(format!(
                "band edges {:?} Hz must lie strictly between 0 and {} Hz",
                self.band.edges(),
                nyquist
            )));
        }
        if wn.len() == 2 && wn[0] >= wn[1] {
            return Err(WorkbenchError::invalid("band edges must be increasing"));
        }

        let prototype = match self.family {
            FilterFamily::Butterworth => butterworth_prototype(self.order),
            FilterFamily::Bessel => bessel_prototype(self.order),
        };

        // Pre-warp for the bilinear transform with fs = 2
        let warped: Vec<f64> = wn.iter().map(|w| 4.0 * (PI * w / 2.0).tan()).collect();

        let analog = match self.band {
            FilterBand::Lowpass(_) => lowpass_to_lowpass(prototype, warped[0]),
            FilterBand::Highpass(_) => lowpass_to_highpass(prototype, warped[0]),
            FilterBand::Bandpass(..) => {
                let bw = warped[1] - warped[0];
                let wo = (warped[0] * warped[1]).sqrt();
                lowpass_to_bandpass(prototype, wo, bw)
            }
            FilterBand::Bandstop(..) => {
                let bw = warped[1] - warped[0];
                let wo = (warped[0] * warped[1]).sqrt();
                lowpass_to_bandstop(prototype, wo, bw)
            }
        };

        let digital = bilinear(analog, 2.0);
        let tf = zpk_to_tf(&digital);
        log::debug!(
            "designed {:?} {:?} order {} at fs={}: {} b / {} a coefficients",
            self.family,
            self.band,
            self.order,
            fs,
            tf.b.len(),
            tf.a.len()
        );
        Ok(tf)
    }
}

impl TransferFunction {
    /// Evaluate H(e^jω) at the given frequencies (Hz)
    pub fn frequency_response(&self, frequencies: &[f64], fs: f64) -> FrequencyResponse {
        let mut magnitude_db = Vec::with_capacity(frequencies.len());
        let mut phase = Vec::with_capacity(frequencies.len());

        for &f in frequencies {
            let omega = 2.0 * PI * f / fs;
            let h = evaluate(&self.b, omega) / evaluate(&self.a, omega);
            magnitude_db.push(20.0 * h.norm().log10());
            phase.push(h.arg());
        }

        FrequencyResponse {
            frequencies: frequencies.to_vec(),
            magnitude_db,
            phase: unwrap_phase(&phase),
        }
    }

    /// Response at `n_points` frequencies evenly spaced over [0, fs/2)
    pub fn frequency_response_grid(&self, n_points: usize, fs: f64) -> FrequencyResponse {
        let frequencies: Vec<f64> = (0..n_points)
            .map(|i| i as f64 * fs / (2.0 * n_points as f64))
            .collect();
        self.frequency_response(&frequencies, fs)
    }
}

/// Σ c[k] e^{-jωk}
fn evaluate(coefficients: &[f64], omega: f64) -> Complex64 {
    coefficients
        .iter()
        .enumerate()
        .map(|(k, &c)| c * Complex64::from_polar(1.0, -omega * k as f64))
        .sum()
}

fn unwrap_phase(phase: &[f64]) -> Vec<f64> {
    let mut unwrapped = Vec::with_capacity(phase.len());
    let mut offset = 0.0;
    for (i, &p) in phase.iter().enumerate() {
        if i > 0 {
            let delta = p - phase[i - 1];
            if delta > PI {
                offset -= 2.0 * PI;
            } else if delta < -PI {
                offset += 2.0 * PI;
            }
        }
        unwrapped.push(p + offset);
    }
    unwrapped
}

/// Butterworth poles on the left half of the unit circle
fn butterworth_prototype(order: usize) -> Zpk {
    let n = order as f64;
    let p = (0..order)
        .map(|i| {
            let m = -(n - 1.0) + 2.0 * i as f64;
            -Complex64::from_polar(1.0, PI * m / (2.0 * n))
        })
        .collect();
    Zpk { z: Vec::new(), p, k: 1.0 }
}

/// Bessel poles, normalised so the phase asymptotes match Butterworth
///
/// Poles are the roots of the reverse Bessel polynomial scaled by
/// `a0^(-1/N)`. Scaling the polynomial first keeps the roots near the unit
/// circle where the iteration converges well.
fn bessel_prototype(order: usize) -> Zpk {
    let n = order;
    // a_k = (2N-k)! / (2^(N-k) k! (N-k)!)
    let coefficient = |k: usize| -> f64 {
        factorial(2 * n - k) / (2f64.powi((n - k) as i32) * factorial(k) * factorial(n - k))
    };

    let scale = coefficient(0).powf(1.0 / n as f64);

    // Monic in u = s / scale: c_k = a_k * scale^(k - N)
    let monic: Vec<f64> = (0..=n)
        .map(|k| coefficient(k) * scale.powi(k as i32 - n as i32))
        .collect();

    Zpk {
        z: Vec::new(),
        p: polynomial_roots(&monic),
        k: 1.0,
    }
}

fn factorial(n: usize) -> f64 {
    (1..=n).map(|i| i as f64).product()
}

/// Roots of a monic polynomial given in ascending powers (`c[N] == 1`)
///
/// Durand-Kerner simultaneous iteration.
fn polynomial_roots(ascending: &[f64]) -> Vec<Complex64> {
    let degree = ascending.len() - 1;
    let eval = |x: Complex64| -> Complex64 {
        ascending
            .iter()
            .rev()
            .fold(Complex64::new(0.0, 0.0), |acc, &c| acc * x + c)
    };

    let seed = Complex64::new(0.4, 0.9);
    let mut roots: Vec<Complex64> = (0..degree).map(|i| seed.powu(i as u32)).collect();

    for _ in 0..1000 {
        let mut largest_step: f64 = 0.0;
        for i in 0..degree {
            let mut denominator = Complex64::new(1.0, 0.0);
            for j in 0..degree {
                if i != j {
                    denominator *= roots[i] - roots[j];
                }
            }
            let step = eval(roots[i]) / denominator;
            roots[i] -= step;
            largest_step = largest_step.max(step.norm());
        }
        if largest_step < 1e-15 {
            break;
        }
    }
    roots
}

fn lowpass_to_lowpass(proto: Zpk, wo: f64) -> Zpk {
    let degree = relative_degree(&proto);
    Zpk {
        z: proto.z.iter().map(|&z| z * wo).collect(),
        p: proto.p.iter().map(|&p| p * wo).collect(),
        k: proto.k * wo.powi(degree as i32),
    }
}

fn lowpass_to_highpass(proto: Zpk, wo: f64) -> Zpk {
    let degree = relative_degree(&proto);
    let mut z: Vec<Complex64> = proto.z.iter().map(|&z| wo / z).collect();
    let p = proto.p.iter().map(|&p| wo / p).collect();
    z.extend(std::iter::repeat(Complex64::new(0.0, 0.0)).take(degree));

    let k = proto.k * (negated_product(&proto.z) / negated_product(&proto.p)).re;
    Zpk { z, p, k }
}

fn lowpass_to_bandpass(proto: Zpk, wo: f64, bw: f64) -> Zpk {
    let degree = relative_degree(&proto);
    let split = |roots: &[Complex64]| -> Vec<Complex64> {
        let scaled: Vec<Complex64> = roots.iter().map(|&r| r * (bw / 2.0)).collect();
        let upper = scaled.iter().map(|&r| r + (r * r - wo * wo).sqrt());
        let lower = scaled.iter().map(|&r| r - (r * r - wo * wo).sqrt());
        upper.chain(lower).collect()
    };

    let mut z = split(&proto.z);
    let p = split(&proto.p);
    z.extend(std::iter::repeat(Complex64::new(0.0, 0.0)).take(degree));

    Zpk {
        z,
        p,
        k: proto.k * bw.powi(degree as i32),
    }
}

fn lowpass_to_bandstop(proto: Zpk, wo: f64, bw: f64) -> Zpk {
    let degree = relative_degree(&proto);
    let split = |roots: &[Complex64]| -> Vec<Complex64> {
        let inverted: Vec<Complex64> = roots.iter().map(|&r| (bw / 2.0) / r).collect();
        let upper = inverted.iter().map(|&r| r + (r * r - wo * wo).sqrt());
        let lower = inverted.iter().map(|&r| r - (r * r - wo * wo).sqrt());
        upper.chain(lower).collect()
    };

    let mut z = split(&proto.z);
    let p = split(&proto.p);
    z.extend(std::iter::repeat(Complex64::new(0.0, wo)).take(degree));
    z.extend(std::iter::repeat(Complex64::new(0.0, -wo)).take(degree));

    let k = proto.k * (negated_product(&proto.z) / negated_product(&proto.p)).re;
    Zpk { z, p, k }
}

/// Map s-plane zeros/poles to the z-plane
fn bilinear(analog: Zpk, fs: f64) -> Zpk {
    let fs2 = Complex64::new(2.0 * fs, 0.0);
    let degree = relative_degree(&analog);

    let mut z: Vec<Complex64> = analog.z.iter().map(|&z| (fs2 + z) / (fs2 - z)).collect();
    let p = analog.p.iter().map(|&p| (fs2 + p) / (fs2 - p)).collect();
    z.extend(std::iter::repeat(Complex64::new(-1.0, 0.0)).take(degree));

    let num: Complex64 = analog.z.iter().map(|&z| fs2 - z).product();
    let den: Complex64 = analog.p.iter().map(|&p| fs2 - p).product();
    Zpk {
        z,
        p,
        k: analog.k * (num / den).re,
    }
}

fn zpk_to_tf(zpk: &Zpk) -> TransferFunction {
    TransferFunction {
        b: poly(&zpk.z).iter().map(|c| c.re * zpk.k).collect(),
        a: poly(&zpk.p).iter().map(|c| c.re).collect(),
    }
}

/// Coefficients (descending powers) of the monic polynomial with these roots
fn poly(roots: &[Complex64]) -> Vec<Complex64> {
    let mut coefficients = vec![Complex64::new(1.0, 0.0)];
    for root in roots {
        let mut next = coefficients.clone();
        next.push(Complex64::new(0.0, 0.0));
        for i in 1..next.len() {
            next[i] -= *root * coefficients[i - 1];
        }
        coefficients = next;
    }
    coefficients
}

fn negated_product(roots: &[Complex64]) -> Complex64 {
    roots.iter().map(|&r| -r).product()
}

fn relative_degree(zpk: &Zpk) -> usize {
    zpk.p.len().saturating_sub(zpk.z.len())
}
