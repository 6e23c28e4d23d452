//! Spectral and time-frequency analysis

pub mod fft;
pub mod windowing;
pub mod stft;
pub mod cwt;

pub use fft::FftEngine;
pub use windowing::AnalysisWindow;
pub use stft::{StftConfig, stft_magnitude};
pub use cwt::{CwtConfig, cwt_magnitude, ricker};
