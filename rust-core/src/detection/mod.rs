//! Adaptive-threshold spike detection

pub mod params;
pub mod export;
pub mod detector;
pub mod session;

pub use params::SpikeParameters;
pub use export::{export_rates, write_rates, ExportOutcome};
pub use detector::{
    adaptive_threshold, ChannelAnalysis, SpikeDetector, SpikeReport, BPF_SIGNAL, INPUT_SIGNAL,
    MASK_SIGNAL, PEAK_TO_PEAK_SIGNAL,
};
pub use session::DetectionSession;
