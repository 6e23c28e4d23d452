//! IIR filter design, filtering and trend removal

pub mod windows;
pub mod design;
pub mod iir;
pub mod detrend;

pub use windows::{WindowType, generate_periodic_window, generate_window};
pub use design::{FilterBand, FilterFamily, FrequencyResponse, IirDesign, TransferFunction};
pub use iir::{IirFilter, lfilter};
pub use detrend::{DetrendKind, detrend};
