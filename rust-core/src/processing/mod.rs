//! Windowed operators, whole-series operators and their invocation

pub mod progress;
pub mod window;
pub mod operation;

pub use progress::{NoProgress, Progress, ProgressSteps};
pub use window::{fill_back, Reduction, WindowedOperator};
pub use operation::{process_selection, OnConflict, Operation};
