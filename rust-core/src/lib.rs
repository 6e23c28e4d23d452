//! ECoG Workbench - Multi-Channel Signal Processing Core
//! 
//! Workspace/channel/signal data model, windowed operators and an
//! adaptive-threshold spike detector, with optional Python bindings.

// Suppress PyO3 non-local impl warnings (harmless macro-generated code)
#![cfg_attr(feature = "python", allow(non_local_definitions))]

pub mod error;
pub mod data;
pub mod overlay;
pub mod filters;
pub mod spectrum;
pub mod processing;
pub mod detection;
pub mod config;
pub mod ingest;
pub mod workbench;

#[cfg(feature = "python")]
pub mod python_bindings;

pub use error::{Result, WorkbenchError};
pub use data::{Orientation, Payload, Selection, StructureEvent, WorkspaceKind, WorkspaceRegistry};
pub use overlay::PresentationOverlay;
pub use filters::{FilterBand, IirDesign, TransferFunction, WindowType};
pub use processing::{OnConflict, Operation, Reduction, WindowedOperator};
pub use detection::{SpikeDetector, SpikeParameters, SpikeReport};
pub use config::{load_config, save_config, WorkbenchConfig};
pub use ingest::{import_acquisition, Acquisition};
pub use workbench::Workbench;
