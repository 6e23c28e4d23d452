//! Error type shared by the data model, operators and detection pipeline

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkbenchError {
    #[error("Workspace '{0}' already exists")]
    WorkspaceExists(String),

    #[error("Unknown workspace '{0}'")]
    UnknownWorkspace(String),

    #[error("Unknown signal '{signal}' in workspace '{workspace}'")]
    UnknownSignal { workspace: String, signal: String },

    #[error("Unknown channel '{0}'")]
    UnknownChannel(String),

    #[error("Channel '{0}' listed more than once")]
    DuplicateChannel(String),

    #[error("Payload count ({payloads}) and channel count ({channels}) must be the same length")]
    LengthMismatch { payloads: usize, channels: usize },

    #[error("Signal '{signal}' holds {expected} payloads, refusing to write {found}")]
    ShapeMismatch {
        signal: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Acquisition has {rows} rows but {names} channel names")]
    AcquisitionShape { rows: usize, names: usize },

    #[error("Signal '{0}' already exists")]
    SignalExists(String),

    #[error("Selection is empty")]
    EmptySelection,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Config error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, WorkbenchError>;

impl WorkbenchError {
    /// Shorthand for parameter validation failures
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        WorkbenchError::InvalidParameter(message.into())
    }
}
