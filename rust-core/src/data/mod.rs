//! Multi-channel signal data model

pub mod payload;
pub mod selection;
pub mod events;
pub mod store;
pub mod registry;

pub use payload::{Payload, ShapeClass, TimeFrequency};
pub use selection::{Orientation, Selection, WorkspaceSelection};
pub use events::{EventBus, StructureEvent, WorkspaceKind};
pub use store::{Projected, SignalStore};
pub use registry::{ProjectedWorkspace, Workspace, WorkspaceRegistry};
