//! Named workspaces and the structural notifications they emit

use std::collections::HashMap;
use std::sync::mpsc::Receiver;

use super::events::{EventBus, StructureEvent, WorkspaceKind};
use super::payload::ShapeClass;
use super::selection::{Orientation, Selection, WorkspaceSelection};
use super::store::{Projected, SignalStore};
use crate::error::{Result, WorkbenchError};

#[derive(Debug, Clone)]
pub struct Workspace<T> {
    pub kind: WorkspaceKind,
    pub store: SignalStore<T>,
}

/// Payloads pulled from one workspace
#[derive(Debug)]
pub struct ProjectedWorkspace<'a, T> {
    pub workspace: String,
    pub entries: Vec<Projected<'a, T>>,
}

/// Owns workspaces by name and tells subscribers when their structure changes
///
/// Mutations through [`WorkspaceRegistry::store_mut`] bypass notification;
/// every other mutating method emits exactly one event on success.
pub struct WorkspaceRegistry<T> {
    sampling_rate: Option<f64>,
    order: Vec<String>,
    workspaces: HashMap<String, Workspace<T>>,
    events: EventBus,
}

impl<T: ShapeClass> WorkspaceRegistry<T> {
    pub fn new(sampling_rate: Option<f64>) -> Self {
        Self {
            sampling_rate,
            order: Vec::new(),
            workspaces: HashMap::new(),
            events: EventBus::new(),
        }
    }

    pub fn subscribe(&mut self) -> Receiver<StructureEvent> {
        self.events.subscribe()
    }

    pub fn sampling_rate(&self) -> Option<f64> {
        self.sampling_rate
    }

    /// Set the rate for the registry and every workspace it holds
    pub fn set_sampling_rate(&mut self, sampling_rate: Option<f64>) {
        self.sampling_rate = sampling_rate;
        for ws in self.workspaces.values_mut() {
            ws.store.set_sampling_rate(sampling_rate);
        }
    }

    /// Create an empty workspace
    ///
    /// A name collision is rejected without touching the existing workspace.
    pub fn create_workspace(&mut self, name: &str, kind: WorkspaceKind) -> Result<()> {
        if self.workspaces.contains_key(name) {
            log::warn!("workspace '{}' already exists", name);
            return Err(WorkbenchError::WorkspaceExists(name.to_string()));
        }

        self.workspaces.insert(
            name.to_string(),
            Workspace {
                kind,
                store: SignalStore::new(self.sampling_rate),
            },
        );
        self.order.push(name.to_string());
        log::info!("created {} workspace '{}'", kind, name);

        self.events.emit(StructureEvent::WorkspaceCreated {
            workspace: name.to_string(),
            kind,
        });
        Ok(())
    }

    /// Drop every workspace
    pub fn remove_all(&mut self) {
        self.order.clear();
        self.workspaces.clear();
        log::info!("removed all workspaces");
        self.events.emit(StructureEvent::AllRemoved);
    }

    pub fn workspace_names(&self) -> &[String] {
        &self.order
    }

    pub fn contains(&self, name: &str) -> bool {
        self.workspaces.contains_key(name)
    }

    pub fn workspace(&self, name: &str) -> Option<&Workspace<T>> {
        self.workspaces.get(name)
    }

    pub fn store(&self, name: &str) -> Result<&SignalStore<T>> {
        self.workspaces
            .get(name)
            .map(|ws| &ws.store)
            .ok_or_else(|| WorkbenchError::UnknownWorkspace(name.to_string()))
    }

    /// Direct access to a store; changes made through it are not announced
    pub fn store_mut(&mut self, name: &str) -> Result<&mut SignalStore<T>> {
        self.workspaces
            .get_mut(name)
            .map(|ws| &mut ws.store)
            .ok_or_else(|| WorkbenchError::UnknownWorkspace(name.to_string()))
    }

    /// Register channels, announcing only the names that were new
    pub fn add_channels<S: AsRef<str>>(&mut self, workspace: &str, channels: &[S]) -> Result<()> {
        let added = self.store_mut(workspace)?.add_channels(channels);
        if !added.is_empty() {
            self.events.emit(StructureEvent::ChannelsAdded {
                workspace: workspace.to_string(),
                channels: added,
            });
        }
        Ok(())
    }

    /// Add a new signal and announce it
    pub fn add_signal(
        &mut self,
        workspace: &str,
        signal: &str,
        payloads: Vec<T>,
        channels: &[String],
    ) -> Result<()> {
        self.store_mut(workspace)?
            .add_column(signal, payloads, Some(channels))?;
        self.events.emit(StructureEvent::SignalAdded {
            workspace: workspace.to_string(),
            signal: signal.to_string(),
            channels: channels.to_vec(),
        });
        Ok(())
    }

    /// Write cells of an existing (or new) signal and announce a change
    pub fn change_signal(
        &mut self,
        workspace: &str,
        signal: &str,
        payloads: Vec<T>,
        channels: &[String],
    ) -> Result<()> {
        self.store_mut(workspace)?
            .add_column(signal, payloads, Some(channels))?;
        self.emit_changed(workspace, signal)
    }

    /// Overwrite a signal in place and announce a change
    pub fn replace_signal(
        &mut self,
        workspace: &str,
        signal: &str,
        payloads: Vec<T>,
        channels: &[String],
    ) -> Result<()> {
        self.store_mut(workspace)?
            .replace_column(signal, payloads, Some(channels))?;
        self.emit_changed(workspace, signal)
    }

    pub fn remove_signal(&mut self, workspace: &str, signal: &str) -> Result<()> {
        if !self.store_mut(workspace)?.remove_column(signal) {
            return Err(WorkbenchError::UnknownSignal {
                workspace: workspace.to_string(),
                signal: signal.to_string(),
            });
        }
        self.events.emit(StructureEvent::SignalRemoved {
            workspace: workspace.to_string(),
            signal: signal.to_string(),
        });
        Ok(())
    }

    /// Snapshot of every workspace, `{workspace: {signal: [channels]}}` or
    /// `{workspace: {channel: [signals]}}`
    pub fn structure(&self, orientation: Orientation) -> Selection {
        let mut snapshot = Selection::new();
        for name in &self.order {
            if let Some(ws) = self.workspaces.get(name) {
                snapshot.push_workspace(WorkspaceSelection {
                    workspace: name.clone(),
                    entries: ws.store.structure(orientation),
                });
            }
        }
        snapshot
    }

    /// Pull payloads for every workspace named in `selection`
    ///
    /// Unknown workspaces are skipped, like unknown keys inside a store.
    pub fn get_data(
        &self,
        selection: &Selection,
        orientation: Orientation,
    ) -> Vec<ProjectedWorkspace<'_, T>> {
        selection
            .workspaces()
            .iter()
            .filter_map(|sel| {
                self.workspaces.get(&sel.workspace).map(|ws| ProjectedWorkspace {
                    workspace: sel.workspace.clone(),
                    entries: ws.store.project(&sel.entries, orientation),
                })
            })
            .collect()
    }

    /// Announce a change with every channel now holding `signal`
    fn emit_changed(&mut self, workspace: &str, signal: &str) -> Result<()> {
        let store = self.store(workspace)?;
        let channels: Vec<String> = store
            .channels()
            .iter()
            .filter(|ch| store.get(ch, signal).is_some())
            .cloned()
            .collect();
        self.events.emit(StructureEvent::SignalChanged {
            workspace: workspace.to_string(),
            signal: signal.to_string(),
            channels,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::payload::Payload;

    fn channels() -> Vec<String> {
        vec!["CH1".to_string(), "CH2".to_string()]
    }

    fn registry_with_signal() -> WorkspaceRegistry<Payload> {
        let mut registry = WorkspaceRegistry::new(Some(512.0));
        registry.create_workspace("W", WorkspaceKind::Normal).unwrap();
        registry.add_channels("W", &channels()).unwrap();
        registry
            .add_signal(
                "W",
                "S",
                vec![Payload::from(vec![1.0]), Payload::from(vec![2.0])],
                &channels(),
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_duplicate_workspace_is_rejected() {
        let mut registry = registry_with_signal();
        let err = registry
            .create_workspace("W", WorkspaceKind::Algorithm)
            .unwrap_err();

        assert!(matches!(err, WorkbenchError::WorkspaceExists(_)));
        assert_eq!(registry.workspace("W").unwrap().kind, WorkspaceKind::Normal);
        assert!(registry.store("W").unwrap().has_signal("S"));
    }

    #[test]
    fn test_events_follow_mutations() {
        let mut registry = WorkspaceRegistry::<Payload>::new(None);
        let rx = registry.subscribe();

        registry.create_workspace("W", WorkspaceKind::Normal).unwrap();
        registry.add_channels("W", &channels()).unwrap();
        registry
            .add_signal("W", "S", vec![Payload::from(vec![0.0]); 2], &channels())
            .unwrap();
        registry.remove_signal("W", "S").unwrap();
        registry.remove_all();

        let events: Vec<StructureEvent> = rx.try_iter().collect();
        assert_eq!(events.len(), 5);
        assert!(matches!(events[0], StructureEvent::WorkspaceCreated { .. }));
        assert!(matches!(events[2], StructureEvent::SignalAdded { .. }));
        assert!(matches!(events[3], StructureEvent::SignalRemoved { .. }));
        assert_eq!(events[4], StructureEvent::AllRemoved);
    }

    #[test]
    fn test_channels_added_lists_only_new_names() {
        let mut registry = registry_with_signal();
        let rx = registry.subscribe();

        registry.add_channels("W", &["CH2", "CH3"]).unwrap();
        registry.add_channels("W", &["CH1"]).unwrap();

        let events: Vec<StructureEvent> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![StructureEvent::ChannelsAdded {
                workspace: "W".to_string(),
                channels: vec!["CH3".to_string()],
            }]
        );
    }

    #[test]
    fn test_signal_changed_carries_all_holders() {
        let mut registry = registry_with_signal();
        registry.add_channels("W", &["CH3"]).unwrap();
        let rx = registry.subscribe();

        // Partial write keeps the other cells
        registry
            .change_signal("W", "S", vec![Payload::from(vec![3.0])], &["CH3".to_string()])
            .unwrap();
        // Replacement narrows the signal
        registry
            .replace_signal("W", "S", vec![Payload::from(vec![4.0])], &["CH2".to_string()])
            .unwrap();

        let holders: Vec<Vec<String>> = rx
            .try_iter()
            .filter_map(|e| match e {
                StructureEvent::SignalChanged { channels, .. } => Some(channels),
                _ => None,
            })
            .collect();
        assert_eq!(
            holders,
            vec![
                vec!["CH1".to_string(), "CH2".to_string(), "CH3".to_string()],
                vec!["CH2".to_string()],
            ]
        );
    }

    #[test]
    fn test_failed_write_emits_nothing() {
        let mut registry = registry_with_signal();
        let rx = registry.subscribe();

        let result = registry.add_signal("W", "T", vec![Payload::from(vec![0.0])], &channels());
        assert!(result.is_err());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_structure_and_get_data() {
        let registry = registry_with_signal();

        let structure = registry.structure(Orientation::BySignal);
        assert_eq!(structure.get("W", "S").unwrap(), channels().as_slice());

        let by_channel = registry.structure(Orientation::ByChannel);
        assert_eq!(by_channel.get("W", "CH2").unwrap(), &["S".to_string()]);

        let selection = Selection::new()
            .with("W", "S", &["CH2"])
            .with("Missing", "S", &["CH1"]);
        let data = registry.get_data(&selection, Orientation::BySignal);
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].entries[0].payloads()[0], &Payload::from(vec![2.0]));
    }

    #[test]
    fn test_remove_unknown_signal() {
        let mut registry = registry_with_signal();
        assert!(matches!(
            registry.remove_signal("W", "Nope"),
            Err(WorkbenchError::UnknownSignal { .. })
        ));
        assert!(matches!(
            registry.remove_signal("Nope", "S"),
            Err(WorkbenchError::UnknownWorkspace(_))
        ));
    }

    #[test]
    fn test_sampling_rate_propagates() {
        let mut registry = registry_with_signal();
        registry.set_sampling_rate(Some(1000.0));
        assert_eq!(registry.store("W").unwrap().sampling_rate(), Some(1000.0));
    }
}
