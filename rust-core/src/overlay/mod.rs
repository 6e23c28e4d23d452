//! Display metadata mirrored alongside the numeric workspaces
//!
//! The overlay keeps its own registry of [`DisplayEntry`] cells, one per
//! (workspace, channel, signal). It follows the numeric registry through
//! [`StructureEvent`]s and is never read by processing code.
//!
//! Groups are overlay-only columns whose entries list member signal names.
//! Removing a signal from its workspace does NOT prune group membership;
//! [`PresentationOverlay::stale_group_members`] reports such dangling
//! references.

pub mod color;

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::mpsc::Receiver;

use crate::data::{
    Orientation, ShapeClass, StructureEvent, WorkspaceKind, WorkspaceRegistry,
};
use crate::error::{Result, WorkbenchError};
pub use color::{random_color, Rgb, GROUP_BRIGHTNESS_CEILING, SIGNAL_BRIGHTNESS_CEILING};

/// What an overlay column stands for
#[derive(Debug, Clone, PartialEq)]
pub enum Membership {
    /// Mirror of the numeric signal with this name
    Signal(String),

    /// Virtual signal drawing the listed member signals
    Group(Vec<String>),
}

/// Display attributes of one (channel, signal) cell
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayEntry {
    pub visible: bool,
    pub membership: Membership,
    pub color: Rgb,
}

impl DisplayEntry {
    pub fn signal(name: &str, color: Rgb) -> Self {
        Self {
            visible: true,
            membership: Membership::Signal(name.to_string()),
            color,
        }
    }

    pub fn group(members: Vec<String>, color: Rgb) -> Self {
        Self {
            visible: false,
            membership: Membership::Group(members),
            color,
        }
    }

    pub fn is_signal(&self) -> bool {
        matches!(self.membership, Membership::Signal(_))
    }
}

impl ShapeClass for DisplayEntry {
    fn shape_class(&self) -> &'static str {
        match self.membership {
            Membership::Signal(_) => "signal entry",
            Membership::Group(_) => "group entry",
        }
    }
}

pub struct PresentationOverlay {
    registry: WorkspaceRegistry<DisplayEntry>,
    rng: StdRng,
}

impl Default for PresentationOverlay {
    fn default() -> Self {
        Self::new()
    }
}

impl PresentationOverlay {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic colors, for tests and reproducible sessions
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            registry: WorkspaceRegistry::new(None),
            rng,
        }
    }

    /// Seed an overlay from the current structure of `source`
    ///
    /// Every existing signal gets a visible entry in the seed color.
    pub fn mirror<T: ShapeClass>(source: &WorkspaceRegistry<T>, seed: Option<u64>) -> Self {
        let mut overlay = match seed {
            Some(seed) => Self::with_seed(seed),
            None => Self::new(),
        };

        for ws in source.structure(Orientation::BySignal).workspaces() {
            let kind = source
                .workspace(&ws.workspace)
                .map(|w| w.kind)
                .unwrap_or(WorkspaceKind::Normal);
            if overlay.registry.create_workspace(&ws.workspace, kind).is_err() {
                continue;
            }
            if let Ok(store) = source.store(&ws.workspace) {
                let channels = store.channels().to_vec();
                overlay.registry.add_channels(&ws.workspace, &channels).ok();
            }
            for (signal, channels) in &ws.entries {
                let entries = vec![DisplayEntry::signal(signal, Rgb::SEED); channels.len()];
                if let Err(e) = overlay.registry.add_signal(&ws.workspace, signal, entries, channels) {
                    log::warn!("overlay could not mirror '{}': {}", signal, e);
                }
            }
        }
        overlay
    }

    /// Structural events of the overlay itself, for display listeners
    pub fn subscribe(&mut self) -> Receiver<StructureEvent> {
        self.registry.subscribe()
    }

    pub fn registry(&self) -> &WorkspaceRegistry<DisplayEntry> {
        &self.registry
    }

    pub fn entry(&self, workspace: &str, channel: &str, signal: &str) -> Option<&DisplayEntry> {
        self.registry
            .store(workspace)
            .ok()
            .and_then(|store| store.get(channel, signal))
    }

    /// Apply every pending event from the numeric registry
    ///
    /// # Returns
    /// Number of events applied
    pub fn sync(&mut self, events: &Receiver<StructureEvent>) -> usize {
        let mut applied = 0;
        for event in events.try_iter() {
            self.apply(&event);
            applied += 1;
        }
        applied
    }

    /// Mirror one structural change
    ///
    /// Mismatches (e.g. an event for a workspace the overlay never saw) are
    /// logged and skipped; the overlay must never abort the numeric side.
    pub fn apply(&mut self, event: &StructureEvent) {
        let outcome = match event {
            StructureEvent::WorkspaceCreated { workspace, kind } => {
                self.registry.create_workspace(workspace, *kind)
            }
            StructureEvent::ChannelsAdded { workspace, channels } => {
                self.registry.add_channels(workspace, channels)
            }
            StructureEvent::SignalAdded {
                workspace,
                signal,
                channels,
            } => {
                let color = random_color(&mut self.rng, SIGNAL_BRIGHTNESS_CEILING);
                let entries = vec![DisplayEntry::signal(signal, color); channels.len()];
                self.registry.add_signal(workspace, signal, entries, channels)
            }
            StructureEvent::SignalChanged {
                workspace,
                signal,
                channels,
            } => self.reconcile_signal(workspace, signal, channels),
            StructureEvent::SignalRemoved { workspace, signal } => {
                self.registry.remove_signal(workspace, signal)
            }
            StructureEvent::AllRemoved => {
                self.registry.remove_all();
                Ok(())
            }
        };

        if let Err(e) = outcome {
            log::warn!("overlay skipped {:?}: {}", event, e);
        }
    }

    /// Bring the entries of `signal` to exactly `channels`
    ///
    /// Entries already present keep their attributes, new channels take the
    /// signal's color and entries of channels outside `channels` are dropped.
    fn reconcile_signal(&mut self, workspace: &str, signal: &str, channels: &[String]) -> Result<()> {
        let store = self.registry.store(workspace)?;
        let holders: Vec<&String> = store
            .channels()
            .iter()
            .filter(|ch| store.get(ch, signal).is_some())
            .collect();
        let unchanged = holders.len() == channels.len()
            && channels.iter().all(|ch| store.get(ch, signal).is_some());
        if unchanged {
            return Ok(());
        }

        let existing = holders
            .first()
            .and_then(|ch| store.get(ch, signal))
            .map(|entry| entry.color);
        let color = match existing {
            Some(color) => color,
            None => random_color(&mut self.rng, SIGNAL_BRIGHTNESS_CEILING),
        };

        let store = self.registry.store(workspace)?;
        let entries: Vec<DisplayEntry> = channels
            .iter()
            .map(|ch| {
                store
                    .get(ch, signal)
                    .cloned()
                    .unwrap_or_else(|| DisplayEntry::signal(signal, color))
            })
            .collect();
        self.registry.replace_signal(workspace, signal, entries, channels)
    }

    pub fn set_visible(&mut self, workspace: &str, signal: &str, visible: bool) -> Result<()> {
        self.for_each_entry(workspace, signal, |entry| entry.visible = visible)
    }

    pub fn set_color(&mut self, workspace: &str, signal: &str, color: Rgb) -> Result<()> {
        self.for_each_entry(workspace, signal, |entry| entry.color = color)
    }

    /// Create a group column
    ///
    /// With no channels and no members only the name is registered, like an
    /// empty folder waiting to be filled.
    pub fn append_group(
        &mut self,
        workspace: &str,
        group: &str,
        channels: &[String],
        members: &[String],
    ) -> Result<()> {
        if channels.is_empty() && members.is_empty() {
            self.registry.store_mut(workspace)?.declare_column(group);
            return Ok(());
        }
        let color = random_color(&mut self.rng, GROUP_BRIGHTNESS_CEILING);
        let entries = vec![DisplayEntry::group(members.to_vec(), color); channels.len()];
        self.registry.add_signal(workspace, group, entries, channels)
    }

    pub fn add_to_group(&mut self, workspace: &str, group: &str, signal: &str) -> Result<()> {
        self.for_each_group(workspace, group, |members| {
            if !members.iter().any(|m| m == signal) {
                members.push(signal.to_string());
            }
        })
    }

    pub fn remove_from_group(&mut self, workspace: &str, group: &str, signal: &str) -> Result<()> {
        self.for_each_group(workspace, group, |members| members.retain(|m| m != signal))
    }

    pub fn remove_group(&mut self, workspace: &str, group: &str) -> Result<()> {
        self.registry.remove_signal(workspace, group)
    }

    /// Group names with their member lists
    pub fn groups(&self, workspace: &str) -> Result<Vec<(String, Vec<String>)>> {
        let store = self.registry.store(workspace)?;
        let mut groups = Vec::new();
        for (column, holders) in store.column_structure(None) {
            let members = holders
                .iter()
                .find_map(|ch| match store.get(ch, &column).map(|e| &e.membership) {
                    Some(Membership::Group(members)) => Some(members.clone()),
                    _ => None,
                });
            if let Some(members) = members {
                groups.push((column, members));
            } else if holders.is_empty() {
                groups.push((column, Vec::new()));
            }
        }
        Ok(groups)
    }

    /// (group, member) pairs whose member is no longer a mirrored signal
    pub fn stale_group_members(&self, workspace: &str) -> Result<Vec<(String, String)>> {
        let store = self.registry.store(workspace)?;
        let live: Vec<&String> = store
            .signals()
            .iter()
            .filter(|s| {
                store
                    .channels()
                    .iter()
                    .any(|ch| store.get(ch, s).map_or(false, DisplayEntry::is_signal))
            })
            .collect();

        let mut stale = Vec::new();
        for (group, members) in self.groups(workspace)? {
            for member in members {
                if !live.contains(&&member) {
                    stale.push((group.clone(), member));
                }
            }
        }
        Ok(stale)
    }

    fn for_each_entry<F>(&mut self, workspace: &str, signal: &str, mut f: F) -> Result<()>
    where
        F: FnMut(&mut DisplayEntry),
    {
        let store = self.registry.store_mut(workspace)?;
        if !store.has_signal(signal) {
            return Err(WorkbenchError::UnknownSignal {
                workspace: workspace.to_string(),
                signal: signal.to_string(),
            });
        }
        let channels = store.channels().to_vec();
        for ch in &channels {
            if let Some(entry) = store.get_mut(ch, signal) {
                f(entry);
            }
        }
        Ok(())
    }

    fn for_each_group<F>(&mut self, workspace: &str, group: &str, mut f: F) -> Result<()>
    where
        F: FnMut(&mut Vec<String>),
    {
        self.for_each_entry(workspace, group, |entry| {
            if let Membership::Group(members) = &mut entry.membership {
                f(members);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Payload;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn numeric() -> WorkspaceRegistry<Payload> {
        let mut registry = WorkspaceRegistry::new(Some(256.0));
        registry.create_workspace("W", WorkspaceKind::Normal).unwrap();
        registry.add_channels("W", &names(&["CH1", "CH2"])).unwrap();
        registry
            .add_signal("W", "S", vec![Payload::from(vec![0.0]); 2], &names(&["CH1", "CH2"]))
            .unwrap();
        registry
    }

    #[test]
    fn test_mirror_seeds_existing_structure() {
        let overlay = PresentationOverlay::mirror(&numeric(), Some(1));
        let entry = overlay.entry("W", "CH2", "S").unwrap();

        assert!(entry.visible);
        assert!(entry.is_signal());
        assert_eq!(entry.color, Rgb::SEED);
    }

    #[test]
    fn test_sync_follows_numeric_registry() {
        let mut registry = WorkspaceRegistry::<Payload>::new(None);
        let rx = registry.subscribe();
        let mut overlay = PresentationOverlay::with_seed(3);

        registry.create_workspace("W", WorkspaceKind::Normal).unwrap();
        registry.add_channels("W", &names(&["CH1", "CH2"])).unwrap();
        registry
            .add_signal("W", "S", vec![Payload::from(vec![0.0]); 2], &names(&["CH1", "CH2"]))
            .unwrap();
        assert_eq!(overlay.sync(&rx), 3);

        let entry = overlay.entry("W", "CH1", "S").unwrap();
        assert!(entry.visible);
        assert!(entry.color.brightness() <= SIGNAL_BRIGHTNESS_CEILING);
        assert_eq!(overlay.entry("W", "CH2", "S").unwrap().color, entry.color);

        registry.remove_signal("W", "S").unwrap();
        overlay.sync(&rx);
        assert!(overlay.entry("W", "CH1", "S").is_none());

        registry.remove_all();
        overlay.sync(&rx);
        assert!(overlay.registry().workspace_names().is_empty());
    }

    #[test]
    fn test_signal_changed_extends_with_same_color() {
        let mut overlay = PresentationOverlay::with_seed(5);
        overlay.apply(&StructureEvent::WorkspaceCreated {
            workspace: "W".into(),
            kind: WorkspaceKind::Algorithm,
        });
        overlay.apply(&StructureEvent::ChannelsAdded {
            workspace: "W".into(),
            channels: names(&["CH1", "CH2"]),
        });
        overlay.apply(&StructureEvent::SignalAdded {
            workspace: "W".into(),
            signal: "S".into(),
            channels: names(&["CH1"]),
        });
        overlay.apply(&StructureEvent::SignalChanged {
            workspace: "W".into(),
            signal: "S".into(),
            channels: names(&["CH1", "CH2"]),
        });

        let first = overlay.entry("W", "CH1", "S").unwrap().color;
        assert_eq!(overlay.entry("W", "CH2", "S").unwrap().color, first);
    }

    #[test]
    fn test_signal_changed_drops_channels_outside_subset() {
        let mut registry = numeric();
        let rx = registry.subscribe();
        let mut overlay = PresentationOverlay::mirror(&registry, Some(4));
        overlay.set_visible("W", "S", false).unwrap();

        registry
            .replace_signal("W", "S", vec![Payload::from(vec![1.0])], &names(&["CH1"]))
            .unwrap();
        overlay.sync(&rx);

        assert!(overlay.entry("W", "CH2", "S").is_none());
        // Surviving entry keeps its attributes
        let kept = overlay.entry("W", "CH1", "S").unwrap();
        assert!(!kept.visible);
        assert_eq!(kept.color, Rgb::SEED);

        registry
            .replace_signal("W", "S", vec![Payload::from(vec![2.0]); 2], &names(&["CH1", "CH2"]))
            .unwrap();
        overlay.sync(&rx);
        assert_eq!(overlay.entry("W", "CH2", "S").unwrap().color, Rgb::SEED);
    }

    #[test]
    fn test_group_membership_is_not_pruned() {
        let mut registry = numeric();
        let rx = registry.subscribe();
        let mut overlay = PresentationOverlay::mirror(&registry, Some(9));

        overlay
            .append_group("W", "G", &names(&["CH1", "CH2"]), &names(&["S"]))
            .unwrap();
        overlay.add_to_group("W", "G", "S").unwrap();
        assert_eq!(overlay.groups("W").unwrap(), vec![("G".to_string(), names(&["S"]))]);
        assert!(overlay.stale_group_members("W").unwrap().is_empty());

        registry.remove_signal("W", "S").unwrap();
        overlay.sync(&rx);

        assert_eq!(overlay.groups("W").unwrap()[0].1, names(&["S"]));
        assert_eq!(
            overlay.stale_group_members("W").unwrap(),
            vec![("G".to_string(), "S".to_string())]
        );

        overlay.remove_from_group("W", "G", "S").unwrap();
        assert!(overlay.stale_group_members("W").unwrap().is_empty());
    }

    #[test]
    fn test_empty_group_and_visibility() {
        let mut overlay = PresentationOverlay::mirror(&numeric(), Some(2));
        overlay.append_group("W", "Empty", &[], &[]).unwrap();
        assert!(overlay.groups("W").unwrap().iter().any(|(g, m)| g == "Empty" && m.is_empty()));

        overlay.set_visible("W", "S", false).unwrap();
        assert!(!overlay.entry("W", "CH1", "S").unwrap().visible);

        overlay.set_color("W", "S", Rgb::new(1, 2, 3)).unwrap();
        assert_eq!(overlay.entry("W", "CH2", "S").unwrap().color, Rgb::new(1, 2, 3));

        overlay.remove_group("W", "Empty").unwrap();
        assert!(overlay.set_visible("W", "Empty", true).is_err());
    }
}
