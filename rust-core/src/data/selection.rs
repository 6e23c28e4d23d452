//! Selection vocabulary: `{workspace: {key: [members]}}`
//!
//! With [`Orientation::BySignal`] the key is a signal and the members are
//! channels; with [`Orientation::ByChannel`] it is the other way round. The
//! same type doubles as a structural snapshot of a registry.

/// Which axis is the outer key of a selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// `{signal: [channels]}`
    BySignal,

    /// `{channel: [signals]}`
    ByChannel,
}

/// Keys selected within one workspace, in selection order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkspaceSelection {
    pub workspace: String,
    pub entries: Vec<(String, Vec<String>)>,
}

impl WorkspaceSelection {
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, members)| members.as_slice())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    workspaces: Vec<WorkspaceSelection>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Selection::insert`]
    pub fn with<S: AsRef<str>>(mut self, workspace: &str, key: &str, members: &[S]) -> Self {
        self.insert(workspace, key, members);
        self
    }

    /// Add (or overwrite) the members selected under `key` in `workspace`
    pub fn insert<S: AsRef<str>>(&mut self, workspace: &str, key: &str, members: &[S]) {
        let members: Vec<String> = members.iter().map(|m| m.as_ref().to_string()).collect();

        let ws = match self.workspaces.iter_mut().position(|w| w.workspace == workspace) {
            Some(idx) => &mut self.workspaces[idx],
            None => {
                self.workspaces.push(WorkspaceSelection {
                    workspace: workspace.to_string(),
                    entries: Vec::new(),
                });
                let last = self.workspaces.len() - 1;
                &mut self.workspaces[last]
            }
        };

        match ws.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = members,
            None => ws.entries.push((key.to_string(), members)),
        }
    }

    pub(crate) fn push_workspace(&mut self, selection: WorkspaceSelection) {
        self.workspaces.push(selection);
    }

    pub fn workspaces(&self) -> &[WorkspaceSelection] {
        &self.workspaces
    }

    pub fn workspace(&self, name: &str) -> Option<&WorkspaceSelection> {
        self.workspaces.iter().find(|w| w.workspace == name)
    }

    pub fn get(&self, workspace: &str, key: &str) -> Option<&[String]> {
        self.workspace(workspace).and_then(|w| w.get(key))
    }

    /// First (workspace, key, members) triple, the unit processing operators act on
    pub fn first(&self) -> Option<(&str, &str, &[String])> {
        self.workspaces.iter().find_map(|ws| {
            ws.entries
                .first()
                .map(|(key, members)| (ws.workspace.as_str(), key.as_str(), members.as_slice()))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.workspaces.iter().all(|w| w.entries.is_empty())
    }

    /// Swap outer keys and members inside every workspace
    ///
    /// New outer keys appear in the order they are first met while walking
    /// the current selection.
    pub fn transposed(&self) -> Selection {
        let mut out = Selection::new();
        for ws in &self.workspaces {
            let mut entries: Vec<(String, Vec<String>)> = Vec::new();
            for (key, members) in &ws.entries {
                for member in members {
                    match entries.iter_mut().find(|(k, _)| k == member) {
                        Some((_, inner)) => inner.push(key.clone()),
                        None => entries.push((member.clone(), vec![key.clone()])),
                    }
                }
            }
            out.workspaces.push(WorkspaceSelection {
                workspace: ws.workspace.clone(),
                entries,
            });
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_merges_workspaces() {
        let selection = Selection::new()
            .with("W", "S1", &["CH1", "CH2"])
            .with("W", "S2", &["CH2"])
            .with("V", "S1", &["CH9"]);

        assert_eq!(selection.workspaces().len(), 2);
        assert_eq!(selection.get("W", "S2").unwrap(), &["CH2".to_string()]);
        assert_eq!(selection.first().unwrap().1, "S1");
    }

    #[test]
    fn test_transpose_round_trip() {
        let selection = Selection::new()
            .with("W", "S1", &["CH1", "CH2"])
            .with("W", "S2", &["CH2"]);

        let by_channel = selection.transposed();
        assert_eq!(
            by_channel.get("W", "CH2").unwrap(),
            &["S1".to_string(), "S2".to_string()]
        );
        assert_eq!(by_channel.transposed(), selection);
    }

    #[test]
    fn test_empty_selection() {
        assert!(Selection::new().is_empty());
        assert!(Selection::new().first().is_none());
    }
}
