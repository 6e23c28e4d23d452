//! Sparse channel x signal table
//!
//! Rows are channels, columns are signals. Registration order of both axes
//! is kept as explicit state; lookups go through the cell map.

use std::collections::{HashMap, HashSet};

use super::payload::ShapeClass;
use super::selection::Orientation;
use crate::error::{Result, WorkbenchError};

/// Payloads found for one outer key of a projection
#[derive(Debug)]
pub struct Projected<'a, T> {
    pub key: String,
    /// (inner key, payload) in the requested order; absent cells are skipped
    pub entries: Vec<(String, &'a T)>,
}

impl<'a, T> Projected<'a, T> {
    pub fn payloads(&self) -> Vec<&'a T> {
        self.entries.iter().map(|(_, payload)| *payload).collect()
    }
}

#[derive(Debug, Clone)]
pub struct SignalStore<T> {
    sampling_rate: Option<f64>,
    rows: Vec<String>,
    columns: Vec<String>,
    cells: HashMap<String, HashMap<String, T>>,
}

impl<T> Default for SignalStore<T> {
    fn default() -> Self {
        Self {
            sampling_rate: None,
            rows: Vec::new(),
            columns: Vec::new(),
            cells: HashMap::new(),
        }
    }
}

impl<T: ShapeClass> SignalStore<T> {
    pub fn new(sampling_rate: Option<f64>) -> Self {
        Self {
            sampling_rate,
            ..Self::default()
        }
    }

    pub fn sampling_rate(&self) -> Option<f64> {
        self.sampling_rate
    }

    pub fn set_sampling_rate(&mut self, sampling_rate: Option<f64>) {
        self.sampling_rate = sampling_rate;
    }

    /// Register channels; already present names are skipped
    ///
    /// # Returns
    /// The names that were actually new, in registration order
    pub fn add_channels<S: AsRef<str>>(&mut self, names: &[S]) -> Vec<String> {
        let mut added = Vec::new();
        for name in names {
            let name = name.as_ref();
            if !self.cells.contains_key(name) {
                self.cells.insert(name.to_string(), HashMap::new());
                self.rows.push(name.to_string());
                added.push(name.to_string());
            }
        }
        added
    }

    /// Register a column without writing any cell
    pub fn declare_column(&mut self, name: &str) {
        if !self.has_signal(name) {
            self.columns.push(name.to_string());
        }
    }

    /// Write one payload per channel under `name`
    ///
    /// `channels = None` targets every registered channel. The write is
    /// all-or-nothing: on any rejection the store is left untouched.
    pub fn add_column(
        &mut self,
        name: &str,
        payloads: Vec<T>,
        channels: Option<&[String]>,
    ) -> Result<()> {
        let channels = self.resolve_channels(channels);
        self.validate_write(name, &payloads, &channels, true)?;

        for (channel, payload) in channels.into_iter().zip(payloads) {
            if let Some(row) = self.cells.get_mut(&channel) {
                row.insert(name.to_string(), payload);
            }
        }
        self.declare_column(name);
        Ok(())
    }

    /// Overwrite `name` wholesale, keeping its position in the column order
    ///
    /// Cells of channels outside the new subset are dropped.
    pub fn replace_column(
        &mut self,
        name: &str,
        payloads: Vec<T>,
        channels: Option<&[String]>,
    ) -> Result<()> {
        let channels = self.resolve_channels(channels);
        self.validate_write(name, &payloads, &channels, false)?;

        for row in self.cells.values_mut() {
            row.remove(name);
        }
        for (channel, payload) in channels.into_iter().zip(payloads) {
            if let Some(row) = self.cells.get_mut(&channel) {
                row.insert(name.to_string(), payload);
            }
        }
        self.declare_column(name);
        Ok(())
    }

    /// Delete every cell of `name` and unregister it
    ///
    /// # Returns
    /// `false` if the column was never registered
    pub fn remove_column(&mut self, name: &str) -> bool {
        for row in self.cells.values_mut() {
            row.remove(name);
        }
        match self.columns.iter().position(|c| c == name) {
            Some(idx) => {
                self.columns.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn channels(&self) -> &[String] {
        &self.rows
    }

    pub fn signals(&self) -> &[String] {
        &self.columns
    }

    pub fn has_channel(&self, name: &str) -> bool {
        self.cells.contains_key(name)
    }

    pub fn has_signal(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn get(&self, channel: &str, signal: &str) -> Option<&T> {
        self.cells.get(channel).and_then(|row| row.get(signal))
    }

    pub fn get_mut(&mut self, channel: &str, signal: &str) -> Option<&mut T> {
        self.cells.get_mut(channel).and_then(|row| row.get_mut(signal))
    }

    /// True when no channel holds a cell for `name`
    pub fn is_column_empty(&self, name: &str) -> bool {
        !self.cells.values().any(|row| row.contains_key(name))
    }

    /// For each requested column, the channels currently holding a cell
    ///
    /// `names = None` walks every registered column. Unknown names map to
    /// an empty channel list.
    pub fn column_structure(&self, names: Option<&[String]>) -> Vec<(String, Vec<String>)> {
        let names = names.unwrap_or(self.columns.as_slice());
        names
            .iter()
            .map(|column| {
                let holders = self
                    .rows
                    .iter()
                    .filter(|row| self.get(row, column).is_some())
                    .cloned()
                    .collect();
                (column.clone(), holders)
            })
            .collect()
    }

    /// For each channel, the columns it holds, in column order
    pub fn row_structure(&self) -> Vec<(String, Vec<String>)> {
        self.rows
            .iter()
            .map(|row| {
                let held = self
                    .columns
                    .iter()
                    .filter(|column| self.get(row, column).is_some())
                    .cloned()
                    .collect();
                (row.clone(), held)
            })
            .collect()
    }

    /// Snapshot in the requested orientation
    pub fn structure(&self, orientation: Orientation) -> Vec<(String, Vec<String>)> {
        match orientation {
            Orientation::BySignal => self.column_structure(None),
            Orientation::ByChannel => self.row_structure(),
        }
    }

    /// Pull payloads out for a `{outer: [inner]}` selection
    ///
    /// Outer keys unknown to the store are skipped, as are inner keys
    /// without a cell, so partial selections degrade gracefully.
    pub fn project(
        &self,
        selection: &[(String, Vec<String>)],
        orientation: Orientation,
    ) -> Vec<Projected<'_, T>> {
        selection
            .iter()
            .filter(|(outer, _)| match orientation {
                Orientation::BySignal => self.has_signal(outer),
                Orientation::ByChannel => self.has_channel(outer),
            })
            .map(|(outer, inner)| {
                let entries = inner
                    .iter()
                    .filter_map(|key| {
                        let cell = match orientation {
                            Orientation::BySignal => self.get(key, outer),
                            Orientation::ByChannel => self.get(outer, key),
                        };
                        cell.map(|payload| (key.clone(), payload))
                    })
                    .collect();
                Projected {
                    key: outer.clone(),
                    entries,
                }
            })
            .collect()
    }

    fn resolve_channels(&self, channels: Option<&[String]>) -> Vec<String> {
        match channels {
            Some(subset) => subset.to_vec(),
            None => self.rows.clone(),
        }
    }

    fn validate_write(
        &self,
        name: &str,
        payloads: &[T],
        channels: &[String],
        check_existing: bool,
    ) -> Result<()> {
        if payloads.len() != channels.len() {
            log::warn!(
                "rejected write to '{}': {} payloads for {} channels",
                name,
                payloads.len(),
                channels.len()
            );
            return Err(WorkbenchError::LengthMismatch {
                payloads: payloads.len(),
                channels: channels.len(),
            });
        }

        if let Some(unknown) = channels.iter().find(|c| !self.has_channel(c)) {
            return Err(WorkbenchError::UnknownChannel(unknown.clone()));
        }

        if let Some(dup) = first_duplicate(channels) {
            return Err(WorkbenchError::DuplicateChannel(dup.to_string()));
        }

        let existing = if check_existing {
            self.rows
                .iter()
                .find_map(|row| self.get(row, name))
                .map(|cell| cell.shape_class())
        } else {
            None
        };
        let expected = existing.or_else(|| payloads.first().map(|p| p.shape_class()));

        if let Some(expected) = expected {
            if let Some(odd) = payloads.iter().find(|p| p.shape_class() != expected) {
                return Err(WorkbenchError::ShapeMismatch {
                    signal: name.to_string(),
                    expected,
                    found: odd.shape_class(),
                });
            }
        }
        Ok(())
    }
}

/// First name that occurs twice in `names`
pub(crate) fn first_duplicate(names: &[String]) -> Option<&str> {
    let mut seen = HashSet::new();
    names
        .iter()
        .find(|name| !seen.insert(name.as_str()))
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::payload::Payload;
    use ndarray::Array2;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn store_with_channels() -> SignalStore<Payload> {
        let mut store = SignalStore::new(Some(512.0));
        store.add_channels(&["CH1", "CH2", "CH3"]);
        store
    }

    #[test]
    fn test_add_channels_keeps_order_and_skips_duplicates() {
        let mut store = store_with_channels();
        let added = store.add_channels(&["CH2", "CH4"]);

        assert_eq!(added, names(&["CH4"]));
        assert_eq!(store.channels(), names(&["CH1", "CH2", "CH3", "CH4"]).as_slice());
    }

    #[test]
    fn test_add_column_then_project_round_trip() {
        let mut store = store_with_channels();
        let channels = names(&["CH3", "CH1"]);
        store
            .add_column(
                "S",
                vec![Payload::from(vec![3.0]), Payload::from(vec![1.0])],
                Some(&channels),
            )
            .unwrap();

        let projected = store.project(&[("S".to_string(), names(&["CH1", "CH3"]))], Orientation::BySignal);
        assert_eq!(projected.len(), 1);
        let payloads = projected[0].payloads();
        assert_eq!(payloads[0], &Payload::from(vec![1.0]));
        assert_eq!(payloads[1], &Payload::from(vec![3.0]));

        let by_channel = store.project(&[("CH3".to_string(), names(&["S"]))], Orientation::ByChannel);
        assert_eq!(by_channel[0].payloads()[0], &Payload::from(vec![3.0]));
    }

    #[test]
    fn test_length_mismatch_leaves_store_unmodified() {
        let mut store = store_with_channels();
        store
            .add_column("S", vec![Payload::from(vec![0.0]); 3], None)
            .unwrap();

        let before_columns = store.signals().to_vec();
        let before_rows = store.row_structure();

        let err = store
            .add_column("T", vec![Payload::from(vec![0.0]); 2], None)
            .unwrap_err();

        assert!(matches!(err, WorkbenchError::LengthMismatch { payloads: 2, channels: 3 }));
        assert_eq!(store.signals(), before_columns.as_slice());
        assert_eq!(store.row_structure(), before_rows);
    }

    #[test]
    fn test_shape_class_is_uniform_per_signal() {
        let mut store = store_with_channels();
        let ch1 = names(&["CH1"]);
        let ch2 = names(&["CH2"]);
        store
            .add_column("S", vec![Payload::from(vec![0.0, 1.0])], Some(&ch1))
            .unwrap();

        let err = store
            .add_column("S", vec![Payload::from(Array2::<f64>::zeros((2, 2)))], Some(&ch2))
            .unwrap_err();
        assert!(matches!(err, WorkbenchError::ShapeMismatch { .. }));
        assert!(store.get("CH2", "S").is_none());
    }

    #[test]
    fn test_repeated_channel_is_rejected() {
        let mut store = store_with_channels();
        store
            .add_column("S", vec![Payload::from(vec![1.0]); 3], None)
            .unwrap();
        let before = store.row_structure();

        let err = store
            .add_column(
                "S",
                vec![Payload::from(vec![5.0]), Payload::from(vec![6.0])],
                Some(&names(&["CH1", "CH1"])),
            )
            .unwrap_err();
        assert!(matches!(err, WorkbenchError::DuplicateChannel(ref ch) if ch == "CH1"));
        assert_eq!(store.get("CH1", "S"), Some(&Payload::from(vec![1.0])));

        let err = store
            .replace_column("S", vec![Payload::from(vec![7.0]); 2], Some(&names(&["CH2", "CH2"])))
            .unwrap_err();
        assert!(matches!(err, WorkbenchError::DuplicateChannel(_)));
        assert_eq!(store.row_structure(), before);
    }

    #[test]
    fn test_unknown_channel_is_rejected() {
        let mut store = store_with_channels();
        let ghost = names(&["CH9"]);
        let err = store
            .add_column("S", vec![Payload::from(vec![0.0])], Some(&ghost))
            .unwrap_err();

        assert!(matches!(err, WorkbenchError::UnknownChannel(_)));
        assert!(!store.has_signal("S"));
    }

    #[test]
    fn test_column_structure_supports_sparse_columns() {
        let mut store = store_with_channels();
        let subset = names(&["CH1", "CH3"]);
        store
            .add_column("S", vec![Payload::from(vec![0.0]); 2], Some(&subset))
            .unwrap();

        let structure = store.column_structure(None);
        assert_eq!(structure, vec![("S".to_string(), subset)]);
    }

    #[test]
    fn test_remove_column() {
        let mut store = store_with_channels();
        store
            .add_column("S", vec![Payload::from(vec![0.0]); 3], None)
            .unwrap();

        assert!(store.remove_column("S"));
        assert!(!store.has_signal("S"));
        assert!(store.is_column_empty("S"));
        assert!(!store.remove_column("S"));
    }

    #[test]
    fn test_replace_column_keeps_position_and_drops_stale_cells() {
        let mut store = store_with_channels();
        store.add_column("A", vec![Payload::from(vec![0.0]); 3], None).unwrap();
        store.add_column("B", vec![Payload::from(vec![0.0]); 3], None).unwrap();

        let subset = names(&["CH2"]);
        store
            .replace_column("A", vec![Payload::from(Array2::<f64>::zeros((1, 1)))], Some(&subset))
            .unwrap();

        assert_eq!(store.signals(), names(&["A", "B"]).as_slice());
        assert!(store.get("CH1", "A").is_none());
        assert!(store.get("CH2", "A").unwrap().as_matrix().is_some());
    }

    #[test]
    fn test_project_skips_missing_keys() {
        let store = store_with_channels();
        let projected = store.project(&[("Nope".to_string(), names(&["CH1"]))], Orientation::BySignal);
        assert!(projected.is_empty());
    }
}
