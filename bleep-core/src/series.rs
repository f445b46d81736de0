//! Series Store — append-only per-label time series
//!
//! ## Overview
//!
//! This module owns the dataset the whole aggregator exists to build: one
//! append-only sequence of readings per sensor label, in label
//! first-appearance order. Entries are created lazily when a label's first
//! reading arrives and remember the tick that was current at that moment
//! ("first seen"); every reading additionally carries its own tick, so
//! correlation survives any interleaving across channels.
//!
//! ## Aggregation Invariants
//!
//! - At most one entry per label; `readings` only grows until
//!   [`clear`](SeriesStore::clear).
//! - Readings append in arrival order — never reordered, never overwritten.
//! - An entry's creation tick is pinned at first sight and never updated.
//! - A snapshot is a deep copy: handing it to a display or export consumer
//!   can never race a later append.
//!
//! ## Concurrency Model
//!
//! Mutation goes through `&mut self`, so the exclusive borrow *is* the
//! critical section: two appends, or an append and a clear, cannot
//! interleave in safe Rust. The store still cross-checks its label index
//! against the entry list on every append and reports a mismatch as
//! [`SeriesError::ConcurrentMutation`] — that error marks a broken
//! serialization discipline upstream, not a condition to recover from.
//!
//! Snapshots rebuild the whole mapping per read rather than sharing
//! structure. At sensor sample rates (a cycle every few seconds, tens of
//! labels at most) the O(size) copy is noise, and it keeps readers entirely
//! free of synchronization.

use alloc::vec::Vec;

use crate::decode::{StampStr, Value};
use crate::errors::SeriesError;
use crate::registry::SensorLabel;
use crate::tick::Tick;

/// One stored sample
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Reading {
    /// Sub-timestamp decoded from the payload (empty for binary channels)
    pub sub_timestamp: StampStr,
    /// The decoded value
    pub value: Value,
    /// Acquisition tick current when the reading was decoded; `None` for
    /// readings observed before the session's first tick
    pub tick: Option<Tick>,
}

/// Append-only series for one label
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SeriesEntry {
    label: SensorLabel,
    first_tick: Option<Tick>,
    readings: Vec<Reading>,
}

impl SeriesEntry {
    /// The label this series belongs to
    pub fn label(&self) -> SensorLabel {
        self.label
    }

    /// Tick current when the entry was created ("first seen", never updated)
    pub fn first_tick(&self) -> Option<Tick> {
        self.first_tick
    }

    /// Readings in arrival order
    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    /// Number of readings
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    /// Whether the series is empty (it never is: entries are created with
    /// their first reading)
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

/// Immutable dataset view: label → series, in first-appearance order
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Dataset {
    entries: Vec<SeriesEntry>,
}

impl Dataset {
    /// Series for `label`, if any reading has arrived for it
    pub fn get(&self, label: SensorLabel) -> Option<&SeriesEntry> {
        self.entries.iter().find(|e| e.label == label)
    }

    /// Iterate entries in label first-appearance order
    pub fn iter(&self) -> core::slice::Iter<'_, SeriesEntry> {
        self.entries.iter()
    }

    /// Number of labels present
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no readings have been stored
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total readings across all labels
    pub fn reading_count(&self) -> usize {
        self.entries.iter().map(SeriesEntry::len).sum()
    }
}

/// The mutable aggregation core
pub struct SeriesStore {
    entries: Vec<SeriesEntry>,
    /// label index → position in `entries`; kept in lockstep with it
    index: [Option<usize>; SensorLabel::COUNT],
    total: usize,
}

impl SeriesStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: [None; SensorLabel::COUNT],
            total: 0,
        }
    }

    /// Append a reading under `label`, creating the entry on first sight
    ///
    /// The entry's creation tick is the reading's tick when the entry is
    /// new; existing entries keep theirs.
    pub fn append(&mut self, label: SensorLabel, reading: Reading) -> Result<(), SeriesError> {
        match self.index[label.index()] {
            Some(pos) => {
                let entry = self
                    .entries
                    .get_mut(pos)
                    .ok_or(SeriesError::ConcurrentMutation)?;
                if entry.label != label {
                    return Err(SeriesError::ConcurrentMutation);
                }
                entry.readings.push(reading);
            }
            None => {
                self.index[label.index()] = Some(self.entries.len());
                let mut readings = Vec::with_capacity(8);
                let first_tick = reading.tick;
                readings.push(reading);
                self.entries.push(SeriesEntry {
                    label,
                    first_tick,
                    readings,
                });
            }
        }

        self.total += 1;
        debug_assert!(self.entries.len() <= SensorLabel::COUNT);
        Ok(())
    }

    /// Drop every entry and reading
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index = [None; SensorLabel::COUNT];
        self.total = 0;
    }

    /// Snapshot the dataset (deep copy; see module docs)
    pub fn as_dataset(&self) -> Dataset {
        Dataset {
            entries: self.entries.clone(),
        }
    }

    /// Number of labels with at least one reading
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no readings
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total readings stored since the last clear
    pub fn reading_count(&self) -> usize {
        self.total
    }
}

impl Default for SeriesStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(value: f64, tick: Option<Tick>) -> Reading {
        Reading {
            sub_timestamp: StampStr::empty(),
            value: Value::Float(value),
            tick,
        }
    }

    #[test]
    fn lazy_entry_creation() {
        let mut store = SeriesStore::new();
        assert!(store.is_empty());

        store
            .append(SensorLabel::Temperature, reading(21.0, None))
            .unwrap();

        let dataset = store.as_dataset();
        let entry = dataset.get(SensorLabel::Temperature).unwrap();
        assert_eq!(entry.len(), 1);
        assert_eq!(entry.first_tick(), None);
        assert_eq!(entry.readings()[0].value, Value::Float(21.0));
    }

    #[test]
    fn appends_preserve_arrival_order() {
        let mut store = SeriesStore::new();
        for v in [1.0, 2.0, 3.0] {
            store.append(SensorLabel::Pm25, reading(v, None)).unwrap();
        }

        let dataset = store.as_dataset();
        let values: Vec<f64> = dataset
            .get(SensorLabel::Pm25)
            .unwrap()
            .readings()
            .iter()
            .filter_map(|r| r.value.as_f64())
            .collect();
        assert_eq!(values, [1.0, 2.0, 3.0]);
        assert_eq!(dataset.reading_count(), 3);
    }

    #[test]
    fn insertion_order_is_first_appearance() {
        let mut store = SeriesStore::new();
        store.append(SensorLabel::Pm25, reading(1.0, None)).unwrap();
        store
            .append(SensorLabel::Temperature, reading(2.0, None))
            .unwrap();
        store.append(SensorLabel::Pm25, reading(3.0, None)).unwrap();

        let labels: Vec<SensorLabel> =
            store.as_dataset().iter().map(SeriesEntry::label).collect();
        assert_eq!(labels, [SensorLabel::Pm25, SensorLabel::Temperature]);
    }

    #[test]
    fn clear_empties_everything() {
        let mut store = SeriesStore::new();
        store.append(SensorLabel::Pm25, reading(1.0, None)).unwrap();
        store.clear();

        assert!(store.is_empty());
        assert_eq!(store.reading_count(), 0);
        assert!(store.as_dataset().is_empty());

        // A fresh append starts a new entry.
        store.append(SensorLabel::Pm25, reading(9.0, None)).unwrap();
        assert_eq!(store.as_dataset().reading_count(), 1);
    }

    #[test]
    fn snapshot_is_isolated_from_later_appends() {
        let mut store = SeriesStore::new();
        store.append(SensorLabel::Pm25, reading(1.0, None)).unwrap();

        let snapshot = store.as_dataset();
        store.append(SensorLabel::Pm25, reading(2.0, None)).unwrap();

        assert_eq!(snapshot.reading_count(), 1);
        assert_eq!(store.as_dataset().reading_count(), 2);
    }
}
