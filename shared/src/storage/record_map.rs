use std::collections::BTreeMap;

use log::error;

use crate::{
    storage::error::StorageError,
    tag::{CompoundTag, Tag},
};

pub const RECORDS_KEY: &str = "records";
pub const RESET_KEY: &str = "reset";
pub const RECORD_KEY_KEY: &str = "key";

/// One independently-dirty sub-record of a Storage
pub trait Record: Sized + Send + Sync + 'static {
    fn save(&self, tag: &mut CompoundTag);

    fn load(tag: &CompoundTag) -> Result<Self, StorageError>;
}

struct RecordEntry<R: Record> {
    record: R,
    dirty: bool,
}

/// Keyed collection of sub-records with per-record dirty flags.
///
/// Deltas carry only dirty records. Removing a record cannot be expressed
/// record-by-record, so it raises a pending reset instead: the next delta
/// carries every record plus a `reset` marker, and the receiver replaces its
/// collection wholesale.
pub struct RecordMap<R: Record> {
    records: BTreeMap<String, RecordEntry<R>>,
    needs_reset: bool,
}

impl<R: Record> Default for RecordMap<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> RecordMap<R> {
    pub fn new() -> Self {
        Self {
            records: BTreeMap::new(),
            needs_reset: false,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&R> {
        self.records.get(key).map(|entry| &entry.record)
    }

    /// Mutable access marks the record dirty
    pub fn get_mut(&mut self, key: &str) -> Option<&mut R> {
        self.records.get_mut(key).map(|entry| {
            entry.dirty = true;
            &mut entry.record
        })
    }

    pub fn insert(&mut self, key: impl Into<String>, record: R) -> Option<R> {
        self.records
            .insert(key.into(), RecordEntry { record, dirty: true })
            .map(|entry| entry.record)
    }

    pub fn remove(&mut self, key: &str) -> Option<R> {
        let removed = self.records.remove(key)?;
        self.needs_reset = true;
        Some(removed.record)
    }

    pub fn clear(&mut self) {
        if !self.records.is_empty() {
            self.needs_reset = true;
        }
        self.records.clear();
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.records.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &R)> {
        self.records.iter().map(|(key, entry)| (key, &entry.record))
    }

    pub fn is_record_dirty(&self, key: &str) -> bool {
        self.records.get(key).is_some_and(|entry| entry.dirty)
    }

    /// True if any record changed or a reset is pending
    pub fn is_dirty(&self) -> bool {
        self.needs_reset || self.records.values().any(|entry| entry.dirty)
    }

    pub fn needs_reset(&self) -> bool {
        self.needs_reset
    }

    /// Forgets pending changes once a delta carrying them was packaged
    pub fn clear_outdated(&mut self) {
        self.needs_reset = false;
        for entry in self.records.values_mut() {
            entry.dirty = false;
        }
    }

    // Serialization

    /// Writes every record under `records`
    pub fn save_all(&self, tag: &mut CompoundTag) {
        tag.put_list(RECORDS_KEY, self.write_records(|_| true));
    }

    /// Writes dirty records only, or everything plus `reset` when records
    /// were removed since the last delta
    pub fn save_outdated(&self, tag: &mut CompoundTag) {
        if self.needs_reset {
            tag.put_bool(RESET_KEY, true);
            self.save_all(tag);
            return;
        }
        tag.put_list(RECORDS_KEY, self.write_records(|entry| entry.dirty));
    }

    /// Replaces the collection with the records in `tag`. A missing
    /// `records` field leaves the collection untouched.
    pub fn load_all(&mut self, tag: &CompoundTag) -> Result<(), StorageError> {
        if !tag.contains_key(RECORDS_KEY) {
            return Ok(());
        }
        let records = tag.get_list(RECORDS_KEY)?;
        self.records.clear();
        self.read_records(records);
        Ok(())
    }

    /// Merges the records in `tag`, replacing the collection first when the
    /// delta carries a reset marker
    pub fn load_update(&mut self, tag: &CompoundTag) -> Result<(), StorageError> {
        if tag.get_bool_or(RESET_KEY, false)? {
            return self.load_all(tag);
        }
        if !tag.contains_key(RECORDS_KEY) {
            return Ok(());
        }
        let records = tag.get_list(RECORDS_KEY)?;
        self.read_records(records);
        Ok(())
    }

    fn write_records(&self, include: impl Fn(&RecordEntry<R>) -> bool) -> Vec<Tag> {
        self.records
            .iter()
            .filter(|(_, entry)| include(entry))
            .map(|(key, entry)| {
                let mut record_tag = CompoundTag::new();
                entry.record.save(&mut record_tag);
                record_tag.put_string(RECORD_KEY_KEY, key.as_str());
                Tag::Compound(record_tag)
            })
            .collect()
    }

    // each record is isolated: a malformed one is logged and skipped
    fn read_records(&mut self, records: &[Tag]) {
        for (index, tag) in records.iter().enumerate() {
            let Some(record_tag) = tag.as_compound() else {
                error!("RecordMap: record {} is a {}, not a Compound", index, tag.type_name());
                continue;
            };
            let key = match record_tag.get_string(RECORD_KEY_KEY) {
                Ok(key) => key.to_string(),
                Err(err) => {
                    error!("RecordMap: record {} has no key: {}", index, err);
                    continue;
                }
            };
            match R::load(record_tag) {
                Ok(record) => {
                    self.records.insert(key, RecordEntry { record, dirty: true });
                }
                Err(err) => {
                    error!("RecordMap: failed to load record `{}`: {}", key, err);
                }
            }
        }
    }
}
