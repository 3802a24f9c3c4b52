use std::{collections::BTreeMap, fmt};

use log::{debug, error, warn};

use crate::{
    storage::{storage::Storage, storage_id::StorageId, storage_key::StorageKey},
    tag::{CompoundTag, Tag},
    types::HolderRef,
};

/// Top-level key of a combined document
pub const ENTRIES_KEY: &str = "entries";
/// Key every entry is tagged with; storages must not write it themselves
pub const ID_KEY: &str = "id";

/// Outcome of applying a document to a CombinedStorage
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Identifiers that were applied, in document order
    pub loaded: Vec<StorageId>,
    /// Entries that were logged and skipped
    pub dropped: usize,
}

/// Every Storage attached to one holder, keyed by identifier
pub struct CombinedStorage {
    holder: HolderRef,
    storages: BTreeMap<StorageId, Box<dyn Storage>>,
    attached: bool,
}

impl CombinedStorage {
    pub fn new(holder: HolderRef) -> Self {
        Self {
            holder,
            storages: BTreeMap::new(),
            attached: false,
        }
    }

    pub fn holder(&self) -> &HolderRef {
        &self.holder
    }

    /// Whether the attachment pass has run for this holder
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub(crate) fn set_attached(&mut self) {
        self.attached = true;
    }

    pub(crate) fn insert(&mut self, id: StorageId, storage: Box<dyn Storage>) {
        if self.storages.insert(id.clone(), storage).is_some() {
            debug!("CombinedStorage: replaced Storage {} on {}", id, self.holder);
        }
    }

    // Lookup

    pub fn get<T: Storage>(&self, key: &StorageKey<T>) -> Option<&T> {
        let storage = self.storages.get(key.id())?;
        (**storage).as_any().downcast_ref::<T>()
    }

    pub fn get_mut<T: Storage>(&mut self, key: &StorageKey<T>) -> Option<&mut T> {
        let storage = self.storages.get_mut(key.id())?;
        (**storage).as_any_mut().downcast_mut::<T>()
    }

    pub fn get_dyn(&self, id: &StorageId) -> Option<&dyn Storage> {
        self.storages.get(id).map(|storage| &**storage)
    }

    pub fn contains(&self, id: &StorageId) -> bool {
        self.storages.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &StorageId> {
        self.storages.keys()
    }

    pub fn len(&self) -> usize {
        self.storages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storages.is_empty()
    }

    /// True iff at least one contained storage is dirty
    pub fn is_dirty(&self) -> bool {
        self.storages.values().any(|storage| storage.is_dirty())
    }

    // Full documents

    /// Writes every storage's full state, one entry per storage
    pub fn to_tag(&self) -> CompoundTag {
        let entries = self
            .storages
            .iter()
            .map(|(id, storage)| {
                let mut entry = CompoundTag::new();
                storage.save(&mut entry);
                Tag::Compound(self.tag_entry(id, entry))
            })
            .collect();

        Self::document(entries)
    }

    /// Replaces state from a full document.
    ///
    /// Each entry is resolved through `construct`, loaded into the fresh
    /// storage, and only then installed; entries that fail to resolve or to
    /// load are logged and dropped without touching the rest.
    pub fn load<F>(&mut self, document: &CompoundTag, mut construct: F) -> LoadSummary
    where
        F: FnMut(&StorageId) -> Option<Box<dyn Storage>>,
    {
        let mut summary = LoadSummary::default();

        for (id, entry) in self.read_entries(document, &mut summary) {
            let Some(mut storage) = construct(&id) else {
                warn!(
                    "CombinedStorage: no Storage registered as {} for {}, dropping entry",
                    id, self.holder
                );
                summary.dropped += 1;
                continue;
            };

            match storage.load(entry) {
                Ok(()) => {
                    self.insert(id.clone(), storage);
                    summary.loaded.push(id);
                }
                Err(err) => {
                    error!(
                        "CombinedStorage: failed to load Storage {} on {}: {}",
                        id, self.holder, err
                    );
                    summary.dropped += 1;
                }
            }
        }

        summary
    }

    // Deltas

    /// Merges a delta document into the existing storages. Entries for
    /// storages this holder does not have are skipped.
    pub fn handle_update_packet(&mut self, document: &CompoundTag) -> LoadSummary {
        let mut summary = LoadSummary::default();

        for (id, entry) in self.read_entries(document, &mut summary) {
            let Some(storage) = self.storages.get_mut(&id) else {
                warn!(
                    "CombinedStorage: update for Storage {} which {} does not have, skipping",
                    id, self.holder
                );
                summary.dropped += 1;
                continue;
            };

            match storage.load_update(entry) {
                Ok(()) => summary.loaded.push(id),
                Err(err) => {
                    error!(
                        "CombinedStorage: failed to apply update to Storage {} on {}: {}",
                        id, self.holder, err
                    );
                    summary.dropped += 1;
                }
            }
        }

        summary
    }

    /// Writes `save_outdated` for every dirty storage. With `clean`, each
    /// storage's dirty flag is cleared right after its own entry is written.
    pub fn create_update_packet(&mut self, clean: bool) -> CompoundTag {
        let mut entries = Vec::new();

        for (id, storage) in self.storages.iter_mut() {
            if !storage.is_dirty() {
                continue;
            }

            let mut entry = CompoundTag::new();
            storage.save_outdated(&mut entry);
            entries.push(Tag::Compound(Self::tag_entry_for(&self.holder, id, entry)));

            if clean {
                Self::clean_storage(&mut **storage);
            }
        }

        Self::document(entries)
    }

    /// The delta `create_update_packet(false)` would write, without needing
    /// mutable access
    pub fn peek_update_packet(&self) -> CompoundTag {
        let entries = self
            .storages
            .iter()
            .filter(|(_, storage)| storage.is_dirty())
            .map(|(id, storage)| {
                let mut entry = CompoundTag::new();
                storage.save_outdated(&mut entry);
                Tag::Compound(self.tag_entry(id, entry))
            })
            .collect();

        Self::document(entries)
    }

    /// Clears the dirty flag of every storage that has an entry in `packet`,
    /// a document previously returned by `create_update_packet(false)`.
    /// Used by the sync layer once the packet is known to be queued.
    pub fn acknowledge_update(&mut self, packet: &CompoundTag) {
        let Ok(entries) = packet.get_list(ENTRIES_KEY) else {
            return;
        };

        for entry in entries.iter().filter_map(Tag::as_compound) {
            let Some(id) = entry
                .get_string(ID_KEY)
                .ok()
                .and_then(|id| StorageId::parse(id).ok())
            else {
                continue;
            };
            if let Some(storage) = self.storages.get_mut(&id) {
                Self::clean_storage(&mut **storage);
            }
        }
    }

    /// Clears every storage's pending changes, e.g. on a replica right after
    /// it applied a server payload
    pub fn mark_synced(&mut self) {
        for storage in self.storages.values_mut() {
            Self::clean_storage(&mut **storage);
        }
    }

    // Helpers

    fn clean_storage(storage: &mut dyn Storage) {
        storage.state_mut().clear_dirty();
        storage.clear_outdated();
    }

    fn document(entries: Vec<Tag>) -> CompoundTag {
        let mut document = CompoundTag::new();
        document.put_list(ENTRIES_KEY, entries);
        document
    }

    fn tag_entry(&self, id: &StorageId, entry: CompoundTag) -> CompoundTag {
        Self::tag_entry_for(&self.holder, id, entry)
    }

    fn tag_entry_for(holder: &HolderRef, id: &StorageId, mut entry: CompoundTag) -> CompoundTag {
        if entry.put(ID_KEY, id.as_str()).is_some() {
            warn!(
                "CombinedStorage: Storage {} on {} wrote the reserved `{}` key, it was overwritten",
                id, holder, ID_KEY
            );
        }
        entry
    }

    /// Pulls `(id, entry)` pairs out of a document, logging and counting the
    /// entries that cannot even be identified
    fn read_entries<'d>(
        &self,
        document: &'d CompoundTag,
        summary: &mut LoadSummary,
    ) -> Vec<(StorageId, &'d CompoundTag)> {
        let entries = match document.get_list(ENTRIES_KEY) {
            Ok(entries) => entries,
            Err(err) => {
                error!("CombinedStorage: unreadable document for {}: {}", self.holder, err);
                return Vec::new();
            }
        };

        let mut output = Vec::with_capacity(entries.len());
        for (index, tag) in entries.iter().enumerate() {
            let Some(entry) = tag.as_compound() else {
                error!(
                    "CombinedStorage: entry {} for {} is a {}, not a Compound",
                    index,
                    self.holder,
                    tag.type_name()
                );
                summary.dropped += 1;
                continue;
            };
            let raw_id = match entry.get_string(ID_KEY) {
                Ok(raw_id) => raw_id,
                Err(err) => {
                    error!(
                        "CombinedStorage: entry {} for {} has no readable id: {}",
                        index, self.holder, err
                    );
                    summary.dropped += 1;
                    continue;
                }
            };
            match StorageId::parse(raw_id) {
                Ok(id) => output.push((id, entry)),
                Err(err) => {
                    warn!(
                        "CombinedStorage: entry {} for {} has an unresolvable id: {}",
                        index, self.holder, err
                    );
                    summary.dropped += 1;
                }
            }
        }
        output
    }
}

impl fmt::Debug for CombinedStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombinedStorage")
            .field("holder", &self.holder)
            .field("storages", &self.storages.keys().collect::<Vec<_>>())
            .field("attached", &self.attached)
            .finish()
    }
}
