use std::any::Any;

use crate::{
    storage::error::StorageError,
    tag::CompoundTag,
    types::HolderRef,
};

/// Upcast helper so type-erased storages can be downcast through their key
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Bookkeeping every Storage carries: the holder it belongs to and whether
/// it has local changes that have not reached remote replicas yet
#[derive(Clone, Debug)]
pub struct StorageState {
    holder: HolderRef,
    dirty: bool,
}

impl StorageState {
    /// Fresh storages start dirty so the first sync always includes them
    pub fn new(holder: HolderRef) -> Self {
        Self {
            holder,
            dirty: true,
        }
    }

    pub fn holder(&self) -> &HolderRef {
        &self.holder
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn clear_dirty(&mut self) {
        self.dirty = false;
    }
}

/// A unit of persistable, syncable state attached to one holder.
///
/// `save`/`load` move the entire logical state. `save_outdated` and
/// `load_update` carry deltas; they default to the full forms, and storages
/// that hold collections of sub-records should override them (see
/// [`RecordMap`](crate::RecordMap)).
pub trait Storage: AsAny + Send + Sync {
    fn state(&self) -> &StorageState;

    fn state_mut(&mut self) -> &mut StorageState;

    /// Writes the entire state. Must not mutate the storage.
    fn save(&self, tag: &mut CompoundTag);

    /// Replaces the state with one previously produced by `save`. Fields
    /// missing from `tag` keep their defaults.
    fn load(&mut self, tag: &CompoundTag) -> Result<(), StorageError>;

    /// Writes whatever changed since the last delta
    fn save_outdated(&self, tag: &mut CompoundTag) {
        self.save(tag);
    }

    /// Applies a document produced by `save_outdated`
    fn load_update(&mut self, tag: &CompoundTag) -> Result<(), StorageError> {
        self.load(tag)
    }

    /// Called right after this storage's delta was packaged and its dirty
    /// flag cleared. Storages tracking per-record changes reset them here.
    fn clear_outdated(&mut self) {}

    fn holder(&self) -> &HolderRef {
        self.state().holder()
    }

    fn is_dirty(&self) -> bool {
        self.state().is_dirty()
    }

    fn mark_dirty(&mut self) {
        self.state_mut().mark_dirty();
    }
}
