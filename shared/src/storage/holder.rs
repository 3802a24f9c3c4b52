use crate::{
    storage::{combined_storage::CombinedStorage, storage::Storage, storage_key::StorageKey},
    types::HolderRef,
};

/// A game object (entity, chunk, or world) that owns a CombinedStorage for
/// its whole lifetime. Host engines implement this on their own types.
pub trait StorageHolder: 'static {
    fn holder_ref(&self) -> HolderRef;

    fn storages(&self) -> &CombinedStorage;

    fn storages_mut(&mut self) -> &mut CombinedStorage;

    /// `None` means the storage's predicate never accepted this holder
    fn get_storage<T: Storage>(&self, key: &StorageKey<T>) -> Option<&T> {
        self.storages().get(key)
    }

    fn get_storage_mut<T: Storage>(&mut self, key: &StorageKey<T>) -> Option<&mut T> {
        self.storages_mut().get_mut(key)
    }
}
