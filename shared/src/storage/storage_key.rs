use std::{fmt, hash::Hash, marker::PhantomData};

use super::{storage::Storage, storage_id::StorageId};

/// Typed capability for fetching one kind of Storage from a holder.
///
/// Keys are only minted by a registry when the storage type is registered,
/// so holding one proves the identifier resolves to `T`.
pub struct StorageKey<T: Storage> {
    id: StorageId,
    phantom_t: PhantomData<fn() -> T>,
}

impl<T: Storage> StorageKey<T> {
    pub(crate) fn new(id: StorageId) -> Self {
        Self {
            id,
            phantom_t: PhantomData,
        }
    }

    pub fn id(&self) -> &StorageId {
        &self.id
    }
}

impl<T: Storage> Clone for StorageKey<T> {
    fn clone(&self) -> Self {
        Self::new(self.id.clone())
    }
}

// keys of different types never compare, so equality only needs the id
impl<T: Storage> PartialEq for StorageKey<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T: Storage> Eq for StorageKey<T> {}

impl<T: Storage> Hash for StorageKey<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T: Storage> fmt::Debug for StorageKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageKey")
            .field("id", &self.id)
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}
