use std::{
    any::{type_name, Any, TypeId},
    collections::BTreeMap,
    mem,
    panic::{catch_unwind, AssertUnwindSafe},
};

use log::{debug, error, info};

use crate::{
    registry::error::RegistryError,
    storage::{
        combined_storage::{CombinedStorage, LoadSummary},
        error::AttachError,
        holder::StorageHolder,
        storage::Storage,
        storage_id::StorageId,
        storage_key::StorageKey,
    },
    tag::CompoundTag,
    types::HolderKind,
};

type AttachPredicate<H> = Box<dyn Fn(&H) -> bool + Send + Sync>;
type StorageFactory<H> = Box<dyn Fn(&H) -> Box<dyn Storage> + Send + Sync>;

struct StorageEntry<H> {
    predicate: AttachPredicate<H>,
    factory: StorageFactory<H>,
    type_id: TypeId,
    type_name: &'static str,
}

/// Storage types registered for one holder kind, and the attachment pass
/// that decides which of them each holder receives
pub struct StorageRegistry<H> {
    kind: HolderKind,
    entries: BTreeMap<StorageId, StorageEntry<H>>,
    locked: bool,
}

impl<H: StorageHolder> StorageRegistry<H> {
    pub fn new(kind: HolderKind) -> Self {
        Self {
            kind,
            entries: BTreeMap::new(),
            locked: false,
        }
    }

    pub fn kind(&self) -> HolderKind {
        self.kind
    }

    /// Registers a storage type. `predicate` decides, once per holder, whether
    /// the holder receives one; `factory` builds it.
    pub fn register<T, P, F>(
        &mut self,
        id: &str,
        predicate: P,
        factory: F,
    ) -> Result<StorageKey<T>, RegistryError>
    where
        T: Storage,
        P: Fn(&H) -> bool + Send + Sync + 'static,
        F: Fn(&H) -> T + Send + Sync + 'static,
    {
        if self.locked {
            return Err(RegistryError::AlreadyLocked {
                kind: self.kind.name(),
            });
        }

        let id = StorageId::parse(id)?;
        if self.entries.contains_key(&id) {
            return Err(RegistryError::DuplicateIdentifier {
                id: id.to_string(),
                kind: self.kind.name(),
            });
        }

        info!(
            "StorageRegistry: registering {} as {} for {} holders",
            type_name::<T>(),
            id,
            self.kind.name()
        );
        self.entries.insert(
            id.clone(),
            StorageEntry {
                predicate: Box::new(predicate),
                factory: Box::new(move |holder: &H| -> Box<dyn Storage> {
                    Box::new(factory(holder))
                }),
                type_id: TypeId::of::<T>(),
                type_name: type_name::<T>(),
            },
        );

        Ok(StorageKey::new(id))
    }

    /// Registers a storage type every holder of this kind receives
    pub fn register_always<T, F>(
        &mut self,
        id: &str,
        factory: F,
    ) -> Result<StorageKey<T>, RegistryError>
    where
        T: Storage,
        F: Fn(&H) -> T + Send + Sync + 'static,
    {
        self.register(id, |_: &H| true, factory)
    }

    /// Recovers the key of an already registered storage, for modules that
    /// did not register it themselves. `None` if `id` is unknown or was
    /// registered with a different type.
    pub fn key<T: Storage>(&self, id: &str) -> Option<StorageKey<T>> {
        let id = StorageId::parse(id).ok()?;
        let entry = self.entries.get(&id)?;
        if entry.type_id != TypeId::of::<T>() {
            return None;
        }
        Some(StorageKey::new(id))
    }

    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn contains(&self, id: &StorageId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &StorageId> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // Attachment

    /// Installs every storage whose predicate accepts `holder`. Runs once per
    /// holder; a predicate or factory that panics only costs its own storage.
    pub fn attach(&self, holder: &mut H) -> Result<Vec<StorageId>, AttachError> {
        if holder.storages().is_attached() {
            return Err(AttachError::AlreadyAttached {
                holder: holder.holder_ref().to_string(),
            });
        }

        let view: &H = holder;
        let mut built = Vec::new();
        for (id, entry) in &self.entries {
            match catch_unwind(AssertUnwindSafe(|| (entry.predicate)(view))) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(panic) => {
                    error!(
                        "StorageRegistry: predicate for {} panicked on {}, not attaching: {}",
                        id,
                        view.holder_ref(),
                        panic_message(&*panic)
                    );
                    continue;
                }
            }
            if let Some(storage) = self.build(id, entry, view) {
                built.push((id.clone(), storage));
            }
        }

        let holder_ref = holder.holder_ref();
        let storages = holder.storages_mut();
        let mut attached = Vec::with_capacity(built.len());
        for (id, storage) in built {
            attached.push(id.clone());
            storages.insert(id, storage);
        }
        storages.set_attached();

        debug!(
            "StorageRegistry: attached {} storages to {}",
            attached.len(),
            holder_ref
        );
        Ok(attached)
    }

    /// Builds the storage registered under `id`, without consulting its
    /// predicate. `None` if the id is unknown or its factory panicked.
    pub fn construct(&self, id: &StorageId, holder: &H) -> Option<Box<dyn Storage>> {
        let entry = self.entries.get(id)?;
        self.build(id, entry, holder)
    }

    /// Applies a full document to `holder`, constructing each entry through
    /// this registry. The holder's storages are detached for the duration, so
    /// factories only see the holder's own fields.
    pub fn load_into(&self, holder: &mut H, document: &CompoundTag) -> LoadSummary {
        let placeholder = CombinedStorage::new(holder.holder_ref());
        let mut combined = mem::replace(holder.storages_mut(), placeholder);

        let view: &H = holder;
        let summary = combined.load(document, |id| self.construct(id, view));

        *holder.storages_mut() = combined;
        summary
    }

    fn build(
        &self,
        id: &StorageId,
        entry: &StorageEntry<H>,
        holder: &H,
    ) -> Option<Box<dyn Storage>> {
        match catch_unwind(AssertUnwindSafe(|| (entry.factory)(holder))) {
            Ok(storage) => Some(storage),
            Err(panic) => {
                error!(
                    "StorageRegistry: factory for {} ({}) panicked on {}: {}",
                    id,
                    entry.type_name,
                    holder.holder_ref(),
                    panic_message(&*panic)
                );
                None
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "<non-string panic>"
    }
}
