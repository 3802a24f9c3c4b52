use crate::{
    storage::{holder::StorageHolder, storage::Storage, storage_key::StorageKey},
    types::HolderKind,
};

pub mod error;
pub mod storage_registry;

pub use error::RegistryError;
pub use storage_registry::StorageRegistry;

// Storage Plugin
/// A gameplay module's registration hook, run once during bootstrap
pub trait StoragePlugin<E: StorageHolder, C: StorageHolder, W: StorageHolder> {
    fn build(&self, registries: &mut StorageRegistries<E, C, W>) -> Result<(), RegistryError>;
}

// Storage Registries
/// One registry per holder kind. Built once at bootstrap, then locked and
/// handed to the server or client manager.
pub struct StorageRegistries<E: StorageHolder, C: StorageHolder, W: StorageHolder> {
    pub entity: StorageRegistry<E>,
    pub chunk: StorageRegistry<C>,
    pub world: StorageRegistry<W>,
}

impl<E: StorageHolder, C: StorageHolder, W: StorageHolder> Default for StorageRegistries<E, C, W> {
    fn default() -> Self {
        Self {
            entity: StorageRegistry::new(HolderKind::Entity),
            chunk: StorageRegistry::new(HolderKind::Chunk),
            world: StorageRegistry::new(HolderKind::World),
        }
    }
}

impl<E: StorageHolder, C: StorageHolder, W: StorageHolder> StorageRegistries<E, C, W> {
    pub fn builder() -> Self {
        Self::default()
    }

    pub fn add_plugin<P: StoragePlugin<E, C, W>>(
        &mut self,
        plugin: P,
    ) -> Result<&mut Self, RegistryError> {
        plugin.build(self)?;
        Ok(self)
    }

    pub fn register_entity<T, P, F>(
        &mut self,
        id: &str,
        predicate: P,
        factory: F,
    ) -> Result<StorageKey<T>, RegistryError>
    where
        T: Storage,
        P: Fn(&E) -> bool + Send + Sync + 'static,
        F: Fn(&E) -> T + Send + Sync + 'static,
    {
        self.entity.register(id, predicate, factory)
    }

    pub fn register_chunk<T, P, F>(
        &mut self,
        id: &str,
        predicate: P,
        factory: F,
    ) -> Result<StorageKey<T>, RegistryError>
    where
        T: Storage,
        P: Fn(&C) -> bool + Send + Sync + 'static,
        F: Fn(&C) -> T + Send + Sync + 'static,
    {
        self.chunk.register(id, predicate, factory)
    }

    pub fn register_world<T, P, F>(
        &mut self,
        id: &str,
        predicate: P,
        factory: F,
    ) -> Result<StorageKey<T>, RegistryError>
    where
        T: Storage,
        P: Fn(&W) -> bool + Send + Sync + 'static,
        F: Fn(&W) -> T + Send + Sync + 'static,
    {
        self.world.register(id, predicate, factory)
    }

    /// Finalizes all three registries; later registrations fail with
    /// `RegistryError::AlreadyLocked`
    pub fn lock(&mut self) {
        self.entity.lock();
        self.chunk.lock();
        self.world.lock();
    }

    pub fn is_locked(&self) -> bool {
        self.entity.is_locked() && self.chunk.is_locked() && self.world.is_locked()
    }

    pub fn build(&mut self) -> Self {
        std::mem::take(self)
    }
}
