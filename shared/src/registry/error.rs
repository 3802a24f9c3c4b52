use thiserror::Error;

use crate::storage::error::StorageIdError;

/// Errors that can occur while registering storage types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Registry is locked and cannot be modified
    #[error("The {kind} storage registry is already locked. Storages must be registered before the registries are handed to a manager")]
    AlreadyLocked { kind: &'static str },

    /// The same identifier was registered twice for one holder kind
    #[error("Storage {id} is already registered for {kind} holders")]
    DuplicateIdentifier { id: String, kind: &'static str },

    /// The identifier could not be parsed
    #[error("Invalid storage identifier: {0}")]
    InvalidId(#[from] StorageIdError),
}
