use thiserror::Error;

use crate::tag::TagError;

/// Errors that can occur while a Storage reads itself from a document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// A field was missing or had the wrong tag type
    #[error("Malformed storage data: {0}")]
    Tag(#[from] TagError),

    /// A field was well-typed but its value is not acceptable
    #[error("Invalid value for `{field}`: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Errors that can occur while parsing a StorageId
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageIdError {
    #[error("Storage id `{input}` must have a non-empty namespace and path")]
    Empty { input: String },

    #[error("Storage id namespace `{namespace}` contains invalid character {character:?}")]
    InvalidNamespace { namespace: String, character: char },

    #[error("Storage id path `{path}` contains invalid character {character:?}")]
    InvalidPath { path: String, character: char },
}

/// Errors that can occur while attaching storages to a holder
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttachError {
    /// Attachment is a one-shot decision made when the holder is created
    #[error("Storages were already attached to {holder}")]
    AlreadyAttached { holder: String },
}
