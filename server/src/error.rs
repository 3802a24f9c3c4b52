use std::{io, path::PathBuf};

use thiserror::Error;

use tether_shared::PayloadError;

/// Failure to hand a payload to one client
#[derive(Debug, Error)]
pub enum SendError {
    /// The target's connection is gone
    #[error("target {target} is disconnected")]
    Disconnected { target: String },
    /// Payload could not be encoded for the wire
    #[error("payload encoding failed: {0}")]
    Payload(#[from] PayloadError),
    /// Any other transport-level failure
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Failure to read or write a holder's saved storages
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("storage file io failed: {0}")]
    Io(#[from] io::Error),
    #[error("storage file is not a valid document: {0}")]
    Json(#[from] serde_json::Error),
    /// JSON cannot carry NaN or infinity, so the document was not written
    #[error("refusing to write {}: `{key}` is not a finite number", .path.display())]
    NonFinite { path: PathBuf, key: String },
}
