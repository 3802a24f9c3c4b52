//! # Tether Server
//! The authoritative side of storage sync: attaches registered storages to
//! entities, chunks & worlds as they are created, and sends full snapshots
//! or deltas of them to every client tracking the holder.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

mod error;
mod manager;
mod persistence;
mod transport;

pub use error::{PersistError, SendError};
pub use manager::{ClearPolicy, ManagerConfig, StorageManager, SyncReport};
pub use persistence::SavedStorageFile;
pub use transport::SyncTransport;

pub mod shared {
    pub use tether_shared::{
        CompoundTag, CompressionMode, HolderKind, HolderRef, LoadSummary, PayloadCodec, StorageId,
        SyncPayload,
    };
}
