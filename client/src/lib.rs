//! # Tether Client
//! The replica side of storage sync: attaches storages to client-side
//! holders and applies the full snapshots & deltas the server sends.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

mod client_storage_manager;
mod error;
mod replica_world;

pub use client_storage_manager::ClientStorageManager;
pub use error::ApplyError;
pub use replica_world::ReplicaWorld;

pub mod shared {
    pub use tether_shared::{
        ChunkPos, CompoundTag, EntityId, HolderRef, LoadSummary, PayloadCodec, SyncPayload,
    };
}
