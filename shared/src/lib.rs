//! # Tether Shared
//! Storage attachment and synchronization primitives shared between the
//! tether-server & tether-client crates: the structured data model, the
//! Storage contract, per-holder-kind registries, the per-holder
//! CombinedStorage, and the sync payloads built from it.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

#[macro_use]
extern crate cfg_if;

mod payload;
mod registry;
mod storage;
mod tag;
mod types;

pub use payload::{
    codec::{CompressionMode, PayloadCodec, FORMAT_VERSION, HEADER_LEN, PAYLOAD_MAGIC},
    error::PayloadError,
    sync_payload::{ChunkSyncPayload, EntitySyncPayload, SyncPayload, WorldSyncPayload},
};
pub use registry::{RegistryError, StoragePlugin, StorageRegistries, StorageRegistry};
pub use storage::{
    combined_storage::{CombinedStorage, LoadSummary, ENTRIES_KEY, ID_KEY},
    error::{AttachError, StorageError, StorageIdError},
    holder::StorageHolder,
    record_map::{Record, RecordMap, RECORDS_KEY, RECORD_KEY_KEY, RESET_KEY},
    storage::{AsAny, Storage, StorageState},
    storage_id::StorageId,
    storage_key::StorageKey,
};
pub use tag::{CompoundTag, Tag, TagError};
pub use types::{ChunkPos, DimensionId, EntityId, HolderKind, HolderRef};
