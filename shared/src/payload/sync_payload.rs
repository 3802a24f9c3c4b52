use serde::{Deserialize, Serialize};

use crate::{
    tag::CompoundTag,
    types::{ChunkPos, EntityId, HolderKind, HolderRef},
};

/// Storages of one entity, addressed by its session id
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntitySyncPayload {
    pub entity_id: i32,
    pub is_update: bool,
    pub storage_tag: CompoundTag,
}

/// Storages of one chunk, addressed by its column coordinate
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChunkSyncPayload {
    pub x: i32,
    pub z: i32,
    pub is_update: bool,
    pub storage_tag: CompoundTag,
}

/// Storages of the receiver's current world; the world is implied by the
/// connection
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldSyncPayload {
    pub is_update: bool,
    pub storage_tag: CompoundTag,
}

/// A full snapshot (`is_update == false`, from `CombinedStorage::to_tag`) or
/// a delta (`is_update == true`, from `CombinedStorage::create_update_packet`)
/// of one holder's storages
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SyncPayload {
    Entity(EntitySyncPayload),
    Chunk(ChunkSyncPayload),
    World(WorldSyncPayload),
}

impl SyncPayload {
    /// Builds the payload shape that matches the holder's kind
    pub fn for_holder(holder: &HolderRef, is_update: bool, storage_tag: CompoundTag) -> Self {
        match holder {
            HolderRef::Entity(EntityId(entity_id)) => SyncPayload::Entity(EntitySyncPayload {
                entity_id: *entity_id,
                is_update,
                storage_tag,
            }),
            HolderRef::Chunk(ChunkPos { x, z }) => SyncPayload::Chunk(ChunkSyncPayload {
                x: *x,
                z: *z,
                is_update,
                storage_tag,
            }),
            HolderRef::World(_) => SyncPayload::World(WorldSyncPayload {
                is_update,
                storage_tag,
            }),
        }
    }

    pub fn kind(&self) -> HolderKind {
        match self {
            SyncPayload::Entity(_) => HolderKind::Entity,
            SyncPayload::Chunk(_) => HolderKind::Chunk,
            SyncPayload::World(_) => HolderKind::World,
        }
    }

    pub fn is_update(&self) -> bool {
        match self {
            SyncPayload::Entity(payload) => payload.is_update,
            SyncPayload::Chunk(payload) => payload.is_update,
            SyncPayload::World(payload) => payload.is_update,
        }
    }

    pub fn storage_tag(&self) -> &CompoundTag {
        match self {
            SyncPayload::Entity(payload) => &payload.storage_tag,
            SyncPayload::Chunk(payload) => &payload.storage_tag,
            SyncPayload::World(payload) => &payload.storage_tag,
        }
    }
}
