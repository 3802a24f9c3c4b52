use log::{debug, info, warn};

use tether_shared::{
    AttachError, ChunkPos, CompoundTag, EntityId, LoadSummary, PayloadCodec, StorageHolder,
    StorageId, StorageRegistries, StorageRegistry, SyncPayload,
};

use crate::{error::ApplyError, replica_world::ReplicaWorld};

/// Applies server payloads to client-side holders. Holds the same registries
/// as the server so full snapshots can construct storages by identifier.
pub struct ClientStorageManager<E: StorageHolder, C: StorageHolder, W: StorageHolder> {
    registries: StorageRegistries<E, C, W>,
    codec: PayloadCodec,
}

impl<E: StorageHolder, C: StorageHolder, W: StorageHolder> ClientStorageManager<E, C, W> {
    pub fn new(mut registries: StorageRegistries<E, C, W>) -> Self {
        registries.lock();
        info!(
            "ClientStorageManager: ready with {} entity, {} chunk and {} world storage types",
            registries.entity.len(),
            registries.chunk.len(),
            registries.world.len()
        );

        Self {
            registries,
            codec: PayloadCodec::default(),
        }
    }

    pub fn registries(&self) -> &StorageRegistries<E, C, W> {
        &self.registries
    }

    // Attachment triggers

    pub fn on_entity_created(&self, entity: &mut E) -> Result<Vec<StorageId>, AttachError> {
        self.registries.entity.attach(entity)
    }

    pub fn on_chunk_loaded(&self, chunk: &mut C) -> Result<Vec<StorageId>, AttachError> {
        self.registries.chunk.attach(chunk)
    }

    pub fn on_world_loaded(&self, world: &mut W) -> Result<Vec<StorageId>, AttachError> {
        self.registries.world.attach(world)
    }

    // Incoming payloads

    /// Decodes `bytes` and applies the payload
    pub fn receive<R>(&self, world: &mut R, bytes: &[u8]) -> Result<LoadSummary, ApplyError>
    where
        R: ReplicaWorld<Entity = E, Chunk = C, World = W>,
    {
        let payload = self.codec.decode(bytes).map_err(|err| {
            warn!("ClientStorageManager: dropping unreadable payload: {}", err);
            ApplyError::from(err)
        })?;
        self.apply(world, &payload)
    }

    /// Applies a full snapshot or a delta to the holder the payload addresses
    pub fn apply<R>(&self, world: &mut R, payload: &SyncPayload) -> Result<LoadSummary, ApplyError>
    where
        R: ReplicaWorld<Entity = E, Chunk = C, World = W>,
    {
        match payload {
            SyncPayload::Entity(entity_payload) => {
                let id = EntityId(entity_payload.entity_id);
                let Some(entity) = world.entity_mut(id) else {
                    return Err(not_found(format!("entity {}", id)));
                };
                Ok(apply_to(
                    &self.registries.entity,
                    entity,
                    entity_payload.is_update,
                    &entity_payload.storage_tag,
                ))
            }
            SyncPayload::Chunk(chunk_payload) => {
                let pos = ChunkPos::new(chunk_payload.x, chunk_payload.z);
                let Some(chunk) = world.chunk_mut(pos) else {
                    return Err(not_found(format!("chunk {}", pos)));
                };
                Ok(apply_to(
                    &self.registries.chunk,
                    chunk,
                    chunk_payload.is_update,
                    &chunk_payload.storage_tag,
                ))
            }
            SyncPayload::World(world_payload) => {
                let Some(current) = world.world_mut() else {
                    return Err(not_found("the current world".to_string()));
                };
                Ok(apply_to(
                    &self.registries.world,
                    current,
                    world_payload.is_update,
                    &world_payload.storage_tag,
                ))
            }
        }
    }
}

fn apply_to<H: StorageHolder>(
    registry: &StorageRegistry<H>,
    holder: &mut H,
    is_update: bool,
    document: &CompoundTag,
) -> LoadSummary {
    let summary = if is_update {
        holder.storages_mut().handle_update_packet(document)
    } else {
        registry.load_into(holder, document)
    };
    // a replica mirrors the server; nothing it just applied is a local change
    holder.storages_mut().mark_synced();

    debug!(
        "ClientStorageManager: applied {} to {}, {} entries loaded, {} dropped",
        if is_update { "delta" } else { "snapshot" },
        holder.holder_ref(),
        summary.loaded.len(),
        summary.dropped
    );
    summary
}

fn not_found(holder: String) -> ApplyError {
    warn!("ClientStorageManager: payload for {}, which has no replica", holder);
    ApplyError::HolderNotFound { holder }
}
