use tether_shared::{ChunkPos, EntityId, StorageHolder};

/// The client's view of the holders it replicates, used to resolve the
/// locator a payload carries
pub trait ReplicaWorld {
    type Entity: StorageHolder;
    type Chunk: StorageHolder;
    type World: StorageHolder;

    fn entity_mut(&mut self, id: EntityId) -> Option<&mut Self::Entity>;

    fn chunk_mut(&mut self, pos: ChunkPos) -> Option<&mut Self::Chunk>;

    /// The world the client is currently in; world payloads always target it
    fn world_mut(&mut self) -> Option<&mut Self::World>;
}
