use std::fmt;

use serde::{Deserialize, Serialize};

/// Session-scoped numeric id of an entity holder
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub i32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Column coordinate of a chunk holder
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }
}

impl fmt::Display for ChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.z)
    }
}

/// Dimension key of a world holder, e.g. `minecraft:overworld`
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DimensionId(pub String);

impl DimensionId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn overworld() -> Self {
        Self::new("minecraft:overworld")
    }
}

impl fmt::Display for DimensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HolderKind {
    Entity,
    Chunk,
    World,
}

impl HolderKind {
    pub fn name(&self) -> &'static str {
        match self {
            HolderKind::Entity => "entity",
            HolderKind::Chunk => "chunk",
            HolderKind::World => "world",
        }
    }
}

/// Locator of the holder that owns a storage.
///
/// Storages keep one of these as a back-reference; it never extends the
/// lifetime of the holder it points at.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum HolderRef {
    Entity(EntityId),
    Chunk(ChunkPos),
    World(DimensionId),
}

impl HolderRef {
    pub fn kind(&self) -> HolderKind {
        match self {
            HolderRef::Entity(_) => HolderKind::Entity,
            HolderRef::Chunk(_) => HolderKind::Chunk,
            HolderRef::World(_) => HolderKind::World,
        }
    }
}

impl fmt::Display for HolderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HolderRef::Entity(id) => write!(f, "entity {}", id),
            HolderRef::Chunk(pos) => write!(f, "chunk {}", pos),
            HolderRef::World(dimension) => write!(f, "world {}", dimension),
        }
    }
}
