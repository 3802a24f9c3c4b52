use std::default::Default;

use tether_shared::CompressionMode;

/// When the dirty flags of storages included in a delta are cleared
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClearPolicy {
    /// Clear only once every tracking target accepted the delta. A failed
    /// send leaves the storages dirty so the next delta carries them again.
    #[default]
    AfterSend,
    /// Clear as each storage's entry is written into the delta, whether or
    /// not the delta reaches anyone
    OnPackage,
}

/// Contains Config properties which will be used by the StorageManager
#[derive(Clone, Debug)]
pub struct ManagerConfig {
    /// Determines when dirty flags are reset after a delta is built
    pub clear_policy: ClearPolicy,
    /// Whether a successor entity (respawned player, converted mob) receives
    /// a copy of its predecessor's storages
    pub copy_on_clone: bool,
    /// Compression applied by `StorageManager::codec` when payloads are
    /// turned into bytes
    pub compression: CompressionMode,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            clear_policy: ClearPolicy::default(),
            copy_on_clone: true,
            compression: CompressionMode::default(),
        }
    }
}
