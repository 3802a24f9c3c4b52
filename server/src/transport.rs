use std::{fmt, hash::Hash};

use tether_shared::{HolderRef, SyncPayload};

use crate::error::SendError;

/// The host's networking layer, as seen by the StorageManager
pub trait SyncTransport {
    /// Identifies one connected client
    type Target: Clone + Eq + Hash + fmt::Debug;

    /// Every client currently tracking `holder`. For an entity that is a
    /// player, this includes the player itself.
    fn tracking(&self, holder: &HolderRef) -> Vec<Self::Target>;

    /// Queues `payload` for `target`
    fn send(&mut self, target: &Self::Target, payload: &SyncPayload) -> Result<(), SendError>;
}
