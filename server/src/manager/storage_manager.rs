use std::ops::AddAssign;

use log::{debug, info, warn};

use tether_shared::{
    AttachError, CompoundTag, LoadSummary, PayloadCodec, Storage, StorageHolder,
    StorageId, StorageRegistries, SyncPayload,
};

use crate::{
    error::{PersistError, SendError},
    manager::{ClearPolicy, ManagerConfig},
    persistence::SavedStorageFile,
    transport::SyncTransport,
};

/// Outcome of one sync operation across its targets
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Payloads the transport accepted
    pub sent: usize,
    /// Payloads the transport refused
    pub failed: usize,
}

impl SyncReport {
    /// True if no send failed. A sync with no targets is delivered.
    pub fn is_delivered(&self) -> bool {
        self.failed == 0
    }

    fn record(&mut self, result: &Result<(), SendError>) {
        match result {
            Ok(()) => self.sent += 1,
            Err(_) => self.failed += 1,
        }
    }
}

impl AddAssign for SyncReport {
    fn add_assign(&mut self, other: Self) {
        self.sent += other.sent;
        self.failed += other.failed;
    }
}

/// Authoritative-side coordinator: runs attachment for newly created
/// holders, reacts to lifecycle events with full resends, and pushes deltas
/// of dirty storages to every client tracking a holder
pub struct StorageManager<E: StorageHolder, C: StorageHolder, W: StorageHolder> {
    config: ManagerConfig,
    registries: StorageRegistries<E, C, W>,
}

impl<E: StorageHolder, C: StorageHolder, W: StorageHolder> StorageManager<E, C, W> {
    /// Create a new StorageManager. The registries are locked here; any
    /// registration must happen before.
    pub fn new(mut registries: StorageRegistries<E, C, W>, config: ManagerConfig) -> Self {
        registries.lock();
        info!(
            "StorageManager: ready with {} entity, {} chunk and {} world storage types",
            registries.entity.len(),
            registries.chunk.len(),
            registries.world.len()
        );

        Self { config, registries }
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn registries(&self) -> &StorageRegistries<E, C, W> {
        &self.registries
    }

    /// Codec hosts use to put payloads on the wire, set up with the
    /// configured compression
    pub fn codec(&self) -> PayloadCodec {
        PayloadCodec::new(self.config.compression)
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

    // Storage construction

    /// Builds the entity storage registered under `id`, `None` if unknown
    pub fn construct_entity_storage(&self, id: &StorageId, entity: &E) -> Option<Box<dyn Storage>> {
        self.registries.entity.construct(id, entity)
    }

    pub fn construct_chunk_storage(&self, id: &StorageId, chunk: &C) -> Option<Box<dyn Storage>> {
        self.registries.chunk.construct(id, chunk)
    }

    pub fn construct_world_storage(&self, id: &StorageId, world: &W) -> Option<Box<dyn Storage>> {
        self.registries.world.construct(id, world)
    }

    // Lifecycle hooks

    /// An entity entered the world: everyone already tracking it gets its
    /// full state
    pub fn on_entity_joined<T: SyncTransport>(&self, transport: &mut T, entity: &E) -> SyncReport {
        self.send_full(transport, entity)
    }

    /// `target` began tracking `entity`, which others may already replicate
    pub fn on_start_tracking<T: SyncTransport>(
        &self,
        transport: &mut T,
        target: &T::Target,
        entity: &E,
    ) -> Result<(), SendError> {
        self.sync_target(transport, target, entity)
    }

    /// `target` began watching `chunk`
    pub fn on_chunk_watched<T: SyncTransport>(
        &self,
        transport: &mut T,
        target: &T::Target,
        chunk: &C,
    ) -> Result<(), SendError> {
        self.sync_target(transport, target, chunk)
    }

    /// A player connected: they receive their world and themselves
    pub fn on_player_logged_in<T: SyncTransport>(
        &self,
        transport: &mut T,
        target: &T::Target,
        player: &E,
        world: &W,
    ) -> SyncReport {
        self.resend_player_context(transport, target, player, world)
    }

    /// The client discarded its replica of the player on respawn, so both the
    /// world and the player are resent in full
    pub fn on_player_respawned<T: SyncTransport>(
        &self,
        transport: &mut T,
        target: &T::Target,
        player: &E,
        world: &W,
    ) -> SyncReport {
        self.resend_player_context(transport, target, player, world)
    }

    /// The player moved to `world`; the client now needs that world's
    /// storages and a fresh copy of its own
    pub fn on_dimension_changed<T: SyncTransport>(
        &self,
        transport: &mut T,
        target: &T::Target,
        player: &E,
        world: &W,
    ) -> SyncReport {
        self.resend_player_context(transport, target, player, world)
    }

    /// `successor` replaces `original` as the same logical entity. Its
    /// storages are overwritten with a deep copy of the original's full
    /// state; a storage's `load` decides which transient fields reset.
    pub fn on_entity_cloned(&self, original: &E, successor: &mut E) -> LoadSummary {
        if !self.config.copy_on_clone {
            debug!(
                "StorageManager: copy on clone disabled, {} starts fresh",
                successor.holder_ref()
            );
            return LoadSummary::default();
        }

        let document = original.storages().to_tag();
        let summary = self.registries.entity.load_into(successor, &document);
        debug!(
            "StorageManager: copied {} storages from {} to {}",
            summary.loaded.len(),
            original.holder_ref(),
            successor.holder_ref()
        );
        summary
    }

    // Sync

    /// Sends `holder` to every client tracking it: its full state, or with
    /// `is_update` a delta of its dirty storages
    pub fn sync_tracking<T: SyncTransport, H: StorageHolder>(
        &self,
        transport: &mut T,
        holder: &mut H,
        is_update: bool,
    ) -> SyncReport {
        if is_update {
            self.send_delta(transport, holder)
        } else {
            self.send_full(transport, holder)
        }
    }

    /// Sends the full state of `holder` to exactly one client
    pub fn sync_target<T: SyncTransport, H: StorageHolder>(
        &self,
        transport: &mut T,
        target: &T::Target,
        holder: &H,
    ) -> Result<(), SendError> {
        let payload = self.build_payload(holder, false);
        let result = transport.send(target, &payload);
        if let Err(err) = &result {
            warn!(
                "StorageManager: full sync of {} to {:?} failed: {}",
                holder.holder_ref(),
                target,
                err
            );
        }
        result
    }

    /// Pushes a delta of `holder`'s dirty storages to its tracking clients.
    /// Does nothing if no storage is dirty.
    pub fn sync<T: SyncTransport, H: StorageHolder>(
        &self,
        transport: &mut T,
        holder: &mut H,
    ) -> SyncReport {
        self.send_delta(transport, holder)
    }

    /// Runs `sync` over a batch of holders, typically once per tick
    pub fn flush_dirty<'h, T, H, I>(&self, transport: &mut T, holders: I) -> SyncReport
    where
        T: SyncTransport,
        H: StorageHolder,
        I: IntoIterator<Item = &'h mut H>,
    {
        let mut report = SyncReport::default();
        for holder in holders {
            report += self.send_delta(transport, holder);
        }
        report
    }

    /// Full snapshot payload for `holder`. With `is_update`, a delta of its
    /// dirty storages is written instead, without clearing anything.
    pub fn build_payload<H: StorageHolder>(&self, holder: &H, is_update: bool) -> SyncPayload {
        let storages = holder.storages();
        let document = if is_update {
            storages.peek_update_packet()
        } else {
            storages.to_tag()
        };
        SyncPayload::for_holder(&holder.holder_ref(), is_update, document)
    }

    // Persistence

    /// The holder's full document, in the shape saved data and sync share
    pub fn save_holder<H: StorageHolder>(&self, holder: &H) -> CompoundTag {
        holder.storages().to_tag()
    }

    pub fn restore_entity(&self, entity: &mut E, document: &CompoundTag) -> LoadSummary {
        self.registries.entity.load_into(entity, document)
    }

    pub fn restore_chunk(&self, chunk: &mut C, document: &CompoundTag) -> LoadSummary {
        self.registries.chunk.load_into(chunk, document)
    }

    pub fn restore_world(&self, world: &mut W, document: &CompoundTag) -> LoadSummary {
        self.registries.world.load_into(world, document)
    }

    /// Writes the world's storages to its saved data file
    pub fn save_world_to(&self, world: &W, file: &SavedStorageFile) -> Result<(), PersistError> {
        file.write(&self.save_holder(world))
    }

    /// Restores the world's storages from its saved data file. A missing file
    /// is a fresh world and loads nothing.
    pub fn restore_world_from(
        &self,
        world: &mut W,
        file: &SavedStorageFile,
    ) -> Result<LoadSummary, PersistError> {
        match file.read()? {
            Some(document) => Ok(self.restore_world(world, &document)),
            None => {
                info!(
                    "StorageManager: no saved storages for {} at {}",
                    world.holder_ref(),
                    file.path().display()
                );
                Ok(LoadSummary::default())
            }
        }
    }

    // Helpers

    fn resend_player_context<T: SyncTransport>(
        &self,
        transport: &mut T,
        target: &T::Target,
        player: &E,
        world: &W,
    ) -> SyncReport {
        let mut report = SyncReport::default();
        report.record(&self.sync_target(transport, target, world));
        report.record(&self.sync_target(transport, target, player));
        report
    }

    fn send_full<T: SyncTransport, H: StorageHolder>(
        &self,
        transport: &mut T,
        holder: &H,
    ) -> SyncReport {
        let payload = self.build_payload(holder, false);
        self.send_to_tracking(transport, &payload, holder)
    }

    fn send_delta<T: SyncTransport, H: StorageHolder>(
        &self,
        transport: &mut T,
        holder: &mut H,
    ) -> SyncReport {
        if !holder.storages().is_dirty() {
            return SyncReport::default();
        }

        let clean_on_package = self.config.clear_policy == ClearPolicy::OnPackage;
        let document = holder.storages_mut().create_update_packet(clean_on_package);
        let payload = SyncPayload::for_holder(&holder.holder_ref(), true, document);
        let report = self.send_to_tracking(transport, &payload, holder);

        if !clean_on_package {
            if report.is_delivered() {
                holder
                    .storages_mut()
                    .acknowledge_update(payload.storage_tag());
            } else {
                warn!(
                    "StorageManager: {} of {} delta sends for {} failed, storages stay dirty",
                    report.failed,
                    report.sent + report.failed,
                    holder.holder_ref()
                );
            }
        }

        report
    }

    fn send_to_tracking<T: SyncTransport, H: StorageHolder>(
        &self,
        transport: &mut T,
        payload: &SyncPayload,
        holder: &H,
    ) -> SyncReport {
        let holder_ref = holder.holder_ref();
        let mut report = SyncReport::default();

        for target in transport.tracking(&holder_ref) {
            let result = transport.send(&target, payload);
            if let Err(err) = &result {
                warn!(
                    "StorageManager: sync of {} to {:?} failed: {}",
                    holder_ref, target, err
                );
            }
            report.record(&result);
        }

        debug!(
            "StorageManager: {} {} to {} targets",
            if payload.is_update() { "delta of" } else { "full" },
            holder_ref,
            report.sent
        );
        report
    }
}
