//! Keyed-document store boundary.
//!
//! The replication backend is an external collaborator. This module defines
//! the port the rest of the system consumes, plus the in-memory adapter
//! used by tests and same-process play. Adapters for hosted document
//! stores implement [`GameStore`] and plug in at composition time.

mod error;
mod memory;

pub use error::StoreError;
pub use memory::InMemoryGameStore;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::record::{GameRecord, RoomId};

/// Port over the external keyed-document store.
///
/// Three operations mirror the backing service: upsert ([`write`]), point
/// read ([`read_once`]) and push subscription ([`subscribe`]).
/// [`write_expecting`] adds the compare-and-set the move path relies on.
///
/// [`write`]: GameStore::write
/// [`read_once`]: GameStore::read_once
/// [`subscribe`]: GameStore::subscribe
/// [`write_expecting`]: GameStore::write_expecting
#[async_trait]
pub trait GameStore: Send + Sync {
    /// Upserts the record for `room_id`, replacing any previous value.
    ///
    /// Plain writes are last-write-wins: concurrent writers race and the
    /// committed record is whichever write landed last.
    async fn write(&self, room_id: &str, record: GameRecord) -> Result<(), StoreError>;

    /// Upserts like [`write`](GameStore::write), but only when the
    /// committed record still carries `expected_version`.
    ///
    /// # Errors
    ///
    /// [`StoreError::VersionConflict`] when another write got there first,
    /// [`StoreError::Missing`] when the room has no record at all.
    async fn write_expecting(
        &self,
        room_id: &str,
        record: GameRecord,
        expected_version: u64,
    ) -> Result<(), StoreError>;

    /// Reads the current record, or `None` when the room does not exist.
    async fn read_once(&self, room_id: &str) -> Result<Option<GameRecord>, StoreError>;

    /// Registers a listener for `room_id`. A room that already has a
    /// record delivers it as the first event; every committed write
    /// follows in commit order, including the subscriber's own. A
    /// listener attached mid-game therefore starts from the current
    /// record and cannot miss a commit that lands during attachment.
    async fn subscribe(&self, room_id: &str) -> Result<RoomSubscription, StoreError>;
}

/// Live subscription to one room's record.
///
/// The record current at attach time, when one exists, arrives first;
/// later updates follow in commit order. Dropping the handle detaches
/// the listener; nothing keeps firing once the owner is gone.
#[derive(Debug)]
pub struct RoomSubscription {
    room_id: RoomId,
    rx: mpsc::UnboundedReceiver<GameRecord>,
    forwarder: JoinHandle<()>,
}

impl RoomSubscription {
    /// Assembles a subscription from a delivery channel and the task
    /// feeding it. Store adapters call this; consumers only read.
    pub fn new(
        room_id: RoomId,
        rx: mpsc::UnboundedReceiver<GameRecord>,
        forwarder: JoinHandle<()>,
    ) -> Self {
        Self {
            room_id,
            rx,
            forwarder,
        }
    }

    /// The subscribed room.
    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    /// Waits for the next committed record. Returns `None` once the
    /// subscription is detached or the store side shuts down.
    pub async fn next(&mut self) -> Option<GameRecord> {
        self.rx.recv().await
    }

    /// Non-blocking poll for UI loops. Returns `None` when nothing is
    /// pending.
    pub fn try_next(&mut self) -> Option<GameRecord> {
        self.rx.try_recv().ok()
    }

    /// Detaches the listener. Equivalent to dropping the handle; provided
    /// so call sites can make the teardown explicit.
    pub fn detach(self) {
        debug!(room_id = %self.room_id, "Subscription detached");
    }
}

impl Drop for RoomSubscription {
    fn drop(&mut self) {
        self.forwarder.abort();
    }
}
