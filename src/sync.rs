//! Room synchronization protocol.
//!
//! Rooms are created, joined and advanced by reading and writing the
//! shared [`GameRecord`] through the store port. Each participant keeps a
//! local rules engine that is rebuilt from the record on every update;
//! the record is always the source of truth.

use std::sync::Arc;

use derive_more::{Display, Error};
use rand::{Rng, distributions::Alphanumeric};
use tracing::{debug, info, instrument, warn};

use crate::record::{GameRecord, RoomId, RoomStatus, Turn};
use crate::rules::RulesEngine;
use crate::store::{GameStore, RoomSubscription, StoreError};
use crate::view::Seat;

/// Length of generated room identifiers.
const ROOM_ID_LEN: usize = 6;

/// Failure of a room synchronization operation.
#[derive(Debug, Display, Error)]
pub enum SyncError {
    /// The requested room has no record in the store.
    #[display("room '{room_id}' not found")]
    RoomNotFound {
        /// The room that was requested.
        room_id: RoomId,
    },
    /// The stored record cannot seed a playable game.
    #[display("room '{room_id}' holds a corrupt record: {reason}")]
    CorruptRecord {
        /// The room whose record is unusable.
        room_id: RoomId,
        /// What made the record unusable.
        reason: String,
    },
    /// The move was based on a record that has since been replaced.
    #[display("submission for room '{room_id}' is stale; the record moved on")]
    StaleSubmission {
        /// The room whose record moved on.
        room_id: RoomId,
    },
    /// The store refused or failed the operation.
    #[display("store operation failed: {source}")]
    Store {
        /// Underlying store failure.
        source: StoreError,
    },
}

impl From<StoreError> for SyncError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::VersionConflict { room_id, .. } => Self::StaleSubmission { room_id },
            other => Self::Store { source: other },
        }
    }
}

/// One participant's live attachment to a room: the seat they occupy, the
/// record they attached at, a rules engine rebuilt from that record and
/// the subscription delivering subsequent commits.
#[derive(Debug)]
pub struct AttachedRoom {
    /// Seat assigned by the attachment path: host for creators, guest for
    /// joiners.
    pub seat: Seat,
    /// The record at attachment time.
    pub record: GameRecord,
    /// Rules engine seeded from `record`.
    pub engine: RulesEngine,
    /// Live feed for the room. The first event replays the record current
    /// at attach time; every later commit follows, including the
    /// participant's own.
    pub subscription: RoomSubscription,
}

/// Creates shared game records and keeps local views converging on them.
#[derive(Clone)]
pub struct RoomSynchronizer {
    store: Arc<dyn GameStore>,
}

impl RoomSynchronizer {
    /// Creates a synchronizer over the given store.
    pub fn new(store: Arc<dyn GameStore>) -> Self {
        Self { store }
    }

    /// Creates a fresh room seeded with the starting position and attaches
    /// the caller as host.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Store`] when the initial write or the
    /// subscription fails.
    #[instrument(skip(self))]
    pub async fn create_room(&self) -> Result<AttachedRoom, SyncError> {
        let room_id = generate_room_id();
        let engine = RulesEngine::starting();
        let record = GameRecord::new(
            room_id.clone(),
            engine.fen(),
            engine.turn(),
            RoomStatus::Waiting,
            0,
        );
        self.store.write(&room_id, record.clone()).await?;
        let subscription = self.store.subscribe(&room_id).await?;
        info!(room_id = %room_id, "Room created");
        Ok(AttachedRoom {
            seat: Seat::Host,
            record,
            engine,
            subscription,
        })
    }

    /// Attaches to an existing room as guest, flipping a waiting room to
    /// active.
    ///
    /// The returned subscription replays the record current at attach
    /// time as its first event, so a commit landing between the
    /// activation write and the attach is delivered rather than lost.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::RoomNotFound`] when no record exists for
    /// `room_id`, [`SyncError::CorruptRecord`] when the stored record
    /// cannot seed a game, and [`SyncError::Store`] for store failures.
    /// A missing room mutates nothing.
    #[instrument(skip(self))]
    pub async fn join_room(&self, room_id: &str) -> Result<AttachedRoom, SyncError> {
        let Some(record) = self.store.read_once(room_id).await? else {
            warn!("Room not found");
            return Err(SyncError::RoomNotFound {
                room_id: room_id.to_string(),
            });
        };
        let engine = validate_record(&record)?;
        let record = self.activate(record).await?;
        let subscription = self.store.subscribe(room_id).await?;
        info!(version = record.version(), "Joined room");
        Ok(AttachedRoom {
            seat: Seat::Guest,
            record,
            engine,
            subscription,
        })
    }

    /// Registers a listener for a room without taking a seat. An existing
    /// room replays its current record as the first event; a room that
    /// does not exist yet starts delivering once it does.
    #[instrument(skip(self))]
    pub async fn subscribe(&self, room_id: &str) -> Result<RoomSubscription, SyncError> {
        Ok(self.store.subscribe(room_id).await?)
    }

    /// Commits the record produced by a local move.
    ///
    /// The write carries `prior`'s version as its guard: if any other
    /// commit landed since `prior` was read, nothing is written.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::StaleSubmission`] when the record moved on and
    /// [`SyncError::Store`] for store failures.
    #[instrument(
        skip(self, prior, fen),
        fields(room_id = %prior.room_id(), from_version = prior.version())
    )]
    pub async fn submit_move(
        &self,
        prior: &GameRecord,
        fen: String,
        turn: Turn,
        game_over: bool,
    ) -> Result<GameRecord, SyncError> {
        let status = if game_over {
            RoomStatus::Finished
        } else {
            *prior.status()
        };
        let next = prior.successor(fen, turn, status);
        self.store
            .write_expecting(prior.room_id(), next.clone(), *prior.version())
            .await?;
        debug!(version = next.version(), "Move committed");
        Ok(next)
    }

    /// Marks a waiting room active. Losing the guard race to a concurrent
    /// joiner is tolerated by re-reading whichever record won.
    async fn activate(&self, record: GameRecord) -> Result<GameRecord, SyncError> {
        if *record.status() != RoomStatus::Waiting {
            return Ok(record);
        }
        let next = record.successor(record.fen().clone(), *record.turn(), RoomStatus::Active);
        match self
            .store
            .write_expecting(record.room_id(), next.clone(), *record.version())
            .await
        {
            Ok(()) => Ok(next),
            Err(StoreError::VersionConflict { .. }) => {
                debug!(room_id = %record.room_id(), "Lost activation race; re-reading");
                let fresh = self.store.read_once(record.room_id()).await?;
                fresh.ok_or_else(|| SyncError::RoomNotFound {
                    room_id: record.room_id().clone(),
                })
            }
            Err(other) => Err(other.into()),
        }
    }
}

/// Rebuilds a rules engine from a stored record, rejecting records whose
/// denormalized turn disagrees with the position itself.
pub(crate) fn validate_record(record: &GameRecord) -> Result<RulesEngine, SyncError> {
    let engine = RulesEngine::from_fen(record.fen()).map_err(|e| SyncError::CorruptRecord {
        room_id: record.room_id().clone(),
        reason: e.to_string(),
    })?;
    if engine.turn() != *record.turn() {
        return Err(SyncError::CorruptRecord {
            room_id: record.room_id().clone(),
            reason: format!(
                "stored turn '{}' disagrees with the position",
                record.turn().label()
            ),
        });
    }
    Ok(engine)
}

fn generate_room_id() -> RoomId {
    let id: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ROOM_ID_LEN)
        .map(char::from)
        .collect();
    id.to_lowercase()
}
