//! In-memory keyed-document store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, instrument, warn};

use super::{GameStore, RoomSubscription, StoreError};
use crate::record::{GameRecord, RoomId};

/// Capacity of a room's commit feed. A listener that falls further behind
/// than this skips ahead to newer commits instead of stalling writers.
const FEED_CAPACITY: usize = 64;

/// One stored document: the serialized record plus the committed version
/// the compare-and-set path checks against.
#[derive(Debug, Clone)]
struct StoredDoc {
    version: u64,
    body: String,
}

#[derive(Debug, Default)]
struct Inner {
    records: HashMap<RoomId, StoredDoc>,
    feeds: HashMap<RoomId, broadcast::Sender<GameRecord>>,
}

/// Keyed-document store held entirely in process memory.
///
/// Documents are kept as serialized JSON, so every write and read crosses
/// the same wire contract a hosted store would see. `Clone` shares the
/// underlying map; two sessions in one process converge through a shared
/// instance.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGameStore {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryGameStore {
    /// Creates an empty store.
    #[instrument]
    pub fn new() -> Self {
        info!("Creating in-memory game store");
        Self::default()
    }

    fn encode(record: &GameRecord) -> Result<String, StoreError> {
        serde_json::to_string(record).map_err(|e| StoreError::Unavailable {
            message: format!("failed to serialize record: {}", e),
        })
    }

    fn decode(room_id: &str, doc: &StoredDoc) -> Result<GameRecord, StoreError> {
        serde_json::from_str(&doc.body).map_err(|e| StoreError::Unavailable {
            message: format!("corrupt document for room '{}': {}", room_id, e),
        })
    }

    // Publishing while the map lock is held keeps delivery in commit order.
    fn commit(inner: &mut Inner, room_id: &str, record: GameRecord, body: String) {
        inner.records.insert(
            room_id.to_string(),
            StoredDoc {
                version: *record.version(),
                body,
            },
        );
        if let Some(feed) = inner.feeds.get(room_id) {
            let _ = feed.send(record);
        }
    }
}

#[async_trait]
impl GameStore for InMemoryGameStore {
    #[instrument(skip(self, record), fields(version = record.version()))]
    async fn write(&self, room_id: &str, record: GameRecord) -> Result<(), StoreError> {
        let body = Self::encode(&record)?;
        let mut inner = self.inner.lock().unwrap();
        Self::commit(&mut inner, room_id, record, body);
        debug!("Record written");
        Ok(())
    }

    #[instrument(skip(self, record), fields(version = record.version()))]
    async fn write_expecting(
        &self,
        room_id: &str,
        record: GameRecord,
        expected_version: u64,
    ) -> Result<(), StoreError> {
        let body = Self::encode(&record)?;
        let mut inner = self.inner.lock().unwrap();

        let Some(current) = inner.records.get(room_id) else {
            warn!("Guarded write targeted a missing room");
            return Err(StoreError::Missing {
                room_id: room_id.to_string(),
            });
        };
        if current.version != expected_version {
            warn!(
                expected = expected_version,
                actual = current.version,
                "Guarded write lost the race"
            );
            return Err(StoreError::VersionConflict {
                room_id: room_id.to_string(),
                expected: expected_version,
                actual: current.version,
            });
        }

        Self::commit(&mut inner, room_id, record, body);
        debug!("Guarded write committed");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn read_once(&self, room_id: &str) -> Result<Option<GameRecord>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let Some(doc) = inner.records.get(room_id) else {
            debug!("Room not present");
            return Ok(None);
        };
        Self::decode(room_id, doc).map(Some)
    }

    #[instrument(skip(self))]
    async fn subscribe(&self, room_id: &str) -> Result<RoomSubscription, StoreError> {
        // Snapshot and feed receiver are taken under one lock hold; every
        // commit lands in exactly one of them.
        let (snapshot, feed_rx) = {
            let mut inner = self.inner.lock().unwrap();
            let snapshot = match inner.records.get(room_id) {
                Some(doc) => Some(Self::decode(room_id, doc)?),
                None => None,
            };
            let feed_rx = inner
                .feeds
                .entry(room_id.to_string())
                .or_insert_with(|| broadcast::channel(FEED_CAPACITY).0)
                .subscribe();
            (snapshot, feed_rx)
        };

        let (tx, rx) = mpsc::unbounded_channel();
        if let Some(record) = snapshot {
            let _ = tx.send(record);
        }
        let room = room_id.to_string();
        let forwarder = tokio::spawn(forward_feed(room.clone(), feed_rx, tx));
        debug!("Subscription attached");
        Ok(RoomSubscription::new(room, rx, forwarder))
    }
}

/// Pumps a room's commit feed into a subscriber's delivery channel until
/// either side disconnects.
async fn forward_feed(
    room_id: String,
    mut feed: broadcast::Receiver<GameRecord>,
    tx: mpsc::UnboundedSender<GameRecord>,
) {
    loop {
        match feed.recv().await {
            Ok(record) => {
                if tx.send(record).is_err() {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(room_id = %room_id, skipped, "Subscriber behind; skipping to newer commits");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
