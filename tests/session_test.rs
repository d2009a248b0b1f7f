//! Session-level tests: gestures through to commits, convergence across
//! seats, and write-failure handling.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chess::Square;
use chess_rooms::{
    AuthSession, GameRecord, GameStore, InMemoryGameStore, LocalSession, MoveFeedback,
    RoomStatus, RoomSubscription, RoomSynchronizer, RulesEngine, Seat, StoreError, Turn,
    to_visual,
};

fn user(name: &str) -> AuthSession {
    AuthSession::new(name.to_string())
}

fn synchronizer() -> (Arc<InMemoryGameStore>, RoomSynchronizer) {
    let store = Arc::new(InMemoryGameStore::new());
    let rooms = RoomSynchronizer::new(store.clone());
    (store, rooms)
}

/// Clicks the cell that shows `square` from this session's seat.
async fn click_square(session: &mut LocalSession, square: Square) -> MoveFeedback {
    let coord = to_visual(session.seat(), square);
    session.click(coord).await
}

#[tokio::test]
async fn test_host_and_guest_converge_after_a_move() {
    let (_store, rooms) = synchronizer();
    let mut host = LocalSession::host(rooms.clone(), user("hanna")).await.unwrap();
    assert_eq!(host.seat(), Seat::Host);
    assert_eq!(*host.record().status(), RoomStatus::Waiting);

    let room_id = host.room_id().to_string();
    let mut guest = LocalSession::join(rooms, user("gabe"), &room_id).await.unwrap();
    assert_eq!(guest.seat(), Seat::Guest);
    assert_eq!(*guest.record().status(), RoomStatus::Active);

    // The host's feed replays its attach record, then the activation.
    let replay = host.await_remote().await.unwrap();
    assert_eq!(replay.status, RoomStatus::Waiting);
    assert!(!replay.turn_changed);
    let update = host.await_remote().await.unwrap();
    assert_eq!(update.status, RoomStatus::Active);
    assert!(!update.turn_changed);

    // White moves from the host seat.
    click_square(&mut host, Square::E2).await;
    let feedback = click_square(&mut host, Square::E4).await;
    assert!(matches!(feedback, MoveFeedback::Submitted { .. }));

    // Guest drains its own attach replay, then sees the move.
    let replay = guest.await_remote().await.unwrap();
    assert!(!replay.turn_changed);
    let update = guest.await_remote().await.unwrap();
    assert!(update.turn_changed);
    assert_eq!(update.turn, Turn::Black);
    assert_eq!(guest.record(), host.record());
}

#[tokio::test]
async fn test_illegal_attempt_commits_nothing() {
    let (store, rooms) = synchronizer();
    let mut host = LocalSession::host(rooms, user("hanna")).await.unwrap();
    let baseline = host.record().clone();

    click_square(&mut host, Square::E2).await;
    let feedback = click_square(&mut host, Square::E5).await;
    match feedback {
        MoveFeedback::Illegal { from, to } => {
            assert_eq!(from, Square::E2);
            assert_eq!(to, Square::E5);
        }
        other => panic!("expected an illegal move report, got {:?}", other),
    }

    assert_eq!(host.record(), &baseline);
    assert_eq!(host.engine().turn(), Turn::White);
    let stored = store.read_once(baseline.room_id()).await.unwrap().unwrap();
    assert_eq!(stored, baseline);
}

#[tokio::test]
async fn test_clicks_outside_own_pieces_are_ignored() {
    let (store, rooms) = synchronizer();
    let mut host = LocalSession::host(rooms, user("hanna")).await.unwrap();
    let baseline = host.record().clone();

    // An empty square, then a black piece while white is to move.
    let feedback = click_square(&mut host, Square::E4).await;
    assert!(matches!(feedback, MoveFeedback::Ignored));
    let feedback = click_square(&mut host, Square::E7).await;
    assert!(matches!(feedback, MoveFeedback::Ignored));

    assert_eq!(host.selected(), None);
    let stored = store.read_once(baseline.room_id()).await.unwrap().unwrap();
    assert_eq!(stored, baseline);
}

#[tokio::test]
async fn test_checkmate_finishes_the_room_for_both_seats() {
    let (_store, rooms) = synchronizer();
    let mut host = LocalSession::host(rooms.clone(), user("hanna")).await.unwrap();
    let room_id = host.room_id().to_string();
    let mut guest = LocalSession::join(rooms, user("gabe"), &room_id).await.unwrap();
    host.await_remote().await.unwrap(); // attach replay
    host.await_remote().await.unwrap(); // activation

    // Fastest mate: white opens the diagonal, black delivers Qh4.
    click_square(&mut host, Square::F2).await;
    click_square(&mut host, Square::F3).await;
    guest.await_remote().await.unwrap(); // attach replay
    guest.await_remote().await.unwrap(); // white's f3

    click_square(&mut guest, Square::E7).await;
    click_square(&mut guest, Square::E5).await;
    host.await_remote().await.unwrap(); // own echo
    host.await_remote().await.unwrap(); // black's reply

    click_square(&mut host, Square::G2).await;
    click_square(&mut host, Square::G4).await;
    guest.await_remote().await.unwrap(); // own echo
    guest.await_remote().await.unwrap(); // white's reply

    click_square(&mut guest, Square::D8).await;
    let (game_over, checkmate) = match click_square(&mut guest, Square::H4).await {
        MoveFeedback::Submitted {
            game_over,
            checkmate,
            ..
        } => (game_over, checkmate),
        other => panic!("expected a submitted move, got {:?}", other),
    };
    assert!(game_over);
    assert!(checkmate);
    assert_eq!(*guest.record().status(), RoomStatus::Finished);

    host.await_remote().await.unwrap(); // own echo
    let update = host.await_remote().await.unwrap();
    assert!(update.game_over);
    assert!(update.checkmate);
    assert_eq!(update.status, RoomStatus::Finished);
    assert_eq!(host.record(), guest.record());
}

#[tokio::test]
async fn test_leaving_does_not_disturb_the_other_seat() {
    let (_store, rooms) = synchronizer();
    let mut host = LocalSession::host(rooms.clone(), user("hanna")).await.unwrap();
    let room_id = host.room_id().to_string();
    let guest = LocalSession::join(rooms, user("gabe"), &room_id).await.unwrap();

    guest.leave();
    host.await_remote().await.unwrap(); // attach replay
    host.await_remote().await.unwrap(); // activation

    click_square(&mut host, Square::E2).await;
    let feedback = click_square(&mut host, Square::E4).await;
    assert!(matches!(feedback, MoveFeedback::Submitted { .. }));

    let echo = host.await_remote().await.unwrap();
    assert_eq!(echo.version, 2);
}

#[tokio::test]
async fn test_corrupt_remote_records_are_skipped() {
    let (store, rooms) = synchronizer();
    let mut host = LocalSession::host(rooms, user("hanna")).await.unwrap();
    host.await_remote().await.unwrap(); // attach replay
    let good = host.record().clone();

    let corrupt = GameRecord::new(
        good.room_id().clone(),
        "garbage".to_string(),
        Turn::White,
        RoomStatus::Active,
        1,
    );
    store.write(good.room_id(), corrupt).await.unwrap();

    // The unusable record is skipped; the session keeps its last good
    // state.
    assert!(host.await_remote().await.is_none());
    assert_eq!(host.record(), &good);
    assert_eq!(host.engine().fen(), *good.fen());

    // The subscription outlives the skip; the next good commit applies.
    let mut engine = RulesEngine::from_fen(good.fen()).unwrap();
    let applied = engine.try_move(Square::E2, Square::E4).unwrap();
    let next = GameRecord::new(
        good.room_id().clone(),
        applied.fen,
        applied.turn,
        RoomStatus::Active,
        2,
    );
    store.write(good.room_id(), next.clone()).await.unwrap();

    let update = host.await_remote().await.unwrap();
    assert_eq!(update.version, 2);
    assert_eq!(host.record(), &next);
}

/// Store double that fails writes on demand while delegating everything
/// else to the in-memory store.
struct FlakyStore {
    inner: InMemoryGameStore,
    fail_writes: AtomicBool,
}

impl FlakyStore {
    fn new() -> Self {
        Self {
            inner: InMemoryGameStore::new(),
            fail_writes: AtomicBool::new(false),
        }
    }

    fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn outage() -> StoreError {
        StoreError::Unavailable {
            message: "injected outage".to_string(),
        }
    }
}

#[async_trait]
impl GameStore for FlakyStore {
    async fn write(&self, room_id: &str, record: GameRecord) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::outage());
        }
        self.inner.write(room_id, record).await
    }

    async fn write_expecting(
        &self,
        room_id: &str,
        record: GameRecord,
        expected_version: u64,
    ) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::outage());
        }
        self.inner.write_expecting(room_id, record, expected_version).await
    }

    async fn read_once(&self, room_id: &str) -> Result<Option<GameRecord>, StoreError> {
        self.inner.read_once(room_id).await
    }

    async fn subscribe(&self, room_id: &str) -> Result<RoomSubscription, StoreError> {
        self.inner.subscribe(room_id).await
    }
}

#[tokio::test]
async fn test_failed_commit_is_reported_and_leaves_the_store_untouched() {
    let store = Arc::new(FlakyStore::new());
    let rooms = RoomSynchronizer::new(store.clone());
    let mut host = LocalSession::host(rooms, user("hanna")).await.unwrap();
    let baseline = host.record().clone();

    store.set_fail_writes(true);
    click_square(&mut host, Square::E2).await;
    let feedback = click_square(&mut host, Square::E4).await;
    assert!(matches!(feedback, MoveFeedback::SyncFailed { .. }));

    // The local board has advanced but the shared record has not; the
    // session keeps its last confirmed record.
    assert_eq!(host.engine().turn(), Turn::Black);
    assert_eq!(host.record(), &baseline);
    let stored = store.read_once(baseline.room_id()).await.unwrap().unwrap();
    assert_eq!(stored, baseline);
}

/// Store double that lands a rival commit inside the join window, after
/// the activation write but before the subscription attaches.
struct RacingStore {
    inner: InMemoryGameStore,
    race_next_attach: AtomicBool,
}

impl RacingStore {
    fn new() -> Self {
        Self {
            inner: InMemoryGameStore::new(),
            race_next_attach: AtomicBool::new(false),
        }
    }

    fn arm(&self) {
        self.race_next_attach.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl GameStore for RacingStore {
    async fn write(&self, room_id: &str, record: GameRecord) -> Result<(), StoreError> {
        self.inner.write(room_id, record).await
    }

    async fn write_expecting(
        &self,
        room_id: &str,
        record: GameRecord,
        expected_version: u64,
    ) -> Result<(), StoreError> {
        self.inner.write_expecting(room_id, record, expected_version).await
    }

    async fn read_once(&self, room_id: &str) -> Result<Option<GameRecord>, StoreError> {
        self.inner.read_once(room_id).await
    }

    async fn subscribe(&self, room_id: &str) -> Result<RoomSubscription, StoreError> {
        if self.race_next_attach.swap(false, Ordering::SeqCst) {
            let current = self
                .inner
                .read_once(room_id)
                .await?
                .expect("a record to race");
            let mut engine = RulesEngine::from_fen(current.fen()).expect("a playable record");
            let applied = engine
                .try_move(Square::E2, Square::E4)
                .expect("a legal opening");
            let rival = GameRecord::new(
                current.room_id().clone(),
                applied.fen,
                applied.turn,
                *current.status(),
                current.version() + 1,
            );
            self.inner
                .write_expecting(room_id, rival, *current.version())
                .await?;
        }
        self.inner.subscribe(room_id).await
    }
}

#[tokio::test]
async fn test_a_commit_racing_the_join_is_still_delivered() {
    let store = Arc::new(RacingStore::new());
    let rooms = RoomSynchronizer::new(store.clone());
    let host = LocalSession::host(rooms.clone(), user("hanna")).await.unwrap();
    let room_id = host.room_id().to_string();

    store.arm();
    let mut guest = LocalSession::join(rooms, user("gabe"), &room_id).await.unwrap();

    // The join handed back the activation record; the rival commit landed
    // before the subscription attached.
    assert_eq!(*guest.record().version(), 1);

    // The attach replay carries the commit the join raced against.
    let update = guest.await_remote().await.unwrap();
    assert_eq!(update.version, 2);
    assert!(update.turn_changed);
    assert_eq!(update.turn, Turn::Black);

    let stored = store.read_once(&room_id).await.unwrap().unwrap();
    assert_eq!(&stored, guest.record());
}
