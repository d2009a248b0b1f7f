//! Per-participant room sessions.
//!
//! A [`LocalSession`] owns everything one participant needs: their auth
//! session, the record they last saw committed, a rules engine rebuilt
//! from it, the gesture state machine and the live subscription. Clicks
//! go in, feedback comes out; remote commits are folded in by polling.

use tracing::{info, instrument, warn};

use crate::identity::AuthSession;
use crate::record::{GameRecord, RoomId, RoomStatus, Turn};
use crate::rules::{AppliedMove, RulesEngine};
use crate::store::RoomSubscription;
use crate::sync::{AttachedRoom, RoomSynchronizer, SyncError, validate_record};
use crate::view::{BoardCoord, BoardView, ClickOutcome, Seat};

/// User-visible feedback from one click.
#[derive(Debug)]
pub enum MoveFeedback {
    /// An origin square was selected or reselected.
    Selected(chess::Square),
    /// Nothing selectable under the click.
    Ignored,
    /// The move was applied locally and committed to the store.
    Submitted {
        /// The move as the rules engine applied it.
        applied: AppliedMove,
        /// Whether the move ended the game.
        game_over: bool,
        /// Whether the game ended in checkmate rather than a draw.
        checkmate: bool,
    },
    /// The move was rejected by the rules engine. Nothing was written.
    Illegal {
        /// Origin of the rejected attempt.
        from: chess::Square,
        /// Destination of the rejected attempt.
        to: chess::Square,
    },
    /// The move was applied locally but the commit failed. Views may
    /// diverge until the next successful sync.
    SyncFailed {
        /// The move as applied locally.
        applied: AppliedMove,
        /// Why the commit failed.
        error: SyncError,
    },
}

/// Summary of the latest remote update folded into the session.
#[derive(Debug, Clone)]
pub struct RemoteUpdate {
    /// Side to move after the update.
    pub turn: Turn,
    /// Whether the side to move changed relative to the previous record.
    pub turn_changed: bool,
    /// Room status after the update.
    pub status: RoomStatus,
    /// Whether the position is terminal.
    pub game_over: bool,
    /// Whether the terminal position is checkmate.
    pub checkmate: bool,
    /// Version of the applied record.
    pub version: u64,
}

/// One participant's live view of a room.
///
/// Dropping the session detaches its subscription.
pub struct LocalSession {
    user: AuthSession,
    synchronizer: RoomSynchronizer,
    room_id: RoomId,
    record: GameRecord,
    engine: RulesEngine,
    view: BoardView,
    subscription: RoomSubscription,
}

impl LocalSession {
    /// Creates a room and attaches as host.
    ///
    /// # Errors
    ///
    /// Propagates [`SyncError`] from room creation.
    #[instrument(skip(synchronizer, user), fields(user = %user.display_name()))]
    pub async fn host(
        synchronizer: RoomSynchronizer,
        user: AuthSession,
    ) -> Result<Self, SyncError> {
        let attached = synchronizer.create_room().await?;
        info!(room_id = %attached.record.room_id(), "Hosting room");
        Ok(Self::from_attachment(synchronizer, user, attached))
    }

    /// Joins an existing room as guest.
    ///
    /// # Errors
    ///
    /// Propagates [`SyncError`] from the join, including
    /// [`SyncError::RoomNotFound`] for unknown ids.
    #[instrument(skip(synchronizer, user), fields(user = %user.display_name()))]
    pub async fn join(
        synchronizer: RoomSynchronizer,
        user: AuthSession,
        room_id: &str,
    ) -> Result<Self, SyncError> {
        let attached = synchronizer.join_room(room_id).await?;
        info!(room_id, "Joined as guest");
        Ok(Self::from_attachment(synchronizer, user, attached))
    }

    fn from_attachment(
        synchronizer: RoomSynchronizer,
        user: AuthSession,
        attached: AttachedRoom,
    ) -> Self {
        let view = BoardView::new(attached.seat);
        Self {
            user,
            synchronizer,
            room_id: attached.record.room_id().clone(),
            record: attached.record,
            engine: attached.engine,
            view,
            subscription: attached.subscription,
        }
    }

    /// The signed-in participant.
    pub fn user(&self) -> &AuthSession {
        &self.user
    }

    /// The room this session is attached to.
    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    /// The seat this session occupies.
    pub fn seat(&self) -> Seat {
        self.view.seat()
    }

    /// The last record this session saw committed.
    pub fn record(&self) -> &GameRecord {
        &self.record
    }

    /// The rules engine for the current position.
    pub fn engine(&self) -> &RulesEngine {
        &self.engine
    }

    /// The currently selected origin square, if any.
    pub fn selected(&self) -> Option<chess::Square> {
        self.view.selected()
    }

    /// Drops any pending selection.
    pub fn clear_selection(&mut self) {
        self.view.clear_selection();
    }

    /// Feeds one visual click through the board view. Legal moves are
    /// committed through the synchronizer; every failure folds into the
    /// returned feedback.
    #[instrument(skip(self), fields(room_id = %self.room_id, seat = self.view.seat().label()))]
    pub async fn click(&mut self, coord: BoardCoord) -> MoveFeedback {
        match self.view.click(&mut self.engine, coord) {
            ClickOutcome::Selected(square) | ClickOutcome::Reselected(square) => {
                MoveFeedback::Selected(square)
            }
            ClickOutcome::Ignored => MoveFeedback::Ignored,
            ClickOutcome::Rejected { from, to } => MoveFeedback::Illegal { from, to },
            ClickOutcome::Moved(applied) => self.submit(applied).await,
        }
    }

    async fn submit(&mut self, applied: AppliedMove) -> MoveFeedback {
        let game_over = self.engine.is_game_over();
        let checkmate = self.engine.is_checkmate();
        match self
            .synchronizer
            .submit_move(&self.record, applied.fen.clone(), applied.turn, game_over)
            .await
        {
            Ok(next) => {
                self.record = next;
                MoveFeedback::Submitted {
                    applied,
                    game_over,
                    checkmate,
                }
            }
            Err(error) => {
                warn!(error = %error, "Commit failed after local move");
                MoveFeedback::SyncFailed { applied, error }
            }
        }
    }

    /// Drains pending remote commits without blocking, folding in the
    /// newest. Returns a summary when anything was applied.
    pub fn poll_remote(&mut self) -> Option<RemoteUpdate> {
        let mut latest = None;
        while let Some(record) = self.subscription.try_next() {
            latest = Some(record);
        }
        self.apply_remote(latest?)
    }

    /// Waits for the next remote commit and folds it in. Returns `None`
    /// when the subscription is detached or the record had to be skipped.
    pub async fn await_remote(&mut self) -> Option<RemoteUpdate> {
        let record = self.subscription.next().await?;
        self.apply_remote(record)
    }

    /// Detaches the subscription and consumes the session.
    pub fn leave(self) {
        info!(room_id = %self.room_id, "Leaving room");
        self.subscription.detach();
    }

    // The record is replaced wholesale; local state is never merged into
    // a remote update.
    fn apply_remote(&mut self, record: GameRecord) -> Option<RemoteUpdate> {
        let engine = match validate_record(&record) {
            Ok(engine) => engine,
            Err(error) => {
                warn!(room_id = %self.room_id, error = %error, "Skipping corrupt remote record");
                return None;
            }
        };
        let turn_changed = record.turn() != self.record.turn();
        self.engine = engine;
        self.record = record;
        self.view.revalidate_selection(&self.engine);
        Some(RemoteUpdate {
            turn: *self.record.turn(),
            turn_changed,
            status: *self.record.status(),
            game_over: self.engine.is_game_over(),
            checkmate: self.engine.is_checkmate(),
            version: *self.record.version(),
        })
    }
}
