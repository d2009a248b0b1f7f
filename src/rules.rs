//! Thin adapter over the external chess rules library.
//!
//! The rest of the system treats move legality as an oracle: feed it a
//! gesture, get back either an applied move with the new position encoding
//! or a rejection. Nothing here re-implements chess rules.

use std::fmt;
use std::str::FromStr;

use chess::{Board, BoardStatus, ChessMove, Color, Piece, Rank, Square};
use derive_more::{Display, Error};
use tracing::{debug, instrument};

use crate::record::Turn;

/// Failure to reconstruct a position from its stored encoding.
#[derive(Debug, Clone, Display, Error)]
pub enum RulesError {
    /// The position encoding did not parse as FEN.
    #[display("invalid position encoding: '{fen}'")]
    InvalidFen {
        /// The offending encoding.
        fen: String,
    },
}

/// A move the rules engine accepted and applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMove {
    /// Origin square.
    pub from: Square,
    /// Destination square.
    pub to: Square,
    /// Promotion piece, when the move was a pawn reaching the last rank.
    pub promotion: Option<Piece>,
    /// Position encoding after the move.
    pub fen: String,
    /// Side to move after the move.
    pub turn: Turn,
}

/// Local, trusted arbiter of move legality for one position.
///
/// Each session holds its own engine, rebuilt from the shared record on
/// every remote update. The engine is never the source of truth for a
/// room; the record is.
#[derive(Clone)]
pub struct RulesEngine {
    board: Board,
}

impl RulesEngine {
    /// An engine at the standard starting position.
    pub fn starting() -> Self {
        Self {
            board: Board::default(),
        }
    }

    /// Reconstructs an engine from a position encoding.
    ///
    /// # Errors
    ///
    /// Returns [`RulesError::InvalidFen`] when the encoding does not parse.
    pub fn from_fen(fen: &str) -> Result<Self, RulesError> {
        let board = Board::from_str(fen).map_err(|_| RulesError::InvalidFen {
            fen: fen.to_string(),
        })?;
        Ok(Self { board })
    }

    /// The current position encoding.
    pub fn fen(&self) -> String {
        self.board.to_string()
    }

    /// The side to move.
    pub fn turn(&self) -> Turn {
        self.board.side_to_move().into()
    }

    /// The piece and color occupying `square`, if any.
    pub fn piece_at(&self, square: Square) -> Option<(Piece, Color)> {
        let piece = self.board.piece_on(square)?;
        let color = self.board.color_on(square)?;
        Some((piece, color))
    }

    /// Attempts the move `from` -> `to` for the side to move.
    ///
    /// Legal moves are applied to the engine and returned; illegal moves
    /// leave the position untouched and return `None`. A two-square gesture
    /// cannot name a promotion piece, so pawns reaching the last rank
    /// always promote to a queen.
    #[instrument(skip(self), fields(from = %from, to = %to))]
    pub fn try_move(&mut self, from: Square, to: Square) -> Option<AppliedMove> {
        let promotion = self.promotion_for(from, to);
        let candidate = ChessMove::new(from, to, promotion);
        if !self.board.legal(candidate) {
            debug!("Move rejected");
            return None;
        }
        self.board = self.board.make_move_new(candidate);
        debug!(fen = %self.fen(), "Move applied");
        Some(AppliedMove {
            from,
            to,
            promotion,
            fen: self.fen(),
            turn: self.turn(),
        })
    }

    fn promotion_for(&self, from: Square, to: Square) -> Option<Piece> {
        if self.board.piece_on(from) != Some(Piece::Pawn) {
            return None;
        }
        let last_rank = match self.board.side_to_move() {
            Color::White => Rank::Eighth,
            Color::Black => Rank::First,
        };
        (to.get_rank() == last_rank).then_some(Piece::Queen)
    }

    /// Whether the position is terminal (checkmate or stalemate).
    pub fn is_game_over(&self) -> bool {
        self.board.status() != BoardStatus::Ongoing
    }

    /// Whether the side to move is checkmated.
    pub fn is_checkmate(&self) -> bool {
        self.board.status() == BoardStatus::Checkmate
    }
}

impl fmt::Debug for RulesEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RulesEngine")
            .field("fen", &self.fen())
            .finish()
    }
}

impl From<Color> for Turn {
    fn from(color: Color) -> Self {
        match color {
            Color::White => Turn::White,
            Color::Black => Turn::Black,
        }
    }
}

impl From<Turn> for Color {
    fn from(turn: Turn) -> Self {
        match turn {
            Turn::White => Color::White,
            Turn::Black => Color::Black,
        }
    }
}
