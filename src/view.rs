//! Board view gesture logic: clicks in, move intents out.
//!
//! Pure presentation-side state, no rendering and no store access. The
//! view works in visual coordinates (row 0 is the top of whatever the
//! front end draws) and translates to logical squares according to the
//! seat's orientation. Mirroring is presentation only: both seats submit
//! the same logical squares for the same piece.

use chess::{File, Rank, Square};
use derive_new::new;
use tracing::{debug, instrument};

use crate::record::Turn;
use crate::rules::{AppliedMove, RulesEngine};

/// Which participant this client is. Decides board orientation and
/// nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seat {
    /// The room creator. Sees white's camp at the bottom.
    Host,
    /// The joiner. Sees the board rotated a half turn.
    Guest,
}

impl Seat {
    /// Human-readable seat name.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Host => "Host",
            Self::Guest => "Guest",
        }
    }
}

/// A square in visual space: `row` 0 is the topmost rendered row, `col` 0
/// the leftmost column. Both range over `0..8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, new)]
pub struct BoardCoord {
    /// Rendered row, top to bottom.
    pub row: u8,
    /// Rendered column, left to right.
    pub col: u8,
}

/// Maps a visual coordinate to the logical square it addresses for `seat`.
///
/// The host sees a8 at the top-left; the guest's board is rotated a half
/// turn, so the same cell addresses h1. Components outside `0..8` wrap,
/// the same masking [`Rank::from_index`] applies.
pub fn to_logical(seat: Seat, coord: BoardCoord) -> Square {
    let (row, col) = (coord.row & 7, coord.col & 7);
    let (row, col) = match seat {
        Seat::Host => (row, col),
        Seat::Guest => (7 - row, 7 - col),
    };
    Square::make_square(
        Rank::from_index(7 - row as usize),
        File::from_index(col as usize),
    )
}

/// Inverse of [`to_logical`]: where `square` renders for `seat`.
pub fn to_visual(seat: Seat, square: Square) -> BoardCoord {
    let row = 7 - square.get_rank().to_index() as u8;
    let col = square.get_file().to_index() as u8;
    match seat {
        Seat::Host => BoardCoord::new(row, col),
        Seat::Guest => BoardCoord::new(7 - row, 7 - col),
    }
}

/// Result of feeding one click to the view.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// The click chose this square as the move origin.
    Selected(Square),
    /// The click moved the origin to another piece of the side to move.
    Reselected(Square),
    /// Nothing selectable under the click; no state changed.
    Ignored,
    /// A legal move was applied to the local engine. Hand the new encoding
    /// to the room synchronizer.
    Moved(AppliedMove),
    /// The attempted move was illegal. Selection cleared, nothing applied.
    Rejected {
        /// Origin of the rejected attempt.
        from: Square,
        /// Destination of the rejected attempt.
        to: Square,
    },
}

/// Two-click gesture state machine.
///
/// The first click selects a piece of the side to move; the second either
/// reselects, completes a move through the rules engine, or clears the
/// selection on an illegal attempt. The view holds no position of its
/// own: every decision defers to the engine it is handed.
#[derive(Debug, Clone)]
pub struct BoardView {
    seat: Seat,
    selected: Option<Square>,
}

impl BoardView {
    /// Creates a view for the given seat with nothing selected.
    pub fn new(seat: Seat) -> Self {
        Self {
            seat,
            selected: None,
        }
    }

    /// The seat this view renders for.
    pub fn seat(&self) -> Seat {
        self.seat
    }

    /// The currently selected origin square, if any.
    pub fn selected(&self) -> Option<Square> {
        self.selected
    }

    /// Drops any pending selection.
    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Re-checks the selection against a rebuilt engine. It survives only
    /// while it still addresses a piece of the side to move.
    pub fn revalidate_selection(&mut self, engine: &RulesEngine) {
        if let Some(square) = self.selected
            && !owns_square(engine, square)
        {
            debug!(square = %square, "Selection no longer valid after update");
            self.selected = None;
        }
    }

    /// Feeds one click through the gesture machine.
    #[instrument(skip(self, engine), fields(seat = self.seat.label()))]
    pub fn click(&mut self, engine: &mut RulesEngine, coord: BoardCoord) -> ClickOutcome {
        let square = to_logical(self.seat, coord);

        let Some(origin) = self.selected else {
            return if owns_square(engine, square) {
                self.selected = Some(square);
                debug!(square = %square, "Origin selected");
                ClickOutcome::Selected(square)
            } else {
                ClickOutcome::Ignored
            };
        };

        if square != origin && owns_square(engine, square) {
            self.selected = Some(square);
            debug!(square = %square, "Origin reselected");
            return ClickOutcome::Reselected(square);
        }

        // Second click always resolves the gesture, legal or not.
        self.selected = None;
        match engine.try_move(origin, square) {
            Some(applied) => ClickOutcome::Moved(applied),
            None => {
                debug!(from = %origin, to = %square, "Illegal move attempt");
                ClickOutcome::Rejected {
                    from: origin,
                    to: square,
                }
            }
        }
    }
}

fn owns_square(engine: &RulesEngine, square: Square) -> bool {
    engine
        .piece_at(square)
        .is_some_and(|(_, color)| Turn::from(color) == engine.turn())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::ALL_SQUARES;

    #[test]
    fn test_host_top_left_is_a8() {
        assert_eq!(to_logical(Seat::Host, BoardCoord::new(0, 0)), Square::A8);
        assert_eq!(to_logical(Seat::Host, BoardCoord::new(7, 0)), Square::A1);
        assert_eq!(to_logical(Seat::Host, BoardCoord::new(7, 7)), Square::H1);
    }

    #[test]
    fn test_guest_board_is_rotated_a_half_turn() {
        assert_eq!(to_logical(Seat::Guest, BoardCoord::new(0, 0)), Square::H1);
        assert_eq!(to_logical(Seat::Guest, BoardCoord::new(7, 7)), Square::A8);
        assert_eq!(to_logical(Seat::Guest, BoardCoord::new(0, 7)), Square::A1);
    }

    #[test]
    fn test_visual_and_logical_mappings_are_inverse() {
        for seat in [Seat::Host, Seat::Guest] {
            for square in ALL_SQUARES {
                assert_eq!(to_logical(seat, to_visual(seat, square)), square);
            }
        }
    }

    #[test]
    fn test_out_of_range_coordinates_wrap() {
        for seat in [Seat::Host, Seat::Guest] {
            assert_eq!(
                to_logical(seat, BoardCoord::new(8, 8)),
                to_logical(seat, BoardCoord::new(0, 0))
            );
            assert_eq!(
                to_logical(seat, BoardCoord::new(255, 255)),
                to_logical(seat, BoardCoord::new(7, 7))
            );
        }
    }

    #[test]
    fn test_rotation_preserves_square_shade() {
        for square in ALL_SQUARES {
            let host = to_visual(Seat::Host, square);
            let guest = to_visual(Seat::Guest, square);
            assert_eq!((host.row + host.col) % 2, (guest.row + guest.col) % 2);
        }
    }

    #[test]
    fn test_first_click_selects_only_own_pieces() {
        let mut engine = RulesEngine::starting();
        let mut view = BoardView::new(Seat::Host);

        // e2, a white pawn, white to move.
        assert_eq!(
            view.click(&mut engine, BoardCoord::new(6, 4)),
            ClickOutcome::Selected(Square::E2)
        );
        view.clear_selection();

        // e7 is black's pawn; empty e4 is nobody's.
        assert_eq!(
            view.click(&mut engine, BoardCoord::new(1, 4)),
            ClickOutcome::Ignored
        );
        assert_eq!(
            view.click(&mut engine, BoardCoord::new(4, 4)),
            ClickOutcome::Ignored
        );
        assert_eq!(view.selected(), None);
    }

    #[test]
    fn test_clicking_another_own_piece_reselects() {
        let mut engine = RulesEngine::starting();
        let mut view = BoardView::new(Seat::Host);
        view.click(&mut engine, BoardCoord::new(6, 4));
        assert_eq!(
            view.click(&mut engine, BoardCoord::new(6, 3)),
            ClickOutcome::Reselected(Square::D2)
        );
        assert_eq!(view.selected(), Some(Square::D2));
    }

    #[test]
    fn test_second_click_completes_a_legal_move() {
        let mut engine = RulesEngine::starting();
        let mut view = BoardView::new(Seat::Host);
        view.click(&mut engine, BoardCoord::new(6, 4));
        let applied = match view.click(&mut engine, BoardCoord::new(4, 4)) {
            ClickOutcome::Moved(applied) => applied,
            other => panic!("expected a move, got {:?}", other),
        };
        assert_eq!(applied.from, Square::E2);
        assert_eq!(applied.to, Square::E4);
        assert_eq!(view.selected(), None);
        assert_eq!(engine.turn(), Turn::Black);
    }

    #[test]
    fn test_illegal_second_click_clears_and_changes_nothing() {
        let mut engine = RulesEngine::starting();
        let mut view = BoardView::new(Seat::Host);
        let before = engine.fen();
        view.click(&mut engine, BoardCoord::new(6, 4));
        assert_eq!(
            view.click(&mut engine, BoardCoord::new(3, 4)),
            ClickOutcome::Rejected {
                from: Square::E2,
                to: Square::E5,
            }
        );
        assert_eq!(view.selected(), None);
        assert_eq!(engine.fen(), before);
    }

    #[test]
    fn test_both_seats_submit_the_same_logical_move() {
        let mut host_engine = RulesEngine::starting();
        let mut guest_engine = RulesEngine::starting();
        let mut host_view = BoardView::new(Seat::Host);
        let mut guest_view = BoardView::new(Seat::Guest);

        host_view.click(&mut host_engine, to_visual(Seat::Host, Square::E2));
        let host_move = host_view.click(&mut host_engine, to_visual(Seat::Host, Square::E4));

        guest_view.click(&mut guest_engine, to_visual(Seat::Guest, Square::E2));
        let guest_move = guest_view.click(&mut guest_engine, to_visual(Seat::Guest, Square::E4));

        assert_eq!(host_move, guest_move);
    }

    #[test]
    fn test_selection_is_dropped_when_the_piece_is_gone() {
        let mut engine = RulesEngine::starting();
        let mut view = BoardView::new(Seat::Host);
        view.click(&mut engine, BoardCoord::new(6, 4));
        assert_eq!(view.selected(), Some(Square::E2));

        // Position after 1. e4: e2 is empty and black is to move.
        let mut advanced = RulesEngine::starting();
        advanced.try_move(Square::E2, Square::E4).unwrap();
        view.revalidate_selection(&advanced);
        assert_eq!(view.selected(), None);
    }
}
