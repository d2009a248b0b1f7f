//! The shared game record: one document per room, replicated through the
//! keyed-document store.

use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};

/// Unique identifier for a game room. Doubles as the document key in the
/// store and as the code players exchange to meet in a room.
pub type RoomId = String;

/// Which side is to move. Serialized as the single letter used in FEN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Turn {
    /// White to move.
    #[serde(rename = "w")]
    White,
    /// Black to move.
    #[serde(rename = "b")]
    Black,
}

impl Turn {
    /// The other side.
    pub fn opponent(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }

    /// Human-readable side name.
    pub fn label(&self) -> &'static str {
        match self {
            Self::White => "White",
            Self::Black => "Black",
        }
    }
}

/// Lifecycle tag for a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    /// Created by a host; no guest has joined yet.
    Waiting,
    /// Both participants attached; moves are flowing.
    Active,
    /// The game reached a terminal position.
    Finished,
}

impl RoomStatus {
    /// Human-readable status name.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Active => "active",
            Self::Finished => "finished",
        }
    }
}

/// The canonical shared state of one room.
///
/// The full position lives in `fen`; `turn` and `status` are denormalized
/// so observers can react without parsing the position. `version` counts
/// committed writes and backs the stale-write guard on the move path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, new)]
pub struct GameRecord {
    room_id: RoomId,
    fen: String,
    turn: Turn,
    status: RoomStatus,
    version: u64,
}

impl GameRecord {
    /// Builds the record that succeeds this one after a committed write,
    /// carrying the same room id and the next version number.
    pub fn successor(&self, fen: String, turn: Turn, status: RoomStatus) -> Self {
        Self::new(self.room_id.clone(), fen, turn, status, self.version + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_serializes_as_fen_letter() {
        assert_eq!(serde_json::to_string(&Turn::White).unwrap(), "\"w\"");
        assert_eq!(serde_json::to_string(&Turn::Black).unwrap(), "\"b\"");
        let turn: Turn = serde_json::from_str("\"b\"").unwrap();
        assert_eq!(turn, Turn::Black);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&RoomStatus::Waiting).unwrap(),
            "\"waiting\""
        );
        let status: RoomStatus = serde_json::from_str("\"finished\"").unwrap();
        assert_eq!(status, RoomStatus::Finished);
    }

    #[test]
    fn test_record_round_trips_through_json() {
        let record = GameRecord::new(
            "abc123".to_string(),
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1".to_string(),
            Turn::White,
            RoomStatus::Waiting,
            0,
        );
        let json = serde_json::to_string(&record).unwrap();
        let decoded: GameRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, record);
        assert!(json.contains("\"turn\":\"w\""));
        assert!(json.contains("\"status\":\"waiting\""));
        assert!(json.contains("\"version\":0"));
    }

    #[test]
    fn test_successor_bumps_version_and_keeps_room() {
        let record = GameRecord::new(
            "abc123".to_string(),
            "start".to_string(),
            Turn::White,
            RoomStatus::Active,
            3,
        );
        let next = record.successor("next".to_string(), Turn::Black, RoomStatus::Active);
        assert_eq!(next.room_id(), "abc123");
        assert_eq!(next.fen(), "next");
        assert_eq!(*next.turn(), Turn::Black);
        assert_eq!(*next.version(), 4);
    }

    #[test]
    fn test_opponent_flips_sides() {
        assert_eq!(Turn::White.opponent(), Turn::Black);
        assert_eq!(Turn::Black.opponent(), Turn::White);
    }
}
