//! Errors surfaced by the keyed-document store boundary.

use derive_more::{Display, Error};

use crate::record::RoomId;

/// Failure of a store operation.
#[derive(Debug, Clone, Display, Error)]
pub enum StoreError {
    /// A version-guarded write found a different committed version.
    #[display("version conflict for room '{room_id}': expected {expected}, found {actual}")]
    VersionConflict {
        /// Room whose record moved on.
        room_id: RoomId,
        /// Version the writer based its update on.
        expected: u64,
        /// Version actually committed.
        actual: u64,
    },
    /// A version-guarded write targeted a room with no record.
    #[display("no record for room '{room_id}'")]
    Missing {
        /// Room that has no record.
        room_id: RoomId,
    },
    /// The backing store refused or failed the operation.
    #[display("store unavailable: {message}")]
    Unavailable {
        /// Adapter-specific failure description.
        message: String,
    },
}
