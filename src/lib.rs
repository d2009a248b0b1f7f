//! Chess Rooms library - two-player chess over a shared game record
//!
//! Players sign in through an identity gate, create or join a room, and
//! play on a board whose legality checks are delegated to an external
//! rules library. Each room is one replicated document; participants
//! converge by subscribing to its commits.
//!
//! # Architecture
//!
//! - **Record**: the shared [`GameRecord`] document, one per room
//! - **Store**: the keyed-document [`GameStore`] port and its in-memory adapter
//! - **Sync**: the [`RoomSynchronizer`] protocol (create, join, subscribe, submit)
//! - **Rules**: the [`RulesEngine`] adapter over the chess library
//! - **View**: the two-click [`BoardView`] gesture machine with seat mirroring
//! - **Session**: one participant's [`LocalSession`] tying the pieces together
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use chess_rooms::{InMemoryGameStore, RoomSynchronizer};
//!
//! # async fn example() -> Result<(), chess_rooms::SyncError> {
//! let store = Arc::new(InMemoryGameStore::new());
//! let rooms = RoomSynchronizer::new(store);
//!
//! // The host creates a room and shares its id out of band.
//! let host = rooms.create_room().await?;
//! let guest = rooms.join_room(host.record.room_id()).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod cli;
mod config;
mod identity;
mod record;
mod rules;
mod session;
mod store;
mod sync;
mod tui;
mod view;

// Crate-level exports - CLI
pub use cli::{Cli, Command};

// Crate-level exports - Configuration
pub use config::{AppConfig, ConfigError};

// Crate-level exports - Identity boundary
pub use identity::{AuthSession, IdentityError, IdentityGate, LocalIdentityGate};

// Crate-level exports - Shared record
pub use record::{GameRecord, RoomId, RoomStatus, Turn};

// Crate-level exports - Rules oracle
pub use rules::{AppliedMove, RulesEngine, RulesError};

// Crate-level exports - Sessions
pub use session::{LocalSession, MoveFeedback, RemoteUpdate};

// Crate-level exports - Store boundary
pub use store::{GameStore, InMemoryGameStore, RoomSubscription, StoreError};

// Crate-level exports - Room synchronization
pub use sync::{AttachedRoom, RoomSynchronizer, SyncError};

// Crate-level exports - Terminal client
pub use tui::run_tui;

// Crate-level exports - Board view
pub use view::{BoardCoord, BoardView, ClickOutcome, Seat, to_logical, to_visual};
