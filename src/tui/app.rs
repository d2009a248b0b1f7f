//! Application state for the terminal client.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent};
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::identity::AuthSession;
use crate::session::{LocalSession, MoveFeedback, RemoteUpdate};
use crate::sync::{RoomSynchronizer, SyncError};
use crate::view::BoardCoord;

/// How long a transient notice stays on screen.
const NOTICE_TTL: Duration = Duration::from_secs(3);

/// Loop control returned from key handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Keep running.
    Stay,
    /// Leave the event loop.
    Quit,
}

/// Which screen is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Create/join menu.
    Menu,
    /// An attached room.
    Game,
}

/// Input mode within the menu screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuMode {
    /// Navigating the menu entries.
    Select,
    /// Typing a room id to join.
    EnterRoomId,
}

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Informational; rendered green.
    Info,
    /// Something went wrong; rendered red.
    Error,
}

/// A message shown under the board. Transient notices expire on their own;
/// sticky ones stay until replaced or the user navigates.
#[derive(Debug, Clone)]
pub struct Notice {
    text: String,
    level: NoticeLevel,
    expires: Option<Instant>,
}

impl Notice {
    fn transient(text: impl Into<String>, level: NoticeLevel) -> Self {
        Self {
            text: text.into(),
            level,
            expires: Some(Instant::now() + NOTICE_TTL),
        }
    }

    fn sticky(text: impl Into<String>, level: NoticeLevel) -> Self {
        Self {
            text: text.into(),
            level,
            expires: None,
        }
    }

    /// The message text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The message severity.
    pub fn level(&self) -> NoticeLevel {
        self.level
    }
}

/// Terminal client state: menu navigation, attached seats and shared
/// preferences.
pub struct App {
    synchronizer: RoomSynchronizer,
    user: AuthSession,
    config: AppConfig,
    config_path: PathBuf,
    screen: Screen,
    menu_mode: MenuMode,
    menu_cursor: usize,
    join_input: String,
    seats: Vec<LocalSession>,
    focus: usize,
    cursor: BoardCoord,
    notice: Option<Notice>,
}

impl App {
    /// Entries of the menu screen, in rendered order.
    pub const MENU_ITEMS: [&'static str; 3] = ["Create room", "Join room", "Quit"];

    /// Creates the client state in the menu screen.
    pub fn new(
        synchronizer: RoomSynchronizer,
        user: AuthSession,
        config: AppConfig,
        config_path: PathBuf,
    ) -> Self {
        Self {
            synchronizer,
            user,
            config,
            config_path,
            screen: Screen::Menu,
            menu_mode: MenuMode::Select,
            menu_cursor: 0,
            join_input: String::new(),
            seats: Vec::new(),
            focus: 0,
            cursor: BoardCoord::new(6, 4),
            notice: None,
        }
    }

    /// The active screen.
    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// The menu input mode.
    pub fn menu_mode(&self) -> MenuMode {
        self.menu_mode
    }

    /// The highlighted menu entry.
    pub fn menu_cursor(&self) -> usize {
        self.menu_cursor
    }

    /// The room id being typed.
    pub fn join_input(&self) -> &str {
        &self.join_input
    }

    /// The signed-in participant.
    pub fn user(&self) -> &AuthSession {
        &self.user
    }

    /// The persisted preferences.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The board cursor in visual coordinates.
    pub fn cursor(&self) -> BoardCoord {
        self.cursor
    }

    /// The current notice, if any.
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// The session receiving input.
    pub fn focused(&self) -> Option<&LocalSession> {
        self.seats.get(self.focus)
    }

    /// How many seats this process holds.
    pub fn seat_count(&self) -> usize {
        self.seats.len()
    }

    /// Advances time-driven state: expires notices and folds in remote
    /// commits for every held seat.
    pub fn tick(&mut self) {
        if let Some(notice) = &self.notice
            && let Some(expires) = notice.expires
            && Instant::now() >= expires
        {
            self.notice = None;
        }

        let focus = self.focus;
        let mut focused_update: Option<RemoteUpdate> = None;
        for (idx, session) in self.seats.iter_mut().enumerate() {
            if let Some(update) = session.poll_remote()
                && idx == focus
            {
                focused_update = Some(update);
            }
        }
        if let Some(update) = focused_update {
            self.apply_update_notice(&update);
        }
    }

    // Mirrors what the subscription delivered; moves themselves stay
    // silent so both seats toast identically.
    fn apply_update_notice(&mut self, update: &RemoteUpdate) {
        if update.game_over {
            let result = if update.checkmate { "Checkmate" } else { "Draw" };
            self.notice = Some(Notice::sticky(
                format!("Game over! Result: {}", result),
                NoticeLevel::Info,
            ));
        } else if update.turn_changed {
            self.notice = Some(Notice::transient(
                format!("{}'s Turn", update.turn.label()),
                NoticeLevel::Info,
            ));
        }
    }

    /// Handles one key press, resolving any resulting room operation.
    pub async fn handle_key(&mut self, key: KeyEvent) -> Transition {
        match self.screen {
            Screen::Menu => self.handle_menu_key(key).await,
            Screen::Game => self.handle_game_key(key).await,
        }
    }

    async fn handle_menu_key(&mut self, key: KeyEvent) -> Transition {
        match self.menu_mode {
            MenuMode::Select => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Transition::Quit,
                KeyCode::Up => {
                    self.menu_cursor =
                        (self.menu_cursor + Self::MENU_ITEMS.len() - 1) % Self::MENU_ITEMS.len();
                }
                KeyCode::Down => {
                    self.menu_cursor = (self.menu_cursor + 1) % Self::MENU_ITEMS.len();
                }
                KeyCode::Enter => match self.menu_cursor {
                    0 => self.create_room().await,
                    1 => {
                        self.menu_mode = MenuMode::EnterRoomId;
                        self.join_input.clear();
                    }
                    _ => return Transition::Quit,
                },
                _ => {}
            },
            MenuMode::EnterRoomId => match key.code {
                KeyCode::Esc => {
                    self.menu_mode = MenuMode::Select;
                    self.join_input.clear();
                }
                KeyCode::Backspace => {
                    self.join_input.pop();
                }
                KeyCode::Enter => self.join_room().await,
                KeyCode::Char(c) if c.is_ascii_alphanumeric() => {
                    self.join_input.push(c.to_ascii_lowercase());
                }
                _ => {}
            },
        }
        Transition::Stay
    }

    async fn handle_game_key(&mut self, key: KeyEvent) -> Transition {
        match key.code {
            KeyCode::Char('q') => return Transition::Quit,
            KeyCode::Esc => self.leave_room(),
            KeyCode::Up => self.move_cursor(-1, 0),
            KeyCode::Down => self.move_cursor(1, 0),
            KeyCode::Left => self.move_cursor(0, -1),
            KeyCode::Right => self.move_cursor(0, 1),
            KeyCode::Enter => self.click_cursor().await,
            KeyCode::Tab => {
                if !self.seats.is_empty() {
                    self.focus = (self.focus + 1) % self.seats.len();
                    debug!(focus = self.focus, "Focus switched");
                }
            }
            KeyCode::Char('g') => self.attach_hotseat().await,
            KeyCode::Char('d') => {
                self.config.toggle_dark_mode();
                self.persist_config();
            }
            KeyCode::Char('o') => {
                self.config.toggle_outline_pieces();
                self.persist_config();
            }
            _ => {}
        }
        Transition::Stay
    }

    async fn create_room(&mut self) {
        match LocalSession::host(self.synchronizer.clone(), self.user.clone()).await {
            Ok(session) => {
                let room_id = session.room_id().to_string();
                info!(room_id = %room_id, "Hosting room");
                self.enter_game(session);
                self.notice = Some(Notice::sticky(
                    format!("Room created: {} (share this id)", room_id),
                    NoticeLevel::Info,
                ));
            }
            Err(e) => {
                warn!(error = %e, "Failed to create room");
                self.notice = Some(Notice::sticky(
                    format!("Could not create room: {}", e),
                    NoticeLevel::Error,
                ));
            }
        }
    }

    async fn join_room(&mut self) {
        let room_id = self.join_input.trim().to_string();
        if room_id.is_empty() {
            self.notice = Some(Notice::transient("Enter a room id", NoticeLevel::Error));
            return;
        }
        match LocalSession::join(self.synchronizer.clone(), self.user.clone(), &room_id).await {
            Ok(session) => {
                info!(room_id = %room_id, "Joined room");
                self.enter_game(session);
            }
            Err(SyncError::RoomNotFound { .. }) => {
                warn!(room_id = %room_id, "Room not found");
                self.notice = Some(Notice::sticky("Room not found!", NoticeLevel::Error));
            }
            Err(e) => {
                warn!(room_id = %room_id, error = %e, "Failed to join room");
                self.notice = Some(Notice::sticky(
                    format!("Could not join: {}", e),
                    NoticeLevel::Error,
                ));
            }
        }
    }

    fn enter_game(&mut self, session: LocalSession) {
        self.seats = vec![session];
        self.focus = 0;
        self.cursor = BoardCoord::new(6, 4);
        self.screen = Screen::Game;
        self.menu_mode = MenuMode::Select;
        self.join_input.clear();
        self.notice = None;
    }

    /// Attaches the opposite seat in this process, for hot-seat play.
    async fn attach_hotseat(&mut self) {
        if self.seats.len() != 1 {
            return;
        }
        let room_id = self.seats[0].room_id().to_string();
        match LocalSession::join(self.synchronizer.clone(), self.user.clone(), &room_id).await {
            Ok(session) => {
                info!(room_id = %room_id, "Hot-seat guest attached");
                self.seats.push(session);
                self.focus = 1;
                self.notice = Some(Notice::transient(
                    "Hot-seat guest attached; Tab switches seats",
                    NoticeLevel::Info,
                ));
            }
            Err(e) => {
                warn!(error = %e, "Hot-seat attach failed");
                self.notice = Some(Notice::sticky(
                    format!("Could not attach guest: {}", e),
                    NoticeLevel::Error,
                ));
            }
        }
    }

    async fn click_cursor(&mut self) {
        let coord = self.cursor;
        let Some(session) = self.seats.get_mut(self.focus) else {
            return;
        };
        match session.click(coord).await {
            MoveFeedback::Selected(_) | MoveFeedback::Ignored => {}
            MoveFeedback::Submitted { .. } => {
                // Turn and game-over notices arrive through the
                // subscription echo, same as for the other seat.
            }
            MoveFeedback::Illegal { .. } => {
                self.notice = Some(Notice::transient("Invalid move!", NoticeLevel::Error));
            }
            MoveFeedback::SyncFailed { error, .. } => {
                self.notice = Some(Notice::transient(
                    format!("Sync failed: {}", error),
                    NoticeLevel::Error,
                ));
            }
        }
    }

    fn leave_room(&mut self) {
        for session in self.seats.drain(..) {
            session.leave();
        }
        self.focus = 0;
        self.screen = Screen::Menu;
        self.menu_mode = MenuMode::Select;
        self.notice = None;
    }

    fn move_cursor(&mut self, row_delta: i8, col_delta: i8) {
        let row = (self.cursor.row as i8 + row_delta).clamp(0, 7) as u8;
        let col = (self.cursor.col as i8 + col_delta).clamp(0, 7) as u8;
        self.cursor = BoardCoord::new(row, col);
    }

    fn persist_config(&mut self) {
        if let Err(e) = self.config.save(&self.config_path) {
            warn!(error = %e, "Failed to persist config");
            self.notice = Some(Notice::transient(
                format!("Could not save preferences: {}", e),
                NoticeLevel::Error,
            ));
        }
    }
}
