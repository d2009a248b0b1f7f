//! Terminal client for chess rooms.
//!
//! One process can hold both seats of a room (hot-seat play); each seat is
//! a full session converging through the shared store, so the rendering
//! path is identical to a two-process game.

mod app;
mod ui;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::Backend, backend::CrosstermBackend};
use tokio::time::{Duration, sleep};
use tracing::{error, info};

use crate::config::AppConfig;
use crate::identity::AuthSession;
use crate::sync::RoomSynchronizer;

use app::{App, Transition};

/// Runs the terminal client until the user quits.
///
/// # Errors
///
/// Returns terminal setup and rendering failures; game-level failures are
/// shown in the client instead of ending the process.
pub async fn run_tui(
    synchronizer: RoomSynchronizer,
    user: AuthSession,
    config: AppConfig,
    config_path: PathBuf,
) -> Result<()> {
    // Log to a file so traces do not tear the alternate screen.
    let log_file = std::fs::File::create("chess_rooms_tui.log")?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::sync::Arc::new(log_file))
        .with_ansi(false)
        .try_init();

    info!("Starting chess rooms TUI");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(synchronizer, user, config, config_path);
    let res = run_loop(&mut terminal, &mut app).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = &res {
        error!(error = ?err, "Event loop error");
    }
    res
}

/// Drives rendering and input until the user quits.
async fn run_loop<B>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()>
where
    B: Backend + io::Write,
    <B as Backend>::Error: Send + Sync + 'static,
{
    info!("Starting event loop");

    loop {
        app.tick();

        terminal.draw(|f| ui::render(f, app))?;

        // Poll for input with short timeout to keep the loop responsive.
        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
        {
            // Skip key release events (crossterm fires both press and release).
            if key.kind == KeyEventKind::Release {
                continue;
            }

            if app.handle_key(key).await == Transition::Quit {
                info!("Quitting");
                return Ok(());
            }
        }

        sleep(Duration::from_millis(10)).await;
    }
}
