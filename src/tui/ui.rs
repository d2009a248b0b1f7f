//! Stateless rendering for the terminal client.

use chess::{Color as PieceColor, Piece};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::session::LocalSession;
use crate::view::{BoardCoord, Seat, to_logical};

use super::app::{App, MenuMode, Notice, NoticeLevel, Screen};

/// Renders the active screen.
pub fn render(frame: &mut Frame, app: &App) {
    match app.screen() {
        Screen::Menu => render_menu(frame, app),
        Screen::Game => render_game(frame, app),
    }
}

fn render_menu(frame: &mut Frame, app: &App) {
    let area = center_rect(frame.area(), 48, 14);
    let block = Block::default()
        .title("Chess Rooms")
        .borders(Borders::ALL)
        .title_alignment(Alignment::Center);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = vec![
        Line::from(format!("Signed in as {}", app.user().display_name())),
        Line::from(""),
    ];
    for (idx, item) in App::MENU_ITEMS.iter().enumerate() {
        let (marker, style) = if idx == app.menu_cursor() {
            (
                "> ",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )
        } else {
            ("  ", Style::default())
        };
        lines.push(Line::from(Span::styled(format!("{}{}", marker, item), style)));
    }
    lines.push(Line::from(""));
    match app.menu_mode() {
        MenuMode::EnterRoomId => {
            lines.push(Line::from(format!("Room id: {}_", app.join_input())));
        }
        MenuMode::Select => {
            lines.push(Line::from(Span::styled(
                "Up/Down select, Enter confirm",
                Style::default().fg(Color::DarkGray),
            )));
        }
    }
    if let Some(notice) = app.notice() {
        lines.push(Line::from(""));
        lines.push(notice_line(notice));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_game(frame: &mut Frame, app: &App) {
    let Some(session) = app.focused() else {
        render_menu(frame, app);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),  // Status
            Constraint::Min(11),    // Board
            Constraint::Length(1),  // Notice
            Constraint::Length(1),  // Help
        ])
        .split(frame.area());

    render_status(frame, chunks[0], app, session);
    render_board(frame, chunks[1], app, session);

    if let Some(notice) = app.notice() {
        let paragraph = Paragraph::new(notice_line(notice)).alignment(Alignment::Center);
        frame.render_widget(paragraph, chunks[2]);
    }

    render_help(frame, chunks[3], app);
}

fn render_status(frame: &mut Frame, area: Rect, app: &App, session: &LocalSession) {
    let record = session.record();
    let status = format!(
        "Room {}  |  {} ({})  |  {}'s turn  |  {}",
        session.room_id(),
        app.user().display_name(),
        session.seat().label(),
        record.turn().label(),
        record.status().label(),
    );
    let paragraph = Paragraph::new(status)
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

fn render_board(frame: &mut Frame, area: Rect, app: &App, session: &LocalSession) {
    let seat = session.seat();
    let engine = session.engine();
    let selected = session.selected();
    let dark = *app.config().dark_mode();
    let outline = *app.config().outline_pieces();

    let mut lines = Vec::with_capacity(9);
    for row in 0..8u8 {
        let mut spans = vec![Span::styled(
            format!(" {} ", rank_label(seat, row)),
            Style::default().fg(Color::DarkGray),
        )];
        for col in 0..8u8 {
            let coord = BoardCoord::new(row, col);
            let square = to_logical(seat, coord);
            let occupant = engine.piece_at(square);

            let glyph = match occupant {
                Some((piece, _)) => piece_glyph(piece, outline),
                None => ' ',
            };
            let mut style = Style::default().bg(square_bg(coord, dark));
            if let Some((_, color)) = occupant {
                style = style.fg(piece_fg(color, dark));
            }
            if selected == Some(square) {
                style = style.bg(Color::Yellow).fg(Color::Black);
            }
            if coord == app.cursor() {
                style = style.add_modifier(Modifier::REVERSED);
            }
            spans.push(Span::styled(format!(" {} ", glyph), style));
        }
        lines.push(Line::from(spans));
    }

    let mut footer = vec![Span::raw("   ")];
    for col in 0..8u8 {
        footer.push(Span::styled(
            format!(" {} ", file_label(seat, col)),
            Style::default().fg(Color::DarkGray),
        ));
    }
    lines.push(Line::from(footer));

    // Rank labels, 8 cell columns and the file footer, plus the border.
    let board_area = center_rect(area, 29, 11);
    let block = Block::default().borders(Borders::ALL);
    let inner = block.inner(board_area);
    frame.render_widget(block, board_area);
    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_help(frame: &mut Frame, area: Rect, app: &App) {
    let mut help = String::from("Arrows move  Enter select/move  Tab seat");
    if app.seat_count() == 1 {
        help.push_str("  g hot-seat");
    }
    help.push_str("  d dark  o outline  Esc leave  q quit");
    let paragraph = Paragraph::new(help)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

fn notice_line(notice: &Notice) -> Line<'_> {
    let color = match notice.level() {
        NoticeLevel::Info => Color::Green,
        NoticeLevel::Error => Color::Red,
    };
    Line::from(Span::styled(
        notice.text().to_string(),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ))
}

fn rank_label(seat: Seat, row: u8) -> char {
    let rank = match seat {
        Seat::Host => 8 - row,
        Seat::Guest => row + 1,
    };
    (b'0' + rank) as char
}

fn file_label(seat: Seat, col: u8) -> char {
    match seat {
        Seat::Host => (b'a' + col) as char,
        Seat::Guest => (b'h' - col) as char,
    }
}

fn piece_glyph(piece: Piece, outline: bool) -> char {
    if outline {
        match piece {
            Piece::King => '\u{2654}',
            Piece::Queen => '\u{2655}',
            Piece::Rook => '\u{2656}',
            Piece::Bishop => '\u{2657}',
            Piece::Knight => '\u{2658}',
            Piece::Pawn => '\u{2659}',
        }
    } else {
        match piece {
            Piece::King => '\u{265A}',
            Piece::Queen => '\u{265B}',
            Piece::Rook => '\u{265C}',
            Piece::Bishop => '\u{265D}',
            Piece::Knight => '\u{265E}',
            Piece::Pawn => '\u{265F}',
        }
    }
}

fn piece_fg(color: PieceColor, dark: bool) -> Color {
    match (color, dark) {
        (PieceColor::White, true) => Color::White,
        (PieceColor::White, false) => Color::Blue,
        (PieceColor::Black, true) => Color::Red,
        (PieceColor::Black, false) => Color::Black,
    }
}

fn square_bg(coord: BoardCoord, dark: bool) -> Color {
    let light_square = (coord.row + coord.col) % 2 == 0;
    match (light_square, dark) {
        (true, false) => Color::Gray,
        (false, false) => Color::DarkGray,
        (true, true) => Color::DarkGray,
        (false, true) => Color::Black,
    }
}

fn center_rect(area: Rect, width: u16, height: u16) -> Rect {
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length((area.height.saturating_sub(height)) / 2),
            Constraint::Length(height),
            Constraint::Length((area.height.saturating_sub(height)) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length((area.width.saturating_sub(width)) / 2),
            Constraint::Length(width),
            Constraint::Length((area.width.saturating_sub(width)) / 2),
        ])
        .split(vert[1])[1]
}
