//! Layout and drawing: menu, tile board, bubble field, sidebar, pause, quit menu, game over.
//! Also maps mouse positions back onto the board / field.

use crate::GameKind;
use crate::app::{ActiveGame, GameResult, MenuState, QuitOption, Screen};
use crate::bubbles::{BubbleGame, FIELD_SIZE, LANES};
use crate::grid::GRID_SIDE;
use crate::highscores::HighScores;
use crate::mood::{DayLog, Mood, TimeSlot};
use crate::session::SessionStatus;
use crate::theme::Theme;
use crate::tiles::TileGame;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Margin, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Gauge, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count};

/// One tile in terminal cells (last column is the gap between tiles).
const TILE_W: u16 = 8;
const TILE_H: u16 = 3;
/// Bubble field interior in terminal cells.
const FIELD_W: u16 = 48;
const FIELD_H: u16 = 20;
const SIDEBAR_WIDTH: u16 = 24;
/// Fade from white back to the refilled tiles.
const MATCH_FLASH_MS: u32 = 350;

/// Everything the renderer reads for one frame.
pub struct View<'a> {
    pub screen: Screen,
    pub game: Option<&'a ActiveGame>,
    pub theme: &'a Theme,
    pub high_scores: HighScores,
    pub menu: &'a MenuState,
    pub quit_selected: QuitOption,
    pub paused: bool,
    pub last_result: Option<GameResult>,
    pub today: &'a DayLog,
    pub now: Instant,
}

/// Flash over tiles cleared by a match (TachyonFX fade).
pub struct MatchFlash {
    cells: Vec<usize>,
    effect: Option<Effect>,
    last_process: Option<Instant>,
}

impl MatchFlash {
    pub fn new(cells: Vec<usize>) -> Self {
        Self {
            cells,
            effect: None,
            last_process: None,
        }
    }

    pub fn done(&self) -> bool {
        self.effect.as_ref().is_some_and(Effect::done)
    }
}

fn board_outer_size(kind: GameKind) -> (u16, u16) {
    match kind {
        GameKind::Tiles => (GRID_SIDE as u16 * TILE_W + 2, GRID_SIDE as u16 * TILE_H + 2),
        GameKind::Bubbles => (FIELD_W + 2, FIELD_H + 2),
    }
}

/// (board outer, sidebar) centred in `area`; shared by drawing and hit-testing.
fn game_layout(area: Rect, kind: GameKind) -> (Rect, Rect) {
    let (bw, bh) = board_outer_size(kind);
    let sidebar_h = 20u16;
    let total_w = bw + SIDEBAR_WIDTH;
    let total_h = bh.max(sidebar_h);

    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_h),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(bw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert[1]);
    let board = Rect {
        height: bh.min(inner[0].height),
        ..inner[0]
    };
    (board, inner[1])
}

fn board_inner(area: Rect, kind: GameKind) -> Rect {
    game_layout(area, kind).0.inner(Margin::new(1, 1))
}

fn tile_rect(board: Rect, index: usize) -> Rect {
    let (row, col) = ((index / GRID_SIDE) as u16, (index % GRID_SIDE) as u16);
    Rect {
        x: board.x + col * TILE_W,
        y: board.y + row * TILE_H,
        width: TILE_W - 1,
        height: TILE_H,
    }
    .intersection(board)
}

/// Tile index under a terminal position, if any.
pub fn tile_at(area: Rect, column: u16, row: u16) -> Option<usize> {
    let board = board_inner(area, GameKind::Tiles);
    if !board.contains(Position::new(column, row)) {
        return None;
    }
    // gap column between tiles
    if (column - board.x) % TILE_W == TILE_W - 1 {
        return None;
    }
    let col = ((column - board.x) / TILE_W) as usize;
    let r = ((row - board.y) / TILE_H) as usize;
    (col < GRID_SIDE && r < GRID_SIDE).then_some(r * GRID_SIDE + col)
}

/// Field coordinates (0..100) of a terminal position inside the bubble field.
pub fn field_point(area: Rect, column: u16, row: u16) -> Option<(f32, f32)> {
    let field = board_inner(area, GameKind::Bubbles);
    if field.width == 0 || field.height == 0 || !field.contains(Position::new(column, row)) {
        return None;
    }
    let x = (f32::from(column - field.x) + 0.5) / f32::from(field.width) * FIELD_SIZE;
    let y = (f32::from(row - field.y) + 0.5) / f32::from(field.height) * FIELD_SIZE;
    Some((x, y))
}

/// Terminal cell for a field point, if it lies inside the field.
fn field_cell(field: Rect, x: f32, y: f32) -> Option<(u16, u16)> {
    if !(0.0..FIELD_SIZE).contains(&x) || !(0.0..FIELD_SIZE).contains(&y) {
        return None;
    }
    let cx = (x / FIELD_SIZE * f32::from(field.width)) as u16;
    let cy = (y / FIELD_SIZE * f32::from(field.height)) as u16;
    (cx < field.width && cy < field.height).then_some((field.x + cx, field.y + cy))
}

pub fn draw(frame: &mut Frame, view: &View, flash: &mut Option<MatchFlash>) {
    let area = frame.area();
    match view.screen {
        Screen::Menu => draw_menu(frame, view, area),
        Screen::Playing | Screen::QuitMenu => {
            if let Some(game) = view.game {
                draw_game(frame, view, game, area);
                if let (ActiveGame::Tiles(_), Some(f)) = (game, flash.as_mut()) {
                    apply_match_effect(frame, view, f, area);
                }
            }
            if view.screen == Screen::QuitMenu {
                draw_quit_menu(frame, view.theme, view.quit_selected);
            } else if view.paused {
                draw_pause_overlay(frame, view.theme, area);
            }
        }
        Screen::GameOver => {
            if let Some(game) = view.game {
                draw_game(frame, view, game, area);
            }
            draw_game_over(frame, view, area);
        }
    }
}

fn draw_game(frame: &mut Frame, view: &View, game: &ActiveGame, area: Rect) {
    let (board, sidebar) = game_layout(area, game.kind());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(view.theme.div_line).bg(view.theme.bg))
        .title(Span::styled(
            format!(" {} ", game.kind().title()),
            Style::default().fg(view.theme.title),
        ));
    let inner = block.inner(board);
    block.render(board, frame.buffer_mut());
    match game {
        ActiveGame::Tiles(g) => draw_tiles(frame, view.theme, g, inner),
        ActiveGame::Bubbles(g) => draw_bubbles(frame, view.theme, g, inner),
    }
    draw_sidebar(frame, view, game, sidebar);
}

fn draw_tiles(frame: &mut Frame, theme: &Theme, game: &TileGame, board: Rect) {
    let buf = frame.buffer_mut();
    for y in board.y..board.y + board.height {
        for x in board.x..board.x + board.width {
            buf[(x, y)].set_symbol(" ").set_style(Style::default().bg(theme.bg));
        }
    }
    for (index, token) in game.grid().cells().iter().enumerate() {
        let rect = tile_rect(board, index);
        let color = theme.mood_color(token.mood);
        let fill = Style::default().bg(color);
        if index == game.cursor() {
            let cursor = Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.main_fg).bg(color));
            cursor.render(rect, frame.buffer_mut());
        } else {
            Paragraph::new("").style(fill).render(rect, frame.buffer_mut());
        }
        if game.selection() == Some(index) {
            let mid = Rect {
                y: rect.y + rect.height / 2,
                height: 1,
                ..rect
            }
            .inner(Margin::new(1, 0));
            Paragraph::new("◆")
                .alignment(Alignment::Center)
                .style(fill.fg(Color::Black).add_modifier(Modifier::BOLD))
                .render(mid, frame.buffer_mut());
        }
    }
}

fn draw_bubbles(frame: &mut Frame, theme: &Theme, game: &BubbleGame, field: Rect) {
    let buf = frame.buffer_mut();
    let (lo, hi) = BubbleGame::lane_span(game.lane());
    for y in field.y..field.y + field.height {
        for x in field.x..field.x + field.width {
            let field_x = (f32::from(x - field.x) + 0.5) / f32::from(field.width) * FIELD_SIZE;
            let bg = if (lo..hi).contains(&field_x) {
                theme.div_line
            } else {
                theme.bg
            };
            buf[(x, y)].set_symbol(" ").set_style(Style::default().bg(bg));
        }
    }

    for p in game.particles() {
        if let Some((cx, cy)) = field_cell(field, p.x, p.y) {
            let (symbol, fg) = if p.life() > 0.5 {
                ("*", theme.mood_color(p.mood))
            } else {
                ("·", theme.inactive_fg)
            };
            buf[(cx, cy)].set_symbol(symbol).set_fg(fg);
        }
    }
    for b in game.bubbles().iter().filter(|b| b.is_visible()) {
        if let Some((cx, cy)) = field_cell(field, b.x, b.y) {
            buf[(cx, cy)]
                .set_symbol("●")
                .set_fg(theme.mood_color(b.mood))
                .set_style(Style::default().add_modifier(Modifier::BOLD));
        }
    }

    // lane marker on the bottom row
    let lane_w = field.width / LANES as u16;
    let marker_x = field.x + lane_w * game.lane() as u16 + lane_w / 2;
    if field.height > 0 && marker_x < field.x + field.width {
        buf[(marker_x, field.y + field.height - 1)]
            .set_symbol("▲")
            .set_fg(theme.title);
    }
}

/// Create or update the match flash and process it (TachyonFX: white fading back to tile colours).
fn apply_match_effect(frame: &mut Frame, view: &View, flash: &mut MatchFlash, area: Rect) {
    let board = board_inner(area, GameKind::Tiles);
    let delta = flash
        .last_process
        .map(|t| view.now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u128::from(u32::MAX)) as u32;
    flash.last_process = Some(view.now);

    if flash.effect.is_none() {
        let mut positions = HashSet::new();
        for &index in &flash.cells {
            let r = tile_rect(board, index);
            for y in r.y..r.y + r.height {
                for x in r.x..r.x + r.width {
                    positions.insert((x, y));
                }
            }
        }
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            positions.contains(&(pos.x, pos.y))
        }));
        let effect = fx::fade_from(Color::White, Color::White, (MATCH_FLASH_MS, Interpolation::Linear))
            .with_filter(filter)
            .with_area(board);
        flash.effect = Some(effect);
    }

    if let Some(effect) = flash.effect.as_mut() {
        frame.render_effect(effect, board, TfxDuration::from_millis(delta_ms));
    }
}

fn draw_sidebar(frame: &mut Frame, view: &View, game: &ActiveGame, area: Rect) {
    let theme = view.theme;
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let border_style = Style::default().fg(theme.div_line).bg(theme.bg);
    let session = game.session();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Time (title + gauge)
            Constraint::Length(1),
            Constraint::Length(6), // Stats
            Constraint::Length(1),
            Constraint::Length(7), // Moods legend
        ])
        .split(area);

    // --- Time ---
    let time_block = Block::default().borders(Borders::ALL).border_style(border_style);
    let time_inner = time_block.inner(chunks[0]);
    time_block.render(chunks[0], frame.buffer_mut());
    let time_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(time_inner);
    let remaining = session.time_remaining();
    let clock = if session.status() == SessionStatus::Finished {
        "time's up".to_string()
    } else {
        format!("{} / {}", mmss(remaining), mmss(session.budget()))
    };
    Paragraph::new(Line::from(vec![
        Span::styled("Time: ", title_style),
        Span::styled(clock, fg_style),
    ]))
    .render(time_layout[0], frame.buffer_mut());
    let ratio = session.remaining_ratio().clamp(0.0, 1.0);
    let bar_color = if ratio > 0.5 {
        Color::Green
    } else if ratio > 0.2 {
        Color::Yellow
    } else {
        Color::Red
    };
    Gauge::default()
        .ratio(ratio)
        .label("")
        .gauge_style(Style::default().fg(bar_color))
        .render(time_layout[1], frame.buffer_mut());

    // --- Stats ---
    let stats_block = Block::default().borders(Borders::ALL).border_style(border_style);
    let stats_inner = stats_block.inner(chunks[2]);
    stats_block.render(chunks[2], frame.buffer_mut());
    let mut stats = vec![
        Line::from(vec![
            Span::styled("Score: ", title_style),
            Span::styled(session.score().to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Best: ", title_style),
            Span::styled(view.high_scores.best(game.kind()).to_string(), fg_style),
        ]),
    ];
    match game {
        ActiveGame::Tiles(g) => {
            let selected = g.selection().map_or_else(
                || "-".to_string(),
                |i| format!("r{} c{}", i / GRID_SIDE + 1, i % GRID_SIDE + 1),
            );
            stats.push(Line::from(vec![
                Span::styled("Selected: ", title_style),
                Span::styled(selected, fg_style),
            ]));
        }
        ActiveGame::Bubbles(g) => {
            stats.push(Line::from(vec![
                Span::styled("Floating: ", title_style),
                Span::styled(g.bubbles().len().to_string(), fg_style),
            ]));
            stats.push(Line::from(vec![
                Span::styled("Missed: ", title_style),
                Span::styled(g.misses().to_string(), fg_style),
            ]));
        }
    }
    Paragraph::new(stats).render(stats_inner, frame.buffer_mut());

    // --- Moods legend ---
    let legend_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(" Moods ", title_style));
    let legend_inner = legend_block.inner(chunks[4]);
    legend_block.render(chunks[4], frame.buffer_mut());
    let legend: Vec<Line> = Mood::ALL
        .iter()
        .map(|&m| {
            Line::from(vec![
                Span::styled("██ ", Style::default().fg(theme.mood_color(m))),
                Span::styled(m.label(), fg_style),
            ])
        })
        .collect();
    Paragraph::new(legend).render(legend_inner, frame.buffer_mut());
}

fn mmss(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn centered(area: Rect, w: u16, h: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(w) / 2,
        y: area.y + area.height.saturating_sub(h) / 2,
        width: w.min(area.width),
        height: h.min(area.height),
    }
}

fn draw_menu(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let mut popup = centered(area, 52, 19);

    let highlight = Style::default()
        .fg(Color::Black)
        .bg(theme.mood_color(Mood::Happy))
        .add_modifier(Modifier::BOLD);
    let normal = Style::default().fg(theme.main_fg);
    let dim = Style::default().fg(theme.inactive_fg);

    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled(" mood", Style::default().fg(theme.mood_color(Mood::Calm)).add_modifier(Modifier::BOLD)),
            Span::styled("arcade ", Style::default().fg(theme.main_fg).add_modifier(Modifier::BOLD)),
        ]),
        Line::from(""),
    ];
    let today = match view.today.dominant() {
        Some(m) => Line::from(vec![
            Span::styled(" Today feels ", normal),
            Span::styled(m.label(), Style::default().fg(theme.mood_color(m)).add_modifier(Modifier::BOLD)),
            Span::styled(" ", normal),
        ]),
        None if view.today.logged() > 0 => Line::from(Span::styled(" Today is a mixed day ", normal)),
        None => Line::from(Span::styled(" No moods logged today ", dim)),
    };
    lines.push(today);
    let mut slots = vec![Span::from(" ")];
    for slot in TimeSlot::ALL {
        let (glyph, style) = match view.today.get(slot) {
            Some(m) => ("●", Style::default().fg(theme.mood_color(m))),
            None => ("○", dim),
        };
        slots.push(Span::styled(format!("{} {glyph}  ", slot.label()), style));
    }
    lines.push(Line::from(slots));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(" ─ PICK A GAME ─ ", Style::default().fg(theme.div_line))));
    lines.push(Line::from(""));
    for kind in GameKind::ALL {
        let style = if view.menu.selected == kind { highlight } else { normal };
        lines.push(Line::from(vec![
            Span::styled(format!(" {:<12}", kind.title()), style),
            Span::styled(format!("  best {:>5} ", view.high_scores.best(kind)), dim),
        ]));
        lines.push(Line::from(""));
    }
    lines.extend([
        Line::from(""),
        Line::from(vec![
            Span::styled(" ↕ ", Style::default().fg(theme.mood_color(Mood::Calm))),
            Span::from("CHOOSE   "),
            Span::styled(" ENTER ", Style::default().fg(theme.mood_color(Mood::Calm))),
            Span::from("PLAY   "),
            Span::styled(" Q ", Style::default().fg(theme.mood_color(Mood::Angry))),
            Span::from("QUIT"),
        ]),
    ]);

    // Slide in from below, ease-out cubic
    let elapsed = view.now.saturating_duration_since(view.menu.animation_start).as_millis() as f32;
    let t = (elapsed / 500.0).min(1.0);
    let offset_t = 1.0 - (1.0 - t).powi(3);
    popup.y += ((1.0 - offset_t) * 8.0) as u16;
    popup = popup.intersection(area);

    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
        )
        .render(popup, frame.buffer_mut());
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup = centered(area, 28, 5);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(" Paused ", Style::default().fg(Color::Black).bg(Color::Yellow))),
        Line::from(""),
        Line::from(Span::styled(" P — Resume    Q — Quit ", Style::default().fg(theme.main_fg))),
    ];
    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
        )
        .render(popup, frame.buffer_mut());
}

fn draw_game_over(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let popup = centered(area, 34, 11);
    let Some(result) = view.last_result else {
        return;
    };
    let fg = Style::default().fg(theme.main_fg);
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(" Time's up! ", Style::default().fg(Color::White).bg(Color::Red))),
        Line::from(""),
        Line::from(Span::styled(format!(" Score: {} ", result.score), fg)),
        Line::from(Span::styled(
            format!(" Best: {} ", view.high_scores.best(result.game)),
            fg,
        )),
    ];
    if result.new_record {
        lines.push(Line::from(Span::styled(
            " New record! ",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(" R — Again  Enter — Menu  Q — Quit ", fg)));
    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
                .title(Span::styled(format!(" {} ", result.game.title()), theme.title)),
        )
        .render(popup, frame.buffer_mut());
}

fn draw_quit_menu(frame: &mut Frame, theme: &Theme, selected: QuitOption) {
    let quit_rect = centered(frame.area(), 24, 8);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.title).bg(theme.bg))
        .title(" Leave game? ");
    Clear.render(quit_rect, frame.buffer_mut());
    let inner = block.inner(quit_rect);
    block.render(quit_rect, frame.buffer_mut());

    let options = [
        (QuitOption::Resume, " Resume "),
        (QuitOption::MainMenu, " Main Menu "),
        (QuitOption::Exit, " Exit "),
    ];
    for (i, (opt, label)) in options.iter().enumerate() {
        let style = if *opt == selected {
            Style::default()
                .fg(theme.bg)
                .bg(theme.title)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.title)
        };
        let rx = inner.x + inner.width.saturating_sub(label.len() as u16) / 2;
        let ry = inner.y + 1 + i as u16 * 2;
        if ry < inner.y + inner.height {
            frame.buffer_mut().set_string(rx, ry, label, style);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCREEN: Rect = Rect {
        x: 0,
        y: 0,
        width: 120,
        height: 40,
    };

    #[test]
    fn every_tile_centre_maps_back_to_its_index() {
        let board = board_inner(SCREEN, GameKind::Tiles);
        for index in 0..GRID_SIDE * GRID_SIDE {
            let r = tile_rect(board, index);
            let (cx, cy) = (r.x + r.width / 2, r.y + r.height / 2);
            assert_eq!(tile_at(SCREEN, cx, cy), Some(index));
        }
    }

    #[test]
    fn clicks_outside_the_board_miss() {
        let board = board_inner(SCREEN, GameKind::Tiles);
        assert_eq!(tile_at(SCREEN, 0, 0), None);
        assert_eq!(tile_at(SCREEN, board.x + board.width, board.y), None);
    }

    #[test]
    fn gap_between_tiles_selects_nothing() {
        let board = board_inner(SCREEN, GameKind::Tiles);
        let gap = board.x + TILE_W - 1;
        assert_eq!(tile_at(SCREEN, gap, board.y + 1), None);
        assert_eq!(tile_at(SCREEN, gap - 1, board.y + 1), Some(0));
        assert_eq!(tile_at(SCREEN, gap + 1, board.y + 1), Some(1));
    }

    #[test]
    fn field_point_round_trips_through_field_cell() {
        let field = board_inner(SCREEN, GameKind::Bubbles);
        assert_eq!(field.width, FIELD_W);
        assert_eq!(field.height, FIELD_H);
        let (x, y) = field_point(SCREEN, field.x + 10, field.y + 5).unwrap();
        assert_eq!(field_cell(field, x, y), Some((field.x + 10, field.y + 5)));
        assert_eq!(field_point(SCREEN, field.x - 1, field.y), None);
    }

    #[test]
    fn points_outside_the_field_have_no_cell() {
        let field = board_inner(SCREEN, GameKind::Bubbles);
        assert_eq!(field_cell(field, 50.0, 110.0), None);
        assert_eq!(field_cell(field, 50.0, -1.0), None);
        assert!(field_cell(field, 0.0, 0.0).is_some());
    }
}
