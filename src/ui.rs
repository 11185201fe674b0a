//! Layout and drawing: playfield, sidebar, pause and game-over overlays.

use crate::app::Screen;
use crate::game::{GameState, RenderState};
use crate::shape::{EMPTY, TetrominoKind};
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Widget};
use std::time::Instant;
use tachyonfx::{Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx};

/// Each field cell is two terminal columns wide so blocks look square.
const CELL_WIDTH: u16 = 2;
const CELL_SYMBOL: &str = "██";

const SIDEBAR_WIDTH: u16 = 24;

/// Duration of the game-over board fade (TachyonFX) in ms.
const GAME_OVER_FADE_MS: u32 = 900;

/// Playfield size in terminal cells, border included.
fn playfield_size(view: &RenderState<'_>) -> (u16, u16) {
    let cols = u16::try_from(view.field.cols()).unwrap_or(u16::MAX);
    let rows = u16::try_from(view.field.rows()).unwrap_or(u16::MAX);
    (
        cols.saturating_mul(CELL_WIDTH).saturating_add(2),
        rows.saturating_add(2),
    )
}

/// Draw the current screen, with the pause overlay on top when paused.
/// On game over the board fades out with TachyonFX unless `no_animation`;
/// `game_over_effect` / `effect_time` carry the running effect between frames.
#[allow(clippy::too_many_arguments)]
pub fn draw(
    frame: &mut Frame,
    screen: Screen,
    state: &GameState,
    theme: &Theme,
    paused: bool,
    area: Rect,
    game_over_effect: &mut Option<Effect>,
    effect_time: &mut Option<Instant>,
    now: Instant,
    no_animation: bool,
) {
    let view = state.render_state();
    let (playfield_area, sidebar_area) = game_layout(area, &view);
    let board_rect = Block::default().borders(Borders::ALL).inner(playfield_area);

    match screen {
        Screen::Playing => {
            draw_playfield(frame, &view, theme, playfield_area, false);
            draw_sidebar(frame, state, theme, sidebar_area);
            if paused {
                draw_pause_overlay(frame, theme, playfield_area);
            }
        }
        Screen::GameOver => {
            let fading = view.game_over
                && !no_animation
                && game_over_effect.as_ref().is_none_or(|effect| !effect.done());
            draw_playfield(frame, &view, theme, playfield_area, !fading);
            draw_sidebar(frame, state, theme, sidebar_area);
            if fading {
                apply_game_over_effect(frame, theme, board_rect, game_over_effect, effect_time, now);
            }
            draw_game_over(frame, state, theme, playfield_area);
        }
    }
}

/// Centre playfield + sidebar in the area; returns (playfield, sidebar).
fn game_layout(area: Rect, view: &RenderState<'_>) -> (Rect, Rect) {
    let (pw, ph) = playfield_size(view);
    let total_w = pw.saturating_add(SIDEBAR_WIDTH);

    let horiz_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);

    let vert_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(ph),
            Constraint::Fill(1),
        ])
        .split(horiz_chunks[1]);

    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(pw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert_chunks[1]);
    (inner[0], inner[1])
}

/// Fade the board to the inactive colour once the game is over.
fn apply_game_over_effect(
    frame: &mut Frame,
    theme: &Theme,
    board_rect: Rect,
    game_over_effect: &mut Option<Effect>,
    effect_time: &mut Option<Instant>,
    now: Instant,
) {
    let delta = effect_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = u32::try_from(delta.as_millis()).unwrap_or(u32::MAX);
    *effect_time = Some(now);

    let effect = game_over_effect.get_or_insert_with(|| {
        fx::fade_to(
            theme.inactive_fg,
            theme.bg(),
            (GAME_OVER_FADE_MS, Interpolation::Linear),
        )
        .with_area(board_rect)
    });
    frame.render_effect(effect, board_rect, TfxDuration::from_millis(delta_ms));
}

/// Colour for one board cell; `faded` draws every block in the inactive colour.
fn cell_color(theme: &Theme, value: u8, faded: bool) -> Color {
    if value == EMPTY {
        theme.bg()
    } else if faded {
        theme.inactive_fg
    } else {
        theme.block_color(value)
    }
}

fn draw_playfield(frame: &mut Frame, view: &RenderState<'_>, theme: &Theme, area: Rect, faded: bool) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg()))
        .title(Span::styled(" Blockfall ", theme.title));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let buf = frame.buffer_mut();
    let mut put = |x: usize, y: usize, value: u8| {
        let Ok(x) = u16::try_from(x) else { return };
        let Ok(y) = u16::try_from(y) else { return };
        let rx = inner.x.saturating_add(x.saturating_mul(CELL_WIDTH));
        let ry = inner.y.saturating_add(y);
        if rx.saturating_add(CELL_WIDTH) > inner.right() || ry >= inner.bottom() {
            return;
        }
        let style = Style::default().fg(cell_color(theme, value, faded)).bg(theme.bg());
        let symbol = if value == EMPTY { " " } else { "█" };
        for dx in 0..CELL_WIDTH {
            buf[(rx + dx, ry)].set_symbol(symbol).set_style(style);
        }
    };

    for (y, row) in view.field.iter_rows().enumerate() {
        for (x, &value) in row.iter().enumerate() {
            put(x, y, value);
        }
    }

    // Active piece on top; cells still above the field are not drawn.
    let value = view.piece.kind.value();
    for (px, py) in view.piece.blocks() {
        if let (Ok(px), Ok(py)) = (usize::try_from(px), usize::try_from(py)) {
            put(px, py, value);
        }
    }
}

fn draw_sidebar(frame: &mut Frame, state: &GameState, theme: &Theme, area: Rect) {
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let border_style = Style::default().fg(theme.div_line).bg(theme.bg());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Stats (border + lines, pieces)
            Constraint::Length(9), // Colours (border + one row per kind)
            Constraint::Fill(1),   // Controls
        ])
        .split(area);

    let stats_lines = vec![
        Line::from(vec![
            Span::styled("Lines: ", title_style),
            Span::styled(state.lines_cleared.to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Pieces: ", title_style),
            Span::styled(state.pieces_locked.to_string(), fg_style),
        ]),
    ];
    Paragraph::new(stats_lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style),
        )
        .render(chunks[0], frame.buffer_mut());

    let colour_lines: Vec<Line> = TetrominoKind::ALL
        .iter()
        .map(|&kind| {
            let c = theme.kind_color(kind);
            Line::from(vec![
                Span::styled(CELL_SYMBOL, Style::default().fg(c)),
                Span::styled(format!(" {}", kind.name()), fg_style),
            ])
        })
        .collect();
    Paragraph::new(colour_lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(Span::styled(" Colours ", title_style)),
        )
        .render(chunks[1], frame.buffer_mut());

    let help = vec![
        Line::from(Span::styled("←/→ h/l  Move", fg_style)),
        Line::from(Span::styled("↑ k i    Rotate", fg_style)),
        Line::from(Span::styled("↓ j      Soft drop", fg_style)),
        Line::from(Span::styled("P        Pause", fg_style)),
        Line::from(Span::styled("R        Restart", fg_style)),
        Line::from(Span::styled("Q Esc    Quit", fg_style)),
    ];
    Paragraph::new(help)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(Span::styled(" Controls ", title_style)),
        )
        .render(chunks[2], frame.buffer_mut());
}

/// Popup rect of the given size centred in `area`.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup = centered(area, 22, 6);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(Span::styled(" P Resume  Q Quit ", Style::default().fg(theme.main_fg))),
    ];
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg())),
    );
    p.render(popup, frame.buffer_mut());
}

fn draw_game_over(frame: &mut Frame, state: &GameState, theme: &Theme, area: Rect) {
    let popup = centered(area, 22, 8);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Game Over ",
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(" Lines: {} ", state.lines_cleared),
            Style::default().fg(theme.main_fg),
        )),
        Line::from(""),
        Line::from(Span::styled(" R Restart  Q Quit ", Style::default().fg(theme.main_fg))),
    ];
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg())),
    );
    p.render(popup, frame.buffer_mut());
}
