//! Game state: field, active piece, gravity timer and the running/game-over machine.

use crate::GameConfig;
use crate::field::{Field, Piece};
use crate::rng::KindSource;
use crate::shape::{TetrominoKind, rotate};
use std::time::Duration;
use thiserror::Error;

/// Construction errors. Everything after construction is infallible.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("field dimensions must be positive, got {rows}x{cols}")]
    InvalidDimensions { rows: usize, cols: usize },
    #[error("field needs at least {min} columns, got {cols}")]
    FieldTooNarrow { cols: usize, min: usize },
    #[error("field dimensions may not exceed {max}, got {rows}x{cols}")]
    FieldTooLarge { rows: usize, cols: usize, max: usize },
    #[error("shape has no cells")]
    EmptyShape,
    #[error("shape row {row} is {found} wide, expected {expected}")]
    RaggedShape {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("shape for {kind} holds a value other than its kind")]
    ShapeValueMismatch { kind: &'static str },
    #[error("drop interval must be greater than zero")]
    ZeroDropInterval,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Running,
    /// Terminal until an explicit reset.
    GameOver,
}

/// Commands the front end can push into the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    MoveLeft,
    MoveRight,
    SoftDrop,
    Rotate,
    Reset,
}

/// Snapshot borrowed by the renderer once per frame.
#[derive(Debug, Clone, Copy)]
pub struct RenderState<'a> {
    pub field: &'a Field,
    pub piece: &'a Piece,
    pub game_over: bool,
}

#[derive(Debug)]
pub struct GameState {
    pub field: Field,
    pub piece: Piece,
    drop_counter: Duration,
    drop_interval: Duration,
    /// `None` right after a reset: the next tick only records its timestamp.
    last_time: Option<Duration>,
    status: Status,
    /// Set on the transition to game over; cleared by `take_game_over_notice`.
    game_over_notice: bool,
    kinds: Box<dyn KindSource>,
    pub lines_cleared: u32,
    pub pieces_locked: u32,
}

impl GameState {
    pub fn new(config: &GameConfig, kinds: Box<dyn KindSource>) -> Result<Self, GameError> {
        TetrominoKind::check_table()?;
        if config.drop_interval.is_zero() {
            return Err(GameError::ZeroDropInterval);
        }
        let field = Field::new(config.rows, config.cols)?;
        // placeholder until the first spawn below
        let piece = Piece::spawn(TetrominoKind::I, field.cols());
        let mut state = Self {
            field,
            piece,
            drop_counter: Duration::ZERO,
            drop_interval: config.drop_interval,
            last_time: Some(Duration::ZERO),
            status: Status::Running,
            game_over_notice: false,
            kinds,
            lines_cleared: 0,
            pieces_locked: 0,
        };
        state.spawn_next();
        log::info!(
            "new game: {}x{} field, drop interval {:?}",
            state.field.rows(),
            state.field.cols(),
            state.drop_interval
        );
        Ok(state)
    }

    #[cfg(test)]
    pub fn status(&self) -> Status {
        self.status
    }

    #[inline]
    pub fn is_game_over(&self) -> bool {
        self.status == Status::GameOver
    }

    pub fn render_state(&self) -> RenderState<'_> {
        RenderState {
            field: &self.field,
            piece: &self.piece,
            game_over: self.is_game_over(),
        }
    }

    /// True exactly once after the game ends.
    pub fn take_game_over_notice(&mut self) -> bool {
        std::mem::take(&mut self.game_over_notice)
    }

    /// Advance the gravity timer to `now`. Past the drop interval the piece
    /// falls one row; if it cannot, it locks, full rows are swept and the next
    /// piece spawns.
    pub fn tick(&mut self, now: Duration) {
        if self.is_game_over() {
            return;
        }
        let last = self.last_time.unwrap_or(now);
        self.last_time = Some(now);
        self.drop_counter += now.saturating_sub(last);

        if self.drop_counter > self.drop_interval {
            self.piece.y += 1;
            if self.field.collides(&self.piece) {
                self.piece.y -= 1;
                self.lock_piece();
            }
            self.drop_counter = Duration::ZERO;
        }
    }

    /// Apply one input command. Returns whether the state changed.
    /// Everything except `Reset` is ignored once the game is over.
    pub fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Reset => {
                self.reset();
                true
            }
            _ if self.is_game_over() => false,
            Command::MoveLeft => self.try_shift(-1, 0),
            Command::MoveRight => self.try_shift(1, 0),
            // never locks; only gravity does
            Command::SoftDrop => self.try_shift(0, 1),
            Command::Rotate => self.try_rotate(),
        }
    }

    /// Empty the field, zero the counters and start again with a fresh piece.
    pub fn reset(&mut self) {
        self.field.clear();
        self.drop_counter = Duration::ZERO;
        self.last_time = None;
        self.status = Status::Running;
        self.game_over_notice = false;
        self.lines_cleared = 0;
        self.pieces_locked = 0;
        self.spawn_next();
        log::info!("game reset");
    }

    fn try_shift(&mut self, dx: i32, dy: i32) -> bool {
        self.piece.x += dx;
        self.piece.y += dy;
        if self.field.collides(&self.piece) {
            self.piece.x -= dx;
            self.piece.y -= dy;
            return false;
        }
        true
    }

    fn try_rotate(&mut self) -> bool {
        let rotated = rotate(&self.piece.shape);
        let previous = std::mem::replace(&mut self.piece.shape, rotated);
        if self.field.collides(&self.piece) {
            self.piece.shape = previous;
            return false;
        }
        true
    }

    fn lock_piece(&mut self) {
        self.field.merge(&self.piece);
        let lines = self.field.sweep();
        self.pieces_locked += 1;
        self.lines_cleared += lines as u32;
        log::debug!(
            "locked {} at ({}, {}), cleared {} line(s)",
            self.piece.kind.name(),
            self.piece.x,
            self.piece.y,
            lines
        );
        self.spawn_next();
    }

    fn spawn_next(&mut self) {
        let kind = self.kinds.next_kind();
        self.piece = Piece::spawn(kind, self.field.cols());
        log::debug!("spawned {} at x={}", kind.name(), self.piece.x);
        if self.field.collides(&self.piece) {
            self.status = Status::GameOver;
            self.game_over_notice = true;
            log::info!(
                "game over: {} blocked at spawn after {} pieces, {} lines",
                kind.name(),
                self.pieces_locked,
                self.lines_cleared
            );
        }
    }
}
