//! App: terminal init, main loop, tick and key handling.

use crate::clock::{Clock, SystemClock};
use crate::game::{Command, GameState};
use crate::input::{Action, key_to_action};
use crate::rng::{KindSource, RandomKinds};
use crate::theme::Theme;
use crate::{Args, GameConfig};
use anyhow::{Context, Result, bail};
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};
use tachyonfx::Effect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playing,
    GameOver,
}

pub struct App<C: Clock = SystemClock> {
    theme: Theme,
    state: GameState,
    clock: C,
    screen: Screen,
    paused: bool,
    /// Clock reading when the current pause started.
    paused_at: Option<Duration>,
    /// Total paused time, hidden from the game's gravity timer.
    paused_total: Duration,
    frame_interval: Duration,
    no_animation: bool,
    /// TachyonFX fade for the board once the game is over.
    game_over_effect: Option<Effect>,
    /// Last time we processed the game-over effect (for delta).
    game_over_effect_time: Option<Instant>,
}

impl App<SystemClock> {
    pub fn new(args: &Args, config: &GameConfig, theme: Theme) -> Result<Self> {
        let kinds = Box::new(RandomKinds::new(args.seed));
        let mut app = Self::with_parts(config, kinds, theme, SystemClock::new())?;
        app.frame_interval = frame_interval(args.frame_rate)?;
        app.no_animation = args.no_animation;
        Ok(app)
    }
}

/// Runs its closure once when dropped.
struct RestoreGuard<F: FnMut()> {
    restore: F,
}

impl<F: FnMut()> RestoreGuard<F> {
    fn new(restore: F) -> Self {
        Self { restore }
    }
}

impl<F: FnMut()> Drop for RestoreGuard<F> {
    fn drop(&mut self) {
        (self.restore)();
    }
}

fn frame_interval(rate: f64) -> Result<Duration> {
    if !rate.is_finite() || rate <= 0.0 {
        bail!("frame rate must be a positive number, got {rate}");
    }
    Duration::try_from_secs_f64(1.0 / rate)
        .map_err(|e| anyhow::anyhow!("frame rate {rate} is too low: {e}"))
}

impl<C: Clock> App<C> {
    pub fn with_parts(
        config: &GameConfig,
        kinds: Box<dyn KindSource>,
        theme: Theme,
        clock: C,
    ) -> Result<Self> {
        let state = GameState::new(config, kinds).context("cannot start game")?;
        let screen = if state.is_game_over() {
            Screen::GameOver
        } else {
            Screen::Playing
        };
        Ok(Self {
            theme,
            state,
            clock,
            screen,
            paused: false,
            paused_at: None,
            paused_total: Duration::ZERO,
            frame_interval: Duration::from_millis(16),
            no_animation: false,
            game_over_effect: None,
            game_over_effect_time: None,
        })
    }

    /// Time as seen by the game: clock time minus everything spent paused.
    fn game_time(&self) -> Duration {
        self.clock.now().saturating_sub(self.paused_total)
    }

    fn set_paused(&mut self, paused: bool) {
        if paused == self.paused {
            return;
        }
        let now = self.clock.now();
        if paused {
            self.paused_at = Some(now);
        } else if let Some(start) = self.paused_at.take() {
            self.paused_total += now.saturating_sub(start);
        }
        self.paused = paused;
        log::debug!("paused: {paused}");
    }

    /// Apply one key action. Returns false when the app should exit.
    fn handle_action(&mut self, action: Action) -> bool {
        match action {
            Action::Quit => return false,
            Action::None => {}
            Action::Pause => {
                if self.screen == Screen::Playing {
                    self.set_paused(!self.paused);
                }
            }
            Action::Reset => {
                self.set_paused(false);
                self.state.handle(Command::Reset);
                self.screen = Screen::Playing;
                self.game_over_effect = None;
                self.game_over_effect_time = None;
            }
            _ if self.paused => {}
            other => {
                if let Some(command) = other.command() {
                    self.state.handle(command);
                }
            }
        }
        true
    }

    /// One frame of game time: gravity, and the switch to the game-over screen.
    fn update(&mut self) {
        if self.screen != Screen::Playing || self.paused {
            return;
        }
        self.state.tick(self.game_time());
        if self.state.take_game_over_notice() {
            self.screen = Screen::GameOver;
            log::info!(
                "final: {} lines cleared, {} pieces locked",
                self.state.lines_cleared,
                self.state.pieces_locked
            );
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode().context("cannot enable raw mode")?;
        // Restores the terminal on every exit path, setup errors included
        let _restore = RestoreGuard::new(|| {
            let _ = execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
            let _ = execute!(std::io::stdout(), LeaveAlternateScreen);
            let _ = disable_raw_mode();
        });
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen).context("cannot enter alternate screen")?;

        // Release events let us ignore key-ups; unsupported terminals just never send them
        let _ = execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        );

        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))
                .context("cannot create terminal")?;

        self.run_loop(&mut terminal)
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let now = Instant::now();
            terminal.draw(|f| {
                crate::ui::draw(
                    f,
                    self.screen,
                    &self.state,
                    &self.theme,
                    self.paused,
                    f.area(),
                    &mut self.game_over_effect,
                    &mut self.game_over_effect_time,
                    now,
                    self.no_animation,
                );
            })?;

            let timeout = self.frame_interval.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    if let Event::Key(key) = event::read()? {
                        // OS auto-repeat arrives as Press or Repeat; key-ups do nothing
                        if key.kind == KeyEventKind::Release {
                            continue;
                        }
                        if !self.handle_action(key_to_action(key)) {
                            return Ok(());
                        }
                    }
                }
            }

            self.update();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::rng::SequenceKinds;
    use crate::shape::TetrominoKind::{O, T};

    fn app(kinds: Vec<crate::shape::TetrominoKind>) -> App<ManualClock> {
        App::with_parts(
            &GameConfig::default(),
            Box::new(SequenceKinds::new(kinds)),
            Theme::classic(),
            ManualClock::default(),
        )
        .unwrap()
    }

    fn step(app: &mut App<ManualClock>, ms: u64) {
        app.clock.advance(Duration::from_millis(ms));
        app.update();
    }

    #[test]
    fn test_frames_drive_gravity() {
        let mut a = app(vec![T]);
        for _ in 0..31 {
            step(&mut a, 16);
        }
        assert_eq!(a.state.piece.y, 0);
        step(&mut a, 16);
        assert_eq!(a.state.piece.y, 1);
    }

    #[test]
    fn test_pause_freezes_gravity_and_input() {
        let mut a = app(vec![T]);
        assert!(a.handle_action(Action::Pause));
        assert!(a.paused);
        step(&mut a, 5000);
        assert!(a.handle_action(Action::MoveLeft));
        assert_eq!((a.state.piece.x, a.state.piece.y), (4, 0));

        a.handle_action(Action::Pause);
        assert_eq!(a.paused_total, Duration::from_millis(5000));
        step(&mut a, 100);
        assert_eq!(a.state.piece.y, 0);
        step(&mut a, 401);
        assert_eq!(a.state.piece.y, 1);
    }

    #[test]
    fn test_commands_reach_the_game() {
        let mut a = app(vec![T]);
        a.handle_action(Action::MoveRight);
        a.handle_action(Action::SoftDrop);
        assert_eq!((a.state.piece.x, a.state.piece.y), (5, 1));
        a.handle_action(Action::Rotate);
        assert_eq!(a.state.piece.shape.width(), 2);
    }

    #[test]
    fn test_quit_stops_the_loop() {
        let mut a = app(vec![T]);
        assert!(a.handle_action(Action::None));
        assert!(!a.handle_action(Action::Quit));
    }

    #[test]
    fn test_game_over_stops_ticking_until_reset() {
        let mut a = app(vec![O, T, O]);
        for y in 0..2 {
            for x in 1..10 {
                a.state.field.set(x, y, 5);
            }
        }
        a.state.piece.x = 0;
        a.state.piece.y = 18;
        step(&mut a, 501);
        assert_eq!(a.screen, Screen::GameOver);

        let piece = a.state.piece.clone();
        step(&mut a, 5000);
        a.handle_action(Action::SoftDrop);
        a.handle_action(Action::Pause);
        assert!(!a.paused);
        assert_eq!(a.state.piece, piece);

        a.handle_action(Action::Reset);
        assert_eq!(a.screen, Screen::Playing);
        assert_eq!(a.state.field.occupied_count(), 0);
        assert_eq!(a.state.piece.kind, O);
        step(&mut a, 16);
        assert_eq!(a.state.piece.y, 0);
    }

    #[test]
    fn test_restore_guard_runs_on_early_error() {
        use std::cell::Cell;

        let restored = Cell::new(0);
        let setup = || -> Result<()> {
            let _restore = RestoreGuard::new(|| restored.set(restored.get() + 1));
            bail!("alternate screen unavailable");
        };
        assert!(setup().is_err());
        assert_eq!(restored.get(), 1);

        {
            let _restore = RestoreGuard::new(|| restored.set(restored.get() + 1));
        }
        assert_eq!(restored.get(), 2);
    }

    #[test]
    fn test_frame_interval_validation() {
        assert_eq!(frame_interval(50.0).unwrap(), Duration::from_millis(20));
        assert!(frame_interval(0.0).is_err());
        assert!(frame_interval(f64::NAN).is_err());
        assert!(frame_interval(1e-30).is_err());
        assert!(frame_interval(f64::MIN_POSITIVE).is_err());
    }
}
