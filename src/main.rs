//! Blockfall: classic falling-block puzzle game in the terminal.

mod app;
mod clock;
mod field;
mod game;
mod input;
mod rng;
mod shape;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use game::GameError;
use std::path::PathBuf;
use std::time::Duration;

/// Core game options derived from the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    pub rows: usize,
    pub cols: usize,
    pub drop_interval: Duration,
}

impl GameConfig {
    pub fn from_args(args: &Args) -> Self {
        Self {
            rows: args.rows,
            cols: args.cols,
            drop_interval: Duration::from_millis(args.drop_interval_ms),
        }
    }

    pub fn validate(&self) -> Result<(), GameError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(GameError::InvalidDimensions {
                rows: self.rows,
                cols: self.cols,
            });
        }
        if self.cols < field::MIN_COLS {
            return Err(GameError::FieldTooNarrow {
                cols: self.cols,
                min: field::MIN_COLS,
            });
        }
        if self.rows > field::MAX_DIM || self.cols > field::MAX_DIM {
            return Err(GameError::FieldTooLarge {
                rows: self.rows,
                cols: self.cols,
                max: field::MAX_DIM,
            });
        }
        if self.drop_interval.is_zero() {
            return Err(GameError::ZeroDropInterval);
        }
        Ok(())
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rows: 20,
            cols: 10,
            drop_interval: Duration::from_millis(500),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;
    let config = GameConfig::from_args(&args);
    config.validate().context("invalid game options")?;
    let theme = match theme::Theme::load(args.theme.as_deref(), args.palette) {
        Ok(theme) => theme,
        Err(e) => {
            log::warn!("falling back to default theme: {e}");
            theme::Theme::default_for_palette(args.palette)
        }
    };
    let mut app = App::new(&args, &config, theme)?;
    app.run()?;
    Ok(())
}

/// Logging goes to a file only; the terminal belongs to the game.
fn init_logging(args: &Args) -> Result<()> {
    let Some(path) = args.log_file.as_deref() else {
        return Ok(());
    };
    let file = std::fs::File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

/// Falling-block puzzle game in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "blockfall",
    version,
    about = "Classic falling-block puzzle in the terminal. Complete horizontal rows to clear them.",
    long_about = "Blockfall is a terminal falling-block puzzle game.\n\n\
        Tetrominoes fall from the top of the field. Move and rotate them so they fill \
        horizontal rows; a full row disappears. The game ends when a new piece has no room to spawn.\n\n\
        CONTROLS (normal):\n  Left/Right  Move    Up        Rotate     Down       Soft drop\n  R           Restart P         Pause      Q / Esc    Quit\n\n\
        CONTROLS (vim):\n  h/l         Move    k or i    Rotate     j          Soft drop"
)]
pub struct Args {
    /// Playfield height in rows.
    #[arg(long, default_value = "20", value_name = "ROWS")]
    pub rows: usize,

    /// Playfield width in columns (at least 4).
    #[arg(long, default_value = "10", value_name = "COLS")]
    pub cols: usize,

    /// Gravity: time in ms before the piece falls one row.
    #[arg(long, default_value = "500", value_name = "MS")]
    pub drop_interval_ms: u64,

    /// Seed for the piece sequence (random if not set).
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Path to theme file (btop-style theme[key]="value"). Uses the classic palette if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Target render frames per second.
    #[arg(long, default_value = "60.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Disable the game-over fade.
    #[arg(long)]
    pub no_animation: bool,

    /// Write log output to this file (logging is off otherwise).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log level when RUST_LOG is not set.
    #[arg(long, default_value = "info", value_name = "LEVEL")]
    pub log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args_match_classic_game() {
        let args = Args::parse_from(["blockfall"]);
        let config = GameConfig::from_args(&args);
        assert_eq!(config, GameConfig::default());
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(args.palette, Palette::Normal);
    }

    #[test]
    fn test_args_override_config() {
        let args = Args::parse_from([
            "blockfall",
            "--rows",
            "24",
            "--cols",
            "12",
            "--drop-interval-ms",
            "250",
            "--seed",
            "9",
            "--palette",
            "contrast",
        ]);
        let config = GameConfig::from_args(&args);
        assert_eq!(config.rows, 24);
        assert_eq!(config.cols, 12);
        assert_eq!(config.drop_interval, Duration::from_millis(250));
        assert_eq!(args.seed, Some(9));
        assert_eq!(args.palette, Palette::HighContrast);
    }

    #[test]
    fn test_validate_rejects_bad_options() {
        let mut config = GameConfig::default();
        config.cols = 2;
        assert!(matches!(
            config.validate(),
            Err(GameError::FieldTooNarrow { cols: 2, .. })
        ));
        config = GameConfig::default();
        config.rows = 0;
        assert!(matches!(
            config.validate(),
            Err(GameError::InvalidDimensions { .. })
        ));
        config = GameConfig::default();
        config.rows = 1 << 40;
        assert!(matches!(
            config.validate(),
            Err(GameError::FieldTooLarge { .. })
        ));
        let args = Args::parse_from(["blockfall", "--rows", "100000"]);
        assert!(GameConfig::from_args(&args).validate().is_err());
        config = GameConfig::default();
        config.drop_interval = Duration::ZERO;
        assert_eq!(config.validate(), Err(GameError::ZeroDropInterval));
    }
}
