//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use crate::Palette;
use crate::shape::TetrominoKind;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Cell colours (index 0 = background, 1..=7 = piece kinds) and UI colours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    /// Indexed by cell value, so field cells and piece cells share one lookup.
    pub blocks: [Color; 8],
    /// Grid / border.
    pub div_line: Color,
    /// Text (stats, help).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Secondary text and the faded board after game over.
    pub inactive_fg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

/// Theme file keys for the seven piece colours, in kind order.
const BLOCK_KEYS: [&str; 7] = [
    "block_i", "block_o", "block_t", "block_s", "block_z", "block_j", "block_l",
];

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}

impl Theme {
    /// The classic eight-colour table: dark grey background, saturated primaries for pieces.
    pub fn classic() -> Self {
        Self {
            blocks: [
                Color::Rgb(0x22, 0x22, 0x22), // background
                Color::Rgb(0xFF, 0x00, 0x00), // I
                Color::Rgb(0x00, 0xFF, 0x00), // O
                Color::Rgb(0x00, 0x00, 0xFF), // T
                Color::Rgb(0xFF, 0xFF, 0x00), // S
                Color::Rgb(0x00, 0xFF, 0xFF), // Z
                Color::Rgb(0xFF, 0x00, 0xFF), // J
                Color::Rgb(0xFF, 0xAA, 0x00), // L
            ],
            div_line: Color::Rgb(0x44, 0x44, 0x44),
            main_fg: Color::Rgb(0xCC, 0xCC, 0xCC),
            title: Color::Rgb(0xFF, 0xAA, 0x00),
            inactive_fg: Color::Rgb(0x55, 0x55, 0x55),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to the classic defaults if path is None or the file is missing.
    /// `palette` then overrides the piece colours for HighContrast or Colorblind.
    pub fn load(path: Option<&Path>, palette: Palette) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            Some(p) => {
                log::warn!("theme file {} not found, using defaults", p.display());
                return Ok(Self::default_for_palette(palette));
            }
            None => return Ok(Self::default_for_palette(palette)),
        };
        let s = std::fs::read_to_string(path)?;
        let map = parse_theme_file(&s);
        let mut theme = Self::from_map(&map)?;
        theme.apply_palette(palette);
        log::info!("loaded theme from {}", path.display());
        Ok(theme)
    }

    /// Default theme for a palette when no file is loaded.
    pub fn default_for_palette(palette: Palette) -> Self {
        let mut t = Self::classic();
        t.apply_palette(palette);
        t
    }

    /// Override piece colours for high-contrast or colorblind play.
    pub fn apply_palette(&mut self, palette: Palette) {
        let pieces = match palette {
            Palette::Normal => return,
            // bright, fully saturated on black
            Palette::HighContrast => [
                Color::Rgb(0x00, 0xFF, 0xFF),
                Color::Rgb(0xFF, 0xFF, 0x00),
                Color::Rgb(0xFF, 0x00, 0xFF),
                Color::Rgb(0x00, 0xFF, 0x00),
                Color::Rgb(0xFF, 0x00, 0x00),
                Color::Rgb(0x00, 0x88, 0xFF),
                Color::Rgb(0xFF, 0x88, 0x00),
            ],
            // Tol's bright scheme: no red/green pair carries meaning alone
            Palette::Colorblind => [
                Color::Rgb(0x44, 0x77, 0xAA),
                Color::Rgb(0xCC, 0xBB, 0x44),
                Color::Rgb(0xAA, 0x33, 0x77),
                Color::Rgb(0x22, 0x88, 0x33),
                Color::Rgb(0xEE, 0x66, 0x77),
                Color::Rgb(0x66, 0xCC, 0xEE),
                Color::Rgb(0xEE, 0x77, 0x33),
            ],
        };
        if palette == Palette::HighContrast {
            self.blocks[0] = Color::Black;
        }
        self.blocks[1..].copy_from_slice(&pieces);
    }

    /// Unknown keys are ignored; a present key with a malformed colour is an error.
    fn from_map(map: &HashMap<String, String>) -> Result<Self, ThemeError> {
        let mut theme = Self::classic();
        let get = |key: &str| map.get(key).map(|v| parse_hex(v)).transpose();

        if let Some(c) = get("background")?.or(get("main_bg")?) {
            theme.blocks[0] = c;
        }
        for (i, key) in BLOCK_KEYS.iter().enumerate() {
            if let Some(c) = get(key)? {
                theme.blocks[i + 1] = c;
            }
        }
        if let Some(c) = get("div_line")? {
            theme.div_line = c;
        }
        if let Some(c) = get("main_fg")? {
            theme.main_fg = c;
        }
        if let Some(c) = get("title")? {
            theme.title = c;
        }
        if let Some(c) = get("inactive_fg")? {
            theme.inactive_fg = c;
        }
        Ok(theme)
    }

    #[inline]
    pub fn bg(&self) -> Color {
        self.blocks[0]
    }

    /// Colour for a field or piece cell value (0..=7).
    #[inline]
    pub fn block_color(&self, value: u8) -> Color {
        self.blocks[(value as usize) % self.blocks.len()]
    }

    #[inline]
    pub fn kind_color(&self, kind: TetrominoKind) -> Color {
        self.block_color(kind.value())
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(stripped) = line.strip_prefix("theme[") {
            if let Some(end) = stripped.find(']') {
                let key = stripped[..end].trim();
                let rest = stripped[end + 1..].trim();
                if let Some(eq) = rest.find('=') {
                    let value = rest[eq + 1..]
                        .trim()
                        .trim_matches('"')
                        .trim_matches('\'')
                        .to_string();
                    if !value.is_empty() {
                        map.insert(key.to_string(), value);
                    }
                }
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    if !s.is_ascii() {
        return Err(invalid());
    }
    let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| invalid());
    let (r, g, b) = match s.len() {
        6 => (channel(&s[0..2])?, channel(&s[2..4])?, channel(&s[4..6])?),
        3 => (
            channel(&s[0..1])? * 17,
            channel(&s[1..2])? * 17,
            channel(&s[2..3])? * 17,
        ),
        _ => return Err(invalid()),
    };
    Ok(Color::Rgb(r, g, b))
}
