//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use crate::Palette;
use crate::catalog::{TileCategory, TileKind};
use crate::crush::FeedbackTone;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Points at or above which a tile is drawn in the top tier colour.
const HIGH_TIER_POINTS: i32 = 100;

/// One Dark palette and UI colours loaded from a theme file.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Tile colours by value: low, mid, high.
    pub tiers: [Color; 3],
    /// Penalty tiles and warning feedback.
    pub penalty: Color,
    /// Playfield background.
    pub bg: Color,
    /// Lane dividers / border.
    pub div_line: Color,
    /// Text (score, time).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Hints and the ground line.
    pub inactive_fg: Color,
    /// Low-time countdown, bomb feedback and the shake flash.
    pub urgent: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

const fn rgb(hex: u32) -> Color {
    Color::Rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

impl Default for Theme {
    fn default() -> Self {
        Self::onedark_default()
    }
}

impl Theme {
    /// Hardcoded One Dark defaults.
    pub fn onedark_default() -> Self {
        Self {
            tiers: [rgb(0x61AFEF), rgb(0x98C379), rgb(0xE5C07B)],
            penalty: rgb(0xC678DD),
            bg: rgb(0x31353F),
            div_line: rgb(0x3F444F),
            main_fg: rgb(0xABB2BF),
            title: rgb(0xE5C07B),
            inactive_fg: rgb(0x5C6370),
            urgent: rgb(0xE06C75),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to One Dark defaults if path is None or the file is missing.
    pub fn load(path: Option<&Path>, palette: Palette) -> Result<Self, ThemeError> {
        let mut theme = match path {
            Some(p) if p.exists() => Self::from_map(&parse_theme_file(&std::fs::read_to_string(p)?)),
            _ => Self::onedark_default(),
        };
        theme.apply_palette(palette);
        Ok(theme)
    }

    /// Override tile colours for high-contrast or colorblind.
    pub fn apply_palette(&mut self, palette: Palette) {
        match palette {
            Palette::Normal => {}
            Palette::HighContrast => {
                self.tiers = [rgb(0x0088FF), rgb(0x00FF00), rgb(0xFFFF00)];
                self.penalty = rgb(0xFF00FF);
                self.urgent = rgb(0xFF0000);
            }
            Palette::Colorblind => {
                self.tiers = [rgb(0x0077BB), rgb(0x009988), rgb(0xEE7733)];
                self.penalty = rgb(0xEE3377);
                self.urgent = rgb(0xCC3311);
            }
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).and_then(|v| parse_hex(v).ok());
        let d = Self::onedark_default();
        Self {
            tiers: [
                get("cpu_box").unwrap_or(d.tiers[0]),
                get("mem_box").or_else(|| get("cpu_start")).unwrap_or(d.tiers[1]),
                get("cpu_mid").unwrap_or(d.tiers[2]),
            ],
            penalty: get("net_box").unwrap_or(d.penalty),
            bg: get("meter_bg").unwrap_or(d.bg),
            div_line: get("div_line").unwrap_or(d.div_line),
            main_fg: get("main_fg").unwrap_or(d.main_fg),
            title: get("title").unwrap_or(d.title),
            inactive_fg: get("inactive_fg").unwrap_or(d.inactive_fg),
            urgent: get("cpu_end").or_else(|| get("temp_end")).unwrap_or(d.urgent),
        }
    }

    /// Tile colour. The bomb borrows the mid tier so it passes for a regular tile.
    pub fn tile_color(&self, kind: &TileKind) -> Color {
        match kind.category {
            TileCategory::PenaltyHeavy => self.penalty,
            TileCategory::Bomb => self.tiers[1],
            TileCategory::Standard if kind.points >= HIGH_TIER_POINTS => self.tiers[2],
            TileCategory::Standard if kind.is_valuable() => self.tiers[1],
            TileCategory::Standard => self.tiers[0],
        }
    }

    pub fn tone_color(&self, tone: FeedbackTone) -> Color {
        match tone {
            FeedbackTone::Normal => self.title,
            FeedbackTone::Warning => self.penalty,
            FeedbackTone::Penalty => self.urgent,
        }
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
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some(end) = stripped.find(']') else {
            continue;
        };
        let key = stripped[..end].trim();
        let rest = stripped[end + 1..].trim();
        if let Some(value) = rest.strip_prefix('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if !value.is_empty() {
                map.insert(key.to_string(), value.to_string());
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    let channel = |range: std::ops::Range<usize>| {
        s.get(range)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .ok_or_else(invalid)
    };
    match s.len() {
        6 => Ok(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
        3 => Ok(Color::Rgb(
            channel(0..1)? * 17,
            channel(1..2)? * 17,
            channel(2..3)? * 17,
        )),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    #[test]
    fn test_parse_hex_6() {
        let c = parse_hex("#98C379").unwrap();
        assert!(matches!(c, Color::Rgb(0x98, 0xC3, 0x79)));
    }

    #[test]
    fn test_parse_hex_3() {
        let c = parse_hex("#FFF").unwrap();
        assert!(matches!(c, Color::Rgb(255, 255, 255)));
        assert!(parse_hex("#GG0000").is_err());
        assert!(parse_hex("#12345").is_err());
    }

    #[test]
    fn test_parse_theme_line() {
        let map = parse_theme_file(r##"theme[meter_bg]="#31353F""##);
        assert_eq!(map.get("meter_bg"), Some(&"#31353F".to_string()));
        let theme = Theme::from_map(&map);
        assert!(matches!(theme.bg, Color::Rgb(0x31, 0x35, 0x3F)));
    }

    #[test]
    fn bomb_looks_like_a_standard_tile() {
        let theme = Theme::default();
        let catalog = Catalog::standard().unwrap();
        let bomb = catalog.bomb().unwrap();
        let twin = catalog
            .kinds()
            .iter()
            .find(|k| k.category == TileCategory::Standard && theme.tile_color(k) == theme.tile_color(bomb));
        assert!(twin.is_some());
    }

    #[test]
    fn palettes_change_tiles() {
        let mut theme = Theme::default();
        let before = theme.tiers;
        theme.apply_palette(Palette::Colorblind);
        assert_ne!(theme.tiers, before);
    }
}
