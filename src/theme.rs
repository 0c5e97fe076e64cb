//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use crate::mood::Mood;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Mood palette and UI colours loaded from a theme file.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Mood colours by `Mood::index()`: happy, calm, neutral, sad, angry.
    pub moods: [Color; 5],
    /// Board background.
    pub bg: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Text (score, timer).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Secondary text and fading particles.
    pub inactive_fg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::onedark_default()
    }
}

/// One Dark values, used when a key is missing from a theme file.
const ONEDARK_MOODS: [Color; 5] = [
    Color::Rgb(0xE5, 0xC0, 0x7B), // happy: yellow
    Color::Rgb(0x61, 0xAF, 0xEF), // calm: blue
    Color::Rgb(0x98, 0xC3, 0x79), // neutral: green
    Color::Rgb(0xC6, 0x78, 0xDD), // sad: magenta
    Color::Rgb(0xE0, 0x6C, 0x75), // angry: red
];
const ONEDARK_BG: Color = Color::Rgb(0x31, 0x35, 0x3F);
const ONEDARK_DIV_LINE: Color = Color::Rgb(0x3F, 0x44, 0x4F);
const ONEDARK_MAIN_FG: Color = Color::Rgb(0xAB, 0xB2, 0xBF);
const ONEDARK_TITLE: Color = Color::Rgb(0xE5, 0xC0, 0x7B);
const ONEDARK_INACTIVE_FG: Color = Color::Rgb(0x5C, 0x63, 0x70);

impl Theme {
    pub fn onedark_default() -> Self {
        Self {
            moods: ONEDARK_MOODS,
            bg: ONEDARK_BG,
            div_line: ONEDARK_DIV_LINE,
            main_fg: ONEDARK_MAIN_FG,
            title: ONEDARK_TITLE,
            inactive_fg: ONEDARK_INACTIVE_FG,
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to One Dark if path is None or the file does not exist.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let mut theme = match path {
            Some(p) if p.exists() => Self::from_map(&parse_theme_file(&std::fs::read_to_string(p)?)),
            _ => Self::onedark_default(),
        };
        theme.apply_palette(palette);
        Ok(theme)
    }

    /// Override mood colours for high-contrast or colorblind play.
    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => {
                self.moods = [
                    Color::Rgb(0xFF, 0xFF, 0x00),
                    Color::Rgb(0x00, 0x88, 0xFF),
                    Color::Rgb(0x00, 0xFF, 0x00),
                    Color::Rgb(0xFF, 0x00, 0xFF),
                    Color::Rgb(0xFF, 0x00, 0x00),
                ];
            }
            crate::Palette::Colorblind => {
                // Tol "vibrant": no red/green pair carries meaning on its own
                self.moods = [
                    Color::Rgb(0xEE, 0x77, 0x33),
                    Color::Rgb(0x00, 0x77, 0xBB),
                    Color::Rgb(0x00, 0x99, 0x88),
                    Color::Rgb(0xEE, 0x33, 0x77),
                    Color::Rgb(0xCC, 0x33, 0x11),
                ];
            }
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).and_then(|v| parse_hex(v).ok());
        Self {
            moods: [
                get("title").or_else(|| get("cpu_mid")).unwrap_or(ONEDARK_MOODS[0]),
                get("cpu_box").unwrap_or(ONEDARK_MOODS[1]),
                get("mem_box").or_else(|| get("cpu_start")).unwrap_or(ONEDARK_MOODS[2]),
                get("net_box").unwrap_or(ONEDARK_MOODS[3]),
                get("cpu_end").or_else(|| get("temp_end")).unwrap_or(ONEDARK_MOODS[4]),
            ],
            bg: get("meter_bg").unwrap_or(ONEDARK_BG),
            div_line: get("div_line").unwrap_or(ONEDARK_DIV_LINE),
            main_fg: get("main_fg").unwrap_or(ONEDARK_MAIN_FG),
            title: get("title").unwrap_or(ONEDARK_TITLE),
            inactive_fg: get("inactive_fg").unwrap_or(ONEDARK_INACTIVE_FG),
        }
    }

    #[inline]
    pub fn mood_color(&self, mood: Mood) -> Color {
        self.moods[mood.index() as usize]
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
    let bad = || ThemeError::InvalidHex(s.to_string());
    let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| bad());
    if !s.is_ascii() {
        return Err(bad());
    }
    let (r, g, b) = match s.len() {
        6 => (channel(&s[0..2])?, channel(&s[2..4])?, channel(&s[4..6])?),
        3 => (
            channel(&s[0..1])? * 17,
            channel(&s[1..2])? * 17,
            channel(&s[2..3])? * 17,
        ),
        _ => return Err(bad()),
    };
    Ok(Color::Rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_6() {
        let c = parse_hex("#98C379").unwrap();
        assert!(matches!(c, Color::Rgb(0x98, 0xC3, 0x79)));
    }

    #[test]
    fn test_parse_hex_3() {
        let c = parse_hex("#FFF").unwrap();
        assert!(matches!(c, Color::Rgb(255, 255, 255)));
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        assert!(matches!(parse_hex("#12345"), Err(ThemeError::InvalidHex(_))));
        assert!(matches!(parse_hex("zzzzzz"), Err(ThemeError::InvalidHex(_))));
    }

    #[test]
    fn test_parse_theme_line() {
        let map = parse_theme_file(r##"theme[meter_bg]="#31353F""##);
        assert_eq!(map.get("meter_bg"), Some(&"#31353F".to_string()));
    }

    #[test]
    fn test_theme_keys_map_to_moods() {
        let map = parse_theme_file("theme[cpu_box]='#010203'\ntheme[main_fg]=\"#FFF\"\n");
        let theme = Theme::from_map(&map);
        assert_eq!(theme.mood_color(Mood::Calm), Color::Rgb(1, 2, 3));
        assert_eq!(theme.main_fg, Color::Rgb(255, 255, 255));
        assert_eq!(theme.mood_color(Mood::Angry), ONEDARK_MOODS[4]);
    }

    #[test]
    fn test_palette_override() {
        let mut theme = Theme::default();
        theme.apply_palette(crate::Palette::HighContrast);
        assert_eq!(theme.mood_color(Mood::Neutral), Color::Rgb(0, 255, 0));
        assert_eq!(theme.bg, ONEDARK_BG);
    }
}
