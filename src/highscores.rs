//! Persist per-game high scores to disk (XDG config or ~/.config/moodarcade).

use crate::GameKind;
use anyhow::Result;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const FILENAME: &str = "highscores";

/// Returns the path to the high scores file (config dir / moodarcade / highscores).
pub fn config_path() -> PathBuf {
    let base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".config"))
            .unwrap_or_else(|_| PathBuf::from(".")),
    };
    base.join("moodarcade").join(FILENAME)
}

/// Best score per game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HighScores {
    pub tiles: u32,
    pub bubbles: u32,
}

impl HighScores {
    pub fn best(&self, game: GameKind) -> u32 {
        match game {
            GameKind::Tiles => self.tiles,
            GameKind::Bubbles => self.bubbles,
        }
    }

    /// Keep max(stored, new). Returns true when `score` beats the stored best.
    pub fn record(&mut self, game: GameKind, score: u32) -> bool {
        let slot = match game {
            GameKind::Tiles => &mut self.tiles,
            GameKind::Bubbles => &mut self.bubbles,
        };
        let improved = score > *slot;
        *slot = (*slot).max(score);
        improved
    }

    /// `key=value` lines; unknown keys and junk are skipped.
    pub fn parse(content: &str) -> Self {
        let mut scores = Self::default();
        for line in content.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let Ok(n) = value.trim().parse::<u32>() else {
                continue;
            };
            match key.trim() {
                "tiles" => scores.tiles = n,
                "bubbles" => scores.bubbles = n,
                _ => {}
            }
        }
        scores
    }

    /// Load from a file; zeros on missing/unreadable file.
    pub fn load_from(path: &Path) -> Self {
        fs::read_to_string(path)
            .map(|s| Self::parse(&s))
            .unwrap_or_default()
    }

    /// Save to a file. Creates parent directories if needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut f = fs::File::create(path)?;
        writeln!(f, "tiles={}", self.tiles)?;
        writeln!(f, "bubbles={}", self.bubbles)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_keeps_the_maximum() {
        let mut hs = HighScores::default();
        assert!(hs.record(GameKind::Tiles, 120));
        assert!(!hs.record(GameKind::Tiles, 90));
        assert!(!hs.record(GameKind::Tiles, 120));
        assert_eq!(hs.best(GameKind::Tiles), 120);
        assert_eq!(hs.best(GameKind::Bubbles), 0);
    }

    #[test]
    fn zero_score_is_not_a_record() {
        let mut hs = HighScores::default();
        assert!(!hs.record(GameKind::Bubbles, 0));
    }

    #[test]
    fn parse_skips_junk() {
        let hs = HighScores::parse("tiles=340\n# comment\nbubbles = 12 \nsnake=9\nbubbles=x\n");
        assert_eq!(hs, HighScores { tiles: 340, bubbles: 12 });
    }

    #[test]
    fn save_then_load() {
        let dir = std::env::temp_dir().join(format!("moodarcade-hs-{}", std::process::id()));
        let path = dir.join("nested").join(FILENAME);
        let hs = HighScores { tiles: 70, bubbles: 21 };
        hs.save_to(&path).unwrap();
        assert_eq!(HighScores::load_from(&path), hs);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_loads_zeros() {
        let path = std::env::temp_dir().join("moodarcade-definitely-missing").join(FILENAME);
        assert_eq!(HighScores::load_from(&path), HighScores::default());
    }
}
