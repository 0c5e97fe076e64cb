//! Moodarcade: the mood journal's two minigames in the terminal, Mood Match and Bubble Pop.

mod app;
mod bubbles;
mod grid;
mod highscores;
mod input;
mod logging;
mod mood;
mod session;
mod theme;
mod tiles;
mod ui;

use anyhow::Result;
use app::App;
use clap::{Parser, ValueEnum};
use grid::AdjacencyRule;
use mood::{DayLog, SlotEntry};

/// Options derived from CLI that affect game behaviour.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub tile_seconds: u32,
    pub bubble_seconds: u32,
    /// Fixed RNG seed; entropy when None.
    pub seed: Option<u64>,
    pub adjacency: AdjacencyRule,
    pub no_animation: bool,
    pub frame_rate: f64,
    pub today: DayLog,
}

impl GameConfig {
    pub fn seconds_for(&self, game: GameKind) -> u32 {
        match game {
            GameKind::Tiles => self.tile_seconds,
            GameKind::Bubbles => self.bubble_seconds,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_logging(args.log_file.as_deref())?;
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "theme not loaded, using defaults");
        theme::Theme::default()
    });
    let config = GameConfig {
        tile_seconds: args.tile_seconds,
        bubble_seconds: args.bubble_seconds,
        seed: args.seed,
        adjacency: if args.strict_adjacency {
            AdjacencyRule::Strict
        } else {
            AdjacencyRule::Naive
        },
        no_animation: args.no_animation,
        frame_rate: args.frame_rate,
        today: DayLog::from_entries(&args.mood),
    };
    let mut app = App::new(config, theme, args.game);
    app.run()?;
    Ok(())
}

/// Mood journal minigames in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "moodarcade",
    version,
    about = "Mood journal minigames in the terminal: swap mood tiles into triples, or pop rising bubbles.",
    long_about = "Moodarcade bundles the two minigames of a mood journal.\n\n\
        MOOD MATCH: a 5x5 board of mood tiles. Select a tile, then a neighbour to swap them. \
        A swap that lines up three of a kind (row or column) scores 10 per matched tile; \
        anything else is undone. 45 seconds.\n\n\
        BUBBLE POP: bubbles rise from the bottom. Pop them before they float away, 1 point each. 30 seconds.\n\n\
        CONTROLS:\n  Arrows/hjkl  Move cursor or lane   Enter/Space  Select / pop\n  \
        Mouse click  Select / pop           P            Pause\n  Q / Esc      Quit menu            R            Play again (game over)"
)]
pub struct Args {
    /// Start this game immediately instead of showing the menu.
    #[arg(short, long)]
    pub game: Option<GameKind>,

    /// Mood Match time budget in seconds.
    #[arg(long, default_value_t = session::TILE_SECONDS, value_name = "SECS", value_parser = clap::value_parser!(u32).range(1..))]
    pub tile_seconds: u32,

    /// Bubble Pop time budget in seconds.
    #[arg(long, default_value_t = session::BUBBLE_SECONDS, value_name = "SECS", value_parser = clap::value_parser!(u32).range(1..))]
    pub bubble_seconds: u32,

    /// RNG seed for reproducible boards and bubbles.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Do not treat the last tile of a row and the first tile of the next as neighbours.
    #[arg(long)]
    pub strict_adjacency: bool,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Target render frames per second.
    #[arg(long, default_value = "60.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Disable the match flash effect.
    #[arg(long)]
    pub no_animation: bool,

    /// Today's mood for a time slot, e.g. --mood morning=calm (repeatable).
    #[arg(long, value_name = "SLOT=MOOD", value_parser = mood::parse_slot_entry)]
    pub mood: Vec<SlotEntry>,

    /// Write logs to this file (filter with MOODARCADE_LOG).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<std::path::PathBuf>,
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

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum GameKind {
    /// Mood Match tile swap.
    #[default]
    #[value(alias = "match")]
    Tiles,
    /// Bubble Pop.
    #[value(alias = "pop")]
    Bubbles,
}

impl GameKind {
    pub const ALL: [Self; 2] = [Self::Tiles, Self::Bubbles];

    pub fn title(self) -> &'static str {
        match self {
            Self::Tiles => "Mood Match",
            Self::Bubbles => "Bubble Pop",
        }
    }
}
