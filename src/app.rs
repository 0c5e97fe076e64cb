//! App: terminal init, main loop, game timers, key/mouse handling and finished-session bookkeeping.

use crate::bubbles::BubbleGame;
use crate::grid::SwapOutcome;
use crate::highscores::{self, HighScores};
use crate::input::{Action, key_to_action};
use crate::session::Session;
use crate::theme::Theme;
use crate::tiles::{ClickOutcome, Direction, TileGame};
use crate::ui::{self, MatchFlash};
use crate::{GameConfig, GameKind};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use rand::SeedableRng;
use rand::rngs::StdRng;
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Menu,
    Playing,
    GameOver,
    QuitMenu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitOption {
    Resume,
    MainMenu,
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuState {
    pub selected: GameKind,
    pub animation_start: Instant,
}

impl Default for MenuState {
    fn default() -> Self {
        Self {
            selected: GameKind::Tiles,
            animation_start: Instant::now(),
        }
    }
}

/// Last finished session, for the game-over screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameResult {
    pub game: GameKind,
    pub score: u32,
    pub new_record: bool,
}

/// The minigame currently on screen.
#[derive(Debug)]
pub enum ActiveGame {
    Tiles(TileGame),
    Bubbles(BubbleGame),
}

impl ActiveGame {
    pub fn kind(&self) -> GameKind {
        match self {
            Self::Tiles(_) => GameKind::Tiles,
            Self::Bubbles(_) => GameKind::Bubbles,
        }
    }

    pub fn session(&self) -> &Session {
        match self {
            Self::Tiles(g) => g.session(),
            Self::Bubbles(g) => g.session(),
        }
    }

    fn update(&mut self, now: Instant) -> Option<u32> {
        match self {
            Self::Tiles(g) => g.update(now),
            Self::Bubbles(g) => g.update(now),
        }
    }

    fn resume(&mut self, now: Instant) {
        match self {
            Self::Tiles(g) => g.resume(now),
            Self::Bubbles(g) => g.resume(now),
        }
    }
}

pub struct App {
    config: GameConfig,
    theme: Theme,
    screen: Screen,
    paused: bool,
    game: Option<ActiveGame>,
    games_started: u64,
    menu_state: MenuState,
    quit_selected: QuitOption,
    high_scores: HighScores,
    scores_path: PathBuf,
    last_result: Option<GameResult>,
    /// Session completion callbacks post here; drained once per frame.
    results_tx: Sender<(GameKind, u32)>,
    results_rx: Receiver<(GameKind, u32)>,
    /// Tiles cleared by the last match, while their flash effect runs.
    flash: Option<MatchFlash>,
    /// Terminal area of the last frame, for mouse hit-testing.
    last_area: Rect,
}

impl App {
    pub fn new(config: GameConfig, theme: Theme, start: Option<GameKind>) -> Self {
        let mut app = Self::with_scores_at(config, theme, highscores::config_path());
        if let Some(kind) = start {
            app.menu_state.selected = kind;
            app.start_game(kind);
        }
        app
    }

    fn with_scores_at(config: GameConfig, theme: Theme, scores_path: PathBuf) -> Self {
        let (results_tx, results_rx) = mpsc::channel();
        Self {
            config,
            theme,
            screen: Screen::Menu,
            paused: false,
            game: None,
            games_started: 0,
            menu_state: MenuState::default(),
            quit_selected: QuitOption::Resume,
            high_scores: HighScores::load_from(&scores_path),
            scores_path,
            last_result: None,
            results_tx,
            results_rx,
            flash: None,
            last_area: Rect::default(),
        }
    }

    /// Seeded runs stay reproducible but each new game gets its own stream.
    fn next_rng(&mut self) -> StdRng {
        let rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(self.games_started)),
            None => StdRng::from_entropy(),
        };
        self.games_started += 1;
        rng
    }

    fn start_game(&mut self, kind: GameKind) {
        let now = Instant::now();
        let seconds = self.config.seconds_for(kind);
        let tx = self.results_tx.clone();
        let session = Session::new(seconds).with_completion(move |score| {
            // Receiver lives as long as the App; a failed send means we are shutting down.
            let _ = tx.send((kind, score));
        });
        let rng = self.next_rng();
        self.game = Some(match kind {
            GameKind::Tiles => {
                ActiveGame::Tiles(TileGame::new(session, self.config.adjacency, rng, now))
            }
            GameKind::Bubbles => ActiveGame::Bubbles(BubbleGame::new(session, rng, now)),
        });
        self.screen = Screen::Playing;
        self.paused = false;
        self.flash = None;
        self.last_result = None;
        tracing::info!(game = ?kind, seconds, "session started");
    }

    /// Leave the current game without reporting a score.
    fn abandon_game(&mut self) {
        if let Some(game) = self.game.take() {
            tracing::info!(game = ?game.kind(), score = game.session().score(), "session abandoned");
        }
        self.flash = None;
        self.paused = false;
        self.screen = Screen::Menu;
        self.menu_state.animation_start = Instant::now();
    }

    fn drain_results(&mut self) {
        while let Ok((game, score)) = self.results_rx.try_recv() {
            let new_record = self.high_scores.record(game, score);
            if let Err(e) = self.high_scores.save_to(&self.scores_path) {
                tracing::warn!(error = %e, "could not save high scores");
            }
            if new_record {
                tracing::info!(game = ?game, score, "new high score");
            }
            self.last_result = Some(GameResult {
                game,
                score,
                new_record,
            });
            self.screen = Screen::GameOver;
            self.paused = false;
        }
    }

    fn resume(&mut self) {
        self.paused = false;
        self.screen = Screen::Playing;
        if let Some(game) = self.game.as_mut() {
            game.resume(Instant::now());
        }
    }

    fn on_click_outcome(&mut self, outcome: ClickOutcome) {
        if let ClickOutcome::Swapped(SwapOutcome::Matched { cells, .. }) = outcome {
            if !self.config.no_animation {
                self.flash = Some(MatchFlash::new(cells));
            }
        }
    }

    fn play_action(&mut self, action: Action) {
        let Some(game) = self.game.as_mut() else {
            return;
        };
        match (game, action) {
            (ActiveGame::Tiles(g), Action::Move(d)) => g.move_cursor(d),
            (ActiveGame::Tiles(g), Action::Activate) => {
                let outcome = g.activate();
                self.on_click_outcome(outcome);
            }
            (ActiveGame::Bubbles(g), Action::Move(d)) => g.move_lane(d),
            (ActiveGame::Bubbles(g), Action::Activate) => {
                g.pop_in_lane();
            }
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.screen != Screen::Playing || self.paused {
            return;
        }
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }
        let area = self.last_area;
        let Some(game) = self.game.as_mut() else {
            return;
        };
        match game {
            ActiveGame::Tiles(g) => {
                if let Some(index) = ui::tile_at(area, mouse.column, mouse.row) {
                    let outcome = g.click(index);
                    self.on_click_outcome(outcome);
                }
            }
            ActiveGame::Bubbles(g) => {
                if let Some((x, y)) = ui::field_point(area, mouse.column, mouse.row) {
                    g.pop_at(x, y);
                }
            }
        }
    }

    /// Returns false when the app should exit.
    fn handle_action(&mut self, action: Action) -> bool {
        match self.screen {
            Screen::Menu => match action {
                Action::Quit => return false,
                Action::Move(Direction::Up | Direction::Down) => {
                    self.menu_state.selected = match self.menu_state.selected {
                        GameKind::Tiles => GameKind::Bubbles,
                        GameKind::Bubbles => GameKind::Tiles,
                    };
                }
                Action::Activate => self.start_game(self.menu_state.selected),
                _ => {}
            },
            Screen::Playing => match action {
                Action::Pause => {
                    if self.paused {
                        self.resume();
                    } else {
                        self.paused = true;
                    }
                }
                Action::Quit => {
                    self.screen = Screen::QuitMenu;
                    self.quit_selected = QuitOption::Resume;
                }
                _ if !self.paused => self.play_action(action),
                _ => {}
            },
            Screen::QuitMenu => match action {
                Action::Move(Direction::Down | Direction::Right) => {
                    self.quit_selected = match self.quit_selected {
                        QuitOption::Resume => QuitOption::MainMenu,
                        QuitOption::MainMenu => QuitOption::Exit,
                        QuitOption::Exit => QuitOption::Resume,
                    };
                }
                Action::Move(Direction::Up | Direction::Left) => {
                    self.quit_selected = match self.quit_selected {
                        QuitOption::Resume => QuitOption::Exit,
                        QuitOption::MainMenu => QuitOption::Resume,
                        QuitOption::Exit => QuitOption::MainMenu,
                    };
                }
                Action::Activate => match self.quit_selected {
                    QuitOption::Resume => self.resume(),
                    QuitOption::MainMenu => self.abandon_game(),
                    QuitOption::Exit => return false,
                },
                Action::Pause | Action::Quit => self.resume(),
                _ => {}
            },
            Screen::GameOver => match action {
                Action::Quit => return false,
                Action::Restart => {
                    let kind = self
                        .last_result
                        .map_or(self.menu_state.selected, |r| r.game);
                    self.start_game(kind);
                }
                Action::Activate => {
                    self.game = None;
                    self.screen = Screen::Menu;
                    self.menu_state.animation_start = Instant::now();
                }
                _ => {}
            },
        }
        true
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{DisableMouseCapture, EnableMouseCapture},
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

        let result = ratatui::Terminal::new(ratatui::backend::CrosstermBackend::new(stdout))
            .map_err(anyhow::Error::from)
            .and_then(|mut terminal| self.run_loop(&mut terminal));

        // Restore
        execute!(std::io::stdout(), DisableMouseCapture, LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let frame_duration = Duration::from_secs_f64(1.0 / self.config.frame_rate.max(1.0));
        loop {
            let now = Instant::now();

            if self.screen == Screen::Playing && !self.paused {
                if let Some(game) = self.game.as_mut() {
                    if game.update(now).is_some() {
                        self.flash = None;
                    }
                }
            }
            self.drain_results();

            let view = ui::View {
                screen: self.screen,
                game: self.game.as_ref(),
                theme: &self.theme,
                high_scores: self.high_scores,
                menu: &self.menu_state,
                quit_selected: self.quit_selected,
                paused: self.paused,
                last_result: self.last_result,
                today: &self.config.today,
                now,
            };
            let flash = &mut self.flash;
            let mut area = self.last_area;
            terminal.draw(|f| {
                area = f.area();
                ui::draw(f, &view, flash);
            })?;
            self.last_area = area;

            if self.flash.as_ref().is_some_and(MatchFlash::done) {
                self.flash = None;
            }

            let timeout = frame_duration.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    match event::read()? {
                        Event::Key(key) if key.kind == KeyEventKind::Press => {
                            if !self.handle_action(key_to_action(key)) {
                                return Ok(());
                            }
                        }
                        Event::Mouse(mouse) => self.handle_mouse(mouse),
                        _ => {}
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::AdjacencyRule;
    use crate::mood::DayLog;

    fn config() -> GameConfig {
        GameConfig {
            tile_seconds: 2,
            bubble_seconds: 30,
            seed: Some(3),
            adjacency: AdjacencyRule::Naive,
            no_animation: true,
            frame_rate: 60.0,
            today: DayLog::default(),
        }
    }

    #[test]
    fn finished_session_lands_in_saved_high_scores() {
        let dir = std::env::temp_dir().join(format!("moodarcade-app-{}", std::process::id()));
        let path = dir.join("highscores");
        let mut app = App::with_scores_at(config(), Theme::default(), path.clone());

        app.start_game(GameKind::Tiles);
        assert_eq!(app.screen, Screen::Playing);
        let later = Instant::now() + Duration::from_secs(3);
        let game = app.game.as_mut().unwrap();
        assert_eq!(game.update(later), Some(0));
        app.drain_results();

        assert_eq!(app.screen, Screen::GameOver);
        assert_eq!(
            app.last_result,
            Some(GameResult {
                game: GameKind::Tiles,
                score: 0,
                new_record: false,
            })
        );

        app.results_tx.send((GameKind::Bubbles, 7)).unwrap();
        app.drain_results();
        assert_eq!(app.last_result.map(|r| r.new_record), Some(true));
        assert_eq!(app.high_scores.best(GameKind::Bubbles), 7);
        assert_eq!(HighScores::load_from(&path).best(GameKind::Bubbles), 7);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn leaving_early_reports_nothing() {
        let dir = std::env::temp_dir().join(format!("moodarcade-app-quit-{}", std::process::id()));
        let mut app = App::with_scores_at(config(), Theme::default(), dir.join("highscores"));
        app.start_game(GameKind::Bubbles);
        app.abandon_game();
        app.drain_results();
        assert_eq!(app.screen, Screen::Menu);
        assert!(app.game.is_none());
        assert_eq!(app.last_result, None);
        assert!(!dir.exists());
    }
}
