//! Mood Match: the 5x5 tile-swap minigame around a [`Grid`] and a [`Session`].

use crate::grid::{AdjacencyRule, CELL_COUNT, GRID_SIDE, Grid, SwapOutcome};
use crate::session::{Session, TickOutcome, Ticker};
use rand::rngs::StdRng;
use std::time::{Duration, Instant};

/// Cursor / lane movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// What a click did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// First click of a pair.
    Selected(usize),
    /// Second click: swap attempted, selection cleared.
    Swapped(SwapOutcome),
    /// Session over (or index off the board with nothing selected).
    Ignored,
}

#[derive(Debug)]
pub struct TileGame {
    grid: Grid,
    session: Session,
    selection: Option<usize>,
    cursor: usize,
    adjacency: AdjacencyRule,
    rng: StdRng,
    countdown: Ticker,
}

impl TileGame {
    pub fn new(session: Session, adjacency: AdjacencyRule, mut rng: StdRng, now: Instant) -> Self {
        let grid = Grid::random(&mut rng);
        Self::with_grid(grid, session, adjacency, rng, now)
    }

    pub fn with_grid(
        grid: Grid,
        session: Session,
        adjacency: AdjacencyRule,
        rng: StdRng,
        now: Instant,
    ) -> Self {
        Self {
            grid,
            session,
            selection: None,
            cursor: CELL_COUNT / 2,
            adjacency,
            rng,
            countdown: Ticker::new(Duration::from_secs(1), now),
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn selection(&self) -> Option<usize> {
        self.selection
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn click(&mut self, index: usize) -> ClickOutcome {
        if !self.session.is_running() {
            return ClickOutcome::Ignored;
        }
        let Some(selected) = self.selection.take() else {
            if index >= CELL_COUNT {
                return ClickOutcome::Ignored;
            }
            self.selection = Some(index);
            return ClickOutcome::Selected(index);
        };
        let moved = self.grid.cells()[selected].id;
        let outcome = self
            .grid
            .attempt_swap(selected, index, self.adjacency, &mut self.rng);
        let points = outcome.points();
        if let SwapOutcome::Matched { cells, .. } = &outcome {
            self.session.add_points(points);
            tracing::debug!(selected, index, token = moved, matched = cells.len(), points, "tiles matched");
        }
        ClickOutcome::Swapped(outcome)
    }

    /// Click the cell under the keyboard cursor.
    pub fn activate(&mut self) -> ClickOutcome {
        self.click(self.cursor)
    }

    /// Moves within the board; stops at the edges.
    pub fn move_cursor(&mut self, direction: Direction) {
        let (row, col) = (self.cursor / GRID_SIDE, self.cursor % GRID_SIDE);
        let (row, col) = match direction {
            Direction::Up => (row.saturating_sub(1), col),
            Direction::Down => ((row + 1).min(GRID_SIDE - 1), col),
            Direction::Left => (row, col.saturating_sub(1)),
            Direction::Right => (row, (col + 1).min(GRID_SIDE - 1)),
        };
        self.cursor = row * GRID_SIDE + col;
    }

    /// One second of countdown.
    pub fn tick_second(&mut self) -> TickOutcome {
        let outcome = self.session.tick();
        if let TickOutcome::Finished { score } = outcome {
            self.selection = None;
            tracing::info!(score, "tile session finished");
        }
        outcome
    }

    /// Drive the countdown from the wall clock. Returns the final score on the call that ends the session.
    pub fn update(&mut self, now: Instant) -> Option<u32> {
        if !self.session.is_running() {
            return None;
        }
        for _ in 0..self.countdown.due(now) {
            if let TickOutcome::Finished { score } = self.tick_second() {
                return Some(score);
            }
        }
        None
    }

    pub fn resume(&mut self, now: Instant) {
        self.countdown.restart(now);
    }
}
