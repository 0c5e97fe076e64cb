//! Timed play session: score, countdown, finish-once callback; plus the wall-clock ticker.

use std::fmt;
use std::time::{Duration, Instant};

/// Starting budget for the tile game, in seconds.
pub const TILE_SECONDS: u32 = 45;
/// Starting budget for the bubble game, in seconds.
pub const BUBBLE_SECONDS: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Running,
    Finished,
}

/// What one countdown tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Running { remaining: u32 },
    /// This tick ended the session.
    Finished { score: u32 },
    /// Session was already over; nothing changed.
    Inert,
}

/// Receives the final score.
pub type CompletionCallback = Box<dyn FnOnce(u32)>;

pub struct Session {
    score: u32,
    budget: u32,
    time_remaining: u32,
    status: SessionStatus,
    on_complete: Option<CompletionCallback>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("score", &self.score)
            .field("budget", &self.budget)
            .field("time_remaining", &self.time_remaining)
            .field("status", &self.status)
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

impl Session {
    pub fn new(budget_secs: u32) -> Self {
        Self {
            score: 0,
            budget: budget_secs,
            time_remaining: budget_secs,
            status: SessionStatus::Running,
            on_complete: None,
        }
    }

    /// Attach the callback that receives the final score.
    pub fn with_completion(mut self, callback: impl FnOnce(u32) + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn budget(&self) -> u32 {
        self.budget
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == SessionStatus::Running
    }

    /// Fraction of the budget still left, 0.0..=1.0.
    pub fn remaining_ratio(&self) -> f64 {
        if self.budget == 0 {
            0.0
        } else {
            f64::from(self.time_remaining) / f64::from(self.budget)
        }
    }

    /// Ignored once finished. Returns whether the points were applied.
    pub fn add_points(&mut self, points: u32) -> bool {
        if !self.is_running() {
            return false;
        }
        self.score = self.score.saturating_add(points);
        true
    }

    /// One second of countdown.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.is_running() {
            return TickOutcome::Inert;
        }
        self.time_remaining = self.time_remaining.saturating_sub(1);
        if self.time_remaining > 0 {
            return TickOutcome::Running {
                remaining: self.time_remaining,
            };
        }
        self.status = SessionStatus::Finished;
        if let Some(callback) = self.on_complete.take() {
            callback(self.score);
        }
        TickOutcome::Finished { score: self.score }
    }
}

/// Fixed-period timer polled from the main loop.
#[derive(Debug, Clone, Copy)]
pub struct Ticker {
    period: Duration,
    next: Instant,
}

impl Ticker {
    pub fn new(period: Duration, now: Instant) -> Self {
        Self {
            period,
            next: now + period,
        }
    }

    /// Number of whole periods elapsed since the last call.
    pub fn due(&mut self, now: Instant) -> u32 {
        if self.period.is_zero() {
            return 0;
        }
        let mut fired = 0;
        while now >= self.next {
            self.next += self.period;
            fired += 1;
        }
        fired
    }

    /// When the next period ends.
    pub fn next_at(&self) -> Instant {
        self.next
    }

    /// Consume exactly one period.
    pub fn fire(&mut self) {
        self.next += self.period;
    }

    /// Start a fresh period at `now`, forgetting any partial one (used after pause).
    pub fn restart(&mut self, now: Instant) {
        self.next = now + self.period;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn idle_session_finishes_after_budget_and_reports_once() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&calls);
        let mut s = Session::new(TILE_SECONDS).with_completion(move |score| sink.borrow_mut().push(score));

        for i in 1..TILE_SECONDS {
            assert_eq!(s.tick(), TickOutcome::Running { remaining: TILE_SECONDS - i });
        }
        assert!(s.is_running());
        assert_eq!(s.tick(), TickOutcome::Finished { score: 0 });
        assert_eq!(s.status(), SessionStatus::Finished);
        assert_eq!(s.tick(), TickOutcome::Inert);
        assert_eq!(s.tick(), TickOutcome::Inert);
        assert_eq!(*calls.borrow(), vec![0]);
    }

    #[test]
    fn score_reported_is_final_score() {
        let got = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&got);
        let mut s = Session::new(2).with_completion(move |score| *sink.borrow_mut() = Some(score));
        assert!(s.add_points(30));
        s.tick();
        assert!(s.add_points(10));
        s.tick();
        assert_eq!(*got.borrow(), Some(40));
    }

    #[test]
    fn finished_session_rejects_points() {
        let mut s = Session::new(1);
        s.tick();
        assert!(!s.add_points(10));
        assert_eq!(s.score(), 0);
    }

    #[test]
    fn score_never_decreases() {
        let mut s = Session::new(BUBBLE_SECONDS);
        let mut last = 0;
        for p in [0, 1, 10, 0, 30] {
            s.add_points(p);
            assert!(s.score() >= last);
            last = s.score();
        }
        assert_eq!(s.score(), 41);
    }

    #[test]
    fn remaining_ratio_tracks_countdown() {
        let mut s = Session::new(4);
        assert!((s.remaining_ratio() - 1.0).abs() < f64::EPSILON);
        s.tick();
        assert!((s.remaining_ratio() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn ticker_counts_whole_periods() {
        let start = Instant::now();
        let mut t = Ticker::new(Duration::from_millis(700), start);
        assert_eq!(t.due(start), 0);
        assert_eq!(t.due(start + Duration::from_millis(699)), 0);
        assert_eq!(t.due(start + Duration::from_millis(700)), 1);
        assert_eq!(t.due(start + Duration::from_millis(2200)), 2);
        assert_eq!(t.due(start + Duration::from_millis(2200)), 0);
    }

    #[test]
    fn ticker_restart_drops_partial_period() {
        let start = Instant::now();
        let mut t = Ticker::new(Duration::from_secs(1), start);
        let resumed = start + Duration::from_secs(10);
        t.restart(resumed);
        assert_eq!(t.due(resumed + Duration::from_millis(999)), 0);
        assert_eq!(t.due(resumed + Duration::from_secs(1)), 1);
    }
}
