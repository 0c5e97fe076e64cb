//! Bubble Pop: rising bubbles, tap to pop, cosmetic particle bursts.
//!
//! Field coordinates run 0..=100 on both axes with y = 0 at the top. Bubbles
//! enter below the bottom edge and rise; anything above `ESCAPE_Y` is a miss.

use crate::mood::Mood;
use crate::session::{Session, TickOutcome, Ticker};
use crate::tiles::Direction;
use rand::Rng;
use rand::rngs::StdRng;
use std::time::{Duration, Instant};

pub const MAX_BUBBLES: usize = 8;
pub const SPAWN_INTERVAL: Duration = Duration::from_millis(700);
pub const MOTION_INTERVAL: Duration = Duration::from_millis(16);
pub const SPAWN_Y: f32 = 110.0;
/// Bubbles above this line are gone.
pub const ESCAPE_Y: f32 = -20.0;
pub const FIELD_SIZE: f32 = 100.0;
pub const BURST_PARTICLES: usize = 8;
pub const PARTICLE_LIFETIME_MS: u32 = 1000;
const PARTICLE_SPEED: f32 = 1.2;
/// Mouse hit radius in field units.
pub const POP_RADIUS: f32 = 6.0;
/// Keyboard play splits the field into this many columns.
pub const LANES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bubble {
    pub id: u64,
    pub x: f32,
    pub y: f32,
    /// Field units per motion tick.
    pub speed: f32,
    pub mood: Mood,
}

impl Bubble {
    pub fn is_visible(&self) -> bool {
        (0.0..=FIELD_SIZE).contains(&self.y)
    }
}

/// Decoration only; never affects score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub age_ms: u32,
    pub mood: Mood,
}

impl Particle {
    /// 1.0 when fresh, 0.0 when about to expire.
    pub fn life(&self) -> f32 {
        1.0 - (self.age_ms as f32 / PARTICLE_LIFETIME_MS as f32).min(1.0)
    }
}

#[derive(Debug)]
pub struct BubbleGame {
    bubbles: Vec<Bubble>,
    particles: Vec<Particle>,
    session: Session,
    rng: StdRng,
    next_id: u64,
    misses: u32,
    lane: usize,
    countdown: Ticker,
    spawner: Ticker,
    motion: Ticker,
}

impl BubbleGame {
    pub fn new(session: Session, rng: StdRng, now: Instant) -> Self {
        Self {
            bubbles: Vec::with_capacity(MAX_BUBBLES),
            particles: Vec::new(),
            session,
            rng,
            next_id: 0,
            misses: 0,
            lane: LANES / 2,
            countdown: Ticker::new(Duration::from_secs(1), now),
            spawner: Ticker::new(SPAWN_INTERVAL, now),
            motion: Ticker::new(MOTION_INTERVAL, now),
        }
    }

    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn misses(&self) -> u32 {
        self.misses
    }

    pub fn lane(&self) -> usize {
        self.lane
    }

    /// Field x range covered by a lane.
    pub fn lane_span(lane: usize) -> (f32, f32) {
        let width = FIELD_SIZE / LANES as f32;
        (lane as f32 * width, (lane + 1) as f32 * width)
    }

    /// Random position, speed and tint; no-op when the field is full.
    pub fn try_spawn(&mut self) -> Option<u64> {
        if self.bubbles.len() >= MAX_BUBBLES {
            return None;
        }
        let x = self.rng.gen_range(5.0..95.0);
        let speed = self.rng.gen_range(0.5..=1.5);
        let mood = Mood::random(&mut self.rng);
        self.spawn_with(x, speed, mood)
    }

    pub fn spawn_with(&mut self, x: f32, speed: f32, mood: Mood) -> Option<u64> {
        if self.bubbles.len() >= MAX_BUBBLES {
            return None;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.bubbles.push(Bubble {
            id,
            x,
            y: SPAWN_Y,
            speed,
            mood,
        });
        Some(id)
    }

    /// One 16 ms motion step: bubbles rise, escaped ones are dropped, particles age.
    pub fn advance(&mut self) {
        for b in &mut self.bubbles {
            b.y -= b.speed;
        }
        let before = self.bubbles.len();
        self.bubbles.retain(|b| b.y >= ESCAPE_Y);
        self.misses += (before - self.bubbles.len()) as u32;

        let step = MOTION_INTERVAL.as_millis() as u32;
        self.particles.retain_mut(|p| {
            p.x += p.vx;
            p.y += p.vy;
            p.age_ms += step;
            p.age_ms < PARTICLE_LIFETIME_MS
        });
    }

    /// Pop by id. Score +1 and a particle burst; false if gone or session over.
    pub fn pop(&mut self, id: u64) -> bool {
        if !self.session.is_running() {
            return false;
        }
        let Some(pos) = self.bubbles.iter().position(|b| b.id == id) else {
            return false;
        };
        let bubble = self.bubbles.swap_remove(pos);
        self.session.add_points(1);
        self.burst(bubble.x, bubble.y, bubble.mood);
        true
    }

    /// Nearest visible bubble within `POP_RADIUS` of a field point.
    pub fn pop_at(&mut self, x: f32, y: f32) -> bool {
        let hit = self
            .bubbles
            .iter()
            .filter(|b| b.is_visible())
            .map(|b| (b.id, (b.x - x).hypot(b.y - y)))
            .filter(|&(_, d)| d <= POP_RADIUS)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id);
        hit.is_some_and(|id| self.pop(id))
    }

    /// Pops the visible bubble in the cursor lane that is closest to escaping.
    pub fn pop_in_lane(&mut self) -> bool {
        let (lo, hi) = Self::lane_span(self.lane);
        let hit = self
            .bubbles
            .iter()
            .filter(|b| b.is_visible() && b.x >= lo && b.x < hi)
            .min_by(|a, b| a.y.total_cmp(&b.y))
            .map(|b| b.id);
        hit.is_some_and(|id| self.pop(id))
    }

    /// Left/right move the lane cursor; up/down are ignored.
    pub fn move_lane(&mut self, direction: Direction) {
        match direction {
            Direction::Left => self.lane = self.lane.saturating_sub(1),
            Direction::Right => self.lane = (self.lane + 1).min(LANES - 1),
            Direction::Up | Direction::Down => {}
        }
    }

    fn burst(&mut self, x: f32, y: f32, mood: Mood) {
        for i in 0..BURST_PARTICLES {
            let angle = std::f32::consts::TAU * i as f32 / BURST_PARTICLES as f32;
            self.particles.push(Particle {
                x,
                y,
                vx: angle.cos() * PARTICLE_SPEED,
                vy: angle.sin() * PARTICLE_SPEED,
                age_ms: 0,
                mood,
            });
        }
    }

    pub fn tick_second(&mut self) -> TickOutcome {
        let outcome = self.session.tick();
        if let TickOutcome::Finished { score } = outcome {
            tracing::info!(score, misses = self.misses, "bubble session finished");
        }
        outcome
    }

    /// Runs every due countdown, spawn and motion tick in time order, one at a time.
    /// On equal deadlines: countdown, then motion, then spawn.
    /// Returns the final score on the call that ends the session.
    pub fn update(&mut self, now: Instant) -> Option<u32> {
        while self.session.is_running() {
            let next = self
                .countdown
                .next_at()
                .min(self.motion.next_at())
                .min(self.spawner.next_at());
            if next > now {
                break;
            }
            if self.countdown.next_at() == next {
                self.countdown.fire();
                if let TickOutcome::Finished { score } = self.tick_second() {
                    return Some(score);
                }
            } else if self.motion.next_at() == next {
                self.motion.fire();
                self.advance();
            } else {
                self.spawner.fire();
                self.try_spawn();
            }
        }
        None
    }

    pub fn resume(&mut self, now: Instant) {
        self.countdown.restart(now);
        self.spawner.restart(now);
        self.motion.restart(now);
    }
}
