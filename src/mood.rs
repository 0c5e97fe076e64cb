//! Mood palette, daily time slots and the "dominant mood of the day" rule.

use rand::Rng;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The five moods. Doubles as the tile/bubble colour palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Mood {
    Happy,
    Calm,
    Neutral,
    Sad,
    Angry,
}

impl Mood {
    pub const ALL: [Self; 5] = [Self::Happy, Self::Calm, Self::Neutral, Self::Sad, Self::Angry];

    /// Palette index 0..5 for theme.mood_color().
    pub fn index(self) -> u8 {
        match self {
            Self::Happy => 0,
            Self::Calm => 1,
            Self::Neutral => 2,
            Self::Sad => 3,
            Self::Angry => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Happy => "happy",
            Self::Calm => "calm",
            Self::Neutral => "neutral",
            Self::Sad => "sad",
            Self::Angry => "angry",
        }
    }

    /// Uniformly random mood.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoodParseError {
    #[error("unknown mood '{0}' (expected happy, calm, neutral, sad or angry)")]
    UnknownMood(String),
    #[error("unknown time slot '{0}' (expected morning, afternoon, evening or night)")]
    UnknownSlot(String),
    #[error("expected SLOT=MOOD, got '{0}'")]
    MissingSeparator(String),
}

impl FromStr for Mood {
    type Err = MoodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|m| m.label() == needle)
            .ok_or_else(|| MoodParseError::UnknownMood(s.to_string()))
    }
}

/// The four daily logging slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSlot {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeSlot {
    pub const ALL: [Self; 4] = [Self::Morning, Self::Afternoon, Self::Evening, Self::Night];

    fn position(self) -> usize {
        match self {
            Self::Morning => 0,
            Self::Afternoon => 1,
            Self::Evening => 2,
            Self::Night => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
            Self::Night => "night",
        }
    }
}

impl FromStr for TimeSlot {
    type Err = MoodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|slot| slot.label() == needle)
            .ok_or_else(|| MoodParseError::UnknownSlot(s.to_string()))
    }
}

/// One `--mood SLOT=MOOD` entry from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotEntry {
    pub slot: TimeSlot,
    pub mood: Mood,
}

/// clap value parser for `SLOT=MOOD`.
pub fn parse_slot_entry(s: &str) -> Result<SlotEntry, MoodParseError> {
    let (slot, mood) = s
        .split_once('=')
        .ok_or_else(|| MoodParseError::MissingSeparator(s.to_string()))?;
    Ok(SlotEntry {
        slot: slot.parse()?,
        mood: mood.parse()?,
    })
}

/// A day's moods, at most one per slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayLog {
    slots: [Option<Mood>; 4],
}

/// A mood must appear in at least this many slots to dominate the day.
const DOMINANT_THRESHOLD: usize = 2;

impl DayLog {
    pub fn from_entries(entries: &[SlotEntry]) -> Self {
        let mut log = Self::default();
        for e in entries {
            log.set(e.slot, e.mood);
        }
        log
    }

    /// Later entries for the same slot replace earlier ones.
    pub fn set(&mut self, slot: TimeSlot, mood: Mood) {
        self.slots[slot.position()] = Some(mood);
    }

    pub fn get(&self, slot: TimeSlot) -> Option<Mood> {
        self.slots[slot.position()]
    }

    pub fn logged(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Plurality mood, if it reaches the threshold and is not tied.
    pub fn dominant(&self) -> Option<Mood> {
        let mut counts = [0usize; 5];
        for mood in self.slots.iter().flatten() {
            counts[mood.index() as usize] += 1;
        }
        let best = *counts.iter().max()?;
        if best < DOMINANT_THRESHOLD {
            return None;
        }
        let mut leaders = Mood::ALL.into_iter().filter(|m| counts[m.index() as usize] == best);
        let leader = leaders.next()?;
        leaders.next().is_none().then_some(leader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(entries: &[(TimeSlot, Mood)]) -> DayLog {
        let mut l = DayLog::default();
        for &(slot, mood) in entries {
            l.set(slot, mood);
        }
        l
    }

    #[test]
    fn empty_day_has_no_dominant_mood() {
        assert_eq!(DayLog::default().dominant(), None);
    }

    #[test]
    fn single_entry_is_below_threshold() {
        let l = log(&[(TimeSlot::Morning, Mood::Happy)]);
        assert_eq!(l.dominant(), None);
    }

    #[test]
    fn plurality_of_two_wins() {
        let l = log(&[
            (TimeSlot::Morning, Mood::Calm),
            (TimeSlot::Afternoon, Mood::Sad),
            (TimeSlot::Evening, Mood::Calm),
        ]);
        assert_eq!(l.dominant(), Some(Mood::Calm));
    }

    #[test]
    fn two_two_tie_is_mixed() {
        let l = log(&[
            (TimeSlot::Morning, Mood::Calm),
            (TimeSlot::Afternoon, Mood::Sad),
            (TimeSlot::Evening, Mood::Calm),
            (TimeSlot::Night, Mood::Sad),
        ]);
        assert_eq!(l.dominant(), None);
    }

    #[test]
    fn overwriting_a_slot_replaces_it() {
        let mut l = log(&[(TimeSlot::Morning, Mood::Angry), (TimeSlot::Night, Mood::Angry)]);
        l.set(TimeSlot::Morning, Mood::Happy);
        assert_eq!(l.logged(), 2);
        assert_eq!(l.dominant(), None);
    }

    #[test]
    fn parse_slot_entry_accepts_any_case() {
        let e = parse_slot_entry("Evening=CALM").unwrap();
        assert_eq!(e, SlotEntry { slot: TimeSlot::Evening, mood: Mood::Calm });
    }

    #[test]
    fn parse_slot_entry_errors() {
        assert!(matches!(parse_slot_entry("morning"), Err(MoodParseError::MissingSeparator(_))));
        assert!(matches!(parse_slot_entry("noon=happy"), Err(MoodParseError::UnknownSlot(_))));
        assert!(matches!(parse_slot_entry("night=meh"), Err(MoodParseError::UnknownMood(_))));
    }
}
