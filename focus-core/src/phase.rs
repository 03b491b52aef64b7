use std::time::Duration;

use crate::error::TimerError;

/// Work sessions before a long break
pub const MAX_SESSIONS: u32 = 4;

pub const MIN_MINUTES: u32 = 1;
pub const MAX_MINUTES: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Work,
    ShortBreak,
    LongBreak,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Work => "Work",
            Phase::ShortBreak => "Break",
            Phase::LongBreak => "Long Break",
        }
    }

    /// Next phase in the edit-mode cycle, not the countdown sequence.
    pub fn cycle(self) -> Self {
        match self {
            Phase::Work => Phase::ShortBreak,
            Phase::ShortBreak => Phase::LongBreak,
            Phase::LongBreak => Phase::Work,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerStatus {
    Running,
    Paused,
    /// Only held inside the tick that ends a phase.
    Finished,
    /// Entered once by quit; nothing moves afterwards.
    Retired,
}

/// Configured length of each phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseDurations {
    pub work: Duration,
    pub short_break: Duration,
    pub long_break: Duration,
}

impl PhaseDurations {
    pub fn from_minutes(work: u32, short_break: u32, long_break: u32) -> Result<Self, TimerError> {
        Ok(Self {
            work: checked_minutes(work)?,
            short_break: checked_minutes(short_break)?,
            long_break: checked_minutes(long_break)?,
        })
    }

    /// Second-scale phases for trying the full cycle by hand.
    pub fn dev() -> Self {
        Self {
            work: Duration::from_secs(5),
            short_break: Duration::from_secs(3),
            long_break: Duration::from_secs(5),
        }
    }

    pub fn get(&self, phase: Phase) -> Duration {
        match phase {
            Phase::Work => self.work,
            Phase::ShortBreak => self.short_break,
            Phase::LongBreak => self.long_break,
        }
    }

    pub fn set(&mut self, phase: Phase, duration: Duration) {
        match phase {
            Phase::Work => self.work = duration,
            Phase::ShortBreak => self.short_break = duration,
            Phase::LongBreak => self.long_break = duration,
        }
    }

    pub fn minutes(&self, phase: Phase) -> u32 {
        (self.get(phase).as_secs() / 60) as u32
    }
}

impl Default for PhaseDurations {
    fn default() -> Self {
        Self {
            work: Duration::from_secs(25 * 60),
            short_break: Duration::from_secs(5 * 60),
            long_break: Duration::from_secs(15 * 60),
        }
    }
}

fn checked_minutes(minutes: u32) -> Result<Duration, TimerError> {
    if (MIN_MINUTES..=MAX_MINUTES).contains(&minutes) {
        Ok(Duration::from_secs(u64::from(minutes) * 60))
    } else {
        Err(TimerError::DurationOutOfRange { minutes })
    }
}
