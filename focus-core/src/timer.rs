//! Pomodoro phase state machine
//!
//! `PhaseTimer` is a plain value: it only moves when `tick` is called. The
//! engine task calls it once per second while the timer is running.

use std::time::Duration;
use tracing::debug;

use crate::phase::{Phase, PhaseDurations, TimerStatus, MAX_SESSIONS};

const ONE_SECOND: Duration = Duration::from_secs(1);

/// Emitted by the tick that runs a phase down to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseEnd {
    pub ended: Phase,
    pub next: Phase,
    /// Session number after the transition.
    pub session: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhaseTimer {
    phase: Phase,
    status: TimerStatus,
    total: Duration,
    remaining: Duration,
    session: u32,
    durations: PhaseDurations,
}

impl PhaseTimer {
    /// New timer at the start of the first Work phase, paused.
    pub fn new(durations: PhaseDurations) -> Self {
        Self {
            phase: Phase::Work,
            status: TimerStatus::Paused,
            total: durations.work,
            remaining: durations.work,
            session: 1,
            durations,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn status(&self) -> TimerStatus {
        self.status
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    pub fn total(&self) -> Duration {
        self.total
    }

    pub fn session(&self) -> u32 {
        self.session
    }

    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    pub fn is_retired(&self) -> bool {
        self.status == TimerStatus::Retired
    }

    /// Returns whether the timer actually started.
    pub fn start(&mut self) -> bool {
        if self.status != TimerStatus::Paused {
            return false;
        }
        self.status = TimerStatus::Running;
        true
    }

    /// Returns whether the timer actually paused.
    pub fn pause(&mut self) -> bool {
        if self.status != TimerStatus::Running {
            return false;
        }
        self.status = TimerStatus::Paused;
        true
    }

    /// Rewinds the current phase to its full length and pauses.
    pub fn reset(&mut self) {
        if self.is_retired() {
            return;
        }
        self.status = TimerStatus::Paused;
        self.total = self.durations.get(self.phase);
        self.remaining = self.total;
    }

    /// Returns true only for the call that retires the timer.
    pub fn quit(&mut self) -> bool {
        if self.is_retired() {
            return false;
        }
        self.status = TimerStatus::Retired;
        true
    }

    /// Advances the countdown by one second.
    pub fn tick(&mut self) -> Option<PhaseEnd> {
        if !self.is_running() {
            return None;
        }
        self.remaining = self.remaining.saturating_sub(ONE_SECOND);
        if !self.remaining.is_zero() {
            return None;
        }

        self.status = TimerStatus::Finished;
        let ended = self.phase;
        self.advance();
        self.status = TimerStatus::Running;

        debug!(?ended, next = ?self.phase, session = self.session, "phase finished");
        Some(PhaseEnd {
            ended,
            next: self.phase,
            session: self.session,
        })
    }

    fn advance(&mut self) {
        match self.phase {
            Phase::Work if self.session >= MAX_SESSIONS => self.phase = Phase::LongBreak,
            Phase::Work => self.phase = Phase::ShortBreak,
            Phase::ShortBreak => {
                self.phase = Phase::Work;
                self.session += 1;
            }
            Phase::LongBreak => {
                self.phase = Phase::Work;
                self.session = 1;
            }
        }
        self.total = self.durations.get(self.phase);
        self.remaining = self.total;
    }

    pub fn durations(&self) -> PhaseDurations {
        self.durations
    }

    pub fn minutes_for(&self, phase: Phase) -> u32 {
        self.durations.minutes(phase)
    }

    /// Range checking is the caller's job. Editing the active phase takes
    /// effect at once, even mid-countdown.
    pub fn set_minutes_for(&mut self, phase: Phase, minutes: u32) {
        let duration = Duration::from_secs(u64::from(minutes) * 60);
        self.durations.set(phase, duration);
        if phase == self.phase {
            self.total = duration;
            self.remaining = duration;
        }
    }

    pub fn progress(&self) -> f64 {
        progress(self.total, self.remaining)
    }

    pub fn format_time(&self) -> String {
        format_clock(self.remaining)
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            phase: self.phase,
            status: self.status,
            total: self.total,
            remaining: self.remaining,
            session: self.session,
            max_sessions: MAX_SESSIONS,
            durations: self.durations,
        }
    }
}

/// Read-only copy of the timer handed to the UI.
#[derive(Debug, Clone, PartialEq)]
pub struct TimerSnapshot {
    pub phase: Phase,
    pub status: TimerStatus,
    pub total: Duration,
    pub remaining: Duration,
    pub session: u32,
    pub max_sessions: u32,
    pub durations: PhaseDurations,
}

impl TimerSnapshot {
    pub fn progress(&self) -> f64 {
        progress(self.total, self.remaining)
    }

    pub fn format_time(&self) -> String {
        format_clock(self.remaining)
    }

    pub fn minutes_for(&self, phase: Phase) -> u32 {
        self.durations.minutes(phase)
    }

    pub fn label(&self) -> String {
        match self.phase {
            Phase::Work => format!(
                "{} ({}/{})",
                self.phase.label(),
                self.session,
                self.max_sessions
            ),
            _ => self.phase.label().to_string(),
        }
    }
}

impl Default for TimerSnapshot {
    fn default() -> Self {
        PhaseTimer::new(PhaseDurations::default()).snapshot()
    }
}

fn progress(total: Duration, remaining: Duration) -> f64 {
    let total = total.as_secs_f64();
    if total > 0.0 {
        ((total - remaining.as_secs_f64()) / total).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn format_clock(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
