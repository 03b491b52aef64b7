//! Timer core shared by the focus TUI
//!
//! The pomodoro state machine lives here, together with the task that drives
//! it on a real clock, the duration editing rules and the block-letter clock
//! renderer. Nothing in this crate touches the terminal.

pub mod edit;
pub mod engine;
pub mod error;
pub mod glyph;
pub mod phase;
pub mod timer;

pub use edit::{adjust_digit, adjust_step, Digit, EditPolicy};
pub use engine::{spawn, TimerHandle};
pub use error::TimerError;
pub use phase::{
    Phase, PhaseDurations, TimerStatus, MAX_MINUTES, MAX_SESSIONS, MIN_MINUTES,
};
pub use timer::{PhaseEnd, PhaseTimer, TimerSnapshot};
