//! Duration editing rules
//!
//! Two policies exist and only one is active at a time. `Digit` edits the
//! tens or units digit of the minute count with wraparound, `Step` moves the
//! whole value by five minutes. Both keep durations in 1..=60.

use serde::Deserialize;

use crate::phase::{MAX_MINUTES, MIN_MINUTES};

const STEP_MINUTES: i32 = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditPolicy {
    #[default]
    Digit,
    Step,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Digit {
    #[default]
    Tens,
    Units,
}

impl EditPolicy {
    /// New minute value for one key press in `direction` (+1 or -1), or
    /// `None` when the edit would leave the valid range.
    pub fn apply(self, minutes: u32, digit: Digit, direction: i32) -> Option<u32> {
        let raw = match self {
            EditPolicy::Digit => adjust_digit(minutes, digit, direction),
            EditPolicy::Step => adjust_step(minutes, direction * STEP_MINUTES) as i32,
        };
        validated(raw)
    }
}

/// Raw digit edit. The result can fall outside 1..=60 (e.g. 10 with the tens
/// digit lowered gives 0); callers must reject those.
pub fn adjust_digit(minutes: u32, digit: Digit, delta: i32) -> i32 {
    let tens = (minutes / 10) as i32;
    let mut units = (minutes % 10) as i32;

    match digit {
        Digit::Tens => {
            let mut new_tens = tens + delta;
            if new_tens < 0 {
                new_tens = 6;
                units = 0;
            } else if new_tens > 6 {
                new_tens = 0;
            } else if new_tens == 6 {
                // 60 is the only value with a six in the tens place
                units = 0;
            }
            new_tens * 10 + units
        }
        Digit::Units => {
            if tens == 6 {
                return 60;
            }
            let mut new_units = units + delta;
            if new_units < 0 {
                if tens == 0 {
                    return 60;
                }
                new_units = 9;
            } else if new_units > 9 {
                if tens == 5 && new_units == 10 {
                    return 60;
                }
                new_units = 0;
            }
            tens * 10 + new_units
        }
    }
}

/// Flat step with wraparound over 1..=60; there is no zero.
pub fn adjust_step(minutes: u32, delta: i32) -> u32 {
    let span = (MAX_MINUTES - MIN_MINUTES + 1) as i32;
    let offset = (minutes as i32 - MIN_MINUTES as i32 + delta).rem_euclid(span);
    offset as u32 + MIN_MINUTES
}

fn validated(raw: i32) -> Option<u32> {
    u32::try_from(raw)
        .ok()
        .filter(|m| (MIN_MINUTES..=MAX_MINUTES).contains(m))
}
