use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimerError {
    #[error("phase duration of {minutes} minutes is outside 1..=60")]
    DurationOutOfRange { minutes: u32 },

    #[error("timer has been shut down")]
    Retired,
}
