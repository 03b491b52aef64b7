//! Timer task
//!
//! A single tokio task owns the `PhaseTimer`. Callers talk to it through a
//! `TimerHandle`: every command is answered with the snapshot taken right
//! after it was applied, the latest snapshot is also kept on a watch channel,
//! and phase ends are delivered on their own channel.

use std::future;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::edit::{Digit, EditPolicy};
use crate::error::TimerError;
use crate::phase::{Phase, PhaseDurations};
use crate::timer::{PhaseEnd, PhaseTimer, TimerSnapshot};

const TICK: Duration = Duration::from_secs(1);
const COMMAND_BUFFER: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Command {
    Start,
    Pause,
    Reset,
    Quit,
    SetMinutes {
        phase: Phase,
        minutes: u32,
    },
    Adjust {
        phase: Phase,
        policy: EditPolicy,
        digit: Digit,
        direction: i32,
    },
}

struct Request {
    command: Command,
    reply: oneshot::Sender<TimerSnapshot>,
}

/// Cheap to clone; all clones drive the same timer.
#[derive(Clone)]
pub struct TimerHandle {
    commands: mpsc::Sender<Request>,
    snapshots: watch::Receiver<TimerSnapshot>,
}

/// Starts the timer task on the current runtime. The timer begins paused.
pub fn spawn(durations: PhaseDurations) -> (TimerHandle, mpsc::UnboundedReceiver<PhaseEnd>) {
    let timer = PhaseTimer::new(durations);
    let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
    let (snapshot_tx, snapshot_rx) = watch::channel(timer.snapshot());
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    let task = TimerTask {
        timer,
        ticker: None,
        commands: command_rx,
        snapshots: snapshot_tx,
        phase_ends: event_tx,
    };
    tokio::spawn(task.run());

    let handle = TimerHandle {
        commands: command_tx,
        snapshots: snapshot_rx,
    };
    (handle, event_rx)
}

impl TimerHandle {
    pub async fn start(&self) -> Result<TimerSnapshot, TimerError> {
        self.send(Command::Start).await
    }

    pub async fn pause(&self) -> Result<TimerSnapshot, TimerError> {
        self.send(Command::Pause).await
    }

    pub async fn reset(&self) -> Result<TimerSnapshot, TimerError> {
        self.send(Command::Reset).await
    }

    /// Retires the timer and stops its task. Only the first call succeeds.
    pub async fn quit(&self) -> Result<TimerSnapshot, TimerError> {
        self.send(Command::Quit).await
    }

    /// Writes a duration as is; range checks belong to the caller.
    pub async fn set_minutes(
        &self,
        phase: Phase,
        minutes: u32,
    ) -> Result<TimerSnapshot, TimerError> {
        self.send(Command::SetMinutes { phase, minutes }).await
    }

    /// Applies one edit step to `phase`. Edits that would leave 1..=60 are
    /// dropped and the returned snapshot shows the unchanged duration.
    pub async fn adjust(
        &self,
        phase: Phase,
        policy: EditPolicy,
        digit: Digit,
        direction: i32,
    ) -> Result<TimerSnapshot, TimerError> {
        self.send(Command::Adjust {
            phase,
            policy,
            digit,
            direction,
        })
        .await
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Waits for the next published snapshot.
    pub async fn changed(&mut self) -> Result<TimerSnapshot, TimerError> {
        self.snapshots
            .changed()
            .await
            .map_err(|_| TimerError::Retired)?;
        Ok(self.snapshots.borrow_and_update().clone())
    }

    async fn send(&self, command: Command) -> Result<TimerSnapshot, TimerError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Request { command, reply })
            .await
            .map_err(|_| TimerError::Retired)?;
        response.await.map_err(|_| TimerError::Retired)
    }
}

struct TimerTask {
    timer: PhaseTimer,
    ticker: Option<Interval>,
    commands: mpsc::Receiver<Request>,
    snapshots: watch::Sender<TimerSnapshot>,
    phase_ends: mpsc::UnboundedSender<PhaseEnd>,
}

impl TimerTask {
    async fn run(mut self) {
        info!("timer task started");
        loop {
            tokio::select! {
                request = self.commands.recv() => {
                    let Some(Request { command, reply }) = request else {
                        // every handle is gone
                        break;
                    };
                    self.apply(command);
                    let snapshot = self.timer.snapshot();
                    let _ = reply.send(snapshot);
                    if self.timer.is_retired() {
                        break;
                    }
                }
                _ = next_tick(&mut self.ticker) => {
                    if let Some(end) = self.timer.tick() {
                        info!(
                            ended = ?end.ended,
                            next = ?end.next,
                            session = end.session,
                            "phase ended"
                        );
                        let _ = self.phase_ends.send(end);
                    }
                    self.publish();
                }
            }
        }
        self.ticker = None;
        info!("timer task stopped");
    }

    fn apply(&mut self, command: Command) {
        debug!(?command, "timer command");
        match command {
            Command::Start => {
                if self.timer.start() {
                    // first tick lands a full second after starting
                    let mut ticker = time::interval_at(Instant::now() + TICK, TICK);
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    self.ticker = Some(ticker);
                }
            }
            Command::Pause => {
                if self.timer.pause() {
                    self.ticker = None;
                }
            }
            Command::Reset => {
                self.timer.reset();
                self.ticker = None;
            }
            Command::Quit => {
                if self.timer.quit() {
                    info!("timer retired");
                }
                self.ticker = None;
            }
            Command::SetMinutes { phase, minutes } => {
                self.timer.set_minutes_for(phase, minutes);
            }
            Command::Adjust {
                phase,
                policy,
                digit,
                direction,
            } => {
                let current = self.timer.minutes_for(phase);
                match policy.apply(current, digit, direction) {
                    Some(minutes) => {
                        debug!(?phase, from = current, to = minutes, "duration edited");
                        self.timer.set_minutes_for(phase, minutes);
                    }
                    None => debug!(?phase, current, "edit out of range, ignored"),
                }
            }
        }
        self.publish();
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.timer.snapshot());
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::TimerStatus;
    use tokio::time::sleep;

    fn seconds(work: u64, short_break: u64, long_break: u64) -> PhaseDurations {
        PhaseDurations {
            work: Duration::from_secs(work),
            short_break: Duration::from_secs(short_break),
            long_break: Duration::from_secs(long_break),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn counts_down_once_per_second() {
        let (timer, _ends) = spawn(seconds(10, 5, 5));
        let snapshot = timer.start().await.unwrap();
        assert_eq!(snapshot.status, TimerStatus::Running);
        assert_eq!(snapshot.remaining, Duration::from_secs(10));

        sleep(Duration::from_millis(3500)).await;
        assert_eq!(timer.snapshot().remaining, Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn pause_freezes_remaining() {
        let (timer, _ends) = spawn(seconds(10, 5, 5));
        timer.start().await.unwrap();
        sleep(Duration::from_millis(2500)).await;

        let paused = timer.pause().await.unwrap();
        assert_eq!(paused.status, TimerStatus::Paused);
        assert_eq!(paused.remaining, Duration::from_secs(8));

        sleep(Duration::from_secs(5)).await;
        assert_eq!(timer.snapshot().remaining, Duration::from_secs(8));

        // pausing again changes nothing
        assert_eq!(timer.pause().await.unwrap(), paused);
    }

    #[tokio::test(start_paused = true)]
    async fn phase_end_is_reported_and_next_phase_auto_starts() {
        let (timer, mut ends) = spawn(seconds(3, 2, 4));
        timer.start().await.unwrap();

        let end = ends.recv().await.unwrap();
        assert_eq!(end.ended, Phase::Work);
        assert_eq!(end.next, Phase::ShortBreak);

        let snapshot = timer.snapshot();
        assert_eq!(snapshot.phase, Phase::ShortBreak);
        assert_eq!(snapshot.status, TimerStatus::Running);
        assert_eq!(snapshot.remaining, Duration::from_secs(2));

        let end = ends.recv().await.unwrap();
        assert_eq!(end.ended, Phase::ShortBreak);
        assert_eq!(end.session, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn editing_active_phase_resets_remaining_at_once() {
        let (timer, _ends) = spawn(PhaseDurations::default());
        timer.start().await.unwrap();
        sleep(Duration::from_millis(4500)).await;

        let snapshot = timer.set_minutes(Phase::Work, 10).await.unwrap();
        assert_eq!(snapshot.remaining, Duration::from_secs(600));
        assert_eq!(snapshot.status, TimerStatus::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn adjust_rejects_out_of_range_edits() {
        let (timer, _ends) = spawn(PhaseDurations::from_minutes(10, 5, 15).unwrap());

        let snapshot = timer
            .adjust(Phase::Work, EditPolicy::Digit, Digit::Tens, -1)
            .await
            .unwrap();
        assert_eq!(snapshot.minutes_for(Phase::Work), 10);

        let snapshot = timer
            .adjust(Phase::ShortBreak, EditPolicy::Digit, Digit::Units, 1)
            .await
            .unwrap();
        assert_eq!(snapshot.minutes_for(Phase::ShortBreak), 6);

        let snapshot = timer
            .adjust(Phase::LongBreak, EditPolicy::Step, Digit::Tens, -1)
            .await
            .unwrap();
        assert_eq!(snapshot.minutes_for(Phase::LongBreak), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_stops_the_countdown() {
        let (timer, _ends) = spawn(seconds(10, 5, 5));
        timer.start().await.unwrap();
        sleep(Duration::from_millis(3500)).await;

        let snapshot = timer.reset().await.unwrap();
        assert_eq!(snapshot.status, TimerStatus::Paused);
        assert_eq!(snapshot.remaining, Duration::from_secs(10));

        sleep(Duration::from_secs(3)).await;
        assert_eq!(timer.snapshot().remaining, Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn quit_ends_the_task_exactly_once() {
        let (mut timer, mut ends) = spawn(seconds(2, 2, 2));
        timer.start().await.unwrap();

        let retired = timer.quit().await.unwrap();
        assert_eq!(retired.status, TimerStatus::Retired);

        sleep(Duration::from_secs(10)).await;
        assert_eq!(timer.snapshot().remaining, Duration::from_secs(2));
        assert!(ends.recv().await.is_none());

        assert_eq!(timer.quit().await, Err(TimerError::Retired));
        assert_eq!(timer.start().await, Err(TimerError::Retired));

        // the final snapshot is still delivered, then the channel reports closed
        let last = timer.changed().await.unwrap();
        assert_eq!(last.status, TimerStatus::Retired);
        assert_eq!(timer.changed().await, Err(TimerError::Retired));
    }

    #[tokio::test(start_paused = true)]
    async fn changed_follows_the_countdown() {
        let (mut timer, _ends) = spawn(seconds(5, 5, 5));
        timer.start().await.unwrap();
        // consume the snapshot published by start
        let _ = timer.changed().await.unwrap();

        let next = timer.changed().await.unwrap();
        assert_eq!(next.remaining, Duration::from_secs(4));
    }
}
