use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use focus_core::{
    Digit, EditPolicy, Phase, PhaseEnd, TimerError, TimerHandle, TimerSnapshot, TimerStatus,
};
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub const BLINK_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ToggleHelp,
    ToggleEdit,
    Escape,
    StartStop,
    Reset,
    Quit,
    NextEditPhase,
    SelectDigit(Digit),
    Adjust(i32),
}

impl Action {
    pub fn from_key(key: KeyEvent) -> Option<Self> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return matches!(key.code, KeyCode::Char('c')).then_some(Action::Quit);
        }
        let action = match key.code {
            KeyCode::Char('?') => Action::ToggleHelp,
            KeyCode::Esc => Action::Escape,
            KeyCode::Char(' ') => Action::StartStop,
            KeyCode::Tab => Action::NextEditPhase,
            KeyCode::Left => Action::SelectDigit(Digit::Tens),
            KeyCode::Right => Action::SelectDigit(Digit::Units),
            KeyCode::Up => Action::Adjust(1),
            KeyCode::Down => Action::Adjust(-1),
            KeyCode::Char(c) => match c.to_ascii_lowercase() {
                'e' => Action::ToggleEdit,
                'r' => Action::Reset,
                'q' => Action::Quit,
                'h' => Action::SelectDigit(Digit::Tens),
                'l' => Action::SelectDigit(Digit::Units),
                'k' => Action::Adjust(1),
                'j' => Action::Adjust(-1),
                _ => return None,
            },
            _ => return None,
        };
        Some(action)
    }
}

/// UI-only state; none of it reaches the timer.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub edit_mode: bool,
    pub help_mode: bool,
    pub edit_phase: Phase,
    pub digit: Digit,
    pub blink_on: bool,
    pub last_blink: Instant,
}

impl ViewState {
    pub fn new(now: Instant) -> Self {
        Self {
            edit_mode: false,
            help_mode: false,
            edit_phase: Phase::Work,
            digit: Digit::Tens,
            blink_on: true,
            last_blink: now,
        }
    }

    fn enter_edit(&mut self, phase: Phase, now: Instant) {
        self.edit_mode = true;
        self.edit_phase = phase;
        self.digit = Digit::Tens;
        self.blink_on = true;
        self.last_blink = now;
    }

    /// Flips the blink phase once `BLINK_INTERVAL` has passed.
    pub fn blink(&mut self, now: Instant) {
        if self.edit_mode && now.saturating_duration_since(self.last_blink) >= BLINK_INTERVAL {
            self.blink_on = !self.blink_on;
            self.last_blink = now;
        }
    }

    /// Text for the big clock: the countdown, or `MM:00` of the edited
    /// phase with the selected digit blanked during the off half of a blink.
    pub fn clock_text(&self, snapshot: &TimerSnapshot, policy: EditPolicy) -> String {
        if !self.edit_mode {
            return snapshot.format_time();
        }
        let minutes = snapshot.minutes_for(self.edit_phase);
        let mut tens = (minutes / 10).to_string();
        let mut units = (minutes % 10).to_string();
        if !self.blink_on {
            match (policy, self.digit) {
                (EditPolicy::Step, _) => {
                    tens = " ".to_string();
                    units = " ".to_string();
                }
                (EditPolicy::Digit, Digit::Tens) => tens = " ".to_string(),
                (EditPolicy::Digit, Digit::Units) => units = " ".to_string(),
            }
        }
        format!("{tens}{units}:00")
    }
}

pub struct App {
    timer: TimerHandle,
    snapshot: TimerSnapshot,
    view: ViewState,
    policy: EditPolicy,
    pub should_quit: bool,
}

impl App {
    /// Takes over a freshly spawned timer and starts the first phase.
    pub async fn new(
        timer: TimerHandle,
        policy: EditPolicy,
        now: Instant,
    ) -> Result<Self, TimerError> {
        let snapshot = timer.start().await?;
        info!(phase = ?snapshot.phase, "timer started");
        Ok(Self {
            timer,
            snapshot,
            view: ViewState::new(now),
            policy,
            should_quit: false,
        })
    }

    pub fn snapshot(&self) -> &TimerSnapshot {
        &self.snapshot
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn policy(&self) -> EditPolicy {
        self.policy
    }

    pub async fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Result<(), TimerError> {
        match Action::from_key(key) {
            Some(action) => self.dispatch(action, now).await,
            None => Ok(()),
        }
    }

    pub async fn dispatch(&mut self, action: Action, now: Instant) -> Result<(), TimerError> {
        debug!(?action, "key action");
        match action {
            Action::ToggleHelp => {
                if self.view.help_mode {
                    self.view.help_mode = false;
                    self.view.edit_mode = false;
                } else {
                    self.view.help_mode = true;
                }
            }
            Action::ToggleEdit => {
                if self.view.help_mode {
                    return Ok(());
                }
                if self.view.edit_mode {
                    self.view.edit_mode = false;
                } else {
                    self.view.enter_edit(self.snapshot.phase, now);
                }
            }
            Action::Escape => {
                if self.view.help_mode {
                    self.view.help_mode = false;
                } else if self.view.edit_mode {
                    self.view.edit_mode = false;
                }
            }
            Action::StartStop => match self.snapshot.status {
                TimerStatus::Running => self.snapshot = self.timer.pause().await?,
                TimerStatus::Paused => self.snapshot = self.timer.start().await?,
                TimerStatus::Finished | TimerStatus::Retired => {}
            },
            Action::Reset => self.snapshot = self.timer.reset().await?,
            Action::Quit => {
                match self.timer.quit().await {
                    Ok(snapshot) => self.snapshot = snapshot,
                    Err(TimerError::Retired) => {}
                    Err(e) => return Err(e),
                }
                info!("quit requested");
                self.should_quit = true;
            }
            _ if !self.editing() => {}
            Action::NextEditPhase => {
                self.view.edit_phase = self.view.edit_phase.cycle();
                self.view.digit = Digit::Tens;
            }
            Action::SelectDigit(digit) => {
                if self.policy == EditPolicy::Digit {
                    self.view.digit = digit;
                }
            }
            Action::Adjust(direction) => {
                self.snapshot = self
                    .timer
                    .adjust(self.view.edit_phase, self.policy, self.view.digit, direction)
                    .await?;
            }
        }
        Ok(())
    }

    fn editing(&self) -> bool {
        self.view.edit_mode && !self.view.help_mode
    }

    pub fn on_render_tick(&mut self, now: Instant) {
        self.view.blink(now);
    }

    /// Picks up whatever the timer task published last.
    pub fn refresh(&mut self) {
        self.snapshot = self.timer.snapshot();
    }

    pub async fn timer_changed(&mut self) -> Result<(), TimerError> {
        self.snapshot = self.timer.changed().await?;
        Ok(())
    }

    pub fn on_phase_end(&mut self, end: PhaseEnd) {
        info!(ended = ?end.ended, next = ?end.next, session = end.session, "phase complete");
        self.refresh();
    }

    pub fn clock_text(&self) -> String {
        self.view.clock_text(&self.snapshot, self.policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventKind;
    use focus_core::PhaseDurations;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    async fn app_with(policy: EditPolicy) -> (App, Instant) {
        let now = Instant::now();
        let (timer, _ends) = focus_core::spawn(PhaseDurations::default());
        let app = App::new(timer, policy, now).await.unwrap();
        (app, now)
    }

    #[test]
    fn keys_map_to_actions() {
        assert_eq!(Action::from_key(key(KeyCode::Char(' '))), Some(Action::StartStop));
        assert_eq!(Action::from_key(key(KeyCode::Char('R'))), Some(Action::Reset));
        assert_eq!(Action::from_key(key(KeyCode::Char('E'))), Some(Action::ToggleEdit));
        assert_eq!(Action::from_key(key(KeyCode::Up)), Some(Action::Adjust(1)));
        assert_eq!(Action::from_key(key(KeyCode::Char('j'))), Some(Action::Adjust(-1)));
        assert_eq!(
            Action::from_key(key(KeyCode::Char('l'))),
            Some(Action::SelectDigit(Digit::Units))
        );
        assert_eq!(
            Action::from_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Action::Quit)
        );
        assert_eq!(Action::from_key(key(KeyCode::Char('x'))), None);
        assert_eq!(
            Action::from_key(KeyEvent::new_with_kind(
                KeyCode::Char('?'),
                KeyModifiers::NONE,
                KeyEventKind::Press
            )),
            Some(Action::ToggleHelp)
        );
    }

    #[test]
    fn blink_flips_every_half_second_in_edit_mode() {
        let start = Instant::now();
        let mut view = ViewState::new(start);
        view.blink(start + Duration::from_secs(1));
        assert!(view.blink_on, "no blinking outside edit mode");

        view.enter_edit(Phase::Work, start);
        view.blink(start + Duration::from_millis(499));
        assert!(view.blink_on);
        view.blink(start + Duration::from_millis(500));
        assert!(!view.blink_on);
        view.blink(start + Duration::from_millis(700));
        assert!(!view.blink_on);
        view.blink(start + Duration::from_millis(1000));
        assert!(view.blink_on);
    }

    #[test]
    fn clock_text_blanks_the_selected_digit() {
        let snapshot = TimerSnapshot::default();
        let mut view = ViewState::new(Instant::now());
        assert_eq!(view.clock_text(&snapshot, EditPolicy::Digit), "25:00");

        view.edit_mode = true;
        view.edit_phase = Phase::LongBreak;
        assert_eq!(view.clock_text(&snapshot, EditPolicy::Digit), "15:00");

        view.blink_on = false;
        assert_eq!(view.clock_text(&snapshot, EditPolicy::Digit), " 5:00");
        view.digit = Digit::Units;
        assert_eq!(view.clock_text(&snapshot, EditPolicy::Digit), "1 :00");
        assert_eq!(view.clock_text(&snapshot, EditPolicy::Step), "  :00");
    }

    #[tokio::test(start_paused = true)]
    async fn app_starts_the_timer() {
        let (app, _) = app_with(EditPolicy::Digit).await;
        assert_eq!(app.snapshot().status, TimerStatus::Running);
        assert_eq!(app.snapshot().phase, Phase::Work);
    }

    #[tokio::test(start_paused = true)]
    async fn space_toggles_between_running_and_paused() {
        let (mut app, now) = app_with(EditPolicy::Digit).await;
        app.handle_key(key(KeyCode::Char(' ')), now).await.unwrap();
        assert_eq!(app.snapshot().status, TimerStatus::Paused);
        app.handle_key(key(KeyCode::Char(' ')), now).await.unwrap();
        assert_eq!(app.snapshot().status, TimerStatus::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_works_in_edit_mode() {
        let (mut app, now) = app_with(EditPolicy::Digit).await;
        tokio::time::sleep(Duration::from_millis(3500)).await;
        app.refresh();
        assert_eq!(app.snapshot().remaining, Duration::from_secs(25 * 60 - 3));

        app.dispatch(Action::ToggleEdit, now).await.unwrap();
        app.dispatch(Action::Reset, now).await.unwrap();
        assert_eq!(app.snapshot().status, TimerStatus::Paused);
        assert_eq!(app.snapshot().remaining, Duration::from_secs(25 * 60));
        assert!(app.view().edit_mode);
    }

    #[tokio::test(start_paused = true)]
    async fn entering_edit_mode_targets_active_phase() {
        let (mut app, now) = app_with(EditPolicy::Digit).await;
        app.dispatch(Action::ToggleEdit, now).await.unwrap();
        let view = app.view();
        assert!(view.edit_mode);
        assert_eq!(view.edit_phase, Phase::Work);
        assert_eq!(view.digit, Digit::Tens);
        assert!(view.blink_on);

        app.dispatch(Action::SelectDigit(Digit::Units), now).await.unwrap();
        app.dispatch(Action::NextEditPhase, now).await.unwrap();
        assert_eq!(app.view().edit_phase, Phase::ShortBreak);
        assert_eq!(app.view().digit, Digit::Tens);

        app.dispatch(Action::ToggleEdit, now).await.unwrap();
        assert!(!app.view().edit_mode);
    }

    #[tokio::test(start_paused = true)]
    async fn digit_edits_commit_live() {
        let (mut app, now) = app_with(EditPolicy::Digit).await;
        app.dispatch(Action::ToggleEdit, now).await.unwrap();

        app.dispatch(Action::Adjust(-1), now).await.unwrap();
        assert_eq!(app.snapshot().minutes_for(Phase::Work), 15);
        assert_eq!(app.snapshot().remaining, Duration::from_secs(15 * 60));

        app.dispatch(Action::SelectDigit(Digit::Units), now).await.unwrap();
        app.dispatch(Action::Adjust(1), now).await.unwrap();
        assert_eq!(app.snapshot().minutes_for(Phase::Work), 16);

        // leaving edit mode keeps the new duration
        app.dispatch(Action::Escape, now).await.unwrap();
        assert!(!app.view().edit_mode);
        assert_eq!(app.snapshot().minutes_for(Phase::Work), 16);
    }

    #[tokio::test(start_paused = true)]
    async fn step_policy_ignores_digit_selection() {
        let (mut app, now) = app_with(EditPolicy::Step).await;
        app.dispatch(Action::ToggleEdit, now).await.unwrap();
        app.dispatch(Action::NextEditPhase, now).await.unwrap();
        app.dispatch(Action::SelectDigit(Digit::Units), now).await.unwrap();
        assert_eq!(app.view().digit, Digit::Tens);

        app.dispatch(Action::Adjust(-1), now).await.unwrap();
        assert_eq!(app.snapshot().minutes_for(Phase::ShortBreak), 60);
        // the running Work phase is untouched
        assert_eq!(app.snapshot().remaining, Duration::from_secs(25 * 60));
    }

    #[tokio::test(start_paused = true)]
    async fn edit_keys_do_nothing_outside_edit_mode() {
        let (mut app, now) = app_with(EditPolicy::Digit).await;
        app.dispatch(Action::Adjust(1), now).await.unwrap();
        app.dispatch(Action::NextEditPhase, now).await.unwrap();
        assert_eq!(app.snapshot().minutes_for(Phase::Work), 25);
        assert_eq!(app.view().edit_phase, Phase::Work);
    }

    #[tokio::test(start_paused = true)]
    async fn help_overlay_and_escape() {
        let (mut app, now) = app_with(EditPolicy::Digit).await;
        app.dispatch(Action::ToggleEdit, now).await.unwrap();
        app.dispatch(Action::ToggleHelp, now).await.unwrap();
        assert!(app.view().help_mode);

        // edit keys and the edit toggle are ignored under the overlay
        app.dispatch(Action::Adjust(1), now).await.unwrap();
        app.dispatch(Action::ToggleEdit, now).await.unwrap();
        assert_eq!(app.snapshot().minutes_for(Phase::Work), 25);
        assert!(app.view().edit_mode);

        // escape peels one layer at a time
        app.dispatch(Action::Escape, now).await.unwrap();
        assert!(!app.view().help_mode);
        assert!(app.view().edit_mode);
        app.dispatch(Action::Escape, now).await.unwrap();
        assert!(!app.view().edit_mode);
        app.dispatch(Action::Escape, now).await.unwrap();
        assert!(!app.view().edit_mode && !app.view().help_mode);
    }

    #[tokio::test(start_paused = true)]
    async fn closing_help_with_its_key_leaves_every_mode() {
        let (mut app, now) = app_with(EditPolicy::Digit).await;
        app.dispatch(Action::ToggleEdit, now).await.unwrap();
        app.dispatch(Action::ToggleHelp, now).await.unwrap();
        app.dispatch(Action::ToggleHelp, now).await.unwrap();
        assert!(!app.view().help_mode);
        assert!(!app.view().edit_mode);
    }

    #[tokio::test(start_paused = true)]
    async fn quit_retires_timer_and_stops_loop() {
        let (mut app, now) = app_with(EditPolicy::Digit).await;
        app.handle_key(key(KeyCode::Char('q')), now).await.unwrap();
        assert!(app.should_quit);
        assert_eq!(app.snapshot().status, TimerStatus::Retired);

        // a second quit is harmless
        app.dispatch(Action::Quit, now).await.unwrap();
        assert!(app.should_quit);
        // start/stop against a retired timer does nothing
        app.dispatch(Action::StartStop, now).await.unwrap();
    }
}
