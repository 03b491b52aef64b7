use anyhow::{Context, Result};
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use directories::ProjectDirs;
use futures::StreamExt;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::fs::{self, OpenOptions};
use std::io::{self, IsTerminal, Stdout};
use std::panic;
use std::process::ExitCode;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod alerts;
mod app;
mod cli;
mod config;
mod ui;

use alerts::{AlertSink, Alerts};
use app::App;
use cli::Invocation;
use config::Config;
use ui::Screen;

/// Redraw cadence; also drives the edit-mode blink.
const RENDER_INTERVAL: Duration = Duration::from_millis(100);

#[tokio::main]
async fn main() -> ExitCode {
    if let Invocation::Exit(code) = cli::parse(std::env::args_os()) {
        return code;
    }

    if let Err(err) = run().await {
        println!("Error running program: {:#}", err);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn run() -> Result<()> {
    init_logging();

    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        anyhow::bail!("focus requires an interactive terminal (TTY)");
    }

    let config = config::load_config()?;
    let durations = config.durations()?;
    info!(?durations, dev_mode = config.timer.dev_mode, "starting focus");

    // Restore the terminal before the panic message is printed
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        restore_terminal();
        original_hook(panic_info);
    }));

    // Setup terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut terminal = undo_on_error(enter_alternate_screen, restore_terminal)?;

    let res = run_app(&mut terminal, &config, durations).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = &res {
        error!("{:#}", err);
    }
    info!("focus exited");
    res
}

async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    config: &Config,
    durations: focus_core::PhaseDurations,
) -> Result<()> {
    let (timer, mut phase_ends) = focus_core::spawn(durations);
    let alerts = Alerts::new(&config.alerts);
    let mut app = App::new(timer, config.timer.edit_policy, Instant::now()).await?;

    let mut events = EventStream::new();
    let mut render_tick = tokio::time::interval(RENDER_INTERVAL);

    loop {
        let clock = app.clock_text();
        terminal.draw(|f| {
            ui::draw(
                f,
                &Screen {
                    snapshot: app.snapshot(),
                    view: app.view(),
                    clock: &clock,
                    policy: app.policy(),
                    theme: &config.theme,
                    icons: &config.icons,
                },
            )
        })?;

        tokio::select! {
            maybe_event = events.next() => match maybe_event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    app.handle_key(key, Instant::now()).await?;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e).context("Failed to read terminal event"),
                None => break,
            },
            Some(end) = phase_ends.recv() => {
                alerts.phase_ended(end.ended);
                app.on_phase_end(end);
            }
            changed = app.timer_changed() => changed?,
            _ = render_tick.tick() => app.on_render_tick(Instant::now()),
        }

        if app.should_quit {
            break;
        }
    }

    alerts.close();
    Ok(())
}

fn enter_alternate_screen() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    Terminal::new(CrosstermBackend::new(stdout)).context("Failed to create terminal")
}

/// Best effort; used where the original error matters more.
fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}

/// Runs `setup`, calling `undo` before a failure is propagated.
fn undo_on_error<T>(setup: impl FnOnce() -> Result<T>, undo: impl FnOnce()) -> Result<T> {
    setup().inspect_err(|_| undo())
}

/// Logs go to a file because the terminal belongs to the UI.
fn init_logging() {
    let Some(proj_dirs) = ProjectDirs::from("com", "focus", "focus") else {
        return;
    };
    let log_dir = proj_dirs.data_local_dir();
    if fs::create_dir_all(log_dir).is_err() {
        return;
    }
    let Ok(file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("focus.log"))
    else {
        return;
    };

    let filter = EnvFilter::try_from_env("FOCUS_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}
