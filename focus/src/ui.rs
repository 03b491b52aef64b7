use crate::app::ViewState;
use crate::config::{Icons, Theme};
use focus_core::{glyph, EditPolicy, Phase, PhaseDurations, TimerSnapshot, TimerStatus};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Gauge, Paragraph},
    Frame,
};

/// Box around the clock; wide enough for the longest controls line.
const PANEL_WIDTH: u16 = 68;
const PANEL_HEIGHT: u16 = 15;

/// Everything a frame depends on.
pub struct Screen<'a> {
    pub snapshot: &'a TimerSnapshot,
    pub view: &'a ViewState,
    pub clock: &'a str,
    pub policy: EditPolicy,
    pub theme: &'a Theme,
    pub icons: &'a Icons,
}

pub fn draw(f: &mut Frame, screen: &Screen) {
    let area = f.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(PANEL_HEIGHT), Constraint::Length(1)])
        .split(area);

    draw_panel(f, fixed_centered_rect(PANEL_WIDTH, PANEL_HEIGHT, chunks[0]), screen);
    draw_status_bar(f, chunks[1], screen);

    if screen.view.help_mode {
        draw_help_overlay(f, screen.theme);
    }
}

fn draw_panel(f: &mut Frame, area: Rect, screen: &Screen) {
    let theme = screen.theme;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.gray));
    let inner_area = block.inner(area);
    f.render_widget(block, area);

    let v_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(5),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
        ])
        .split(inner_area);

    draw_phase_line(f, v_chunks[0], screen);
    draw_clock(f, v_chunks[2], screen);
    if !screen.view.edit_mode {
        f.render_widget(
            Gauge::default()
                .gauge_style(Style::default().fg(theme.blue).bg(theme.black))
                .label("")
                .ratio(screen.snapshot.progress()),
            v_chunks[4],
        );
    }
    draw_controls(f, v_chunks[6], screen);
}

fn draw_phase_line(f: &mut Frame, area: Rect, screen: &Screen) {
    let theme = screen.theme;
    let (text, phase) = if screen.view.edit_mode {
        (
            format!("EDIT: {} Duration", screen.view.edit_phase.label()),
            screen.view.edit_phase,
        )
    } else {
        (screen.snapshot.label(), screen.snapshot.phase)
    };
    let color = match phase {
        Phase::Work => theme.blue,
        Phase::ShortBreak | Phase::LongBreak => theme.green,
    };
    f.render_widget(
        Paragraph::new(Span::styled(
            text,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center),
        area,
    );
}

fn draw_clock(f: &mut Frame, area: Rect, screen: &Screen) {
    let theme = screen.theme;
    let color = if screen.view.edit_mode {
        theme.green
    } else {
        match screen.snapshot.status {
            TimerStatus::Running | TimerStatus::Finished => theme.yellow,
            TimerStatus::Paused | TimerStatus::Retired => theme.gray,
        }
    };
    f.render_widget(
        Paragraph::new(glyph::render(screen.clock))
            .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center),
        area,
    );
}

fn draw_controls(f: &mut Frame, area: Rect, screen: &Screen) {
    let text = if !screen.view.edit_mode {
        "[Space] Start/Pause  [R] Reset  [E] Edit  [?] Help  [Q] Quit"
    } else if screen.policy == EditPolicy::Digit {
        "[Tab] Phase  [H/L] Digit  [J/K] Adjust  [E] Exit  [Q] Quit"
    } else {
        "[Tab] Phase  [J/K] ±5 min  [E] Exit  [Q] Quit"
    };
    f.render_widget(
        Paragraph::new(text)
            .style(Style::default().fg(screen.theme.foreground))
            .alignment(Alignment::Center),
        area,
    );
}

fn draw_status_bar(f: &mut Frame, area: Rect, screen: &Screen) {
    let theme = screen.theme;
    let icons = screen.icons;
    let (mode_text, mode_color) = if screen.view.help_mode {
        ("HELP", theme.magenta)
    } else if screen.view.edit_mode {
        ("EDIT", theme.green)
    } else {
        ("NORMAL", theme.blue)
    };
    let state_icon = match screen.snapshot.status {
        TimerStatus::Running | TimerStatus::Finished => &icons.running,
        TimerStatus::Paused | TimerStatus::Retired => &icons.paused,
    };
    let info = format!(
        " {} {} {} session {}/{} {} {}",
        state_icon,
        screen.snapshot.phase.label(),
        icons.separator,
        screen.snapshot.session,
        screen.snapshot.max_sessions,
        icons.separator,
        durations_summary(&screen.snapshot.durations),
    );
    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(
                format!(" {} ", mode_text),
                Style::default()
                    .bg(mode_color)
                    .fg(theme.background)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(info),
        ]))
        .block(Block::default().style(Style::default().bg(theme.black).fg(theme.gray))),
        area,
    );
}

/// `25/5/15 min`, or seconds when any phase is shorter than a minute.
fn durations_summary(durations: &PhaseDurations) -> String {
    let phases = [Phase::Work, Phase::ShortBreak, Phase::LongBreak];
    if phases.iter().any(|&p| durations.get(p).as_secs() < 60) {
        let secs: Vec<String> = phases
            .iter()
            .map(|&p| durations.get(p).as_secs().to_string())
            .collect();
        format!("{} s", secs.join("/"))
    } else {
        let mins: Vec<String> = phases.iter().map(|&p| durations.minutes(p).to_string()).collect();
        format!("{} min", mins.join("/"))
    }
}

const SHORTCUTS: [(&str, &[(&str, &str)]); 2] = [
    (
        "General",
        &[
            ("?", "Toggle help"),
            ("Space", "Start/stop timer"),
            ("R", "Reset current phase"),
            ("E", "Toggle edit mode"),
            ("Esc", "Leave help or edit mode"),
            ("Q", "Quit"),
        ],
    ),
    (
        "Edit mode",
        &[
            ("Tab", "Next phase"),
            ("H/←  L/→", "Select tens/units digit"),
            ("K/↑  J/↓", "Increase/decrease"),
        ],
    ),
];

fn draw_help_overlay(f: &mut Frame, theme: &Theme) {
    let area = centered_rect(60, 70, f.area());
    f.render_widget(Clear, area);

    let mut lines = Vec::new();
    for (section, keys) in SHORTCUTS {
        lines.push(Line::from(Span::styled(
            section,
            Style::default().fg(theme.blue).add_modifier(Modifier::BOLD),
        )));
        for (key, description) in keys {
            lines.push(Line::from(vec![
                Span::styled(format!("  {:<10}", key), Style::default().fg(theme.yellow)),
                Span::styled(*description, Style::default().fg(theme.foreground)),
            ]));
        }
        lines.push(Line::from(""));
    }

    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .title(" Help ")
                .borders(Borders::ALL)
                .border_type(BorderType::Double)
                .border_style(Style::default().fg(theme.magenta))
                .style(Style::default().bg(theme.background)),
        ),
        area,
    );
}

fn fixed_centered_rect(width: u16, height: u16, r: Rect) -> Rect {
    let width = width.min(r.width);
    let height = height.min(r.height);
    Rect {
        x: r.x + (r.width - width) / 2,
        y: r.y + (r.height - height) / 2,
        width,
        height,
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
