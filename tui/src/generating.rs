use deck_common::StatusKind;
use deck_core::{format_countdown, Action, PollingState, StatusTracker, StopReason};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Gauge, List, ListItem, Paragraph, Wrap},
};

use crate::app::App;
use crate::widgets::status_bar::StatusBar;

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];
const MAX_LOG_LINES: usize = 8;

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(6),
            Constraint::Min(3),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(f.area());

    let session = app
        .controller()
        .session()
        .map(|s| s.as_str().to_string())
        .unwrap_or_default();
    let started = app
        .started_at()
        .map(|t| format!("  started {}", t.format("%H:%M:%S")))
        .unwrap_or_default();
    f.render_widget(
        Paragraph::new(format!("Session {session}{started}"))
            .block(Block::default().title(" Generating ").borders(Borders::ALL)),
        chunks[0],
    );

    let Some(tracker) = app.controller().tracker() else {
        return;
    };
    let status = tracker.status();
    let percent = status.progress_percent();

    f.render_widget(
        Gauge::default()
            .block(Block::default().borders(Borders::ALL))
            .gauge_style(Style::default().fg(gauge_color(tracker)))
            .percent(percent)
            .label(format!("{percent}%")),
        chunks[1],
    );

    f.render_widget(
        Paragraph::new(detail_lines(tracker, app.ticks()))
            .block(Block::default().title(" Status ").borders(Borders::ALL))
            .wrap(Wrap { trim: true }),
        chunks[2],
    );

    let logs: Vec<ListItem> = status
        .logs
        .iter()
        .rev()
        .take(MAX_LOG_LINES)
        .map(|log| {
            let mut line = format!("{} [{}]", log.step_name, log.status);
            if let Some(ms) = log.duration {
                line.push_str(&format!(" {ms}ms"));
            }
            if let Some(err) = &log.error_message {
                line.push_str(&format!(" {err}"));
            }
            ListItem::new(line)
        })
        .collect();
    f.render_widget(
        List::new(logs).block(Block::default().title(" Steps ").borders(Borders::ALL)),
        chunks[3],
    );

    f.render_widget(
        Paragraph::new(banner(tracker, app))
            .block(Block::default().borders(Borders::ALL))
            .wrap(Wrap { trim: true }),
        chunks[4],
    );

    let hints = action_hints(&tracker.actions());
    let state = if tracker.is_active() { "Polling" } else { "Stopped" };
    f.render_widget(
        StatusBar::new("DECK", state, &hints).accent(gauge_color(tracker)),
        chunks[5],
    );
}

fn detail_lines(tracker: &StatusTracker, ticks: u64) -> Vec<Line<'static>> {
    let status = tracker.status();
    let spinner = if tracker.is_active() {
        SPINNER[(ticks % SPINNER.len() as u64) as usize]
    } else {
        " "
    };
    let mut lines = vec![Line::from(vec![
        Span::raw(format!("{spinner} ")),
        Span::styled(
            status.status.label(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(if status.current_step.is_empty() {
            String::new()
        } else {
            format!("  {}", status.current_step)
        }),
    ])];

    if status.total_slides > 0 {
        lines.push(Line::from(format!(
            "Slides {}/{}",
            status.slides_completed, status.total_slides
        )));
    }
    if let Some(seconds) = tracker.countdown() {
        lines.push(Line::from(format!("About {} remaining", format_countdown(seconds))));
    }
    if let Some(title) = status.title.as_deref() {
        lines.push(Line::from(format!("Title: {title}")));
    }
    if let Some(err) = tracker.last_error() {
        lines.push(Line::styled(
            format!("Connection problem, retrying: {err}"),
            Style::default().fg(Color::Yellow),
        ));
    }
    lines
}

fn banner(tracker: &StatusTracker, app: &App) -> Line<'static> {
    if let Some((text, color)) = app.flash() {
        return Line::styled(text.to_string(), Style::default().fg(color));
    }
    match tracker.polling() {
        PollingState::Stopped(StopReason::Completed) => {
            let took = tracker
                .status()
                .generation_time
                .map(|s| format!(" in {}", format_countdown(s)))
                .unwrap_or_default();
            Line::styled(
                format!("Presentation ready{took}"),
                Style::default().fg(Color::Green),
            )
        }
        PollingState::Stopped(StopReason::Failed | StopReason::SessionNotFound) => Line::styled(
            tracker.failure_message().unwrap_or_default(),
            Style::default().fg(Color::Red),
        ),
        _ => Line::from("Working on your presentation..."),
    }
}

fn gauge_color(tracker: &StatusTracker) -> Color {
    match tracker.kind() {
        StatusKind::Completed => Color::Green,
        StatusKind::Failed => Color::Red,
        _ if tracker.polling() == PollingState::Stopped(StopReason::SessionNotFound) => Color::Red,
        _ => Color::Cyan,
    }
}

fn action_hints(actions: &[Action]) -> String {
    let mut hints: Vec<&str> = actions
        .iter()
        .map(|action| match action {
            Action::Download => "d download",
            Action::DownloadAudio => "a audio",
            Action::Preview => "p preview",
            Action::Retry => "r retry",
            Action::Back => "b back",
        })
        .collect();
    hints.push("q quit");
    hints.join("  ")
}
