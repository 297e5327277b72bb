use deck_common::PROMPT_MAX_CHARS;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::app::{App, Focus};
use crate::widgets::{banner::banner_lines, status_bar::StatusBar};

const HINTS: &str = "Tab field  <-/-> change  Enter generate  Esc quit";

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7),
            Constraint::Min(5),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(f.area());

    f.render_widget(
        Paragraph::new(banner_lines()).style(Style::default().fg(Color::Cyan)),
        chunks[0],
    );

    let form = app.controller().form();
    let focused = app.focus() == Focus::Prompt;
    let mut prompt = form.prompt.clone();
    if focused {
        prompt.push('_');
    }
    let prompt_block = Block::default()
        .title(format!(
            " Topic ({}/{PROMPT_MAX_CHARS}) ",
            form.prompt_len()
        ))
        .borders(Borders::ALL)
        .border_style(field_style(focused));
    f.render_widget(
        Paragraph::new(prompt)
            .block(prompt_block)
            .wrap(Wrap { trim: false }),
        chunks[1],
    );

    let audio = if form.include_audio { "x" } else { " " };
    let options = Line::from(vec![
        option_span("Slides", form.slide_count.get().to_string(), app.focus() == Focus::Slides),
        Span::raw("   "),
        option_span("Theme", form.theme.as_str().to_string(), app.focus() == Focus::Theme),
        Span::raw("   "),
        option_span("Audio", audio.to_string(), app.focus() == Focus::Audio),
        Span::raw("   "),
        option_span(
            "Language",
            form.language_name().to_string(),
            app.focus() == Focus::Language,
        ),
    ]);
    f.render_widget(
        Paragraph::new(options).block(Block::default().title(" Options ").borders(Borders::ALL)),
        chunks[2],
    );

    let notice = app
        .controller()
        .notice()
        .map(|n| Span::styled(n.to_string(), Style::default().fg(Color::Red)))
        .or_else(|| app.flash().map(|(text, color)| Span::styled(text.to_string(), Style::default().fg(color))))
        .unwrap_or_else(|| Span::raw(""));
    f.render_widget(
        Paragraph::new(Line::from(notice))
            .block(Block::default().borders(Borders::ALL))
            .wrap(Wrap { trim: true }),
        chunks[3],
    );

    let status = if app.is_busy() { "Submitting..." } else { "Ready" };
    f.render_widget(StatusBar::new("NEW", status, HINTS), chunks[4]);
}

fn field_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

fn option_span(label: &str, value: String, focused: bool) -> Span<'static> {
    let text = format!("{label}: [{value}]");
    if focused {
        Span::styled(text, Style::default().add_modifier(Modifier::REVERSED))
    } else {
        Span::raw(text)
    }
}
