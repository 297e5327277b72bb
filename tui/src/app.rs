use std::io;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Local};
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use deck_core::{
    AppController, Backend, Config, Effect, ErrorReporter, Intent, JobKind, JobOutcome,
    PollMessage, View,
};
use futures_util::StreamExt;
use ratatui::prelude::*;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::time::{interval, timeout, Duration};

use crate::app_event_sender::{AppEvent, AppEventSender};
use crate::preview::SlidePreview;
use crate::{generating, landing};

const LANGUAGE_TIMEOUT: Duration = Duration::from_secs(3);

/// Landing form field with keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Prompt,
    Slides,
    Theme,
    Audio,
    Language,
}

impl Focus {
    const ORDER: [Focus; 5] = [
        Focus::Prompt,
        Focus::Slides,
        Focus::Theme,
        Focus::Audio,
        Focus::Language,
    ];

    fn next(self) -> Self {
        let idx = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(idx + 1) % Self::ORDER.len()]
    }

    fn previous(self) -> Self {
        let idx = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(idx + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}

#[derive(Debug, Clone)]
enum Flash {
    Info(String),
    Error(String),
}

pub struct App {
    controller: AppController,
    focus: Focus,
    running: bool,
    submitting: bool,
    flash: Option<Flash>,
    preview: Option<SlidePreview>,
    ticks: u64,
    started_at: Option<DateTime<Local>>,
    app_event_tx: AppEventSender,
}

impl App {
    pub fn new(controller: AppController, app_event_tx: AppEventSender) -> Self {
        Self {
            controller,
            focus: Focus::Prompt,
            running: true,
            submitting: false,
            flash: None,
            preview: None,
            ticks: 0,
            started_at: None,
            app_event_tx,
        }
    }

    pub fn controller(&self) -> &AppController {
        &self.controller
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_busy(&self) -> bool {
        self.submitting
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Local time the current session was submitted.
    pub fn started_at(&self) -> Option<DateTime<Local>> {
        self.started_at
    }

    pub fn preview(&self) -> Option<&SlidePreview> {
        self.preview.as_ref()
    }

    pub fn flash(&self) -> Option<(&str, Color)> {
        match &self.flash {
            Some(Flash::Info(text)) => Some((text.as_str(), Color::Green)),
            Some(Flash::Error(text)) => Some((text.as_str(), Color::Red)),
            None => None,
        }
    }

    pub fn tick(&mut self) {
        self.ticks = self.ticks.wrapping_add(1);
    }

    /// Map a key press to an intent. Pure form edits are applied in place.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Intent> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Some(Intent::Quit);
        }

        if let Some(preview) = self.preview.as_mut() {
            match key.code {
                KeyCode::Left | KeyCode::Char('h') => preview.previous_slide(),
                KeyCode::Right | KeyCode::Char('l') => preview.next_slide(),
                KeyCode::Esc | KeyCode::Char('q') => self.preview = None,
                _ => {}
            }
            return None;
        }

        match self.controller.view() {
            View::Landing => self.handle_landing_key(key),
            View::Generating => match key.code {
                KeyCode::Char('d') => Some(Intent::Download),
                KeyCode::Char('a') => Some(Intent::DownloadAudio),
                KeyCode::Char('p') => Some(Intent::Preview),
                KeyCode::Char('r') => Some(Intent::Retry),
                KeyCode::Char('b') | KeyCode::Esc => Some(Intent::Back),
                KeyCode::Char('q') => Some(Intent::Quit),
                _ => None,
            },
        }
    }

    fn handle_landing_key(&mut self, key: KeyEvent) -> Option<Intent> {
        match key.code {
            KeyCode::Esc => return Some(Intent::Quit),
            KeyCode::Enter => return Some(Intent::Submit),
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.previous(),
            _ => {}
        }

        let form = self.controller.form_mut();
        match (self.focus, key.code) {
            (Focus::Prompt, KeyCode::Char(c)) => {
                form.prompt.push(c);
                self.controller.clear_notice();
            }
            (Focus::Prompt, KeyCode::Backspace) => {
                form.prompt.pop();
                self.controller.clear_notice();
            }
            (Focus::Slides, KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')) => {
                form.slide_count = form.slide_count.next();
            }
            (Focus::Theme, KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')) => {
                form.theme = form.theme.next();
            }
            (Focus::Audio, KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')) => {
                form.include_audio = !form.include_audio;
            }
            (Focus::Language, KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')) => {
                form.cycle_language();
            }
            _ => {}
        }
        None
    }

    pub async fn dispatch(&mut self, intent: Intent) {
        if matches!(intent, Intent::Back | Intent::Retry | Intent::Submit) {
            self.flash = None;
            self.preview = None;
        }
        if intent == Intent::Submit {
            self.submitting = true;
        }
        let effect = self.controller.handle_intent(intent).await;
        self.submitting = false;
        self.started_at = match self.controller.view() {
            View::Generating if intent == Intent::Submit => Some(Local::now()),
            View::Generating => self.started_at,
            View::Landing => None,
        };
        match effect {
            Effect::None => {}
            Effect::Quit => self.running = false,
            Effect::Spawn(job) => {
                let kind = job.kind;
                self.flash = Some(Flash::Info(match kind {
                    JobKind::Download => "Downloading presentation...".to_string(),
                    JobKind::DownloadAudio => "Downloading narration...".to_string(),
                    JobKind::Preview => "Loading preview...".to_string(),
                }));
                let tx = self.app_event_tx.clone();
                tokio::spawn(async move {
                    let result = job
                        .run()
                        .await
                        .map_err(|e| ErrorReporter::format_user_error(&e));
                    tx.send(AppEvent::JobFinished { kind, result });
                });
            }
        }
    }

    pub fn handle_poll(&mut self, message: PollMessage) {
        self.controller.handle_poll(message);
    }

    pub fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            // Results arriving after the user left the session are dropped.
            AppEvent::JobFinished { .. } if self.controller.view() != View::Generating => {}
            AppEvent::JobFinished { kind, result } => match result {
                Ok(JobOutcome::Saved { path, .. }) => {
                    let what = if kind == JobKind::DownloadAudio { "Narration" } else { "Presentation" };
                    self.flash = Some(Flash::Info(format!("{what} saved to {}", path.display())));
                }
                Ok(JobOutcome::Preview(preview)) => {
                    self.flash = None;
                    self.preview = Some(SlidePreview::new(preview));
                }
                Err(message) => {
                    tracing::warn!(?kind, "job failed: {message}");
                    self.flash = Some(Flash::Error(message));
                }
            },
        }
    }

    pub fn draw(&self, f: &mut Frame) {
        match self.controller.view() {
            View::Landing => landing::draw(f, self),
            View::Generating => generating::draw(f, self),
        }
        if let Some(preview) = &self.preview {
            preview.draw(f, centered_rect(80, 70, f.area()));
        }
    }
}

pub async fn run_app(config: Config, backend: Arc<dyn Backend>) -> Result<()> {
    let (mut controller, mut poll_rx) = AppController::new(backend, &config);
    if timeout(LANGUAGE_TIMEOUT, controller.load_languages()).await.is_err() {
        tracing::warn!("language list timed out, using defaults");
    }
    let (app_tx, mut app_rx) = mpsc::unbounded_channel();
    let mut app = App::new(controller, AppEventSender::new(app_tx));

    // setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = event_loop(&mut terminal, &mut app, &mut poll_rx, &mut app_rx).await;

    // restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn event_loop<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    poll_rx: &mut UnboundedReceiver<PollMessage>,
    app_rx: &mut UnboundedReceiver<AppEvent>,
) -> Result<()> {
    let mut events = EventStream::new();
    let mut tick_interval = interval(Duration::from_millis(250));

    while app.is_running() {
        terminal.draw(|f| app.draw(f))?;

        tokio::select! {
            _ = tick_interval.tick() => app.tick(),
            Some(message) = poll_rx.recv() => app.handle_poll(message),
            Some(event) = app_rx.recv() => app.handle_app_event(event),
            maybe_event = events.next() => match maybe_event {
                Some(Ok(Event::Key(key))) => {
                    if let Some(intent) = app.handle_key(key) {
                        if intent == Intent::Submit {
                            app.submitting = true;
                            terminal.draw(|f| app.draw(f))?;
                        }
                        app.dispatch(intent).await;
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
        }
    }
    Ok(())
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
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
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_core::scripted::{ScriptedBackend, StatusReply};
    use deck_common::{SlideCount, StatusKind};
    use ratatui::backend::TestBackend;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app(backend: ScriptedBackend) -> (App, UnboundedReceiver<PollMessage>) {
        let config = Config {
            output_dir: std::env::temp_dir().join("deck-tui-tests"),
            ..Config::default()
        };
        let (controller, rx) = AppController::new(Arc::new(backend), &config);
        (App::new(controller, AppEventSender::noop()), rx)
    }

    fn screen(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 32)).unwrap();
        terminal.draw(|f| app.draw(f)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            assert!(app.handle_key(key(KeyCode::Char(c))).is_none());
        }
    }

    #[test]
    fn test_landing_form_keys() {
        let (mut app, _rx) = app(ScriptedBackend::new());
        type_text(&mut app, "Climate");
        app.handle_key(key(KeyCode::Backspace));
        assert_eq!(app.controller().form().prompt, "Climat");

        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.focus(), Focus::Slides);
        app.handle_key(key(KeyCode::Right));
        assert_eq!(app.controller().form().slide_count, SlideCount::Fifteen);

        app.handle_key(key(KeyCode::BackTab));
        assert_eq!(app.focus(), Focus::Prompt);
        assert_eq!(app.handle_key(key(KeyCode::Enter)), Some(Intent::Submit));
        assert_eq!(app.handle_key(key(KeyCode::Esc)), Some(Intent::Quit));
    }

    #[tokio::test(start_paused = true)]
    async fn test_generating_screen_shows_status() {
        let (mut app, mut rx) = app(
            ScriptedBackend::new()
                .with_session("abc123")
                .with_statuses([StatusReply::status(StatusKind::Queued, 0)]),
        );
        type_text(&mut app, "Climate Change Solutions");
        app.dispatch(Intent::Submit).await;
        assert_eq!(app.controller().view(), View::Generating);

        let message = rx.recv().await.unwrap();
        app.handle_poll(message);
        let text = screen(&app);
        assert!(text.contains("Queued"), "{text}");
        assert!(text.contains("0%"), "{text}");
        assert!(text.contains("abc123"), "{text}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_validation_notice_rendered() {
        let (mut app, _rx) = app(ScriptedBackend::new());
        type_text(&mut app, "short");
        app.dispatch(Intent::Submit).await;
        assert_eq!(app.controller().view(), View::Landing);
        assert!(app.controller().notice().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_back_key_returns_to_landing() {
        let (mut app, _rx) = app(ScriptedBackend::new().with_session("abc123"));
        type_text(&mut app, "Climate Change Solutions");
        app.dispatch(Intent::Submit).await;

        let intent = app.handle_key(key(KeyCode::Char('b')));
        assert_eq!(intent, Some(Intent::Back));
        app.dispatch(Intent::Back).await;
        assert_eq!(app.controller().view(), View::Landing);
        assert!(!app.controller().is_polling());
    }

    #[tokio::test]
    async fn test_job_result_after_back_is_dropped() {
        let (mut app, _rx) = app(ScriptedBackend::new());
        app.handle_app_event(AppEvent::JobFinished {
            kind: JobKind::Download,
            result: Err("boom".to_string()),
        });
        assert!(app.flash().is_none());
    }
}
