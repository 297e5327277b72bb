use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use deck_api::DeckApiClient;
use deck_common::{SessionId, SlideCount, Theme};
use deck_core::{
    format_countdown, submission, Backend, Config, DeckError, ErrorReporter, Job, JobKind,
    JobOutcome, LoadReport, PollerHandle, StatusTracker, SubmissionForm,
};
use tokio::sync::mpsc;

mod logging;

#[derive(Parser, Debug)]
#[command(name = "deck")]
#[command(about = "Generate presentations from a prompt and track them to completion")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Backend base URL (e.g., http://localhost:5000/api)
    #[arg(long)]
    pub api_url: Option<String>,

    /// Read configuration from this file instead of the search path
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory downloaded files are written to
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive terminal UI (default)
    Interactive,
    /// Submit a prompt and follow it without the UI
    Generate {
        /// Presentation topic
        prompt: String,
        /// Number of slides: 5, 10 or 15
        #[arg(short, long, default_value = "10", value_parser = parse_slides)]
        slides: SlideCount,
        /// corporate | startup | academic
        #[arg(short, long, default_value = "corporate", value_parser = parse_theme)]
        theme: Theme,
        /// Also generate narration audio
        #[arg(long)]
        audio: bool,
        /// Language code
        #[arg(short, long)]
        language: Option<String>,
        /// Do not download the file when generation completes
        #[arg(long)]
        no_download: bool,
    },
    /// Show the current status of a session once
    Status { session_id: String },
    /// Download a finished presentation
    Download {
        session_id: String,
        /// Download the narration audio instead
        #[arg(long)]
        audio: bool,
    },
    /// List languages offered by the backend
    Languages,
}

fn parse_slides(s: &str) -> Result<SlideCount, String> {
    let n: u8 = s.parse().map_err(|_| format!("not a number: {s}"))?;
    SlideCount::try_from(n)
}

fn parse_theme(s: &str) -> Result<Theme, String> {
    Theme::from_str(s).map_err(str::to_string)
}

pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let (config, report) = load_config(&cli)?;
    logging::init(&config.log_path(), cli.debug)?;
    report.log();

    let client = DeckApiClient::with_timeout(config.api_base_url.clone(), config.request_timeout())
        .context("building HTTP client")?;
    tracing::info!(api = client.base_url(), "deck starting");
    let backend: Arc<dyn Backend> = Arc::new(client);

    match cli.command {
        Some(Commands::Interactive) | None => {
            deck_tui::run_interactive(config, backend).await?;
        }
        Some(Commands::Generate {
            prompt,
            slides,
            theme,
            audio,
            language,
            no_download,
        }) => {
            let mut form = SubmissionForm::new(language.unwrap_or_else(|| config.language.clone()));
            form.prompt = prompt;
            form.slide_count = slides;
            form.theme = theme;
            form.include_audio = audio;
            let mut stdout = std::io::stdout();
            generate(backend, &config, form, !no_download, &mut stdout).await?;
        }
        Some(Commands::Status { session_id }) => {
            let session_id = parse_session(&session_id)?;
            let status = backend
                .fetch_status(&session_id)
                .await
                .map_err(|e| user_error(e.into()))?;
            let mut tracker = StatusTracker::new(false);
            tracker.apply(deck_core::PollEvent::Status(status));
            println!("{}", progress_line(&tracker));
        }
        Some(Commands::Download { session_id, audio }) => {
            let session_id = parse_session(&session_id)?;
            let kind = if audio { JobKind::DownloadAudio } else { JobKind::Download };
            let mut stdout = std::io::stdout();
            save(kind, session_id, backend, &config, &mut stdout).await?;
        }
        Some(Commands::Languages) => {
            let languages = backend
                .list_languages()
                .await
                .map_err(|e| user_error(e.into()))?;
            for (code, name) in languages {
                println!("{code}\t{name}");
            }
        }
    }

    Ok(())
}

/// File or search-path config, then environment, then flags.
///
/// Runs before logging is set up, so the search outcome is handed back to
/// be logged afterwards.
pub fn load_config(cli: &Cli) -> Result<(Config, LoadReport)> {
    let (mut config, report) = match &cli.config {
        Some(path) => {
            let config = Config::load_from_file(path)
                .with_context(|| format!("loading config {}", path.display()))?;
            let report = LoadReport {
                source: Some(path.clone()),
                ..LoadReport::default()
            };
            (config, report)
        }
        None => Config::load_with_fallback(),
    };
    config.apply_env();
    apply_flags(&mut config, cli);
    Ok((config, report))
}

fn apply_flags(config: &mut Config, cli: &Cli) {
    if let Some(url) = &cli.api_url {
        config.api_base_url = url.clone();
    }
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
}

fn parse_session(raw: &str) -> Result<SessionId> {
    SessionId::new(raw.trim()).context("session id must not be empty")
}

fn user_error(err: DeckError) -> anyhow::Error {
    anyhow!(ErrorReporter::format_user_error(&err))
}

/// Submit, poll until a terminal state, then optionally download.
pub async fn generate<W: Write>(
    backend: Arc<dyn Backend>,
    config: &Config,
    form: SubmissionForm,
    download: bool,
    out: &mut W,
) -> Result<()> {
    let (request, session_id) = submission::submit(backend.as_ref(), &form)
        .await
        .map_err(user_error)?;
    writeln!(out, "Session {session_id} started")?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let poller = PollerHandle::spawn(
        backend.clone(),
        session_id.clone(),
        1,
        config.poll_interval(),
        tx,
    );
    let mut tracker = StatusTracker::new(request.include_audio);
    let mut last_line = String::new();
    while tracker.is_active() {
        let Some(message) = rx.recv().await else {
            break;
        };
        tracker.apply(message.event);
        let line = progress_line(&tracker);
        if line != last_line {
            writeln!(out, "{line}")?;
            last_line = line;
        }
    }
    poller.cancel();

    match tracker.outcome() {
        Some(Ok(())) => {}
        Some(Err(e)) => {
            return Err(anyhow!(tracker
                .failure_message()
                .unwrap_or_else(|| ErrorReporter::format_user_error(&e))))
        }
        None => return Err(anyhow!("status polling ended before a result arrived")),
    }

    if download {
        save(JobKind::Download, session_id.clone(), backend.clone(), config, out).await?;
        if request.include_audio {
            save(JobKind::DownloadAudio, session_id, backend, config, out).await?;
        }
    }
    Ok(())
}

async fn save<W: Write>(
    kind: JobKind,
    session_id: SessionId,
    backend: Arc<dyn Backend>,
    config: &Config,
    out: &mut W,
) -> Result<()> {
    let job = Job::new(kind, session_id, backend, config.output_dir.clone());
    match job.run().await.map_err(user_error)? {
        JobOutcome::Saved { path, .. } => writeln!(out, "Saved {}", path.display())?,
        JobOutcome::Preview(_) => {}
    }
    Ok(())
}

fn progress_line(tracker: &StatusTracker) -> String {
    let status = tracker.status();
    let mut line = format!("[{:>3}%] {}", status.progress_percent(), status.status.label());
    if !status.current_step.is_empty() {
        line.push_str(&format!(" - {}", status.current_step));
    }
    if status.total_slides > 0 {
        line.push_str(&format!(
            " ({}/{} slides)",
            status.slides_completed, status.total_slides
        ));
    }
    if let Some(seconds) = tracker.countdown() {
        line.push_str(&format!(", ~{} left", format_countdown(seconds)));
    }
    if let Some(err) = tracker.last_error() {
        line.push_str(&format!(" [retrying: {err}]"));
    }
    line
}
