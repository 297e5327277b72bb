use deck_common::{GenerationStatus, StatusKind};

use crate::error::{DeckError, ErrorReporter, GENERATION_FAILED_MESSAGE};
use crate::poller::PollEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Completed,
    Failed,
    SessionNotFound,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollingState {
    Active,
    Stopped(StopReason),
}

/// Things the generating view can offer the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Download,
    DownloadAudio,
    Preview,
    Retry,
    Back,
}

/// Client-side projection of one session's progress.
///
/// The last received status is kept as-is; nothing is merged across polls.
#[derive(Debug, Clone)]
pub struct StatusTracker {
    status: GenerationStatus,
    polling: PollingState,
    countdown: Option<u64>,
    last_error: Option<String>,
    include_audio: bool,
}

impl StatusTracker {
    pub fn new(include_audio: bool) -> Self {
        Self {
            status: GenerationStatus::default(),
            polling: PollingState::Active,
            countdown: None,
            last_error: None,
            include_audio,
        }
    }

    pub fn status(&self) -> &GenerationStatus {
        &self.status
    }

    pub fn kind(&self) -> StatusKind {
        self.status.status
    }

    pub fn polling(&self) -> PollingState {
        self.polling
    }

    pub fn is_active(&self) -> bool {
        self.polling == PollingState::Active
    }

    /// Seconds remaining as last reported by the backend.
    pub fn countdown(&self) -> Option<u64> {
        self.countdown
    }

    /// Most recent transient poll failure, cleared by the next good response.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Returns `false` when the event was ignored because polling had stopped.
    pub fn apply(&mut self, event: PollEvent) -> bool {
        if !self.is_active() {
            return false;
        }
        match event {
            PollEvent::Status(status) => {
                if let Some(remaining) = status.estimated_remaining {
                    self.countdown = Some(remaining);
                }
                self.last_error = None;
                self.polling = match status.status {
                    StatusKind::Completed => PollingState::Stopped(StopReason::Completed),
                    StatusKind::Failed => PollingState::Stopped(StopReason::Failed),
                    _ => PollingState::Active,
                };
                if !self.is_active() {
                    self.countdown = None;
                }
                self.status = status;
            }
            PollEvent::SessionNotFound => {
                self.polling = PollingState::Stopped(StopReason::SessionNotFound);
                self.countdown = None;
            }
            PollEvent::TransientError(message) => {
                self.last_error = Some(message);
            }
        }
        true
    }

    pub fn cancel(&mut self) {
        if self.is_active() {
            self.polling = PollingState::Stopped(StopReason::Cancelled);
            self.countdown = None;
        }
    }

    pub fn actions(&self) -> Vec<Action> {
        let mut actions = Vec::new();
        match self.polling {
            PollingState::Stopped(StopReason::Completed) => {
                actions.push(Action::Download);
                if self.include_audio {
                    actions.push(Action::DownloadAudio);
                }
                actions.push(Action::Preview);
            }
            PollingState::Stopped(StopReason::Failed) => actions.push(Action::Retry),
            _ => {}
        }
        actions.push(Action::Back);
        actions
    }

    pub fn allows(&self, action: Action) -> bool {
        self.actions().contains(&action)
    }

    /// Terminal outcome, `None` while still running.
    pub fn outcome(&self) -> Option<Result<(), DeckError>> {
        match self.polling {
            PollingState::Active => None,
            PollingState::Stopped(StopReason::Completed) => Some(Ok(())),
            PollingState::Stopped(StopReason::Failed) => Some(Err(DeckError::GenerationFailed {
                message: self.status.error_message.clone(),
            })),
            PollingState::Stopped(StopReason::SessionNotFound) => {
                Some(Err(DeckError::SessionNotFound(String::new())))
            }
            PollingState::Stopped(StopReason::Cancelled) => Some(Err(DeckError::Generic(
                anyhow::anyhow!("generation tracking was cancelled"),
            ))),
        }
    }

    /// Message for the failure banner, if any.
    pub fn failure_message(&self) -> Option<String> {
        match self.polling {
            PollingState::Stopped(StopReason::Failed)
            | PollingState::Stopped(StopReason::SessionNotFound) => self
                .outcome()
                .and_then(|outcome| outcome.err())
                .map(|err| ErrorReporter::format_user_error(&err))
                .or_else(|| Some(GENERATION_FAILED_MESSAGE.to_string())),
            _ => None,
        }
    }
}

/// `95` -> `1m 35s`
pub fn format_countdown(seconds: u64) -> String {
    if seconds >= 60 {
        format!("{}m {:02}s", seconds / 60, seconds % 60)
    } else {
        format!("{seconds}s")
    }
}
