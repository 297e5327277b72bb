use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use deck_common::SessionId;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::backend::Backend;
use crate::config::Config;
use crate::error::{DeckError, ErrorReporter};
use crate::jobs::{Job, JobKind};
use crate::poller::{PollMessage, PollerHandle};
use crate::router::{View, ViewRouter};
use crate::submission::{self, SubmissionForm};
use crate::tracker::{Action, StatusTracker};

/// What a view asks the controller to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Submit,
    Back,
    Retry,
    Download,
    DownloadAudio,
    Preview,
    Quit,
}

/// Follow-up work the caller has to carry out.
#[derive(Debug)]
pub enum Effect {
    None,
    /// Run off the event loop and report back.
    Spawn(Job),
    Quit,
}

/// Single owner of the view selector, the session and its status.
pub struct AppController {
    backend: Arc<dyn Backend>,
    router: ViewRouter,
    form: SubmissionForm,
    notice: Option<String>,
    tracker: Option<StatusTracker>,
    poller: Option<PollerHandle>,
    epoch: u64,
    poll_interval: Duration,
    poll_tx: UnboundedSender<PollMessage>,
    output_dir: PathBuf,
}

impl AppController {
    pub fn new(
        backend: Arc<dyn Backend>,
        config: &Config,
    ) -> (Self, UnboundedReceiver<PollMessage>) {
        let (poll_tx, poll_rx) = mpsc::unbounded_channel();
        let controller = Self {
            backend,
            router: ViewRouter::new(),
            form: SubmissionForm::new(config.language.clone()),
            notice: None,
            tracker: None,
            poller: None,
            epoch: 0,
            poll_interval: config.poll_interval(),
            poll_tx,
            output_dir: config.output_dir.clone(),
        };
        (controller, poll_rx)
    }

    pub fn view(&self) -> View {
        self.router.view()
    }

    pub fn session(&self) -> Option<&SessionId> {
        self.router.session()
    }

    pub fn form(&self) -> &SubmissionForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut SubmissionForm {
        &mut self.form
    }

    /// Validation or request error shown on the landing view.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    pub fn tracker(&self) -> Option<&StatusTracker> {
        self.tracker.as_ref()
    }

    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(|p| !p.is_finished())
    }

    /// Fill the language picker; keeps the built-in list on failure.
    pub async fn load_languages(&mut self) {
        match self.backend.list_languages().await {
            Ok(languages) => self.form.set_languages(languages),
            Err(e) => tracing::warn!("language list unavailable, using defaults: {e}"),
        }
    }

    pub async fn handle_intent(&mut self, intent: Intent) -> Effect {
        match intent {
            Intent::Submit => {
                self.submit().await;
                Effect::None
            }
            Intent::Back | Intent::Retry => {
                if intent == Intent::Retry && !self.allows(Action::Retry) {
                    return Effect::None;
                }
                self.back();
                Effect::None
            }
            Intent::Download => self.job(Action::Download, JobKind::Download),
            Intent::DownloadAudio => self.job(Action::DownloadAudio, JobKind::DownloadAudio),
            Intent::Preview => self.job(Action::Preview, JobKind::Preview),
            Intent::Quit => {
                self.stop_polling();
                Effect::Quit
            }
        }
    }

    async fn submit(&mut self) {
        if self.router.view() != View::Landing {
            return;
        }
        match submission::submit(self.backend.as_ref(), &self.form).await {
            Ok((request, session_id)) => {
                self.notice = None;
                self.start_session(session_id, request.include_audio);
            }
            Err(e) => {
                if !matches!(e, DeckError::Validation(_)) {
                    tracing::warn!("generation request failed: {e}");
                }
                self.notice = Some(ErrorReporter::format_user_error(&e));
            }
        }
    }

    /// Enter the generating view and start polling `session_id`.
    pub fn start_session(&mut self, session_id: SessionId, include_audio: bool) {
        self.stop_polling();
        self.epoch += 1;
        self.router.start_generation(session_id.clone());
        self.tracker = Some(StatusTracker::new(include_audio));
        self.poller = Some(PollerHandle::spawn(
            self.backend.clone(),
            session_id,
            self.epoch,
            self.poll_interval,
            self.poll_tx.clone(),
        ));
    }

    /// Leave the generating view. Polling is torn down first.
    pub fn back(&mut self) {
        self.stop_polling();
        self.tracker = None;
        self.router.back();
    }

    fn stop_polling(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.cancel();
        }
        if let Some(tracker) = self.tracker.as_mut() {
            tracker.cancel();
        }
    }

    /// Apply a poll result. Results from an older activation are dropped.
    pub fn handle_poll(&mut self, message: PollMessage) -> bool {
        if message.epoch != self.epoch || self.router.session() != Some(&message.session_id) {
            tracing::debug!(epoch = message.epoch, current = self.epoch, "dropping stale poll result");
            return false;
        }
        let Some(tracker) = self.tracker.as_mut() else {
            return false;
        };
        let applied = tracker.apply(message.event);
        if !tracker.is_active() {
            self.poller = None;
        }
        applied
    }

    fn allows(&self, action: Action) -> bool {
        self.tracker.as_ref().is_some_and(|t| t.allows(action))
    }

    fn job(&self, action: Action, kind: JobKind) -> Effect {
        match (self.allows(action), self.router.session()) {
            (true, Some(session_id)) => Effect::Spawn(Job::new(
                kind,
                session_id.clone(),
                self.backend.clone(),
                self.output_dir.clone(),
            )),
            _ => Effect::None,
        }
    }
}
