//! In-memory [`Backend`] that replays canned responses. Used by tests.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use deck_api::{ApiError, Artifact};
use deck_common::{
    default_languages, GenerationRequest, GenerationStatus, PresentationPreview, SessionId,
    StatusKind,
};
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::backend::Backend;

/// One canned reply to `GET /status/{id}`.
#[derive(Debug, Clone)]
pub enum StatusReply {
    Status(GenerationStatus),
    NotFound,
    /// Generic backend error; the poller should keep going.
    Failure(String),
}

impl StatusReply {
    pub fn status(kind: StatusKind, progress: u32) -> Self {
        StatusReply::Status(GenerationStatus {
            status: kind,
            progress,
            ..Default::default()
        })
    }
}

#[derive(Debug, Clone)]
pub enum CreateReply {
    Session(String),
    Backend { code: String, message: String },
    Unreachable,
}

#[derive(Default)]
pub struct ScriptedBackend {
    create_replies: Mutex<VecDeque<CreateReply>>,
    status_replies: Mutex<VecDeque<StatusReply>>,
    last_status: Mutex<Option<StatusReply>>,
    create_requests: Mutex<Vec<GenerationRequest>>,
    status_calls: Mutex<Vec<(SessionId, Instant)>>,
    downloads: AtomicUsize,
    hold_on_call: Mutex<Option<usize>>,
    release: Arc<Notify>,
    languages_unavailable: bool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(self, id: &str) -> Self {
        self.with_create_reply(CreateReply::Session(id.to_string()))
    }

    pub fn with_create_reply(self, reply: CreateReply) -> Self {
        lock(&self.create_replies).push_back(reply);
        self
    }

    /// Replies are consumed in order; the last one repeats once exhausted.
    pub fn with_statuses<I: IntoIterator<Item = StatusReply>>(self, replies: I) -> Self {
        lock(&self.status_replies).extend(replies);
        self
    }

    /// Block the `n`th status call (1-based) until [`ScriptedBackend::release`].
    pub fn hold_status_call(self, n: usize) -> Self {
        *lock(&self.hold_on_call) = Some(n);
        self
    }

    pub fn without_languages(mut self) -> Self {
        self.languages_unavailable = true;
        self
    }

    pub fn release(&self) {
        self.release.notify_one();
    }

    pub fn create_requests(&self) -> Vec<GenerationRequest> {
        lock(&self.create_requests).clone()
    }

    pub fn status_calls(&self) -> Vec<(SessionId, Instant)> {
        lock(&self.status_calls).clone()
    }

    pub fn status_call_count(&self) -> usize {
        lock(&self.status_calls).len()
    }

    pub fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }

    fn next_status(&self) -> StatusReply {
        let next = lock(&self.status_replies).pop_front();
        let mut last = lock(&self.last_status);
        match next {
            Some(reply) => {
                *last = Some(reply.clone());
                reply
            }
            None => last
                .clone()
                .unwrap_or_else(|| StatusReply::status(StatusKind::Queued, 0)),
        }
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn create_generation(&self, request: &GenerationRequest) -> Result<SessionId, ApiError> {
        lock(&self.create_requests).push(request.clone());
        let reply = lock(&self.create_replies)
            .pop_front()
            .unwrap_or(CreateReply::Unreachable);
        match reply {
            CreateReply::Session(id) => SessionId::new(id)
                .ok_or_else(|| ApiError::Decode("empty session id".to_string())),
            CreateReply::Backend { code, message } => Err(ApiError::Backend {
                status: Some(400),
                code,
                message,
            }),
            CreateReply::Unreachable => Err(ApiError::Transport("connection refused".to_string())),
        }
    }

    async fn fetch_status(&self, session_id: &SessionId) -> Result<GenerationStatus, ApiError> {
        let call = {
            let mut calls = lock(&self.status_calls);
            calls.push((session_id.clone(), Instant::now()));
            calls.len()
        };
        let hold = *lock(&self.hold_on_call);
        if hold == Some(call) {
            self.release.notified().await;
        }
        match self.next_status() {
            StatusReply::Status(status) => Ok(status),
            StatusReply::NotFound => Err(ApiError::SessionNotFound {
                session_id: session_id.to_string(),
            }),
            StatusReply::Failure(message) => Err(ApiError::Backend {
                status: Some(500),
                code: "INTERNAL_ERROR".to_string(),
                message,
            }),
        }
    }

    async fn download(&self, session_id: &SessionId) -> Result<Artifact, ApiError> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        Ok(Artifact {
            filename: Some(format!("{session_id}.pptx")),
            content_type: Some("application/vnd.ms-powerpoint".to_string()),
            bytes: b"PK\x03\x04deck".to_vec(),
        })
    }

    async fn download_audio(&self, session_id: &SessionId) -> Result<Artifact, ApiError> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        Ok(Artifact {
            filename: None,
            content_type: Some("audio/wav".to_string()),
            bytes: format!("RIFF{session_id}").into_bytes(),
        })
    }

    async fn fetch_preview(
        &self,
        _session_id: &SessionId,
    ) -> Result<PresentationPreview, ApiError> {
        Ok(PresentationPreview {
            title: "Scripted deck".to_string(),
            slides: Vec::new(),
        })
    }

    async fn list_languages(&self) -> Result<BTreeMap<String, String>, ApiError> {
        if self.languages_unavailable {
            return Err(ApiError::Backend {
                status: Some(503),
                code: "UNAVAILABLE".to_string(),
                message: "translation service offline".to_string(),
            });
        }
        Ok(default_languages())
    }
}
