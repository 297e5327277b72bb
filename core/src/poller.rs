use std::sync::Arc;
use std::time::Duration;

use deck_common::{GenerationStatus, SessionId};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::backend::Backend;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Outcome of one poll cycle.
#[derive(Debug, Clone)]
pub enum PollEvent {
    Status(GenerationStatus),
    /// Generic failure; the next scheduled poll still happens.
    TransientError(String),
    SessionNotFound,
}

impl PollEvent {
    pub fn stops_polling(&self) -> bool {
        match self {
            PollEvent::Status(status) => status.status.is_terminal(),
            PollEvent::SessionNotFound => true,
            PollEvent::TransientError(_) => false,
        }
    }
}

/// A poll event tagged with the activation it belongs to.
#[derive(Debug, Clone)]
pub struct PollMessage {
    pub epoch: u64,
    pub session_id: SessionId,
    pub event: PollEvent,
}

/// Owns the background polling task for one session.
///
/// Dropping or cancelling the handle aborts the task; a query that is in
/// flight at that moment is dropped with it.
#[derive(Debug)]
pub struct PollerHandle {
    epoch: u64,
    session_id: SessionId,
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn spawn(
        backend: Arc<dyn Backend>,
        session_id: SessionId,
        epoch: u64,
        interval: Duration,
        tx: UnboundedSender<PollMessage>,
    ) -> Self {
        tracing::info!(%session_id, epoch, ?interval, "starting status polling");
        let task = tokio::spawn(poll_loop(backend, session_id.clone(), epoch, interval, tx));
        Self {
            epoch,
            session_id,
            task,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn cancel(self) {
        tracing::info!(session_id = %self.session_id, epoch = self.epoch, "cancelling status polling");
        // Drop aborts.
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn poll_loop(
    backend: Arc<dyn Backend>,
    session_id: SessionId,
    epoch: u64,
    interval: Duration,
    tx: UnboundedSender<PollMessage>,
) {
    // First tick completes immediately.
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut cycle: u64 = 0;

    loop {
        ticker.tick().await;
        cycle += 1;
        tracing::debug!(%session_id, cycle, "polling status");

        let event = match backend.fetch_status(&session_id).await {
            Ok(status) => {
                tracing::debug!(%session_id, status = %status.status, progress = status.progress, "status received");
                PollEvent::Status(status)
            }
            Err(e) if e.is_session_not_found() => {
                tracing::warn!(%session_id, "session not found, polling stopped");
                PollEvent::SessionNotFound
            }
            Err(e) => {
                tracing::warn!(%session_id, cycle, "status poll failed: {e}");
                PollEvent::TransientError(e.to_string())
            }
        };

        let stop = event.stops_polling();
        let message = PollMessage {
            epoch,
            session_id: session_id.clone(),
            event,
        };
        if tx.send(message).is_err() {
            tracing::debug!(%session_id, "poll receiver closed");
            break;
        }
        if stop {
            tracing::info!(%session_id, cycles = cycle, "polling reached a terminal state");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripted::{ScriptedBackend, StatusReply};
    use deck_common::StatusKind;
    use tokio::sync::mpsc;

    fn sid(id: &str) -> SessionId {
        SessionId::new(id).unwrap()
    }

    async fn drain(rx: &mut mpsc::UnboundedReceiver<PollMessage>) -> Vec<PollMessage> {
        let mut out = Vec::new();
        while let Some(msg) = rx.recv().await {
            out.push(msg);
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_then_fixed_cadence() {
        let backend = Arc::new(ScriptedBackend::new().with_statuses([
            StatusReply::status(StatusKind::Queued, 0),
            StatusReply::status(StatusKind::Researching, 10),
            StatusReply::status(StatusKind::Planning, 30),
            StatusReply::status(StatusKind::Completed, 100),
        ]));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let start = tokio::time::Instant::now();
        let handle = PollerHandle::spawn(backend.clone(), sid("abc123"), 1, DEFAULT_POLL_INTERVAL, tx);

        let messages = drain(&mut rx).await;
        assert_eq!(messages.len(), 4);
        assert!(messages.iter().all(|m| m.epoch == 1));

        let calls = backend.status_calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[0].1 - start, Duration::ZERO);
        for pair in calls.windows(2) {
            assert_eq!(pair[1].1 - pair[0].1, DEFAULT_POLL_INTERVAL);
        }
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_halts_polling() {
        let backend = Arc::new(ScriptedBackend::new().with_statuses([
            StatusReply::status(StatusKind::Generating, 50),
            StatusReply::status(StatusKind::Failed, 50),
            StatusReply::status(StatusKind::Completed, 100),
        ]));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _handle = PollerHandle::spawn(backend.clone(), sid("abc"), 1, DEFAULT_POLL_INTERVAL, tx);

        let messages = drain(&mut rx).await;
        assert_eq!(messages.len(), 2);
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(backend.status_call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_not_found_halts_polling() {
        let backend = Arc::new(ScriptedBackend::new().with_statuses([
            StatusReply::status(StatusKind::Assembling, 90),
            StatusReply::NotFound,
        ]));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _handle = PollerHandle::spawn(backend.clone(), sid("xyz"), 3, DEFAULT_POLL_INTERVAL, tx);

        let messages = drain(&mut rx).await;
        assert_eq!(messages.len(), 2);
        assert!(matches!(messages[1].event, PollEvent::SessionNotFound));
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(backend.status_call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_do_not_stop_or_slow_polling() {
        let backend = Arc::new(ScriptedBackend::new().with_statuses([
            StatusReply::Failure("upstream timeout".to_string()),
            StatusReply::Failure("upstream timeout".to_string()),
            StatusReply::status(StatusKind::Completed, 100),
        ]));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _handle = PollerHandle::spawn(backend.clone(), sid("abc"), 1, DEFAULT_POLL_INTERVAL, tx);

        let messages = drain(&mut rx).await;
        assert_eq!(messages.len(), 3);
        assert!(matches!(messages[0].event, PollEvent::TransientError(_)));
        let calls = backend.status_calls();
        assert_eq!(calls[2].1 - calls[0].1, DEFAULT_POLL_INTERVAL * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_further_queries() {
        let backend = Arc::new(
            ScriptedBackend::new().with_statuses([StatusReply::status(StatusKind::Researching, 10)]),
        );
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = PollerHandle::spawn(backend.clone(), sid("abc"), 1, DEFAULT_POLL_INTERVAL, tx);

        assert!(rx.recv().await.is_some());
        handle.cancel();
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(backend.status_call_count(), 1);
        // sender was dropped with the task
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_in_flight_query() {
        let backend = Arc::new(
            ScriptedBackend::new()
                .with_statuses([
                    StatusReply::status(StatusKind::Researching, 10),
                    StatusReply::status(StatusKind::Completed, 100),
                ])
                .hold_status_call(2),
        );
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = PollerHandle::spawn(backend.clone(), sid("abc"), 1, DEFAULT_POLL_INTERVAL, tx);

        assert!(rx.recv().await.is_some());
        while backend.status_call_count() < 2 {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        handle.cancel();
        backend.release();
        assert!(rx.recv().await.is_none());
        assert_eq!(backend.status_call_count(), 2);
    }
}
