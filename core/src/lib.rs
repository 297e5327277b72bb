//! Core library: session routing, submission and status polling.

pub mod backend;
pub mod config;
pub mod controller;
pub mod error;
pub mod jobs;
pub mod poller;
pub mod router;
pub mod scripted;
pub mod submission;
pub mod tracker;

pub use backend::Backend;
pub use config::{Config, LoadReport};
pub use controller::{AppController, Effect, Intent};
pub use error::{DeckError, ErrorReporter, Result};
pub use jobs::{Job, JobKind, JobOutcome};
pub use poller::{PollEvent, PollMessage, PollerHandle, DEFAULT_POLL_INTERVAL};
pub use router::{View, ViewRouter};
pub use submission::SubmissionForm;
pub use tracker::{format_countdown, Action, PollingState, StatusTracker, StopReason};
