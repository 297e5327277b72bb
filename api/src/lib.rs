//! HTTP client for the presentation generation backend.

pub mod client;
pub mod error;

pub use client::{Artifact, DeckApiClient};
pub use error::{ApiError, Result, SESSION_NOT_FOUND_CODES};
