use deck_api::ApiError;
use thiserror::Error;

use crate::config::ConfigError;

/// Shown when the backend could not be reached at all.
pub const CONNECTIVITY_MESSAGE: &str =
    "Failed to connect to the server. Please check your connection and try again.";
pub const GENERATION_FAILED_MESSAGE: &str =
    "Presentation generation failed. Please try again.";

/// Every failure a user can run into while driving a generation.
#[derive(Error, Debug)]
pub enum DeckError {
    /// Local check before anything is sent.
    #[error("{0}")]
    Validation(String),

    /// Network or connectivity problem.
    #[error("Request failed: {0}")]
    RequestFailure(String),

    /// Structured error from the backend.
    #[error("{message}")]
    Backend { code: String, message: String },

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// The backend finished the job with `status = failed`.
    #[error("Generation failed")]
    GenerationFailed { message: Option<String> },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Error: {0}")]
    Generic(#[from] anyhow::Error),
}

impl From<ApiError> for DeckError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Transport(reason) => DeckError::RequestFailure(reason),
            ApiError::Backend { code, message, .. } => DeckError::Backend { code, message },
            ApiError::SessionNotFound { session_id } => DeckError::SessionNotFound(session_id),
            ApiError::Decode(reason) => DeckError::Backend {
                code: "INVALID_RESPONSE".to_string(),
                message: format!("Unexpected response from server: {reason}"),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, DeckError>;

/// Error reporting utilities
pub struct ErrorReporter;

impl ErrorReporter {
    /// Format error for user display
    pub fn format_user_error(error: &DeckError) -> String {
        match error {
            DeckError::Validation(message) => message.clone(),
            DeckError::RequestFailure(_) => CONNECTIVITY_MESSAGE.to_string(),
            DeckError::Backend { message, .. } => message.clone(),
            DeckError::SessionNotFound(_) => {
                "This generation session no longer exists.".to_string()
            }
            DeckError::GenerationFailed { message } => message
                .clone()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| GENERATION_FAILED_MESSAGE.to_string()),
            DeckError::Config(config_err) => format!("Configuration problem: {config_err}"),
            DeckError::Io(io_err) => format!("File operation failed: {io_err}"),
            DeckError::Json(json_err) => format!("Data format error: {json_err}"),
            DeckError::Generic(anyhow_err) => format!("Unexpected error: {anyhow_err}"),
        }
    }
}
