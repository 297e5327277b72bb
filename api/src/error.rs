use thiserror::Error;

/// Error codes the backend uses for a session that no longer exists.
pub const SESSION_NOT_FOUND_CODES: [&str; 2] = ["SESSION_NOT_FOUND", "PRESENTATION_NOT_FOUND"];

#[derive(Error, Debug)]
pub enum ApiError {
    /// Connection refused, DNS failure, timeout, broken body stream.
    #[error("Request failed: {0}")]
    Transport(String),

    /// Structured `{error: {code, message}}` body from the backend.
    #[error("{message} ({code})")]
    Backend {
        status: Option<u16>,
        code: String,
        message: String,
    },

    #[error("Session not found: {session_id}")]
    SessionNotFound { session_id: String },

    /// The body did not match the documented shape.
    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn is_session_not_found(&self) -> bool {
        matches!(self, ApiError::SessionNotFound { .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
