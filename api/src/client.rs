use std::collections::BTreeMap;
use std::time::Duration;

use deck_common::{
    ErrorDetail, GenerateResponse, GenerationRequest, GenerationStatus, LanguagesResponse,
    PresentationPreview, SessionId,
};
use futures_util::StreamExt;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ApiError, Result, SESSION_NOT_FOUND_CODES};

/// Binary payload from one of the download endpoints.
#[derive(Debug, Clone)]
pub struct Artifact {
    /// Name suggested by `Content-Disposition`, if any.
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Thin typed wrapper over the backend's REST surface.
#[derive(Debug, Clone)]
pub struct DeckApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl DeckApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: normalize_base(base_url.into()),
        }
    }

    /// Without a timeout the transport default applies.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: normalize_base(base_url.into()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// `POST /generate`
    pub async fn create_generation(&self, request: &GenerationRequest) -> Result<SessionId> {
        let url = self.url("generate");
        tracing::debug!(%url, slides = request.slide_count.get(), "submitting generation request");
        let resp = self.http.post(&url).json(request).send().await?;
        let status = resp.status();
        let body = resp.bytes().await?;
        let parsed: GenerateResponse = decode_body(status.as_u16(), status.is_success(), &body, None)?;

        match parsed.session_id.and_then(SessionId::new) {
            Some(session_id) if parsed.success => {
                tracing::info!(%session_id, "generation started");
                Ok(session_id)
            }
            _ => Err(ApiError::Decode(
                "generation response did not contain a session id".to_string(),
            )),
        }
    }

    /// `GET /status/{session_id}`
    pub async fn fetch_status(&self, session_id: &SessionId) -> Result<GenerationStatus> {
        let url = self.url(&format!("status/{session_id}"));
        let resp = self.http.get(&url).send().await?;
        let status = resp.status();
        let body = resp.bytes().await?;
        decode_body(status.as_u16(), status.is_success(), &body, Some(session_id.as_str()))
    }

    /// `GET /download/{session_id}`
    pub async fn download(&self, session_id: &SessionId) -> Result<Artifact> {
        self.fetch_artifact(&format!("download/{session_id}"), session_id).await
    }

    /// `GET /tts/download/{session_id}`
    pub async fn download_audio(&self, session_id: &SessionId) -> Result<Artifact> {
        self.fetch_artifact(&format!("tts/download/{session_id}"), session_id).await
    }

    /// `GET /presentation/{session_id}`
    pub async fn fetch_preview(&self, session_id: &SessionId) -> Result<PresentationPreview> {
        let url = self.url(&format!("presentation/{session_id}"));
        let resp = self.http.get(&url).send().await?;
        let status = resp.status();
        let body = resp.bytes().await?;
        decode_body(status.as_u16(), status.is_success(), &body, Some(session_id.as_str()))
    }

    /// `GET /translation/languages`
    pub async fn list_languages(&self) -> Result<BTreeMap<String, String>> {
        let url = self.url("translation/languages");
        let resp = self.http.get(&url).send().await?;
        let status = resp.status();
        let body = resp.bytes().await?;
        let parsed: LanguagesResponse = decode_body(status.as_u16(), status.is_success(), &body, None)?;
        Ok(parsed.languages)
    }

    async fn fetch_artifact(&self, path: &str, session_id: &SessionId) -> Result<Artifact> {
        let url = self.url(path);
        tracing::info!(%url, "downloading artifact");
        let resp = self.http.get(&url).send().await?;
        let status = resp.status();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let filename = resp
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(deck_common::filename_from_disposition);

        let is_json = content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("application/json"));

        if !status.is_success() || is_json {
            let body = resp.bytes().await?;
            // A JSON body here is always an error envelope.
            let _: Value = decode_body(status.as_u16(), false, &body, Some(session_id.as_str()))?;
            return Err(ApiError::Decode("expected a binary artifact".to_string()));
        }

        let mut bytes = Vec::new();
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            bytes.extend_from_slice(&chunk);
        }
        tracing::debug!(size = bytes.len(), "artifact received");

        Ok(Artifact {
            filename,
            content_type,
            bytes,
        })
    }
}

fn normalize_base(base: String) -> String {
    base.trim_end_matches('/').to_string()
}

/// Turn a response body into `T` or a classified [`ApiError`].
///
/// The backend may return an error envelope with either a success or an
/// error HTTP status, so the envelope is checked first.
pub(crate) fn decode_body<T: DeserializeOwned>(
    status: u16,
    success: bool,
    body: &[u8],
    session_id: Option<&str>,
) -> Result<T> {
    let value: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) if success => return Err(ApiError::Decode(e.to_string())),
        Err(_) => {
            let text = String::from_utf8_lossy(body).trim().to_string();
            return Err(ApiError::Backend {
                status: Some(status),
                code: format!("HTTP_{status}"),
                message: if text.is_empty() { format!("HTTP {status}") } else { text },
            });
        }
    };

    if let Some(error) = value.get("error").filter(|e| !e.is_null()) {
        let detail = match error {
            Value::String(message) => ErrorDetail {
                code: String::new(),
                message: message.clone(),
            },
            other => serde_json::from_value(other.clone()).unwrap_or_default(),
        };
        return Err(classify_error(detail, status, session_id));
    }

    if !success {
        return Err(ApiError::Backend {
            status: Some(status),
            code: format!("HTTP_{status}"),
            message: format!("HTTP {status}"),
        });
    }

    serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}

fn classify_error(detail: ErrorDetail, status: u16, session_id: Option<&str>) -> ApiError {
    if let Some(session_id) = session_id {
        if SESSION_NOT_FOUND_CODES.contains(&detail.code.as_str()) {
            return ApiError::SessionNotFound {
                session_id: session_id.to_string(),
            };
        }
    }
    let message = if detail.message.is_empty() {
        detail.code.clone()
    } else {
        detail.message
    };
    ApiError::Backend {
        status: Some(status),
        code: detail.code,
        message,
    }
}
