use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Prompts shorter than this are rejected before anything is sent.
pub const PROMPT_MIN_CHARS: usize = 10;
pub const PROMPT_MAX_CHARS: usize = 500;

/// Opaque handle the backend assigns to one generation job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Returns `None` for an empty or whitespace-only id.
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            None
        } else {
            Some(Self(id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SlideCount {
    Five,
    #[default]
    Ten,
    Fifteen,
}

impl SlideCount {
    pub fn get(self) -> u8 {
        match self {
            SlideCount::Five => 5,
            SlideCount::Ten => 10,
            SlideCount::Fifteen => 15,
        }
    }

    pub fn next(self) -> Self {
        match self {
            SlideCount::Five => SlideCount::Ten,
            SlideCount::Ten => SlideCount::Fifteen,
            SlideCount::Fifteen => SlideCount::Five,
        }
    }
}

impl TryFrom<u8> for SlideCount {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            5 => Ok(SlideCount::Five),
            10 => Ok(SlideCount::Ten),
            15 => Ok(SlideCount::Fifteen),
            other => Err(format!("slide count must be 5, 10 or 15, got {other}")),
        }
    }
}

impl From<SlideCount> for u8 {
    fn from(value: SlideCount) -> Self {
        value.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Corporate,
    Startup,
    Academic,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Corporate => "corporate",
            Theme::Startup => "startup",
            Theme::Academic => "academic",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, &'static str> {
        match s.to_lowercase().as_str() {
            "corporate" => Ok(Theme::Corporate),
            "startup" => Ok(Theme::Startup),
            "academic" => Ok(Theme::Academic),
            _ => Err("Invalid theme. Use: corporate, startup, academic"),
        }
    }

    pub fn next(self) -> Self {
        match self {
            Theme::Corporate => Theme::Startup,
            Theme::Startup => Theme::Academic,
            Theme::Academic => Theme::Corporate,
        }
    }
}

/// Body of `POST /generate`. The backend calls the audio flag `include_tts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub slide_count: SlideCount,
    pub theme: Theme,
    #[serde(rename = "include_tts", alias = "include_audio")]
    pub include_audio: bool,
    pub language: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Inner object of the `{ "error": { "code", "message" } }` envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    #[default]
    Queued,
    Researching,
    Planning,
    Generating,
    Assembling,
    Completed,
    Failed,
}

impl StatusKind {
    pub fn is_terminal(self) -> bool {
        matches!(self, StatusKind::Completed | StatusKind::Failed)
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusKind::Queued => "Queued",
            StatusKind::Researching => "Researching",
            StatusKind::Planning => "Planning",
            StatusKind::Generating => "Generating",
            StatusKind::Assembling => "Assembling",
            StatusKind::Completed => "Completed",
            StatusKind::Failed => "Failed",
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One entry of the backend's recent step log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepLog {
    pub step_name: String,
    pub status: String,
    #[serde(default)]
    pub duration: Option<u64>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Snapshot returned by `GET /status/{session_id}`.
///
/// Only `status` is authoritative. The counters are advisory and can move
/// backwards when the backend corrects itself.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GenerationStatus {
    pub status: StatusKind,
    #[serde(default, deserialize_with = "null_as_default")]
    pub progress: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub current_step: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slides_completed: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_slides: u32,
    #[serde(default)]
    pub estimated_remaining: Option<u64>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub generation_time: Option<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub logs: Vec<StepLog>,
}

/// The backend sends `null` for columns that have not been written yet.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl GenerationStatus {
    pub fn progress_percent(&self) -> u16 {
        self.progress.min(100) as u16
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideSummary {
    pub slide_number: u32,
    pub title: String,
    #[serde(default)]
    pub slide_type: String,
    #[serde(default)]
    pub speaker_notes: Option<String>,
}

/// Outline of a finished deck from `GET /presentation/{session_id}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PresentationPreview {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slides: Vec<SlideSummary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LanguagesResponse {
    #[serde(default)]
    pub languages: BTreeMap<String, String>,
}

/// Used when the backend cannot list its languages.
pub fn default_languages() -> BTreeMap<String, String> {
    [
        ("en", "English"),
        ("es", "Spanish"),
        ("fr", "French"),
        ("de", "German"),
        ("ja", "Japanese"),
        ("zh", "Chinese"),
    ]
    .into_iter()
    .map(|(code, name)| (code.to_string(), name.to_string()))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_decodes_with_missing_fields() {
        let status: GenerationStatus =
            serde_json::from_str(r#"{"status":"queued","progress":0}"#).unwrap();
        assert_eq!(status.status, StatusKind::Queued);
        assert_eq!(status.progress, 0);
        assert!(status.estimated_remaining.is_none());
        assert!(status.logs.is_empty());
    }

    #[test]
    fn test_status_decodes_full_payload() {
        let raw = r#"{
            "status": "generating",
            "progress": 55,
            "current_step": "Generating presentation content",
            "slides_completed": 4,
            "total_slides": 10,
            "estimated_remaining": 42,
            "logs": [{"step_name": "research", "status": "completed", "duration": 1200}]
        }"#;
        let status: GenerationStatus = serde_json::from_str(raw).unwrap();
        assert_eq!(status.status, StatusKind::Generating);
        assert_eq!(status.slides_completed, 4);
        assert_eq!(status.estimated_remaining, Some(42));
        assert_eq!(status.logs[0].duration, Some(1200));
    }

    #[test]
    fn test_status_decodes_null_columns() {
        // shape of a queued job before any worker has touched it
        let raw = r#"{"presentation_id":1,"status":"queued","progress":null,"current_step":null,"slides_completed":null,"total_slides":null,"error_message":null,"generation_time":null,"is_active":true,"logs":null}"#;
        let status: GenerationStatus = serde_json::from_str(raw).unwrap();
        assert_eq!(status.status, StatusKind::Queued);
        assert_eq!(status.progress, 0);
        assert_eq!(status.current_step, "");
        assert_eq!(status.total_slides, 0);
        assert!(status.logs.is_empty());
        assert!(status.generation_time.is_none());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(StatusKind::Completed.is_terminal());
        assert!(StatusKind::Failed.is_terminal());
        assert!(!StatusKind::Assembling.is_terminal());
        assert!(!StatusKind::Queued.is_terminal());
    }

    #[test]
    fn test_progress_is_clamped_for_display() {
        let status = GenerationStatus { progress: 140, ..Default::default() };
        assert_eq!(status.progress_percent(), 100);
    }

    #[test]
    fn test_request_wire_format() {
        let request = GenerationRequest {
            prompt: "Climate Change Solutions".to_string(),
            slide_count: SlideCount::Ten,
            theme: Theme::Academic,
            include_audio: true,
            language: "en".to_string(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["slide_count"], 10);
        assert_eq!(value["theme"], "academic");
        assert_eq!(value["include_tts"], true);
    }

    #[test]
    fn test_slide_count_rejects_unknown_values() {
        assert!(serde_json::from_str::<SlideCount>("7").is_err());
        assert_eq!(serde_json::from_str::<SlideCount>("15").unwrap(), SlideCount::Fifteen);
    }

    #[test]
    fn test_session_id_rejects_blank() {
        assert!(SessionId::new("  ").is_none());
        assert_eq!(SessionId::new("abc123").unwrap().as_str(), "abc123");
    }
}
