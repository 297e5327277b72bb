use std::collections::BTreeMap;

use deck_common::{
    default_languages, GenerationRequest, SessionId, SlideCount, Theme, PROMPT_MAX_CHARS,
    PROMPT_MIN_CHARS,
};

use crate::backend::Backend;
use crate::error::{DeckError, Result};

/// Editable state behind the landing view.
#[derive(Debug, Clone)]
pub struct SubmissionForm {
    pub prompt: String,
    pub slide_count: SlideCount,
    pub theme: Theme,
    pub include_audio: bool,
    pub language: String,
    languages: BTreeMap<String, String>,
}

impl Default for SubmissionForm {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            slide_count: SlideCount::default(),
            theme: Theme::default(),
            include_audio: false,
            language: "en".to_string(),
            languages: default_languages(),
        }
    }
}

impl SubmissionForm {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            ..Self::default()
        }
    }

    pub fn languages(&self) -> &BTreeMap<String, String> {
        &self.languages
    }

    /// Replace the language choices; keeps the current pick when still offered.
    pub fn set_languages(&mut self, languages: BTreeMap<String, String>) {
        if languages.is_empty() {
            return;
        }
        if !languages.contains_key(&self.language) {
            if let Some(first) = languages.keys().next() {
                self.language = first.clone();
            }
        }
        self.languages = languages;
    }

    pub fn language_name(&self) -> &str {
        self.languages
            .get(&self.language)
            .map(String::as_str)
            .unwrap_or(self.language.as_str())
    }

    pub fn cycle_language(&mut self) {
        let next = self
            .languages
            .keys()
            .skip_while(|code| **code != self.language)
            .nth(1)
            .or_else(|| self.languages.keys().next());
        if let Some(code) = next {
            self.language = code.clone();
        }
    }

    pub fn prompt_len(&self) -> usize {
        self.prompt.trim().chars().count()
    }

    /// Local checks only; nothing is sent when this fails.
    pub fn validate(&self) -> Result<GenerationRequest> {
        let prompt = self.prompt.trim();
        let len = prompt.chars().count();
        if len == 0 {
            return Err(DeckError::Validation(
                "Please enter a topic for your presentation.".to_string(),
            ));
        }
        if len < PROMPT_MIN_CHARS {
            return Err(DeckError::Validation(format!(
                "Please provide a more detailed prompt (at least {PROMPT_MIN_CHARS} characters)."
            )));
        }
        if len > PROMPT_MAX_CHARS {
            return Err(DeckError::Validation(format!(
                "Prompt is too long ({len} characters, maximum {PROMPT_MAX_CHARS})."
            )));
        }

        Ok(GenerationRequest {
            prompt: prompt.to_string(),
            slide_count: self.slide_count,
            theme: self.theme,
            include_audio: self.include_audio,
            language: self.language.clone(),
        })
    }
}

/// Validate, then issue exactly one creation request.
pub async fn submit(
    backend: &dyn Backend,
    form: &SubmissionForm,
) -> Result<(GenerationRequest, SessionId)> {
    let request = form.validate()?;
    tracing::info!(
        slides = request.slide_count.get(),
        theme = request.theme.as_str(),
        audio = request.include_audio,
        "submitting generation request"
    );
    let session_id = backend.create_generation(&request).await?;
    Ok((request, session_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorReporter;
    use crate::scripted::{CreateReply, ScriptedBackend};

    fn form(prompt: &str) -> SubmissionForm {
        SubmissionForm {
            prompt: prompt.to_string(),
            ..SubmissionForm::default()
        }
    }

    #[tokio::test]
    async fn test_short_prompts_never_reach_backend() {
        let backend = ScriptedBackend::new().with_session("never");
        for prompt in ["", "a", "too short", "123456789"] {
            let err = submit(&backend, &form(prompt)).await.unwrap_err();
            assert!(matches!(err, DeckError::Validation(_)), "{prompt:?}");
        }
        assert!(backend.create_requests().is_empty());
    }

    #[tokio::test]
    async fn test_minimum_length_prompt_is_sent() {
        let backend = ScriptedBackend::new().with_session("abc123");
        let (request, session) = submit(&backend, &form("0123456789")).await.unwrap();
        assert_eq!(session.as_str(), "abc123");
        assert_eq!(request.prompt, "0123456789");
        assert_eq!(backend.create_requests().len(), 1);
    }

    #[test]
    fn test_overlong_prompt_is_rejected() {
        let long = "x".repeat(PROMPT_MAX_CHARS + 1);
        assert!(matches!(form(&long).validate(), Err(DeckError::Validation(_))));
    }

    #[test]
    fn test_whitespace_does_not_count() {
        assert!(form("   short    ").validate().is_err());
    }

    #[tokio::test]
    async fn test_backend_message_surfaces() {
        let backend = ScriptedBackend::new().with_create_reply(CreateReply::Backend {
            code: "RATE_LIMIT".to_string(),
            message: "Too many generations today".to_string(),
        });
        let err = submit(&backend, &form("Climate Change Solutions")).await.unwrap_err();
        assert_eq!(ErrorReporter::format_user_error(&err), "Too many generations today");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_request_failure() {
        let backend = ScriptedBackend::new().with_create_reply(CreateReply::Unreachable);
        let err = submit(&backend, &form("Climate Change Solutions")).await.unwrap_err();
        assert!(matches!(err, DeckError::RequestFailure(_)));
        assert_eq!(backend.create_requests().len(), 1);
    }

    #[test]
    fn test_language_cycle_wraps() {
        let mut form = SubmissionForm::default();
        let languages: BTreeMap<String, String> = [("de", "German"), ("en", "English")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        form.set_languages(languages);
        assert_eq!(form.language, "en");
        form.cycle_language();
        assert_eq!(form.language, "de");
        form.cycle_language();
        assert_eq!(form.language, "en");
        assert_eq!(form.language_name(), "English");
    }

    #[test]
    fn test_unknown_language_is_replaced() {
        let mut form = SubmissionForm::new("xx");
        let languages: BTreeMap<String, String> =
            [("fr".to_string(), "French".to_string())].into_iter().collect();
        form.set_languages(languages);
        assert_eq!(form.language, "fr");
    }
}
