use std::collections::BTreeMap;

use async_trait::async_trait;
use deck_api::{ApiError, Artifact, DeckApiClient};
use deck_common::{GenerationRequest, GenerationStatus, PresentationPreview, SessionId};

/// The generation service as seen by the controller and the poller.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn create_generation(&self, request: &GenerationRequest) -> Result<SessionId, ApiError>;

    async fn fetch_status(&self, session_id: &SessionId) -> Result<GenerationStatus, ApiError>;

    async fn download(&self, session_id: &SessionId) -> Result<Artifact, ApiError>;

    async fn download_audio(&self, session_id: &SessionId) -> Result<Artifact, ApiError>;

    async fn fetch_preview(&self, session_id: &SessionId)
        -> Result<PresentationPreview, ApiError>;

    async fn list_languages(&self) -> Result<BTreeMap<String, String>, ApiError>;
}

#[async_trait]
impl Backend for DeckApiClient {
    async fn create_generation(&self, request: &GenerationRequest) -> Result<SessionId, ApiError> {
        DeckApiClient::create_generation(self, request).await
    }

    async fn fetch_status(&self, session_id: &SessionId) -> Result<GenerationStatus, ApiError> {
        DeckApiClient::fetch_status(self, session_id).await
    }

    async fn download(&self, session_id: &SessionId) -> Result<Artifact, ApiError> {
        DeckApiClient::download(self, session_id).await
    }

    async fn download_audio(&self, session_id: &SessionId) -> Result<Artifact, ApiError> {
        DeckApiClient::download_audio(self, session_id).await
    }

    async fn fetch_preview(
        &self,
        session_id: &SessionId,
    ) -> Result<PresentationPreview, ApiError> {
        DeckApiClient::fetch_preview(self, session_id).await
    }

    async fn list_languages(&self) -> Result<BTreeMap<String, String>, ApiError> {
        DeckApiClient::list_languages(self).await
    }
}
