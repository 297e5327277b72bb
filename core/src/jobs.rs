use std::path::PathBuf;
use std::sync::Arc;

use deck_common::{default_artifact_name, save_artifact, PresentationPreview, SessionId};

use crate::backend::Backend;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Download,
    DownloadAudio,
    Preview,
}

#[derive(Debug, Clone)]
pub enum JobOutcome {
    Saved { kind: JobKind, path: PathBuf },
    Preview(PresentationPreview),
}

/// One-shot request against a finished session. Runs independently of
/// the polling task.
#[derive(Clone)]
pub struct Job {
    pub kind: JobKind,
    pub session_id: SessionId,
    backend: Arc<dyn Backend>,
    output_dir: PathBuf,
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("kind", &self.kind)
            .field("session_id", &self.session_id)
            .field("output_dir", &self.output_dir)
            .finish()
    }
}

impl Job {
    pub fn new(
        kind: JobKind,
        session_id: SessionId,
        backend: Arc<dyn Backend>,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            kind,
            session_id,
            backend,
            output_dir,
        }
    }

    pub async fn run(self) -> Result<JobOutcome> {
        match self.kind {
            JobKind::Download => {
                let artifact = self.backend.download(&self.session_id).await?;
                let name = artifact
                    .filename
                    .unwrap_or_else(|| default_artifact_name(self.session_id.as_str(), "pptx"));
                let path = save_artifact(&self.output_dir, &name, &artifact.bytes).await?;
                tracing::info!(path = %path.display(), bytes = artifact.bytes.len(), "presentation saved");
                Ok(JobOutcome::Saved { kind: self.kind, path })
            }
            JobKind::DownloadAudio => {
                let artifact = self.backend.download_audio(&self.session_id).await?;
                let name = artifact.filename.unwrap_or_else(|| {
                    default_artifact_name(self.session_id.as_str(), "wav")
                        .replacen("presentation_", "presentation_audio_", 1)
                });
                let path = save_artifact(&self.output_dir, &name, &artifact.bytes).await?;
                tracing::info!(path = %path.display(), "narration saved");
                Ok(JobOutcome::Saved { kind: self.kind, path })
            }
            JobKind::Preview => {
                let preview = self.backend.fetch_preview(&self.session_id).await?;
                Ok(JobOutcome::Preview(preview))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripted::ScriptedBackend;

    #[tokio::test]
    async fn test_download_writes_artifact() {
        let tmp = tempfile::tempdir().unwrap();
        let backend = Arc::new(ScriptedBackend::new());
        let job = Job::new(
            JobKind::Download,
            SessionId::new("abc123").unwrap(),
            backend.clone(),
            tmp.path().to_path_buf(),
        );

        match job.run().await.unwrap() {
            JobOutcome::Saved { kind, path } => {
                assert_eq!(kind, JobKind::Download);
                assert_eq!(path, tmp.path().join("abc123.pptx"));
                assert!(std::fs::read(path).unwrap().starts_with(b"PK"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(backend.download_count(), 1);
    }

    #[tokio::test]
    async fn test_audio_falls_back_to_default_name() {
        let tmp = tempfile::tempdir().unwrap();
        let job = Job::new(
            JobKind::DownloadAudio,
            SessionId::new("abc123").unwrap(),
            Arc::new(ScriptedBackend::new()),
            tmp.path().to_path_buf(),
        );

        match job.run().await.unwrap() {
            JobOutcome::Saved { path, .. } => {
                assert_eq!(path, tmp.path().join("presentation_audio_abc123.wav"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
