//! Saga journal and compensation hook.
//!
//! The three stages of an upload have no shared transaction. The journal
//! records an intent before each stage and its outcome after, so a failed
//! run can say exactly which external effects happened. When a stage fails
//! after the image was hosted, [`HostCompensation`] gets a chance to undo
//! the upload.

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use wallery_core::types::Timestamp;

use crate::error::ImageHostError;
use crate::image_host::HostedImage;

/// A step of the upload saga.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    HostUploading,
    Analyzing,
    Persisting,
    Compensating,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PipelineStage::HostUploading => "host_uploading",
            PipelineStage::Analyzing => "analyzing",
            PipelineStage::Persisting => "persisting",
            PipelineStage::Compensating => "compensating",
        })
    }
}

/// What happened at a journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "detail", rename_all = "snake_case")]
pub enum SagaEvent {
    Intent,
    Completed,
    Failed(String),
    /// The stage failed but a fallback value was used instead.
    FellBack(String),
    /// An external effect was left in place.
    Retained(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SagaEntry {
    pub stage: PipelineStage,
    pub event: SagaEvent,
    pub at: Timestamp,
}

/// Ordered record of one pipeline run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SagaJournal {
    entries: Vec<SagaEntry>,
}

impl SagaJournal {
    pub fn entries(&self) -> &[SagaEntry] {
        &self.entries
    }

    pub fn intent(&mut self, stage: PipelineStage) {
        tracing::debug!(%stage, "Stage started");
        self.push(stage, SagaEvent::Intent);
    }

    pub fn completed(&mut self, stage: PipelineStage) {
        tracing::debug!(%stage, "Stage completed");
        self.push(stage, SagaEvent::Completed);
    }

    pub fn failed(&mut self, stage: PipelineStage, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::warn!(%stage, error = %reason, "Stage failed");
        self.push(stage, SagaEvent::Failed(reason));
    }

    pub fn fell_back(&mut self, stage: PipelineStage, reason: impl Into<String>) {
        self.push(stage, SagaEvent::FellBack(reason.into()));
    }

    pub fn retained(&mut self, stage: PipelineStage, reason: impl Into<String>) {
        self.push(stage, SagaEvent::Retained(reason.into()));
    }

    /// Stages that finished successfully, in order.
    pub fn completed_stages(&self) -> Vec<PipelineStage> {
        self.entries
            .iter()
            .filter(|e| e.event == SagaEvent::Completed)
            .map(|e| e.stage)
            .collect()
    }

    /// The stage whose failure ended the run, if any.
    pub fn failed_stage(&self) -> Option<PipelineStage> {
        self.entries
            .iter()
            .find(|e| matches!(e.event, SagaEvent::Failed(_)))
            .map(|e| e.stage)
    }

    fn push(&mut self, stage: PipelineStage, event: SagaEvent) {
        self.entries.push(SagaEntry {
            stage,
            event,
            at: chrono::Utc::now(),
        });
    }
}

/// Result of compensating a hosted image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompensationOutcome {
    /// The asset was removed from the host.
    Released,
    /// The asset is still on the host.
    Retained,
}

/// Undo hook for the host upload stage.
#[async_trait]
pub trait HostCompensation: Send + Sync {
    async fn compensate(&self, hosted: &HostedImage) -> Result<CompensationOutcome, ImageHostError>;
}

/// Leaves the hosted image in place and logs it as orphaned.
///
/// The image host offers no authenticated delete API, so the asset is only
/// reported. Its `delete_url` is included in the log for manual cleanup.
pub struct RetainOrphan;

#[async_trait]
impl HostCompensation for RetainOrphan {
    async fn compensate(&self, hosted: &HostedImage) -> Result<CompensationOutcome, ImageHostError> {
        tracing::warn!(
            image_url = %hosted.image_url,
            thumb_url = %hosted.thumb_url,
            delete_url = hosted.delete_url.as_deref().unwrap_or("<none>"),
            "Hosted image orphaned by failed upload"
        );
        Ok(CompensationOutcome::Retained)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn journal_tracks_completed_and_failed_stages() {
        let mut journal = SagaJournal::default();
        journal.intent(PipelineStage::HostUploading);
        journal.completed(PipelineStage::HostUploading);
        journal.intent(PipelineStage::Analyzing);
        journal.failed(PipelineStage::Analyzing, "blocked");

        assert_eq!(journal.entries().len(), 4);
        assert_eq!(journal.completed_stages(), vec![PipelineStage::HostUploading]);
        assert_eq!(journal.failed_stage(), Some(PipelineStage::Analyzing));
    }

    #[test]
    fn events_serialize_with_detail() {
        let json = serde_json::to_value(SagaEvent::Failed("rate limited".into())).unwrap();
        assert_eq!(json["event"], "failed");
        assert_eq!(json["detail"], "rate limited");
    }

    #[tokio::test]
    async fn retain_orphan_keeps_asset() {
        let hosted = HostedImage {
            image_url: "https://i.example.com/a.png".into(),
            thumb_url: "https://i.example.com/a_t.png".into(),
            delete_url: None,
        };
        assert_eq!(
            RetainOrphan.compensate(&hosted).await.unwrap(),
            CompensationOutcome::Retained
        );
    }
}
