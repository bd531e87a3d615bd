//! The upload pipeline.
//!
//! `Idle -> HostUploading -> Analyzing -> Persisting -> Done`, with `Failed`
//! reachable from every stage. Stages run strictly in sequence and nothing
//! is retried. The analysis stage is governed by [`AnalysisMode`].

use std::sync::Arc;

use wallery_core::analysis::ImageAnalysis;
use wallery_core::data_url::ImagePayload;
use wallery_core::draft::UploadDraft;
use wallery_db::models::wallpaper::{CreateWallpaper, Wallpaper};

use crate::catalog::CatalogStore;
use crate::config::{AnalysisMode, PipelineConfig};
use crate::error::{AnalysisError, ConfigError, PipelineError};
use crate::image_host::{HostedImage, ImageHost, ImgbbClient};
use crate::saga::{CompensationOutcome, HostCompensation, PipelineStage, RetainOrphan, SagaJournal};
use crate::vision::{GeminiClient, VisionAnalyzer};

/// Behavioural switches of a pipeline.
#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    pub analysis_mode: AnalysisMode,
    pub require_name: bool,
}

/// A successful run.
#[derive(Debug)]
pub struct UploadReceipt {
    pub wallpaper: Wallpaper,
    pub journal: SagaJournal,
}

/// A failed run.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct UploadFailure {
    pub error: PipelineError,
    pub journal: SagaJournal,
    /// Hosted image left behind by a failure after the host upload.
    pub orphaned: Option<HostedImage>,
}

/// Orchestrates image host, vision model and catalog for one upload.
pub struct UploadPipeline {
    host: Arc<dyn ImageHost>,
    vision: Option<Arc<dyn VisionAnalyzer>>,
    catalog: Arc<dyn CatalogStore>,
    compensation: Arc<dyn HostCompensation>,
    options: PipelineOptions,
}

impl UploadPipeline {
    /// Assemble a pipeline from its collaborators.
    ///
    /// A name is always required when analysis is skipped.
    pub fn new(
        options: PipelineOptions,
        host: Arc<dyn ImageHost>,
        catalog: Arc<dyn CatalogStore>,
    ) -> Self {
        let require_name = options.require_name || options.analysis_mode == AnalysisMode::Skip;
        Self {
            host,
            vision: None,
            catalog,
            compensation: Arc::new(RetainOrphan),
            options: PipelineOptions {
                require_name,
                ..options
            },
        }
    }

    pub fn with_vision(mut self, vision: Arc<dyn VisionAnalyzer>) -> Self {
        self.vision = Some(vision);
        self
    }

    pub fn with_compensation(mut self, compensation: Arc<dyn HostCompensation>) -> Self {
        self.compensation = compensation;
        self
    }

    /// Build the production pipeline: imgbb host, Gemini vision model and
    /// the given catalog, sharing one HTTP client with the configured
    /// timeout.
    pub fn from_config(
        config: &PipelineConfig,
        catalog: Arc<dyn CatalogStore>,
    ) -> Result<Self, ConfigError> {
        let client = config.http_client()?;
        let host = Arc::new(ImgbbClient::with_client(client.clone(), &config.image_host));
        let mut pipeline = Self::new(
            PipelineOptions {
                analysis_mode: config.analysis_mode,
                require_name: config.require_name,
            },
            host,
            catalog,
        );

        match (&config.vision, config.analysis_mode) {
            (_, AnalysisMode::Skip) => {}
            (Some(vision), _) => {
                pipeline = pipeline.with_vision(Arc::new(GeminiClient::with_client(client, vision)));
            }
            (None, _) => return Err(ConfigError::Missing("VISION_API_KEY")),
        }

        Ok(pipeline)
    }

    pub fn options(&self) -> PipelineOptions {
        self.options
    }

    pub fn catalog(&self) -> &Arc<dyn CatalogStore> {
        &self.catalog
    }

    /// Run the vision model alone, without hosting or persisting anything.
    pub async fn analyze_only(&self, image: &ImagePayload) -> Result<ImageAnalysis, PipelineError> {
        let vision = self.vision.as_ref().ok_or_else(|| {
            PipelineError::InvalidInput("Image analysis is disabled on this server".into())
        })?;
        Ok(vision.analyze(image).await?)
    }

    /// Run the whole upload for a draft.
    ///
    /// Validation happens before any network call. On success the draft is
    /// completed (cleared); on failure it is marked failed and keeps its
    /// contents so the user can retry, which uploads the image again.
    pub async fn run(&self, draft: &mut UploadDraft) -> Result<UploadReceipt, UploadFailure> {
        let mut journal = SagaJournal::default();

        let validated = draft.validate(self.options.require_name).cloned();
        let image = match validated {
            Ok(image) => image,
            Err(e) => {
                let error = PipelineError::from(e);
                draft.fail(error.to_string());
                return Err(UploadFailure {
                    error,
                    journal,
                    orphaned: None,
                });
            }
        };

        if let Err(e) = draft.begin() {
            // Another run owns the draft; leave its status alone.
            return Err(UploadFailure {
                error: e.into(),
                journal,
                orphaned: None,
            });
        }

        tracing::info!(
            mime_type = %image.mime_type,
            bytes = image.len(),
            analysis_mode = %self.options.analysis_mode,
            "Upload started"
        );

        // --- Host upload ---
        journal.intent(PipelineStage::HostUploading);
        let hosted = match self.host.upload(&image).await {
            Ok(hosted) => {
                journal.completed(PipelineStage::HostUploading);
                hosted
            }
            Err(e) => {
                journal.failed(PipelineStage::HostUploading, e.to_string());
                return Err(self.abort(draft, journal, e.into(), None).await);
            }
        };

        // --- Analysis ---
        let analysis = match self.analysis_stage(draft, &image, &mut journal).await {
            Ok(analysis) => analysis,
            Err(e) => return Err(self.abort(draft, journal, e.into(), Some(hosted)).await),
        };

        // --- Persist ---
        let record = resolve_record(draft, analysis, &hosted);
        draft.mark_uploading();
        journal.intent(PipelineStage::Persisting);
        let wallpaper = match self.catalog.insert(record).await {
            Ok(wallpaper) => {
                journal.completed(PipelineStage::Persisting);
                wallpaper
            }
            Err(e) => {
                journal.failed(PipelineStage::Persisting, e.to_string());
                return Err(self.abort(draft, journal, e.into(), Some(hosted)).await);
            }
        };

        draft.complete();
        tracing::info!(
            wallpaper_id = wallpaper.id,
            name = %wallpaper.name,
            tags = ?wallpaper.tags,
            "Upload completed"
        );

        Ok(UploadReceipt { wallpaper, journal })
    }

    /// Run the analysis stage according to the configured mode.
    ///
    /// Returns `Ok(None)` when analysis is skipped.
    async fn analysis_stage(
        &self,
        draft: &mut UploadDraft,
        image: &ImagePayload,
        journal: &mut SagaJournal,
    ) -> Result<Option<ImageAnalysis>, AnalysisError> {
        let mode = self.options.analysis_mode;
        if mode == AnalysisMode::Skip {
            return Ok(None);
        }

        draft.mark_analyzing();
        journal.intent(PipelineStage::Analyzing);

        let result = match &self.vision {
            Some(vision) => vision.analyze(image).await,
            None => Err(AnalysisError::RequestFailed(
                "No vision analyzer is configured".into(),
            )),
        };

        match (result, mode) {
            (Ok(analysis), _) => {
                journal.completed(PipelineStage::Analyzing);
                Ok(Some(analysis))
            }
            (Err(e), AnalysisMode::BestEffort) => {
                tracing::warn!(error = %e, "Analysis failed, using placeholder name and tags");
                journal.fell_back(PipelineStage::Analyzing, e.to_string());
                Ok(Some(ImageAnalysis::placeholder()))
            }
            (Err(e), _) => {
                journal.failed(PipelineStage::Analyzing, e.to_string());
                Err(e)
            }
        }
    }

    /// Fail the run, compensating a hosted image when there is one.
    async fn abort(
        &self,
        draft: &mut UploadDraft,
        mut journal: SagaJournal,
        error: PipelineError,
        hosted: Option<HostedImage>,
    ) -> UploadFailure {
        let orphaned = match hosted {
            Some(hosted) => self.compensate(hosted, &mut journal).await,
            None => None,
        };

        tracing::error!(error = %error, "Upload failed");
        draft.fail(error.to_string());

        UploadFailure {
            error,
            journal,
            orphaned,
        }
    }

    async fn compensate(
        &self,
        hosted: HostedImage,
        journal: &mut SagaJournal,
    ) -> Option<HostedImage> {
        journal.intent(PipelineStage::Compensating);
        match self.compensation.compensate(&hosted).await {
            Ok(CompensationOutcome::Released) => {
                journal.completed(PipelineStage::Compensating);
                None
            }
            Ok(CompensationOutcome::Retained) => {
                journal.retained(PipelineStage::Compensating, hosted.image_url.clone());
                Some(hosted)
            }
            Err(e) => {
                tracing::warn!(error = %e, image_url = %hosted.image_url, "Compensation failed");
                journal.retained(PipelineStage::Compensating, e.to_string());
                Some(hosted)
            }
        }
    }
}

/// Combine user input, analysis and hosted URLs into the record to insert.
///
/// Non-empty user values win over the model's suggestions.
fn resolve_record(
    draft: &UploadDraft,
    analysis: Option<ImageAnalysis>,
    hosted: &HostedImage,
) -> CreateWallpaper {
    let user_tags = draft.resolved_tags();
    let (ai_name, ai_tags) = match analysis {
        Some(a) => (Some(a.name), a.tags),
        None => (None, Vec::new()),
    };

    CreateWallpaper {
        name: draft.resolved_name().or(ai_name).unwrap_or_default(),
        tags: if user_tags.is_empty() { ai_tags } else { user_tags },
        image_url: hosted.image_url.clone(),
        thumb_url: hosted.thumb_url.clone(),
    }
}
