//! Error types for each pipeline stage.
//!
//! Every variant carries the upstream diagnostic text so the single message
//! surfaced to the caller explains what the external service said.

use wallery_core::analysis::AnalysisParseError;
use wallery_core::error::CoreError;

/// Failures of the image host stage.
#[derive(Debug, thiserror::Error)]
pub enum ImageHostError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout). The
    /// request URL carries the API key, so it is stripped before wrapping.
    #[error("Image host request failed: {0}")]
    Request(reqwest::Error),

    /// The host answered with a non-2xx status or `success: false`.
    #[error("Image host rejected the upload ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The host claimed success but the body lacked the expected URLs.
    #[error("Image host returned an unexpected response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ImageHostError {
    fn from(err: reqwest::Error) -> Self {
        ImageHostError::Request(err.without_url())
    }
}

/// Failures of the vision analysis stage.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Vision model request failed: {0}")]
    RequestFailed(String),

    #[error("Content blocked by AI safety filters. Reason: {reason}")]
    Blocked { reason: String },

    #[error("Received an empty or invalid response from the AI model.")]
    Empty,

    #[error(transparent)]
    Unparseable(AnalysisParseError),
}

impl From<AnalysisParseError> for AnalysisError {
    fn from(err: AnalysisParseError) -> Self {
        match err {
            AnalysisParseError::Empty => AnalysisError::Empty,
            other => AnalysisError::Unparseable(other),
        }
    }
}

/// Failures of the catalog store.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The record failed the store's own checks before any write.
    #[error("Invalid wallpaper record: {0}")]
    Rejected(String),
}

/// The single error a pipeline run surfaces to its caller.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Malformed image data or a missing mandatory field. No network call
    /// was made.
    #[error("{0}")]
    InvalidInput(String),

    /// The draft is already being uploaded.
    #[error("{0}")]
    Busy(String),

    #[error("Image upload failed: {0}")]
    ImageHost(#[from] ImageHostError),

    #[error("Image analysis failed: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Failed to save wallpaper: {0}")]
    Persistence(#[from] CatalogError),
}

impl From<CoreError> for PipelineError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => PipelineError::InvalidInput(msg),
            CoreError::Conflict(msg) => PipelineError::Busy(msg),
            other => PipelineError::InvalidInput(other.to_string()),
        }
    }
}

/// Startup configuration problems. Surfaced before any network call.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
