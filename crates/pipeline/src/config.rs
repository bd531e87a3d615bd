//! Pipeline configuration.
//!
//! Secrets and endpoints are read once at startup and validated here; the
//! resulting struct is handed to [`UploadPipeline::from_config`](crate::UploadPipeline::from_config).
//! Nothing in the pipeline reads the environment after that.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Default image host upload endpoint.
pub const DEFAULT_IMAGE_HOST_URL: &str = "https://api.imgbb.com/1/upload";

/// Default base URL for the vision model API (model name is appended).
pub const DEFAULT_VISION_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Default vision model.
pub const DEFAULT_VISION_MODEL: &str = "gemini-pro-vision";

/// Default timeout for each outbound call, in seconds.
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 60;

/// Whether and how the vision model takes part in an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalysisMode {
    /// No vision call; the user supplies the name and tags.
    Skip,
    /// Every upload is analyzed and an analysis failure fails the upload.
    #[default]
    Required,
    /// Analysis failures fall back to a placeholder name and tags.
    BestEffort,
}

impl FromStr for AnalysisMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(AnalysisMode::Skip),
            "required" => Ok(AnalysisMode::Required),
            "best_effort" | "best-effort" => Ok(AnalysisMode::BestEffort),
            other => Err(format!(
                "unknown analysis mode '{other}'; expected skip, required or best_effort"
            )),
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AnalysisMode::Skip => "skip",
            AnalysisMode::Required => "required",
            AnalysisMode::BestEffort => "best_effort",
        })
    }
}

/// Image host endpoint and credentials.
#[derive(Clone)]
pub struct ImageHostConfig {
    pub endpoint: String,
    pub api_key: String,
}

/// Vision model endpoint and credentials.
#[derive(Clone)]
pub struct VisionConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
    /// Ask the model for `application/json` output.
    pub json_mode: bool,
}

// API keys stay out of logs.
impl fmt::Debug for ImageHostConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageHostConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl fmt::Debug for VisionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisionConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("json_mode", &self.json_mode)
            .finish()
    }
}

/// Everything the upload pipeline needs to talk to its collaborators.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub image_host: ImageHostConfig,
    /// `None` when [`AnalysisMode::Skip`] is configured.
    pub vision: Option<VisionConfig>,
    pub analysis_mode: AnalysisMode,
    /// Reject uploads without a user-supplied name. Always `true` in
    /// [`AnalysisMode::Skip`].
    pub require_name: bool,
    /// Timeout applied by the HTTP client to every upstream call.
    pub upstream_timeout: Duration,
}

impl PipelineConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                 | Default                                   |
    /// |-------------------------|-------------------------------------------|
    /// | `IMAGE_HOST_API_KEY`    | required                                  |
    /// | `IMAGE_HOST_URL`        | [`DEFAULT_IMAGE_HOST_URL`]                |
    /// | `VISION_API_KEY`        | required unless `ANALYSIS_MODE=skip`      |
    /// | `VISION_API_URL`        | [`DEFAULT_VISION_API_URL`]                |
    /// | `VISION_MODEL`          | [`DEFAULT_VISION_MODEL`]                  |
    /// | `VISION_JSON_MODE`      | `false`                                   |
    /// | `ANALYSIS_MODE`         | `required`                                |
    /// | `REQUIRE_NAME`          | `false`                                   |
    /// | `UPSTREAM_TIMEOUT_SECS` | `60`                                      |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let analysis_mode = match get("ANALYSIS_MODE") {
            Some(value) => value.parse().map_err(|reason| ConfigError::Invalid {
                var: "ANALYSIS_MODE",
                value,
                reason,
            })?,
            None => AnalysisMode::default(),
        };

        let image_host = ImageHostConfig {
            endpoint: get("IMAGE_HOST_URL").unwrap_or_else(|| DEFAULT_IMAGE_HOST_URL.into()),
            api_key: get("IMAGE_HOST_API_KEY").ok_or(ConfigError::Missing("IMAGE_HOST_API_KEY"))?,
        };

        let vision = match analysis_mode {
            AnalysisMode::Skip => None,
            AnalysisMode::Required | AnalysisMode::BestEffort => Some(VisionConfig {
                endpoint: get("VISION_API_URL")
                    .unwrap_or_else(|| DEFAULT_VISION_API_URL.into())
                    .trim_end_matches('/')
                    .to_string(),
                model: get("VISION_MODEL").unwrap_or_else(|| DEFAULT_VISION_MODEL.into()),
                api_key: get("VISION_API_KEY").ok_or(ConfigError::Missing("VISION_API_KEY"))?,
                json_mode: parse_bool("VISION_JSON_MODE", get("VISION_JSON_MODE"))?,
            }),
        };

        let require_name =
            analysis_mode == AnalysisMode::Skip || parse_bool("REQUIRE_NAME", get("REQUIRE_NAME"))?;

        let upstream_timeout_secs = match get("UPSTREAM_TIMEOUT_SECS") {
            Some(value) => value.parse::<u64>().map_err(|e| ConfigError::Invalid {
                var: "UPSTREAM_TIMEOUT_SECS",
                value,
                reason: e.to_string(),
            })?,
            None => DEFAULT_UPSTREAM_TIMEOUT_SECS,
        };

        Ok(Self {
            image_host,
            vision,
            analysis_mode,
            require_name,
            upstream_timeout: Duration::from_secs(upstream_timeout_secs),
        })
    }

    /// Build the shared HTTP client for the upstream calls.
    pub fn http_client(&self) -> Result<reqwest::Client, ConfigError> {
        Ok(reqwest::Client::builder()
            .timeout(self.upstream_timeout)
            .build()?)
    }
}

fn parse_bool(var: &'static str, value: Option<String>) -> Result<bool, ConfigError> {
    let Some(raw) = value else {
        return Ok(false);
    };
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            value: raw,
            reason: "expected a boolean".into(),
        }),
    }
}
