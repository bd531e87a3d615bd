//! Vision model prompt and response normalization.
//!
//! The model is asked for a bare JSON object but regularly wraps it in a
//! markdown code fence, and older prompts asked for tags as a comma-separated
//! string. [`parse_analysis`] accepts all of those shapes and returns the
//! canonical [`ImageAnalysis`] or a typed [`AnalysisParseError`].

use serde::{Deserialize, Serialize};

use crate::tags::{normalize_tags, TagInput};

/// Instruction sent with every image to the vision model.
pub const ANALYSIS_PROMPT: &str = "Analyze this image and provide a suitable name and tags for a \
wallpaper gallery. Respond with a single, clean JSON object with two keys: \"name\" (a creative \
title, 3-5 words) and \"tags\" (a JSON array of 3-5 relevant, single-word, lowercase tags). Do \
not include any other text or markdown formatting.";

/// Name used when analysis is best-effort and the model gave nothing usable.
pub const PLACEHOLDER_NAME: &str = "Untitled Wallpaper";

/// Tags used together with [`PLACEHOLDER_NAME`].
pub const PLACEHOLDER_TAGS: &[&str] = &["wallpaper"];

/// Name and tags suggested for an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAnalysis {
    pub name: String,
    pub tags: Vec<String>,
}

impl ImageAnalysis {
    /// The fixed fallback pair.
    pub fn placeholder() -> Self {
        Self {
            name: PLACEHOLDER_NAME.to_string(),
            tags: normalize_tags(PLACEHOLDER_TAGS),
        }
    }
}

/// Why a model answer could not be turned into an [`ImageAnalysis`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisParseError {
    #[error("The AI response was empty")]
    Empty,

    #[error("Could not understand the response from AI: {reason}")]
    InvalidJson { reason: String, cleaned: String },

    #[error("The AI response did not include a name")]
    MissingName,
}

#[derive(Deserialize)]
struct RawAnalysis {
    name: Option<String>,
    tags: Option<TagInput>,
}

/// Remove an optional markdown code fence around the model's answer.
///
/// Handles ```` ```json ... ``` ````, bare ```` ``` ... ``` ```` and
/// unfenced text. The result is trimmed.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    // Language identifier directly after the opening fence.
    inner
        .trim_start_matches(|c: char| c.is_ascii_alphanumeric())
        .trim()
}

/// Parse the model's free-text answer into a name and normalized tags.
pub fn parse_analysis(text: &str) -> Result<ImageAnalysis, AnalysisParseError> {
    let cleaned = strip_code_fence(text);
    if cleaned.is_empty() {
        return Err(AnalysisParseError::Empty);
    }

    let raw: RawAnalysis =
        serde_json::from_str(cleaned).map_err(|e| AnalysisParseError::InvalidJson {
            reason: e.to_string(),
            cleaned: cleaned.to_string(),
        })?;

    let name = raw
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or(AnalysisParseError::MissingName)?;

    Ok(ImageAnalysis {
        name,
        tags: raw.tags.map(|t| t.normalize()).unwrap_or_default(),
    })
}
