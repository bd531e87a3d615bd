//! Decoding of `data:` URLs carrying base64 image payloads.
//!
//! The browser hands the pipeline the file it read with `FileReader`, which
//! has the shape `data:image/png;base64,iVBORw0...`. Both the image host and
//! the vision model take the base64 text as-is, so the decoded payload keeps
//! the original encoding alongside the raw bytes.

use std::sync::LazyLock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::Regex;

use crate::error::CoreError;

static DATA_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^data:(image/[A-Za-z0-9.+-]+);base64,(.+)$").expect("data URL pattern is valid")
});

/// An image decoded from a data URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    /// Declared mime type, e.g. `image/png`.
    pub mime_type: String,
    /// Base64 text exactly as it appeared after the comma.
    pub base64: String,
    /// Decoded bytes, never empty.
    pub bytes: Vec<u8>,
}

impl ImagePayload {
    /// Parse a `data:<mime>;base64,<payload>` string.
    ///
    /// Fails with [`CoreError::Validation`] when the string cannot be split
    /// into header and payload, the mime type is not an `image/*` type, the
    /// payload is not valid base64, or it decodes to zero bytes.
    pub fn from_data_url(data_url: &str) -> Result<Self, CoreError> {
        let trimmed = data_url.trim();
        if trimmed.is_empty() {
            return Err(CoreError::Validation("No image data provided.".into()));
        }

        let caps = DATA_URL_RE
            .captures(trimmed)
            .ok_or_else(|| CoreError::Validation("Invalid base64 image format.".into()))?;

        let mime_type = caps[1].to_ascii_lowercase();
        let base64 = caps[2].to_string();

        let bytes = STANDARD
            .decode(base64.as_bytes())
            .map_err(|e| CoreError::Validation(format!("Invalid base64 image payload: {e}")))?;

        if bytes.is_empty() {
            return Err(CoreError::Validation("Image payload is empty.".into()));
        }

        Ok(Self {
            mime_type,
            base64,
            bytes,
        })
    }

    /// Build a payload from raw bytes, encoding them for the upstream APIs.
    pub fn from_bytes(mime_type: impl Into<String>, bytes: Vec<u8>) -> Result<Self, CoreError> {
        let mime_type = mime_type.into();
        if !mime_type.starts_with("image/") {
            return Err(CoreError::Validation(format!(
                "Unsupported mime type '{mime_type}'. Expected an image/* type"
            )));
        }
        if bytes.is_empty() {
            return Err(CoreError::Validation("Image payload is empty.".into()));
        }
        Ok(Self {
            base64: STANDARD.encode(&bytes),
            mime_type,
            bytes,
        })
    }

    /// Re-assemble the data URL, used as the draft preview.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64)
    }

    /// Size of the decoded image in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always `false`; kept alongside [`len`](Self::len).
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
