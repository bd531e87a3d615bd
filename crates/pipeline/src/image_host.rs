//! Image host client.
//!
//! Uploads the base64 payload to an imgbb-compatible API with a single
//! multipart `POST {endpoint}?key=<key>` and returns the hosted URLs. No
//! retries, no caching, and the returned URLs are not checked.

use async_trait::async_trait;
use serde::Deserialize;
use wallery_core::data_url::ImagePayload;

use crate::config::ImageHostConfig;
use crate::error::ImageHostError;

/// URLs of an image stored on the external host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedImage {
    pub image_url: String,
    pub thumb_url: String,
    /// Page where the asset can be deleted, when the host provides one.
    pub delete_url: Option<String>,
}

/// Anything that can store an image and hand back its URLs.
#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload(&self, image: &ImagePayload) -> Result<HostedImage, ImageHostError>;
}

/// HTTP client for the imgbb upload API.
pub struct ImgbbClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    success: Option<bool>,
    data: Option<UploadData>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    url: Option<String>,
    display_url: Option<String>,
    delete_url: Option<String>,
    thumb: Option<UrlField>,
}

#[derive(Debug, Deserialize)]
struct UrlField {
    url: Option<String>,
}

impl ImgbbClient {
    /// Create a client reusing an existing [`reqwest::Client`] (which carries
    /// the upstream timeout).
    pub fn with_client(client: reqwest::Client, config: &ImageHostConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl ImageHost for ImgbbClient {
    async fn upload(&self, image: &ImagePayload) -> Result<HostedImage, ImageHostError> {
        let form = reqwest::multipart::Form::new().text("image", image.base64.clone());

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        tracing::debug!(status = status.as_u16(), bytes = body.len(), "Image host responded");

        parse_upload_response(status.as_u16(), &body)
    }
}

/// Interpret an image host response body.
///
/// A non-2xx status or `success: false` is a rejection carrying the host's
/// own error message verbatim. A missing thumbnail falls back to the full
/// size URL so both URLs are always populated.
fn parse_upload_response(status: u16, body: &str) -> Result<HostedImage, ImageHostError> {
    let parsed: Option<UploadResponse> = serde_json::from_str(body).ok();
    let is_success = (200..300).contains(&status);

    let Some(parsed) = parsed else {
        if is_success {
            return Err(ImageHostError::InvalidResponse(format!(
                "body is not JSON: {body}"
            )));
        }
        return Err(ImageHostError::Rejected {
            status,
            message: body.to_string(),
        });
    };

    if !is_success || parsed.success == Some(false) {
        let message = parsed
            .error
            .as_ref()
            .and_then(error_message)
            .unwrap_or_else(|| body.to_string());
        return Err(ImageHostError::Rejected { status, message });
    }

    let data = parsed
        .data
        .ok_or_else(|| ImageHostError::InvalidResponse("missing `data`".into()))?;

    let image_url = data
        .url
        .or(data.display_url)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ImageHostError::InvalidResponse("missing `data.url`".into()))?;

    let thumb_url = data
        .thumb
        .and_then(|t| t.url)
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| image_url.clone());

    Ok(HostedImage {
        image_url,
        thumb_url,
        delete_url: data.delete_url,
    })
}

/// The host reports errors either as `{"message": ...}` or a bare string.
fn error_message(error: &serde_json::Value) -> Option<String> {
    match error {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Object(map) => map
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string),
        _ => None,
    }
}
