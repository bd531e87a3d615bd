//! Vision model client.
//!
//! Sends the fixed analysis prompt and the inlined image to a Gemini-style
//! `generateContent` endpoint and turns the answer into an
//! [`ImageAnalysis`]. The answer lives at
//! `candidates[0].content.parts[0].text`; when it is absent the prompt
//! feedback says whether the safety filter blocked the request.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use wallery_core::analysis::{parse_analysis, ImageAnalysis, ANALYSIS_PROMPT};
use wallery_core::data_url::ImagePayload;

use crate::config::VisionConfig;
use crate::error::AnalysisError;

/// Anything that can suggest a name and tags for an image.
#[async_trait]
pub trait VisionAnalyzer: Send + Sync {
    async fn analyze(&self, image: &ImagePayload) -> Result<ImageAnalysis, AnalysisError>;
}

/// HTTP client for the Gemini `generateContent` API.
pub struct GeminiClient {
    client: reqwest::Client,
    url: String,
    api_key: String,
    json_mode: bool,
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    InlineData { inline_data: InlineData<'a> },
}

#[derive(Debug, Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GeminiClient {
    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: &VisionConfig) -> Self {
        Self {
            client,
            url: format!("{}/{}:generateContent", config.endpoint, config.model),
            api_key: config.api_key.clone(),
            json_mode: config.json_mode,
        }
    }
}

#[async_trait]
impl VisionAnalyzer for GeminiClient {
    async fn analyze(&self, image: &ImagePayload) -> Result<ImageAnalysis, AnalysisError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: ANALYSIS_PROMPT,
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: &image.mime_type,
                            data: &image.base64,
                        },
                    },
                ],
            }],
            generation_config: self.json_mode.then_some(GenerationConfig {
                response_mime_type: "application/json",
            }),
        };

        let response = self
            .client
            .post(&self.url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(request_failed)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(request_failed)?;

        if !status.is_success() {
            return Err(AnalysisError::RequestFailed(format!(
                "Vision model API error ({}): {body}",
                status.as_u16()
            )));
        }

        let text = extract_answer(&body)?;
        tracing::debug!(chars = text.len(), "Vision model answered");

        parse_analysis(&text).map_err(|e| {
            tracing::warn!(error = %e, "Vision model answer was not usable");
            AnalysisError::from(e)
        })
    }
}

/// The request URL carries the API key; keep it out of the message.
fn request_failed(err: reqwest::Error) -> AnalysisError {
    AnalysisError::RequestFailed(err.without_url().to_string())
}

/// Pull the answer text out of a `generateContent` response body.
fn extract_answer(body: &str) -> Result<String, AnalysisError> {
    let response: GenerateContentResponse = serde_json::from_str(body).map_err(|e| {
        AnalysisError::RequestFailed(format!("Vision model returned invalid JSON: {e}"))
    })?;

    let first = response.candidates.into_iter().next();

    let text = first
        .as_ref()
        .and_then(|c| c.content.as_ref())
        .and_then(|c| c.parts.first())
        .and_then(|p| p.text.clone())
        .filter(|t| !t.trim().is_empty());

    if let Some(text) = text {
        return Ok(text);
    }

    let block_reason = response
        .prompt_feedback
        .and_then(|f| f.block_reason)
        .or_else(|| {
            first
                .and_then(|c| c.finish_reason)
                .filter(|r| r == "SAFETY" || r == "BLOCKLIST" || r == "PROHIBITED_CONTENT")
        });

    match block_reason {
        Some(reason) => Err(AnalysisError::Blocked { reason }),
        None => Err(AnalysisError::Empty),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use std::collections::HashMap;

    use super::*;

    fn answer(text: &str) -> String {
        serde_json::json!({
            "candidates": [{
                "content": {"parts": [{"text": text}], "role": "model"},
                "finishReason": "STOP"
            }]
        })
        .to_string()
    }

    #[test]
    fn extracts_first_candidate_text() {
        let text = extract_answer(&answer("{\"name\": \"Dune Sea\"}")).unwrap();
        assert_eq!(text, "{\"name\": \"Dune Sea\"}");
    }

    #[test]
    fn prompt_block_reason_is_reported() {
        let body = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        assert_matches!(
            extract_answer(body),
            Err(AnalysisError::Blocked { reason }) if reason == "SAFETY"
        );
    }

    #[test]
    fn candidate_safety_stop_is_a_block() {
        let body = r#"{"candidates": [{"finishReason": "SAFETY"}]}"#;
        assert_matches!(extract_answer(body), Err(AnalysisError::Blocked { .. }));
    }

    #[test]
    fn no_candidates_is_empty() {
        assert_matches!(extract_answer("{}"), Err(AnalysisError::Empty));
        assert_matches!(extract_answer(&answer("   ")), Err(AnalysisError::Empty));
    }

    #[test]
    fn request_body_matches_wire_format() {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text { text: "describe" },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: "image/png",
                            data: "AAAA",
                        },
                    },
                ],
            }],
            generation_config: Some(GenerationConfig {
                response_mime_type: "application/json",
            }),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "describe");
        assert_eq!(
            json["contents"][0]["parts"][1]["inline_data"]["mime_type"],
            "image/png"
        );
        assert_eq!(json["generationConfig"]["responseMimeType"], "application/json");
    }

    async fn spawn_upstream(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/v1beta/models")
    }

    fn client_for(endpoint: String) -> GeminiClient {
        GeminiClient::with_client(
            reqwest::Client::new(),
            &VisionConfig {
                endpoint,
                model: "test-model".into(),
                api_key: "vision-key".into(),
                json_mode: false,
            },
        )
    }

    fn payload() -> ImagePayload {
        ImagePayload::from_data_url("data:image/png;base64,iVBORw0KGgo=").unwrap()
    }

    #[tokio::test]
    async fn analyzes_fenced_answer() {
        let router = Router::new().route(
            "/v1beta/models/{action}",
            post(
                |Query(query): Query<HashMap<String, String>>,
                 Json(body): Json<serde_json::Value>| async move {
                    let inline = &body["contents"][0]["parts"][1]["inline_data"];
                    if query.get("key").map(String::as_str) != Some("vision-key")
                        || inline["data"] != "iVBORw0KGgo="
                        || inline["mime_type"] != "image/png"
                    {
                        return (StatusCode::BAD_REQUEST, "unexpected request".to_string());
                    }
                    (
                        StatusCode::OK,
                        answer("```json\n{\"name\": \"Golden Hour\", \"tags\": [\"sunset\", \"Sky\"]}\n```"),
                    )
                },
            ),
        );
        let client = client_for(spawn_upstream(router).await);

        let analysis = client.analyze(&payload()).await.unwrap();
        assert_eq!(analysis.name, "Golden Hour");
        assert_eq!(analysis.tags, vec!["sunset", "sky"]);
    }

    #[tokio::test]
    async fn non_success_status_is_request_failure() {
        let router = Router::new().route(
            "/v1beta/models/{action}",
            post(|| async { (StatusCode::FORBIDDEN, "API key not valid") }),
        );
        let client = client_for(spawn_upstream(router).await);

        assert_matches!(
            client.analyze(&payload()).await,
            Err(AnalysisError::RequestFailed(msg)) if msg.contains("403") && msg.contains("API key not valid")
        );
    }

    #[tokio::test]
    async fn unreachable_model_error_hides_api_key() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = client_for(format!("http://{addr}/v1beta/models"));

        let err = client.analyze(&payload()).await.unwrap_err();
        assert_matches!(err, AnalysisError::RequestFailed(_));
        assert!(!err.to_string().contains("vision-key"), "got: {err}");
    }

    #[tokio::test]
    async fn prose_answer_is_unparseable() {
        let router = Router::new().route(
            "/v1beta/models/{action}",
            post(|| async { answer("I think this is a sunset.") }),
        );
        let client = client_for(spawn_upstream(router).await);

        assert_matches!(
            client.analyze(&payload()).await,
            Err(AnalysisError::Unparseable(_))
        );
    }
}
