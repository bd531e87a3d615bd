#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tokio::sync::Notify;
use tower::ServiceExt;

use wallery_api::config::ServerConfig;
use wallery_api::router::build_app_router;
use wallery_api::state::AppState;
use wallery_core::analysis::ImageAnalysis;
use wallery_core::data_url::ImagePayload;
use wallery_pipeline::image_host::{HostedImage, ImageHost};
use wallery_pipeline::vision::VisionAnalyzer;
use wallery_pipeline::{
    AnalysisError, AnalysisMode, ImageHostError, MemoryCatalog, PipelineOptions, UploadPipeline,
};

/// A one-pixel PNG as a data URL.
pub const PNG_DATA_URL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk+M9QDwADhgGAWjR9awAAAABJRU5ErkJggg==";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        max_upload_bytes: 1024 * 1024,
        database_url: "postgres://localhost/wallery_test".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Fake upstreams
// ---------------------------------------------------------------------------

/// Image host that hands out sequential URLs.
#[derive(Default)]
pub struct FakeHost {
    pub calls: AtomicUsize,
    pub fail: bool,
    /// When set, every upload waits here until notified.
    pub gate: Option<Arc<Notify>>,
    /// Notified when an upload starts.
    pub entered: Arc<Notify>,
}

impl FakeHost {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageHost for FakeHost {
    async fn upload(&self, _image: &ImagePayload) -> Result<HostedImage, ImageHostError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.entered.notify_one();
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail {
            return Err(ImageHostError::Rejected {
                status: 400,
                message: "Invalid API v1 key.".into(),
            });
        }
        Ok(HostedImage {
            image_url: format!("https://i.example.com/{n}.png"),
            thumb_url: format!("https://i.example.com/{n}_t.png"),
            delete_url: None,
        })
    }
}

/// What the fake vision model answers.
#[derive(Clone)]
pub enum VisionReply {
    Analysis(&'static str, &'static [&'static str]),
    Blocked(&'static str),
    Empty,
}

pub struct FakeVision {
    pub calls: AtomicUsize,
    pub reply: VisionReply,
}

impl FakeVision {
    pub fn new(reply: VisionReply) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            reply,
        }
    }
}

#[async_trait]
impl VisionAnalyzer for FakeVision {
    async fn analyze(&self, _image: &ImagePayload) -> Result<ImageAnalysis, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            VisionReply::Analysis(name, tags) => Ok(ImageAnalysis {
                name: name.to_string(),
                tags: tags.iter().map(|t| t.to_string()).collect(),
            }),
            VisionReply::Blocked(reason) => Err(AnalysisError::Blocked {
                reason: reason.to_string(),
            }),
            VisionReply::Empty => Err(AnalysisError::Empty),
        }
    }
}

// ---------------------------------------------------------------------------
// App builders
// ---------------------------------------------------------------------------

/// Handles to the collaborators behind a test app.
pub struct TestApp {
    pub router: Router,
    pub host: Arc<FakeHost>,
    pub vision: Arc<FakeVision>,
    pub catalog: Arc<MemoryCatalog>,
}

pub fn build_test_app_with(mode: AnalysisMode, host: FakeHost, reply: VisionReply) -> TestApp {
    build_test_app_with_config(mode, host, reply, test_config())
}

pub fn build_test_app_with_config(
    mode: AnalysisMode,
    host: FakeHost,
    reply: VisionReply,
    config: ServerConfig,
) -> TestApp {
    let host = Arc::new(host);
    let vision = Arc::new(FakeVision::new(reply));
    let catalog = Arc::new(MemoryCatalog::new());

    let mut pipeline = UploadPipeline::new(
        PipelineOptions {
            analysis_mode: mode,
            require_name: false,
        },
        host.clone(),
        catalog.clone(),
    );
    if mode != AnalysisMode::Skip {
        pipeline = pipeline.with_vision(vision.clone());
    }

    TestApp {
        router: build_app_router(AppState::new(pipeline, config)),
        host,
        vision,
        catalog,
    }
}

/// App in `required` mode whose vision model names everything
/// "Misty Mountains".
pub fn build_test_app() -> TestApp {
    build_test_app_with(
        AnalysisMode::Required,
        FakeHost::default(),
        VisionReply::Analysis("Misty Mountains", &["mountain", "fog"]),
    )
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_raw(app: Router, uri: &str, content_type: &str, body: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", content_type)
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
