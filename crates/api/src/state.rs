use std::sync::Arc;

use wallery_pipeline::{CatalogStore, UploadPipeline};

use crate::config::ServerConfig;
use crate::inflight::InFlightUploads;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The upload pipeline, including the catalog it writes to.
    pub pipeline: Arc<UploadPipeline>,
    pub config: Arc<ServerConfig>,
    /// Digests of uploads currently running.
    pub inflight: Arc<InFlightUploads>,
}

impl AppState {
    pub fn new(pipeline: UploadPipeline, config: ServerConfig) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            config: Arc::new(config),
            inflight: Arc::new(InFlightUploads::default()),
        }
    }

    pub fn catalog(&self) -> &Arc<dyn CatalogStore> {
        self.pipeline.catalog()
    }
}
