//! Upload pipeline for the wallpaper gallery.
//!
//! An upload is three calls to independent services: the image host, the
//! vision model and the catalog database. There is no transaction spanning
//! them, so [`upload::UploadPipeline`] runs them as a saga: each stage is
//! journaled, a failure aborts the remaining stages, and an image that was
//! already hosted is handed to a [`saga::HostCompensation`] hook.

pub mod catalog;
pub mod config;
pub mod error;
pub mod image_host;
pub mod saga;
pub mod upload;
pub mod vision;

pub use catalog::{CatalogStore, MemoryCatalog, PgCatalog};
pub use config::{AnalysisMode, PipelineConfig};
pub use error::{AnalysisError, CatalogError, ConfigError, ImageHostError, PipelineError};
pub use upload::{PipelineOptions, UploadFailure, UploadPipeline, UploadReceipt};
