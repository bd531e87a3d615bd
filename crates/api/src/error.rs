use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use wallery_core::error::CoreError;
use wallery_pipeline::{AnalysisError, CatalogError, PipelineError};

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and [`PipelineError`] for failed
/// uploads, and implements [`IntoResponse`] to produce consistent JSON error
/// responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A failed pipeline run or analysis preview.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// A catalog read failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The request could not be extracted (malformed JSON, wrong field
    /// types, missing content type, bad path or query parameters).
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Internal(msg) => internal(msg),
            },

            AppError::Pipeline(err) => classify_pipeline_error(err),

            AppError::Catalog(err) => {
                tracing::error!(error = %err, "Catalog read failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PERSISTENCE_ERROR",
                    "Failed to load wallpapers".to_string(),
                )
            }

            AppError::Rejected { status, message } => (*status, "VALIDATION_ERROR", message.clone()),
            AppError::InternalError(msg) => internal(msg),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

/// Upstream failures keep their diagnostic text so the user sees why the
/// upload failed.
fn classify_pipeline_error(err: &PipelineError) -> (StatusCode, &'static str, String) {
    let message = err.to_string();
    match err {
        PipelineError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message),
        PipelineError::Busy(_) => (StatusCode::CONFLICT, "CONFLICT", message),
        PipelineError::ImageHost(_) => (StatusCode::BAD_GATEWAY, "IMAGE_HOST_ERROR", message),
        PipelineError::Analysis(AnalysisError::Blocked { .. }) => {
            (StatusCode::UNPROCESSABLE_ENTITY, "ANALYSIS_BLOCKED", message)
        }
        PipelineError::Analysis(_) => (StatusCode::BAD_GATEWAY, "ANALYSIS_ERROR", message),
        PipelineError::Persistence(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "PERSISTENCE_ERROR", message)
        }
    }
}

fn internal(msg: &str) -> (StatusCode, &'static str, String) {
    tracing::error!(error = %msg, "Internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}
