//! Handlers for the wallpaper gallery and the upload pipeline.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use wallery_core::data_url::ImagePayload;
use wallery_core::draft::UploadDraft;
use wallery_core::error::CoreError;
use wallery_core::hashing::sha256_hex;
use wallery_core::tags::TagInput;
use wallery_core::types::DbId;
use wallery_db::models::wallpaper::WallpaperListParams;

use crate::error::{AppError, AppResult};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::response::{DataResponse, MessageResponse};
use crate::state::AppState;

/// Body of `POST /api/v1/wallpapers/upload`.
#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    /// `data:image/...;base64,...`
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Comma-separated string or array of strings.
    #[serde(default)]
    pub tags: Option<TagInput>,
}

/// Body of `POST /api/v1/wallpapers/analyze`.
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub image: Option<String>,
}

// ---------------------------------------------------------------------------
// Gallery
// ---------------------------------------------------------------------------

/// GET /api/v1/wallpapers
///
/// Most recent first. An empty catalog is a successful empty list.
pub async fn list_wallpapers(
    State(state): State<AppState>,
    ApiQuery(mut params): ApiQuery<WallpaperListParams>,
) -> AppResult<impl IntoResponse> {
    params.tag = params
        .tag
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty());

    let wallpapers = state.catalog().list(&params).await?;

    Ok(Json(DataResponse { data: wallpapers }))
}

/// GET /api/v1/wallpapers/{id}
pub async fn get_wallpaper(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<DbId>,
) -> AppResult<impl IntoResponse> {
    let wallpaper = state
        .catalog()
        .find(id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Wallpaper",
            id,
        }))?;

    Ok(Json(DataResponse { data: wallpaper }))
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// POST /api/v1/wallpapers/upload
///
/// Host the image, analyze it and add it to the catalog. Returns 201 with the
/// stored record.
///
/// The run happens in its own task holding the in-flight claim, so a client
/// that disconnects does not abort a run halfway through its stages.
pub async fn upload_wallpaper(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<UploadRequest>,
) -> AppResult<impl IntoResponse> {
    let mut draft = UploadDraft::from_invocation(
        input.image.as_deref().unwrap_or_default(),
        input.name.as_deref(),
        input.tags.as_ref(),
    )?;

    let digest = draft
        .image()
        .map(|image| sha256_hex(&image.bytes))
        .ok_or_else(|| AppError::InternalError("draft lost its image".into()))?;

    let claim = state.inflight.claim(digest.clone()).ok_or_else(|| {
        tracing::warn!(%digest, "Rejected duplicate upload while in flight");
        AppError::Core(CoreError::Conflict(
            "This image is already being uploaded".into(),
        ))
    })?;

    let pipeline = state.pipeline.clone();
    let run = tokio::spawn(async move {
        let result = pipeline.run(&mut draft).await;
        drop(claim);
        result
    });

    let receipt = run
        .await
        .map_err(|e| AppError::InternalError(format!("Upload task failed: {e}")))?
        .map_err(|failure| {
            tracing::warn!(
                %digest,
                failed_stage = ?failure.journal.failed_stage(),
                orphaned = failure.orphaned.as_ref().map(|h| h.image_url.as_str()),
                "Upload rejected"
            );
            AppError::Pipeline(failure.error)
        })?;

    tracing::info!(
        wallpaper_id = receipt.wallpaper.id,
        %digest,
        "Wallpaper uploaded"
    );

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Wallpaper uploaded successfully!",
            data: receipt.wallpaper,
        }),
    ))
}

/// POST /api/v1/wallpapers/analyze
///
/// Suggest a name and tags without hosting or storing anything.
pub async fn analyze_wallpaper(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<AnalyzeRequest>,
) -> AppResult<impl IntoResponse> {
    let image = ImagePayload::from_data_url(input.image.as_deref().unwrap_or_default())?;
    let analysis = state.pipeline.analyze_only(&image).await?;

    Ok(Json(DataResponse { data: analysis }))
}
