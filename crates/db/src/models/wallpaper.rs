//! Wallpaper catalog models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use wallery_core::types::{DbId, Timestamp};

/// A row from the `wallpapers` table.
///
/// Rows are written once by the upload pipeline and never updated.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Wallpaper {
    pub id: DbId,
    pub name: String,
    pub tags: Vec<String>,
    pub image_url: String,
    pub thumb_url: String,
    pub created_at: Timestamp,
}

/// DTO for inserting a wallpaper. `id` and `created_at` are assigned by the
/// store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateWallpaper {
    pub name: String,
    pub tags: Vec<String>,
    pub image_url: String,
    pub thumb_url: String,
}

/// Query parameters for gallery listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WallpaperListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    /// Exact match on one normalized tag.
    pub tag: Option<String>,
}
