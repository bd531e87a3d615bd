//! Repository for the `wallpapers` table.

use sqlx::PgPool;
use wallery_core::types::DbId;

use crate::models::wallpaper::{CreateWallpaper, Wallpaper, WallpaperListParams};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, tags, image_url, thumb_url, created_at";

/// Maximum page size for gallery listing.
pub const MAX_LIMIT: i64 = 200;

/// Clamp a requested page size into `1..=MAX_LIMIT`. `None` means no limit.
pub fn clamp_limit(limit: Option<i64>) -> Option<i64> {
    limit.map(|l| l.clamp(1, MAX_LIMIT))
}

/// Clamp a requested offset to be non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

/// Provides insert and read operations for wallpapers.
pub struct WallpaperRepo;

impl WallpaperRepo {
    /// Insert a new wallpaper, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateWallpaper) -> Result<Wallpaper, sqlx::Error> {
        let query = format!(
            "INSERT INTO wallpapers (name, tags, image_url, thumb_url)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Wallpaper>(&query)
            .bind(&input.name)
            .bind(&input.tags)
            .bind(&input.image_url)
            .bind(&input.thumb_url)
            .fetch_one(pool)
            .await
    }

    /// Find a wallpaper by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Wallpaper>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM wallpapers WHERE id = $1");
        sqlx::query_as::<_, Wallpaper>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List wallpapers, most recently created first.
    ///
    /// Without a `limit` every matching row is returned. Ties on
    /// `created_at` are broken by descending id so inserts in the same
    /// transaction still list newest first.
    pub async fn list(
        pool: &PgPool,
        params: &WallpaperListParams,
    ) -> Result<Vec<Wallpaper>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM wallpapers
             WHERE ($1::TEXT IS NULL OR $1 = ANY(tags))
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Wallpaper>(&query)
            .bind(params.tag.as_deref())
            .bind(clamp_limit(params.limit))
            .bind(clamp_offset(params.offset))
            .fetch_all(pool)
            .await
    }
}
