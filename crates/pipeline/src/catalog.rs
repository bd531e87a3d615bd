//! Catalog store seam.
//!
//! The pipeline writes through [`CatalogStore`] and the gallery reads through
//! it. [`PgCatalog`] is the production store; [`MemoryCatalog`] keeps rows in
//! process and backs the test suites.

use async_trait::async_trait;
use tokio::sync::RwLock;
use wallery_core::types::DbId;
use wallery_db::models::wallpaper::{CreateWallpaper, Wallpaper, WallpaperListParams};
use wallery_db::repositories::wallpaper_repo::{clamp_limit, clamp_offset};
use wallery_db::repositories::WallpaperRepo;
use wallery_db::DbPool;

use crate::error::CatalogError;

/// Insert-and-read access to the wallpaper catalog.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Persist a new record. `id` and `created_at` are assigned here.
    async fn insert(&self, input: CreateWallpaper) -> Result<Wallpaper, CatalogError>;

    /// Records ordered newest first. An empty catalog is not an error.
    async fn list(&self, params: &WallpaperListParams) -> Result<Vec<Wallpaper>, CatalogError>;

    async fn find(&self, id: DbId) -> Result<Option<Wallpaper>, CatalogError>;

    async fn health_check(&self) -> Result<(), CatalogError>;
}

/// Reject records the catalog must never contain.
pub fn validate_new_wallpaper(input: &CreateWallpaper) -> Result<(), CatalogError> {
    if input.name.trim().is_empty() {
        return Err(CatalogError::Rejected("name must not be empty".into()));
    }
    if input.image_url.trim().is_empty() || input.thumb_url.trim().is_empty() {
        return Err(CatalogError::Rejected(
            "image_url and thumb_url must both be set".into(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// PostgreSQL
// ---------------------------------------------------------------------------

/// Catalog backed by the `wallpapers` table.
#[derive(Clone)]
pub struct PgCatalog {
    pool: DbPool,
}

impl PgCatalog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogStore for PgCatalog {
    async fn insert(&self, input: CreateWallpaper) -> Result<Wallpaper, CatalogError> {
        validate_new_wallpaper(&input)?;
        Ok(WallpaperRepo::create(&self.pool, &input).await?)
    }

    async fn list(&self, params: &WallpaperListParams) -> Result<Vec<Wallpaper>, CatalogError> {
        Ok(WallpaperRepo::list(&self.pool, params).await?)
    }

    async fn find(&self, id: DbId) -> Result<Option<Wallpaper>, CatalogError> {
        Ok(WallpaperRepo::find_by_id(&self.pool, id).await?)
    }

    async fn health_check(&self) -> Result<(), CatalogError> {
        Ok(wallery_db::health_check(&self.pool).await?)
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Catalog held in process memory, with the same ordering and filtering
/// rules as [`PgCatalog`].
#[derive(Default)]
pub struct MemoryCatalog {
    rows: RwLock<Vec<Wallpaper>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records inserted so far.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn insert(&self, input: CreateWallpaper) -> Result<Wallpaper, CatalogError> {
        validate_new_wallpaper(&input)?;
        let mut rows = self.rows.write().await;
        let wallpaper = Wallpaper {
            id: rows.len() as DbId + 1,
            name: input.name,
            tags: input.tags,
            image_url: input.image_url,
            thumb_url: input.thumb_url,
            created_at: chrono::Utc::now(),
        };
        rows.push(wallpaper.clone());
        Ok(wallpaper)
    }

    async fn list(&self, params: &WallpaperListParams) -> Result<Vec<Wallpaper>, CatalogError> {
        let rows = self.rows.read().await;
        let mut matching: Vec<Wallpaper> = rows
            .iter()
            .filter(|w| match &params.tag {
                Some(tag) => w.tags.iter().any(|t| t == tag),
                None => true,
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

        let offset = clamp_offset(params.offset) as usize;
        let limit = clamp_limit(params.limit).map_or(usize::MAX, |l| l as usize);
        Ok(matching.into_iter().skip(offset).take(limit).collect())
    }

    async fn find(&self, id: DbId) -> Result<Option<Wallpaper>, CatalogError> {
        Ok(self.rows.read().await.iter().find(|w| w.id == id).cloned())
    }

    async fn health_check(&self) -> Result<(), CatalogError> {
        Ok(())
    }
}
