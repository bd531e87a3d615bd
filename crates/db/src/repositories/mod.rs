//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod wallpaper_repo;

pub use wallpaper_repo::WallpaperRepo;
