//! Domain logic for the wallpaper gallery.
//!
//! Everything in this crate is pure: no network, no database. The upload
//! pipeline and the HTTP layer build on these types.

pub mod analysis;
pub mod data_url;
pub mod draft;
pub mod error;
pub mod hashing;
pub mod tags;
pub mod types;
