//! Beatmap previews for level browsers and multiplayer lobbies.
//!
//! A [`PreviewRecord`] represents a level before its full data is necessarily
//! on disk. Expensive derived resources (catalog downloadability, cover art,
//! preview audio) are fetched on demand, cancellable, and memoized.

pub mod catalog;
pub mod database;
pub mod error;
pub mod local;
pub mod models;
pub mod preview;

#[cfg(test)]
mod test_support;

pub use catalog::{CatalogClient, CatalogEntry, ProgressSink};
pub use error::{PreviewError, PreviewResult};
pub use local::{LocalLevel, LocalStore};
pub use models::{AudioClip, CoverImage, LevelMetadata, PreviewPacket, PreviewSettings};
pub use preview::{Downloadability, PreviewContext, PreviewRecord};
