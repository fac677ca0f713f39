//! Local content-store capability.
//!
//! Previews of installed levels delegate cover and audio loading to the store
//! that owns the level files. Previews never see engine types, only this
//! contract.

use crate::error::PreviewResult;
use crate::models::{AudioClip, CoverImage, LevelMetadata};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// One installed level.
#[async_trait]
pub trait LocalLevel: Send + Sync {
    fn metadata(&self) -> &LevelMetadata;

    /// `Ok(None)` when the level ships no usable cover.
    async fn cover_image(&self, cancel: &CancellationToken) -> PreviewResult<Option<CoverImage>>;

    /// `Ok(None)` when the level has no preview audio.
    async fn preview_audio(&self, cancel: &CancellationToken) -> PreviewResult<Option<AudioClip>>;
}

/// Lookup of installed levels by level id.
pub trait LocalStore: Send + Sync {
    fn level_by_id(&self, level_id: &str) -> Option<Arc<dyn LocalLevel>>;

    fn contains(&self, level_id: &str) -> bool {
        self.level_by_id(level_id).is_some()
    }
}
