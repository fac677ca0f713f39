//! In-memory index of installed levels, loaded from the database.
//!
//! This is the concrete [`LocalStore`] used by local previews: metadata comes
//! from the `level` table, covers and preview audio are read from the level
//! folder on demand.

use crate::database::connection::Database;
use crate::database::models::LevelRow;
use crate::error::{PreviewError, PreviewResult};
use crate::local::{LocalLevel, LocalStore};
use crate::models::{AudioClip, CoverImage, LevelMetadata};
use crate::preview::memo::cancellable;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
pub struct LibraryLevel {
    metadata: LevelMetadata,
    cover_path: Option<PathBuf>,
    audio_path: Option<PathBuf>,
}

impl LibraryLevel {
    pub fn from_row(row: &LevelRow) -> Self {
        Self {
            metadata: LevelMetadata::from(row),
            cover_path: row.cover_path(),
            audio_path: row.audio_path(),
        }
    }
}

/// Reads a level file, treating a missing file as "not shipped".
async fn read_optional(path: &Path, cancel: &CancellationToken) -> PreviewResult<Option<Vec<u8>>> {
    let read = async {
        match tokio::fs::read(path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("LIBRARY: {:?} is missing", path);
                Ok(None)
            }
            Err(e) => Err(PreviewError::from(e)),
        }
    };
    cancellable(read, cancel).await
}

#[async_trait]
impl LocalLevel for LibraryLevel {
    fn metadata(&self) -> &LevelMetadata {
        &self.metadata
    }

    async fn cover_image(&self, cancel: &CancellationToken) -> PreviewResult<Option<CoverImage>> {
        let Some(path) = &self.cover_path else {
            return Ok(None);
        };
        match read_optional(path, cancel).await? {
            Some(data) => CoverImage::decode(&data).map(Some),
            None => Ok(None),
        }
    }

    async fn preview_audio(&self, cancel: &CancellationToken) -> PreviewResult<Option<AudioClip>> {
        let Some(path) = &self.audio_path else {
            return Ok(None);
        };
        let data = read_optional(path, cancel).await?;
        Ok(data.map(|data| AudioClip::new(Some(path.clone()), Bytes::from(data))))
    }
}

#[derive(Debug, Default)]
pub struct SongLibrary {
    levels: HashMap<String, Arc<LibraryLevel>>,
}

impl SongLibrary {
    pub fn from_rows(rows: &[LevelRow]) -> Self {
        let levels = rows
            .iter()
            .map(|row| (row.level_id.clone(), Arc::new(LibraryLevel::from_row(row))))
            .collect();
        Self { levels }
    }

    /// Loads every level row into memory.
    pub async fn load(db: &Database) -> PreviewResult<Self> {
        let rows = db.get_all_levels().await?;
        log::info!("LIBRARY: loaded {} levels", rows.len());
        Ok(Self::from_rows(&rows))
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn level_ids(&self) -> impl Iterator<Item = &str> {
        self.levels.keys().map(|id| id.as_str())
    }
}

impl LocalStore for SongLibrary {
    fn level_by_id(&self, level_id: &str) -> Option<Arc<dyn LocalLevel>> {
        self.levels
            .get(level_id)
            .map(|level| Arc::clone(level) as Arc<dyn LocalLevel>)
    }
}
