//! Data structures mirroring the SQLite tables.

use crate::models::LevelMetadata;
use crate::preview::level_id_to_hash;
use sqlx::FromRow;
use std::path::PathBuf;

/// One installed level. File names are relative to `path`.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct LevelRow {
    pub level_id: String,
    pub hash: String, // derived from level_id, kept for catalog lookups by hash
    pub path: String,
    pub song_name: String,
    pub song_sub_name: String,
    pub song_author_name: String,
    pub level_author_name: String,
    pub bpm: f64,
    pub duration: f64, // seconds
    pub preview_start_time: f64,
    pub preview_duration: f64,
    pub cover_file: Option<String>,
    pub audio_file: Option<String>,
}

impl LevelRow {
    pub fn new(level_id: &str, path: &str, metadata: &LevelMetadata) -> Self {
        Self {
            level_id: level_id.to_string(),
            hash: level_id_to_hash(level_id),
            path: path.to_string(),
            song_name: metadata.song_name.clone(),
            song_sub_name: metadata.song_sub_name.clone(),
            song_author_name: metadata.song_author_name.clone(),
            level_author_name: metadata.level_author_name.clone(),
            bpm: metadata.beats_per_minute as f64,
            duration: metadata.song_duration as f64,
            preview_start_time: metadata.preview_start_time as f64,
            preview_duration: metadata.preview_duration as f64,
            cover_file: None,
            audio_file: None,
        }
    }

    pub fn with_cover(mut self, file: &str) -> Self {
        self.cover_file = Some(file.to_string());
        self
    }

    pub fn with_audio(mut self, file: &str) -> Self {
        self.audio_file = Some(file.to_string());
        self
    }

    pub fn folder(&self) -> PathBuf {
        PathBuf::from(&self.path)
    }

    pub fn cover_path(&self) -> Option<PathBuf> {
        self.cover_file.as_ref().map(|f| self.folder().join(f))
    }

    pub fn audio_path(&self) -> Option<PathBuf> {
        self.audio_file.as_ref().map(|f| self.folder().join(f))
    }
}

impl From<&LevelRow> for LevelMetadata {
    fn from(row: &LevelRow) -> Self {
        Self {
            song_name: row.song_name.clone(),
            song_sub_name: row.song_sub_name.clone(),
            song_author_name: row.song_author_name.clone(),
            level_author_name: row.level_author_name.clone(),
            beats_per_minute: row.bpm as f32,
            song_duration: row.duration as f32,
            preview_start_time: row.preview_start_time as f32,
            preview_duration: row.preview_duration as f32,
        }
    }
}
