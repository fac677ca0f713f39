//! Test doubles for the catalog and the local store.

use crate::catalog::{CatalogClient, CatalogEntry, ProgressSink, report_progress};
use crate::error::{PreviewError, PreviewResult};
use crate::local::{LocalLevel, LocalStore};
use crate::models::{AudioClip, CoverImage, LevelMetadata};
use async_trait::async_trait;
use bytes::Bytes;
use image::{Rgba, RgbaImage};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

pub const HASH_A: &str = "0123456789ABCDEF0123456789ABCDEF01234567";

pub fn level_id_for(hash: &str) -> String {
    format!("custom_level_{}", hash)
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn metadata(song_name: &str) -> LevelMetadata {
    LevelMetadata {
        song_name: song_name.to_string(),
        song_sub_name: String::new(),
        song_author_name: "Camellia".to_string(),
        level_author_name: "mapper".to_string(),
        beats_per_minute: 180.0,
        song_duration: 120.0,
        ..Default::default()
    }
}

pub fn catalog_entry(key: &str, hash: &str) -> CatalogEntry {
    CatalogEntry {
        key: key.to_string(),
        hash: hash.to_string(),
        metadata: metadata("Catalog Song"),
    }
}

pub fn solid_cover(rgba: [u8; 4]) -> CoverImage {
    CoverImage::new(RgbaImage::from_pixel(8, 8, Rgba(rgba)))
}

pub fn png_bytes(rgba: [u8; 4]) -> Bytes {
    solid_cover(rgba)
        .encode_png()
        .unwrap_or_else(|e| panic!("encode test cover: {}", e))
}

/// Catalog double counting every call. A gated catalog holds lookups until
/// [`MockCatalog::open`] is called.
pub struct MockCatalog {
    entry: Mutex<Option<CatalogEntry>>,
    lookup_failures: AtomicUsize,
    fail_covers: AtomicBool,
    cover: Bytes,
    gate_tx: watch::Sender<bool>,
    gate_rx: watch::Receiver<bool>,
    pub lookups: AtomicUsize,
    pub cover_fetches: AtomicUsize,
    pub downloads: AtomicUsize,
}

impl MockCatalog {
    fn new(entry: Option<CatalogEntry>) -> Self {
        let (gate_tx, gate_rx) = watch::channel(true);
        Self {
            entry: Mutex::new(entry),
            lookup_failures: AtomicUsize::new(0),
            fail_covers: AtomicBool::new(false),
            cover: png_bytes([0, 128, 255, 255]),
            gate_tx,
            gate_rx,
            lookups: AtomicUsize::new(0),
            cover_fetches: AtomicUsize::new(0),
            downloads: AtomicUsize::new(0),
        }
    }

    pub fn with_entry(entry: CatalogEntry) -> Self {
        Self::new(Some(entry))
    }

    pub fn not_found() -> Self {
        Self::new(None)
    }

    pub fn gated(self) -> Self {
        let _ = self.gate_tx.send(false);
        self
    }

    pub fn open(&self) {
        let _ = self.gate_tx.send(true);
    }

    /// The next `count` lookups fail with a transport error.
    pub fn fail_lookups(&self, count: usize) {
        self.lookup_failures.store(count, Ordering::SeqCst);
    }

    pub fn fail_covers(&self, fail: bool) {
        self.fail_covers.store(fail, Ordering::SeqCst);
    }

    pub fn cover_bytes(&self) -> Bytes {
        self.cover.clone()
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn cover_fetch_count(&self) -> usize {
        self.cover_fetches.load(Ordering::SeqCst)
    }

    pub fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogClient for MockCatalog {
    async fn lookup_by_hash(
        &self,
        _hash: &str,
        _cancel: &CancellationToken,
    ) -> PreviewResult<Option<CatalogEntry>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let mut gate = self.gate_rx.clone();
        let _ = gate.wait_for(|open| *open).await;

        let failures = self.lookup_failures.load(Ordering::SeqCst);
        if failures > 0 {
            self.lookup_failures.store(failures - 1, Ordering::SeqCst);
            return Err(PreviewError::transport("connection reset"));
        }
        Ok(self.entry.lock().unwrap().clone())
    }

    async fn fetch_cover(
        &self,
        _entry: &CatalogEntry,
        _cancel: &CancellationToken,
    ) -> PreviewResult<Bytes> {
        self.cover_fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_covers.load(Ordering::SeqCst) {
            return Err(PreviewError::transport("cover fetch failed"));
        }
        Ok(self.cover.clone())
    }

    async fn download_archive(
        &self,
        entry: &CatalogEntry,
        include_extras: bool,
        _cancel: &CancellationToken,
        progress: Option<&ProgressSink>,
    ) -> PreviewResult<Bytes> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        report_progress(progress, 0.5);
        report_progress(progress, 1.0);
        let extras = if include_extras { "+extras" } else { "" };
        Ok(Bytes::from(format!("PK:{}{}", entry.key, extras)))
    }
}

/// Installed level double.
pub struct StubLevel {
    metadata: LevelMetadata,
    cover: Option<CoverImage>,
    audio: Option<AudioClip>,
    fail_cover: bool,
    slow_cover: bool,
    pub cover_fetches: AtomicUsize,
    pub audio_fetches: AtomicUsize,
}

impl StubLevel {
    pub fn new(metadata: LevelMetadata) -> Self {
        Self {
            metadata,
            cover: None,
            audio: None,
            fail_cover: false,
            slow_cover: false,
            cover_fetches: AtomicUsize::new(0),
            audio_fetches: AtomicUsize::new(0),
        }
    }

    pub fn with_cover(mut self, cover: CoverImage) -> Self {
        self.cover = Some(cover);
        self
    }

    pub fn with_audio(mut self, audio: AudioClip) -> Self {
        self.audio = Some(audio);
        self
    }

    pub fn failing_cover(mut self) -> Self {
        self.fail_cover = true;
        self
    }

    /// Cover loads never finish on their own.
    pub fn slow_cover(mut self) -> Self {
        self.slow_cover = true;
        self
    }

    pub fn cover_fetch_count(&self) -> usize {
        self.cover_fetches.load(Ordering::SeqCst)
    }

    pub fn audio_fetch_count(&self) -> usize {
        self.audio_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocalLevel for StubLevel {
    fn metadata(&self) -> &LevelMetadata {
        &self.metadata
    }

    async fn cover_image(&self, _cancel: &CancellationToken) -> PreviewResult<Option<CoverImage>> {
        self.cover_fetches.fetch_add(1, Ordering::SeqCst);
        if self.slow_cover {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.fail_cover {
            return Err(PreviewError::Io("cover file unreadable".into()));
        }
        Ok(self.cover.clone())
    }

    async fn preview_audio(&self, _cancel: &CancellationToken) -> PreviewResult<Option<AudioClip>> {
        self.audio_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.audio.clone())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    levels: HashMap<String, Arc<dyn LocalLevel>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, level_id: &str, level: Arc<StubLevel>) {
        self.levels.insert(level_id.to_string(), level);
    }

    pub fn insert_level(&mut self, level_id: &str, level: Arc<dyn LocalLevel>) {
        self.levels.insert(level_id.to_string(), level);
    }
}

impl LocalStore for MemoryStore {
    fn level_by_id(&self, level_id: &str) -> Option<Arc<dyn LocalLevel>> {
        self.levels.get(level_id).cloned()
    }
}
