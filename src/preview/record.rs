//! The preview record: identity, display metadata and lazily-derived
//! resources (downloadability, raw cover, decoded cover, preview audio).
//!
//! A record is built from one of three sources:
//! - an installed level ([`PreviewRecord::from_local`]),
//! - a resolved catalog entry ([`PreviewRecord::from_catalog`]),
//! - a wire packet ([`PreviewRecord::from_packet`]).
//!
//! Each source seeds a different subset of the memo cells and wires its own
//! fetch strategies; every accessor afterwards behaves the same way.

use crate::catalog::{self, CatalogClient, CatalogEntry, ProgressSink};
use crate::error::{PreviewError, PreviewResult};
use crate::local::{LocalLevel, LocalStore};
use crate::models::{AudioClip, CoverImage, LevelMetadata, PreviewPacket, PreviewSettings};
use crate::preview::hash::level_id_to_hash;
use crate::preview::memo::{MemoSlot, SingleFlight, cancellable};
use bytes::Bytes;
use futures_util::future::{BoxFuture, FutureExt};
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio_util::sync::CancellationToken;

type CoverFetchFn = Box<
    dyn Fn(CancellationToken) -> BoxFuture<'static, PreviewResult<Option<CoverImage>>>
        + Send
        + Sync,
>;
type RawCoverFetchFn =
    Box<dyn Fn(CancellationToken) -> BoxFuture<'static, PreviewResult<Bytes>> + Send + Sync>;
type AudioFetchFn = Box<
    dyn Fn(CancellationToken) -> BoxFuture<'static, PreviewResult<Option<AudioClip>>>
        + Send
        + Sync,
>;

/// Whether the level can be fetched from the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Downloadability {
    Unknown,
    Yes,
    No,
}

enum CoverSource {
    Fetch(CoverFetchFn),
    /// Decode whatever [`PreviewRecord::raw_cover`] yields.
    DecodeRawCover,
}

enum RawCoverSource {
    Fetch(RawCoverFetchFn),
    /// Re-encode whatever [`PreviewRecord::cover_image`] yields.
    EncodeCover,
    Unavailable,
}

/// Catalog facts learned after construction.
#[derive(Debug, Default)]
struct RemoteState {
    entry: Option<CatalogEntry>,
    key: Option<String>,
}

/// Collaborators shared by every record of a session.
#[derive(Clone)]
pub struct PreviewContext {
    pub catalog: Arc<dyn CatalogClient>,
    pub settings: Arc<PreviewSettings>,
}

impl PreviewContext {
    pub fn new(catalog: Arc<dyn CatalogClient>, settings: PreviewSettings) -> Self {
        Self {
            catalog,
            settings: Arc::new(settings),
        }
    }
}

pub struct PreviewRecord {
    level_id: String,
    level_hash: String,
    metadata: LevelMetadata,
    is_downloaded: bool,

    remote: Arc<RwLock<RemoteState>>,
    downloadable: SingleFlight<bool>,
    raw_cover: MemoSlot<Bytes>,
    cover: MemoSlot<CoverImage>,

    cover_source: CoverSource,
    raw_cover_source: RawCoverSource,
    audio_fetch: Option<AudioFetchFn>,

    ctx: PreviewContext,
}

impl PreviewRecord {
    /// Preview of an installed level. Cover and audio come from the store.
    pub fn from_local(
        level_id: impl Into<String>,
        store: &dyn LocalStore,
        ctx: &PreviewContext,
    ) -> PreviewResult<Self> {
        let level_id = level_id.into();
        let level = store
            .level_by_id(&level_id)
            .ok_or_else(|| PreviewError::MissingLocalEntry {
                level_id: level_id.clone(),
            })?;

        let cover_level = Arc::clone(&level);
        let cover_fetch: CoverFetchFn = Box::new(move |cancel| {
            let level = Arc::clone(&cover_level);
            async move { level.cover_image(&cancel).await }.boxed()
        });

        let audio_level: Arc<dyn LocalLevel> = Arc::clone(&level);
        let audio_fetch: AudioFetchFn = Box::new(move |cancel| {
            let level = Arc::clone(&audio_level);
            async move { level.preview_audio(&cancel).await }.boxed()
        });

        Ok(Self {
            level_hash: level_id_to_hash(&level_id),
            metadata: level.metadata().clone(),
            level_id,
            is_downloaded: true,
            remote: Arc::default(),
            downloadable: SingleFlight::new(),
            raw_cover: MemoSlot::empty(),
            cover: MemoSlot::empty(),
            cover_source: CoverSource::Fetch(cover_fetch),
            raw_cover_source: RawCoverSource::EncodeCover,
            audio_fetch: Some(audio_fetch),
            ctx: ctx.clone(),
        })
    }

    /// Preview of a level known only to the catalog. Always downloadable.
    pub fn from_catalog(
        level_id: impl Into<String>,
        entry: CatalogEntry,
        ctx: &PreviewContext,
    ) -> Self {
        let client = Arc::clone(&ctx.catalog);
        let cover_entry = entry.clone();
        let raw_cover_fetch: RawCoverFetchFn = Box::new(move |cancel| {
            let client = Arc::clone(&client);
            let entry = cover_entry.clone();
            async move { entry.fetch_cover(client.as_ref(), &cancel).await }.boxed()
        });

        let level_id = level_id.into();
        Self {
            level_hash: level_id_to_hash(&level_id),
            level_id,
            metadata: entry.metadata.clone(),
            is_downloaded: false,
            remote: Arc::new(RwLock::new(RemoteState {
                key: Some(entry.key.clone()),
                entry: Some(entry),
            })),
            downloadable: SingleFlight::resolved(true),
            raw_cover: MemoSlot::empty(),
            cover: MemoSlot::empty(),
            cover_source: CoverSource::DecodeRawCover,
            raw_cover_source: RawCoverSource::Fetch(raw_cover_fetch),
            audio_fetch: None,
            ctx: ctx.clone(),
        }
    }

    /// Preview received from another player. Downloadability and, when
    /// embedded, the raw cover arrive already resolved.
    pub fn from_packet(
        packet: PreviewPacket,
        store: &dyn LocalStore,
        ctx: &PreviewContext,
    ) -> Self {
        let raw_cover = match packet.embedded_cover() {
            Some(cover) => MemoSlot::with(cover.clone()),
            None => MemoSlot::empty(),
        };
        let key = (!packet.level_key.is_empty()).then(|| packet.level_key.clone());

        Self {
            level_hash: level_id_to_hash(&packet.level_id),
            is_downloaded: store.contains(&packet.level_id),
            remote: Arc::new(RwLock::new(RemoteState { entry: None, key })),
            downloadable: SingleFlight::resolved(packet.is_downloadable),
            raw_cover,
            cover: MemoSlot::empty(),
            cover_source: CoverSource::DecodeRawCover,
            raw_cover_source: RawCoverSource::Unavailable,
            audio_fetch: None,
            level_id: packet.level_id,
            metadata: packet.metadata,
            ctx: ctx.clone(),
        }
    }

    pub fn level_id(&self) -> &str {
        &self.level_id
    }

    pub fn level_hash(&self) -> &str {
        &self.level_hash
    }

    pub fn metadata(&self) -> &LevelMetadata {
        &self.metadata
    }

    /// True when the level is installed locally.
    pub fn is_downloaded(&self) -> bool {
        self.is_downloaded
    }

    pub fn download_url(&self) -> String {
        self.ctx.settings.catalog.download_url(&self.level_hash)
    }

    pub fn downloadability(&self) -> Downloadability {
        match self.downloadable.get() {
            Some(true) => Downloadability::Yes,
            Some(false) => Downloadability::No,
            None => Downloadability::Unknown,
        }
    }

    /// Catalog key, once downloadability has been settled.
    pub fn level_key(&self) -> Option<String> {
        if self.downloadability() == Downloadability::Unknown {
            return None;
        }
        self.remote().key.clone()
    }

    pub fn catalog_entry(&self) -> Option<CatalogEntry> {
        self.remote().entry.clone()
    }

    pub fn has_preview_audio(&self) -> bool {
        self.audio_fetch.is_some()
    }

    fn remote(&self) -> RwLockReadGuard<'_, RemoteState> {
        self.remote
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Resolves whether the catalog has this level.
    ///
    /// Seeded records answer immediately. Otherwise one lookup serves every
    /// concurrent caller. A "not found" answer is memoized as `false`; a
    /// transport failure or cancellation is returned and the next call looks
    /// up again. Cancelling the caller that started the lookup cancels it for
    /// every waiter.
    pub async fn is_downloadable(&self, cancel: &CancellationToken) -> PreviewResult<bool> {
        let client = Arc::clone(&self.ctx.catalog);
        let remote = Arc::clone(&self.remote);
        let hash = self.level_hash.clone();
        let timeout = self.ctx.settings.catalog.lookup_timeout();
        let trigger = cancel.clone();

        self.downloadable
            .run(
                move || {
                    async move {
                        log::debug!("PREVIEW: catalog lookup for {}", hash);
                        match catalog::lookup(client.as_ref(), &hash, &trigger, timeout).await {
                            Ok(Some(entry)) => {
                                log::info!("PREVIEW: {} is downloadable as {}", hash, entry.key);
                                let mut remote = write_remote(&remote);
                                remote.key = Some(entry.key.clone());
                                remote.entry = Some(entry);
                                Ok(true)
                            }
                            Ok(None) => {
                                log::info!("PREVIEW: {} is not in the catalog", hash);
                                Ok(false)
                            }
                            Err(PreviewError::Cancelled) => {
                                log::debug!("PREVIEW: catalog lookup for {} cancelled", hash);
                                Err(PreviewError::Cancelled)
                            }
                            Err(e) => {
                                log::warn!("PREVIEW: catalog lookup for {} failed: {}", hash, e);
                                Err(e)
                            }
                        }
                    }
                    .boxed()
                },
                cancel,
            )
            .await
    }

    /// Raw (encoded) cover bytes. Failures are returned and not memoized.
    pub async fn raw_cover(&self, cancel: &CancellationToken) -> PreviewResult<Bytes> {
        if let Some(raw) = self.raw_cover.get() {
            return Ok(raw);
        }

        match (&self.raw_cover_source, &self.cover_source) {
            (RawCoverSource::Fetch(fetch), _) => {
                self.raw_cover
                    .get_or_fetch(fetch(cancel.clone()), cancel)
                    .await
            }
            (RawCoverSource::EncodeCover, CoverSource::Fetch(fetch)) => {
                let encode = async {
                    let cover = self.fetched_cover(fetch, cancel).await?;
                    if cover.is_placeholder() {
                        return Err(PreviewError::CoverUnavailable);
                    }
                    cover.encode_png()
                };
                self.raw_cover.get_or_fetch(encode, cancel).await
            }
            (RawCoverSource::EncodeCover, CoverSource::DecodeRawCover)
            | (RawCoverSource::Unavailable, _) => Err(PreviewError::CoverUnavailable),
        }
    }

    /// Decoded cover. Any failure other than cancellation degrades to the
    /// placeholder, which is then memoized like a real cover.
    pub async fn cover_image(&self, cancel: &CancellationToken) -> PreviewResult<CoverImage> {
        if let Some(cover) = self.cover.get() {
            return Ok(cover);
        }

        match &self.cover_source {
            CoverSource::Fetch(fetch) => self.fetched_cover(fetch, cancel).await,
            CoverSource::DecodeRawCover => {
                let decoded = match self.raw_cover(cancel).await {
                    Ok(raw) => CoverImage::decode(&raw).map(Some),
                    Err(e) => Err(e),
                };
                self.settle_cover(decoded)
            }
        }
    }

    async fn fetched_cover(
        &self,
        fetch: &CoverFetchFn,
        cancel: &CancellationToken,
    ) -> PreviewResult<CoverImage> {
        if let Some(cover) = self.cover.get() {
            return Ok(cover);
        }
        let fetched = cancellable(fetch(cancel.clone()), cancel).await;
        self.settle_cover(fetched)
    }

    fn settle_cover(
        &self,
        fetched: PreviewResult<Option<CoverImage>>,
    ) -> PreviewResult<CoverImage> {
        let cover = match fetched {
            Ok(Some(cover)) => cover,
            Ok(None) => {
                log::debug!("PREVIEW: no cover for {}, using placeholder", self.level_id);
                CoverImage::placeholder()
            }
            Err(PreviewError::Cancelled) => return Err(PreviewError::Cancelled),
            Err(e) => {
                log::warn!(
                    "PREVIEW: cover for {} unavailable ({}), using placeholder",
                    self.level_id,
                    e
                );
                CoverImage::placeholder()
            }
        };

        Ok(self.cover.set_if_empty(cover))
    }

    /// Preview audio. Never memoized; `Ok(None)` when this preview has no
    /// audio source or the level ships none.
    pub async fn preview_audio(
        &self,
        cancel: &CancellationToken,
    ) -> PreviewResult<Option<AudioClip>> {
        match &self.audio_fetch {
            Some(fetch) => cancellable(fetch(cancel.clone()), cancel).await,
            None => Ok(None),
        }
    }

    /// Downloads the level archive from the catalog.
    ///
    /// Uses the resolved catalog entry when there is one, otherwise does a
    /// one-off lookup that leaves the downloadability state untouched.
    pub async fn download_archive(
        &self,
        cancel: &CancellationToken,
        progress: Option<&ProgressSink>,
    ) -> PreviewResult<Bytes> {
        let entry = match self.catalog_entry() {
            Some(entry) => entry,
            None => catalog::lookup(
                self.ctx.catalog.as_ref(),
                &self.level_hash,
                cancel,
                self.ctx.settings.catalog.lookup_timeout(),
            )
            .await?
            .ok_or_else(|| PreviewError::NotFound {
                hash: self.level_hash.clone(),
            })?,
        };

        log::info!("PREVIEW: downloading {} ({})", entry.key, self.level_hash);
        let download = entry.download_archive(
            self.ctx.catalog.as_ref(),
            self.ctx.settings.catalog.include_extras,
            cancel,
            progress,
        );
        cancellable(download, cancel).await
    }

    /// Packs this preview for sending to other players.
    ///
    /// Downloadability and cover failures are folded into `false` and an empty
    /// cover; only cancellation is returned.
    pub async fn to_packet(&self, cancel: &CancellationToken) -> PreviewResult<PreviewPacket> {
        let is_downloadable = match self.is_downloadable(cancel).await {
            Ok(downloadable) => downloadable,
            Err(PreviewError::Cancelled) => return Err(PreviewError::Cancelled),
            Err(e) => {
                log::warn!("PREVIEW: packing {} as not downloadable: {}", self.level_id, e);
                false
            }
        };

        let cover_image = match self.raw_cover(cancel).await {
            Ok(raw) => raw,
            Err(PreviewError::Cancelled) => return Err(PreviewError::Cancelled),
            Err(_) => Bytes::new(),
        };

        Ok(PreviewPacket {
            level_id: self.level_id.clone(),
            level_key: self.level_key().unwrap_or_default(),
            metadata: self.metadata.clone(),
            is_downloadable,
            cover_image,
        })
    }
}

fn write_remote(remote: &RwLock<RemoteState>) -> RwLockWriteGuard<'_, RemoteState> {
    remote
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl fmt::Debug for PreviewRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewRecord")
            .field("level_id", &self.level_id)
            .field("level_hash", &self.level_hash)
            .field("song_name", &self.metadata.song_name)
            .field("is_downloaded", &self.is_downloaded)
            .field("downloadability", &self.downloadability())
            .finish_non_exhaustive()
    }
}
