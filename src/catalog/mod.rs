//! Remote catalog contract.
//!
//! The catalog holds canonical metadata and archives keyed by level hash.
//! Its transport is owned by the embedding application; previews only talk to
//! it through [`CatalogClient`].

use crate::error::{PreviewError, PreviewResult};
use crate::models::LevelMetadata;
use async_trait::async_trait;
use bytes::Bytes;
use crossbeam_channel::Sender;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Receives archive download progress as a fraction in `0.0..=1.0`.
pub type ProgressSink = Sender<f64>;

/// A resolved catalog hit.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    /// Short catalog key (e.g. `"1a2b"`).
    pub key: String,
    pub hash: String,
    pub metadata: LevelMetadata,
}

impl CatalogEntry {
    pub fn matches_hash(&self, hash: &str) -> bool {
        self.hash.eq_ignore_ascii_case(hash)
    }

    /// Fetches the raw cover bytes the catalog serves for this entry.
    pub async fn fetch_cover(
        &self,
        client: &dyn CatalogClient,
        cancel: &CancellationToken,
    ) -> PreviewResult<Bytes> {
        client.fetch_cover(self, cancel).await
    }

    /// Downloads the level archive for this entry.
    pub async fn download_archive(
        &self,
        client: &dyn CatalogClient,
        include_extras: bool,
        cancel: &CancellationToken,
        progress: Option<&ProgressSink>,
    ) -> PreviewResult<Bytes> {
        client
            .download_archive(self, include_extras, cancel, progress)
            .await
    }
}

#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// `Ok(None)` means the catalog definitively has no such level.
    async fn lookup_by_hash(
        &self,
        hash: &str,
        cancel: &CancellationToken,
    ) -> PreviewResult<Option<CatalogEntry>>;

    async fn fetch_cover(
        &self,
        entry: &CatalogEntry,
        cancel: &CancellationToken,
    ) -> PreviewResult<Bytes>;

    async fn download_archive(
        &self,
        entry: &CatalogEntry,
        include_extras: bool,
        cancel: &CancellationToken,
        progress: Option<&ProgressSink>,
    ) -> PreviewResult<Bytes>;
}

/// Forwards a progress fraction without ever blocking the download.
pub fn report_progress(sink: Option<&ProgressSink>, fraction: f64) {
    if let Some(sink) = sink {
        let _ = sink.try_send(fraction.clamp(0.0, 1.0));
    }
}

/// Looks a hash up with cancellation and an optional timeout applied.
///
/// An entry whose hash differs from the requested one is rejected as a
/// transport failure so it is never cached.
pub(crate) async fn lookup(
    client: &dyn CatalogClient,
    hash: &str,
    cancel: &CancellationToken,
    timeout: Option<Duration>,
) -> PreviewResult<Option<CatalogEntry>> {
    let request = async {
        match timeout {
            Some(limit) => {
                match tokio::time::timeout(limit, client.lookup_by_hash(hash, cancel)).await {
                    Ok(result) => result,
                    Err(_) => Err(PreviewError::Timeout {
                        hash: hash.to_string(),
                    }),
                }
            }
            None => client.lookup_by_hash(hash, cancel).await,
        }
    };

    let found = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(PreviewError::Cancelled),
        result = request => result?,
    };

    match found {
        Some(entry) if !entry.matches_hash(hash) => Err(PreviewError::transport(format!(
            "catalog answered {} for hash {}",
            entry.hash, hash
        ))),
        other => Ok(other),
    }
}
