//! Preview settings loaded from `preview.toml`.

use crate::error::{PreviewError, PreviewResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_DOWNLOAD_URL_TEMPLATE: &str = "https://beatsaver.com/api/download/hash/{hash}";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogSettings {
    /// `{hash}` is replaced by the lowercase level hash.
    #[serde(default = "default_download_url_template")]
    pub download_url_template: String,
    /// Upper bound for a single catalog lookup. 0 disables the timeout.
    #[serde(default = "default_lookup_timeout_ms")]
    pub lookup_timeout_ms: u64,
    /// Whether archive downloads ask the catalog for optional extras.
    #[serde(default)]
    pub include_extras: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacketSettings {
    #[serde(default = "default_compression_level")]
    pub compression_level: i32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PreviewSettings {
    #[serde(default)]
    pub catalog: CatalogSettings,
    #[serde(default)]
    pub packet: PacketSettings,
}

fn default_download_url_template() -> String {
    DEFAULT_DOWNLOAD_URL_TEMPLATE.to_string()
}

fn default_lookup_timeout_ms() -> u64 {
    10_000
}

fn default_compression_level() -> i32 {
    3
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            download_url_template: default_download_url_template(),
            lookup_timeout_ms: default_lookup_timeout_ms(),
            include_extras: false,
        }
    }
}

impl Default for PacketSettings {
    fn default() -> Self {
        Self {
            compression_level: default_compression_level(),
        }
    }
}

impl CatalogSettings {
    pub fn lookup_timeout(&self) -> Option<Duration> {
        if self.lookup_timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.lookup_timeout_ms))
        }
    }

    pub fn download_url(&self, hash: &str) -> String {
        self.download_url_template
            .replace("{hash}", &hash.to_lowercase())
    }
}

impl PreviewSettings {
    /// Loads settings from a TOML file. Missing keys fall back to defaults.
    pub fn load(path: &Path) -> PreviewResult<Self> {
        if !path.exists() {
            return Err(PreviewError::Config(format!(
                "settings file not found: {:?}",
                path
            )));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| PreviewError::Config(format!("Failed to read {:?}: {}", path, e)))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> PreviewResult<Self> {
        let settings: PreviewSettings = toml::from_str(content)?;
        if !(1..=22).contains(&settings.packet.compression_level) {
            return Err(PreviewError::Config(format!(
                "packet.compression_level must be within 1..=22, got {}",
                settings.packet.compression_level
            )));
        }
        Ok(settings)
    }
}
