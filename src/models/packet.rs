//! Wire packet carrying a pre-serialized preview.
//!
//! Packets are serialized with `bincode` and wrapped in Zstd, the same pairing
//! used for replay files. Covers dominate the payload so compression pays off.

use crate::error::{PreviewError, PreviewResult};
use crate::models::metadata::LevelMetadata;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use zstd::stream::{decode_all, encode_all};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PreviewPacket {
    pub level_id: String,
    /// Catalog key, empty when the sender never resolved one.
    pub level_key: String,
    pub metadata: LevelMetadata,
    pub is_downloadable: bool,
    /// Raw (encoded) cover bytes. Empty means "no cover embedded".
    pub cover_image: Bytes,
}

impl PreviewPacket {
    pub fn embedded_cover(&self) -> Option<&Bytes> {
        if self.cover_image.is_empty() {
            None
        } else {
            Some(&self.cover_image)
        }
    }

    pub fn encode(&self, compression_level: i32) -> PreviewResult<Vec<u8>> {
        let binary_data = bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| PreviewError::Codec(format!("Serialization error: {}", e)))?;

        encode_all(&binary_data[..], compression_level)
            .map_err(|e| PreviewError::Codec(format!("Compression error: {}", e)))
    }

    pub fn decode(data: &[u8]) -> PreviewResult<Self> {
        let binary_data = decode_all(data)
            .map_err(|e| PreviewError::Codec(format!("Decompression error: {}", e)))?;

        let (packet, _len): (PreviewPacket, usize) =
            bincode::serde::decode_from_slice(&binary_data, bincode::config::standard())
                .map_err(|e| PreviewError::Codec(format!("Deserialization error: {}", e)))?;

        Ok(packet)
    }
}
