//! Cover art and preview audio handles.

use crate::error::PreviewResult;
use bytes::Bytes;
use image::{DynamicImage, ImageOutputFormat, RgbaImage};
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

const PLACEHOLDER_SIZE: u32 = 2;

static PLACEHOLDER: OnceLock<CoverImage> = OnceLock::new();

/// Decoded, renderable cover. Cloning shares the pixel buffer.
#[derive(Debug, Clone)]
pub struct CoverImage {
    pixels: Arc<RgbaImage>,
}

impl CoverImage {
    pub fn new(pixels: RgbaImage) -> Self {
        Self {
            pixels: Arc::new(pixels),
        }
    }

    /// Decodes PNG/JPG bytes into RGBA pixels.
    pub fn decode(raw: &[u8]) -> PreviewResult<Self> {
        let img = image::load_from_memory(raw)?;
        Ok(Self::new(img.to_rgba8()))
    }

    /// Re-encodes the cover as PNG.
    pub fn encode_png(&self) -> PreviewResult<Bytes> {
        let mut buffer = Vec::new();
        DynamicImage::ImageRgba8((*self.pixels).clone())
            .write_to(&mut Cursor::new(&mut buffer), ImageOutputFormat::Png)?;
        Ok(Bytes::from(buffer))
    }

    /// The fixed 2x2 fully transparent black cover. Always the same instance.
    pub fn placeholder() -> Self {
        PLACEHOLDER
            .get_or_init(|| Self::new(RgbaImage::new(PLACEHOLDER_SIZE, PLACEHOLDER_SIZE)))
            .clone()
    }

    pub fn is_placeholder(&self) -> bool {
        PLACEHOLDER
            .get()
            .is_some_and(|placeholder| placeholder.ptr_eq(self))
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Identity comparison (same underlying buffer).
    pub fn ptr_eq(&self, other: &CoverImage) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels)
    }
}

/// Encoded preview audio, as read from the level folder.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub source: Option<PathBuf>,
    pub data: Bytes,
}

impl AudioClip {
    pub fn new(source: Option<PathBuf>, data: Bytes) -> Self {
        Self { source, data }
    }
}
