//! Plain data carried by previews.

pub mod cover;
pub mod metadata;
pub mod packet;
pub mod settings;

pub use cover::{AudioClip, CoverImage};
pub use metadata::LevelMetadata;
pub use packet::PreviewPacket;
pub use settings::{CatalogSettings, PacketSettings, PreviewSettings};
