//! Display metadata shared by every preview source.

use serde::{Deserialize, Serialize};

/// Plain song/level metadata. Copied verbatim from whichever source built the
/// preview; nothing in here is lazy.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LevelMetadata {
    pub song_name: String,
    pub song_sub_name: String,
    pub song_author_name: String,
    pub level_author_name: String,
    pub beats_per_minute: f32,
    /// Seconds.
    pub song_duration: f32,
    #[serde(default)]
    pub preview_start_time: f32,
    #[serde(default)]
    pub preview_duration: f32,
}

impl LevelMetadata {
    /// "Artist - Title" style label used in lists and logs.
    pub fn display_title(&self) -> String {
        match (self.song_author_name.is_empty(), self.song_sub_name.is_empty()) {
            (true, true) => self.song_name.clone(),
            (true, false) => format!("{} {}", self.song_name, self.song_sub_name),
            (false, true) => format!("{} - {}", self.song_author_name, self.song_name),
            (false, false) => format!(
                "{} - {} {}",
                self.song_author_name, self.song_name, self.song_sub_name
            ),
        }
    }
}
