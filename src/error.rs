//! Crate-level error type.
//!
//! Payloads are kept string-based so the error is `Clone`: a single catalog
//! lookup result is handed to every caller waiting on it.

/// Result type used across the crate.
pub type PreviewResult<T> = Result<T, PreviewError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PreviewError {
    /// The catalog has no entry for this hash.
    #[error("no catalog entry for hash {hash}")]
    NotFound { hash: String },

    /// Catalog or download transport failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Catalog lookup exceeded the configured timeout.
    #[error("catalog lookup timed out for hash {hash}")]
    Timeout { hash: String },

    /// The caller cancelled the operation.
    #[error("operation cancelled")]
    Cancelled,

    /// A local-only preview was requested for a level the store doesn't know.
    #[error("level {level_id} is not present in the local store")]
    MissingLocalEntry { level_id: String },

    /// This preview has no source for a raw cover.
    #[error("no cover source available")]
    CoverUnavailable,

    #[error("image error: {0}")]
    Image(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("packet codec error: {0}")]
    Codec(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl PreviewError {
    /// Whether a later attempt may succeed where this one failed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PreviewError::Transport(_) | PreviewError::Timeout { .. } | PreviewError::Io(_)
        )
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, PreviewError::Cancelled)
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        PreviewError::Transport(msg.into())
    }
}

impl From<std::io::Error> for PreviewError {
    fn from(e: std::io::Error) -> Self {
        PreviewError::Io(e.to_string())
    }
}

impl From<image::ImageError> for PreviewError {
    fn from(e: image::ImageError) -> Self {
        PreviewError::Image(e.to_string())
    }
}

impl From<sqlx::Error> for PreviewError {
    fn from(e: sqlx::Error) -> Self {
        PreviewError::Database(e.to_string())
    }
}

impl From<toml::de::Error> for PreviewError {
    fn from(e: toml::de::Error) -> Self {
        PreviewError::Config(e.to_string())
    }
}
