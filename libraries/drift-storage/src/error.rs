/// Storage-specific errors
use thiserror::Error;

/// Result type alias using `StorageError`
pub type Result<T> = std::result::Result<T, StorageError>;

/// Storage error types
#[derive(Error, Debug)]
pub enum StorageError {
    /// Preset name is empty or already taken
    #[error("Invalid preset name: {0}")]
    InvalidName(String),

    /// Preset folder does not exist or is not a directory
    #[error("Invalid preset folder: {0}")]
    InvalidFolder(String),

    /// Color is not a #RRGGBB string
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// No preset under that name
    #[error("Unknown preset: {0}")]
    UnknownPreset(String),

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
