//! Error types for the playback engine

use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The selected folder contains no supported audio files
    #[error("No supported audio files in the selected folder")]
    EmptyLibrary,

    /// No track is currently loaded
    #[error("No track loaded")]
    NoTrackLoaded,

    /// A track could not be decoded
    #[error("Failed to decode track: {0}")]
    Decode(String),

    /// The output channel is unavailable or rejected a command
    #[error("Output channel error: {0}")]
    Device(String),

    /// Player index out of range
    #[error("Unknown player: {0}")]
    UnknownPlayer(usize),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
