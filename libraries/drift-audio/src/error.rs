/// Audio-specific errors
use thiserror::Error;

/// Result type alias using `AudioError`
pub type Result<T> = std::result::Result<T, AudioError>;

/// Audio error types
#[derive(Error, Debug)]
pub enum AudioError {
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Decoding error
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// Resampling error
    #[error("Resample error: {0}")]
    ResampleError(String),

    /// WAV encoding error
    #[error("Encode error: {0}")]
    EncodeError(String),

    /// Every mixdown input failed to decode
    #[error("No usable input tracks")]
    NoUsableInput,

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<AudioError> for drift_playback::PlaybackError {
    fn from(err: AudioError) -> Self {
        drift_playback::PlaybackError::Decode(err.to_string())
    }
}
