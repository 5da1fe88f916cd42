//! Track loading seam
//!
//! Decoding lives outside this crate. The player asks a [`TrackLoader`]
//! for a ready-to-play [`LoadedTrack`] at the moment a track starts;
//! tests use [`StubLoader`] to hand back fixed durations with no I/O.

use std::path::Path;
use std::time::Duration;

use crate::error::Result;
use crate::types::{LoadedTrack, PcmBuffer};

/// Synchronous decode-on-demand
pub trait TrackLoader: Send {
    /// Decode `path` into playable audio plus its duration
    ///
    /// Failures map to [`PlaybackError::Decode`](crate::error::PlaybackError::Decode)
    /// and leave the requesting player stopped.
    fn load(&self, path: &Path) -> Result<LoadedTrack>;
}

/// Loader double returning empty audio with a fixed duration
#[derive(Debug, Clone)]
pub struct StubLoader {
    /// Duration reported for every loaded track
    pub duration: Option<Duration>,
}

impl StubLoader {
    pub fn new(duration: Option<Duration>) -> Self {
        Self { duration }
    }
}

impl TrackLoader for StubLoader {
    fn load(&self, path: &Path) -> Result<LoadedTrack> {
        Ok(LoadedTrack {
            path: path.to_path_buf(),
            duration: self.duration,
            pcm: PcmBuffer::silent(44_100),
        })
    }
}
