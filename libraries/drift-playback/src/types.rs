//! Core types for the playback engine

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Stable player index (0-based channel slot)
pub type PlayerId = usize;

/// Default number of independent players
pub const DEFAULT_PLAYERS: usize = 6;

/// Default recency-buffer capacity
pub const DEFAULT_HISTORY_SIZE: usize = 20;

/// Default waveform color, carried from a matched preset or this fallback
pub const DEFAULT_WAVEFORM_COLOR: &str = "#90EE90";

/// Playback state of a single player
///
/// Looping is an orthogonal flag on the player, not a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    /// No active playback, no pending timer
    Stopped,

    /// Channel is producing audio
    Playing,

    /// Suspended mid-track, elapsed time frozen
    Paused,
}

/// Decoded PCM audio handed to the output channel
///
/// Samples are interleaved stereo f32 in [-1.0, 1.0]. Kept behind an `Arc`
/// so the player and the channel can share one decode without copying.
#[derive(Debug, Clone)]
pub struct PcmBuffer {
    /// Interleaved stereo samples
    pub samples: Arc<Vec<f32>>,

    /// Native sample rate of the file
    ///
    /// A mismatch with the output device's rate is warning-only on the
    /// live path (the channel may pitch-shift); only the offline mixdown
    /// resamples.
    pub sample_rate: u32,
}

impl PcmBuffer {
    /// Buffer with no audio, used when a loader only provides a duration
    pub fn silent(sample_rate: u32) -> Self {
        Self {
            samples: Arc::new(Vec::new()),
            sample_rate,
        }
    }
}

/// A track that has been decoded and is ready to play
#[derive(Debug, Clone)]
pub struct LoadedTrack {
    /// File path the track was decoded from
    pub path: PathBuf,

    /// Total duration; `None` when decoding could not determine it
    pub duration: Option<Duration>,

    /// Decoded audio for the channel
    pub pcm: PcmBuffer,
}

/// Per-player settings applied at play time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Volume slider position (0-100, default: 70)
    pub volume: u8,

    /// Pan slider position (-100 = full left .. +100 = full right)
    pub pan: i8,

    /// Crossfade length (zero = disabled)
    pub fade: Duration,

    /// User override for time-to-next-track, independent of track length
    pub interval: Option<Duration>,

    /// Cosmetic waveform color, keyed by folder identity
    pub waveform_color: String,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            volume: 70,
            pan: 0,
            fade: Duration::ZERO,
            interval: None,
            waveform_color: DEFAULT_WAVEFORM_COLOR.to_string(),
        }
    }
}

/// Configuration for the whole engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Number of independent players (default: 6)
    pub players: usize,

    /// Recency-buffer capacity per player (default: 20)
    pub history_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            players: DEFAULT_PLAYERS,
            history_size: DEFAULT_HISTORY_SIZE,
        }
    }
}

/// A named folder preset, resolved by the storage layer
///
/// The engine only consumes the resolved path and the color tag; preset
/// persistence lives outside the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetFolder {
    /// Display name of the preset
    pub name: String,

    /// Folder the preset points at
    pub path: PathBuf,

    /// Waveform color tag (`#RRGGBB`)
    pub color: String,
}
