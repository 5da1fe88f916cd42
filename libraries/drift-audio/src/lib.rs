//! Drift Player - Audio Processing
//!
//! Decoding and offline rendering for Drift Player.
//!
//! This crate provides:
//! - Full-file decoding via Symphonia (MP3, FLAC, OGG/Vorbis, WAV, AIFF)
//!   into interleaved stereo f32
//! - A [`TrackLoader`](drift_playback::TrackLoader) implementation that
//!   feeds the playback engine ([`SymphoniaLoader`])
//! - Waveform peak extraction for display ([`peaks`])
//! - Offline mixdown export: pan, sum, normalize, fade, 16-bit WAV
//!   ([`mixdown`])
//!
//! The live playback path plays buffers at their native rate; a rate
//! mismatch with the output device audibly shifts pitch and speed and is
//! the host's problem to avoid. Only the offline [`mixdown`] resamples.

pub mod decoder;
pub mod error;
pub mod mixdown;
pub mod peaks;

pub use decoder::{decode, DecodedTrack, SymphoniaLoader};
pub use error::{AudioError, Result};
pub use mixdown::{mixdown, MixInput, MixdownOptions};
pub use peaks::peaks;
