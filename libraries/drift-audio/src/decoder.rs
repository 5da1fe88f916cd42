//! Full-file decoding via Symphonia
//!
//! Every supported container/codec is decoded into one interleaved stereo
//! f32 buffer in [-1.0, 1.0]. Playback and mixdown both consume this
//! shape; nothing downstream has to care what format the file was in.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use symphonia::core::audio::{AudioBufferRef, Signal};
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

use drift_playback::{LoadedTrack, PcmBuffer, TrackLoader};

use crate::error::{AudioError, Result};

/// A fully decoded audio file
#[derive(Debug, Clone)]
pub struct DecodedTrack {
    /// Interleaved stereo samples in [-1.0, 1.0]
    pub samples: Vec<f32>,

    /// Native sample rate of the file
    pub sample_rate: u32,

    /// Total duration, derived from the decoded frame count
    pub duration: Duration,
}

impl DecodedTrack {
    /// Number of stereo frames
    pub fn frames(&self) -> usize {
        self.samples.len() / 2
    }
}

/// Decode an entire file into memory
///
/// Output is always interleaved stereo: mono is duplicated, anything
/// beyond two channels is folded into the front pair at -3 dB.
pub fn decode(path: &Path) -> Result<DecodedTrack> {
    if !path.exists() {
        return Err(AudioError::FileNotFound(path.display().to_string()));
    }

    let file = std::fs::File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AudioError::UnsupportedFormat(format!("probe failed: {e}")))?;

    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| AudioError::DecodeError("no audio tracks found".to_string()))?;

    let sample_rate = track.codec_params.sample_rate.unwrap_or(44_100);
    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| AudioError::UnsupportedFormat(format!("no decoder: {e}")))?;

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            // End of stream surfaces as an IO error in symphonia 0.5.
            Err(SymphoniaError::IoError(_)) => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(AudioError::DecodeError(e.to_string())),
        };
        if packet.track_id() != track_id {
            continue;
        }
        match decoder.decode(&packet) {
            Ok(decoded) => append_stereo(&decoded, &mut samples),
            // A corrupt packet is skipped, not fatal.
            Err(SymphoniaError::DecodeError(e)) => {
                debug!(file = %path.display(), error = e, "skipping corrupt packet");
            }
            Err(e) => return Err(AudioError::DecodeError(e.to_string())),
        }
    }

    if samples.is_empty() {
        return Err(AudioError::DecodeError(format!(
            "no audio data in {}",
            path.display()
        )));
    }

    let frames = samples.len() / 2;
    let duration = Duration::from_secs_f64(frames as f64 / f64::from(sample_rate));
    debug!(
        file = %path.display(),
        frames,
        sample_rate,
        ?duration,
        "decoded"
    );

    Ok(DecodedTrack {
        samples,
        sample_rate,
        duration,
    })
}

/// Append one decoded buffer as interleaved stereo
fn append_stereo(decoded: &AudioBufferRef, out: &mut Vec<f32>) {
    // Symmetric scaling for signed integers (divide by 2^(N-1)) keeps the
    // [-1.0, 1.0] range symmetric.
    match decoded {
        AudioBufferRef::F32(buf) => fold_channels(buf, out, |s| s.clamp(-1.0, 1.0)),
        AudioBufferRef::F64(buf) => fold_channels(buf, out, |s| (s as f32).clamp(-1.0, 1.0)),
        AudioBufferRef::S8(buf) => fold_channels(buf, out, |s| f32::from(s) / 128.0),
        AudioBufferRef::S16(buf) => fold_channels(buf, out, |s| f32::from(s) / 32_768.0),
        AudioBufferRef::S24(buf) => fold_channels(buf, out, |s| s.inner() as f32 / 8_388_608.0),
        AudioBufferRef::S32(buf) => fold_channels(buf, out, |s| s as f32 / 2_147_483_648.0),
        AudioBufferRef::U8(buf) => {
            fold_channels(buf, out, |s| (f32::from(s) / f32::from(u8::MAX)) * 2.0 - 1.0)
        }
        AudioBufferRef::U16(buf) => {
            fold_channels(buf, out, |s| (f32::from(s) / f32::from(u16::MAX)) * 2.0 - 1.0)
        }
        AudioBufferRef::U24(buf) => {
            fold_channels(buf, out, |s| (s.inner() as f32 / 16_777_215.0) * 2.0 - 1.0)
        }
        AudioBufferRef::U32(buf) => {
            fold_channels(buf, out, |s| (s as f32 / u32::MAX as f32) * 2.0 - 1.0)
        }
    }
}

/// Fold any channel layout down to interleaved stereo
///
/// Mono duplicates; stereo passes through; additional channels mix into
/// both sides at -3 dB.
fn fold_channels<T, F>(
    buf: &symphonia::core::audio::AudioBuffer<T>,
    out: &mut Vec<f32>,
    normalize: F,
) where
    T: symphonia::core::sample::Sample + Copy,
    F: Fn(T) -> f32,
{
    const EXTRA_MIX: f32 = 0.707; // -3 dB

    let channels = buf.spec().channels.count();
    let frames = buf.frames();
    out.reserve(frames * 2);

    match channels {
        0 => out.extend(std::iter::repeat(0.0).take(frames * 2)),
        1 => {
            for &sample in buf.chan(0).iter().take(frames) {
                let sample = normalize(sample);
                out.push(sample);
                out.push(sample);
            }
        }
        _ => {
            for frame in 0..frames {
                let mut left = normalize(buf.chan(0)[frame]);
                let mut right = normalize(buf.chan(1)[frame]);
                for chan in 2..channels {
                    let extra = normalize(buf.chan(chan)[frame]) * EXTRA_MIX;
                    left += extra;
                    right += extra;
                }
                out.push(left.clamp(-1.0, 1.0));
                out.push(right.clamp(-1.0, 1.0));
            }
        }
    }
}

/// [`TrackLoader`] backed by [`decode`]
///
/// This is what a host plugs into the playback engine to get real files
/// decoded at track start.
#[derive(Debug, Default, Clone, Copy)]
pub struct SymphoniaLoader;

impl SymphoniaLoader {
    pub fn new() -> Self {
        Self
    }
}

impl TrackLoader for SymphoniaLoader {
    fn load(&self, path: &Path) -> drift_playback::Result<LoadedTrack> {
        let decoded = decode(path)?;
        Ok(LoadedTrack {
            path: path.to_path_buf(),
            duration: Some(decoded.duration),
            pcm: PcmBuffer {
                samples: Arc::new(decoded.samples),
                sample_rate: decoded.sample_rate,
            },
        })
    }
}
