//! Offline mixdown export
//!
//! Renders a set of tracks (each with its own pan) into one 16-bit WAV:
//! decode, resample to the target rate, pan, zero-pad to the longest,
//! sum, normalize the peak to -0.1 dBFS, then apply squared fade ramps.
//! Everything is deterministic for identical inputs.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use tracing::{info, warn};

use drift_playback::channel_gains;

use crate::decoder::decode;
use crate::error::{AudioError, Result};

/// Peak target: -0.1 dBFS, leaving headroom against clipping after the
/// 16-bit quantization
const NORMALIZE_TARGET: f32 = 0.988_553_1;

/// One track in the mix
#[derive(Debug, Clone)]
pub struct MixInput {
    pub path: PathBuf,

    /// Pan position, -100 (left) to +100 (right)
    pub pan: i8,
}

/// Output shape of a mixdown
///
/// The channel count is fixed at stereo: the pan law is a two-channel
/// law, and the decoder already folds every input down to stereo.
#[derive(Debug, Clone)]
pub struct MixdownOptions {
    /// Target sample rate of the WAV
    pub sample_rate: u32,

    /// Squared ramp up from silence at the start
    pub fade_in: Duration,

    /// Squared ramp down to silence at the end
    pub fade_out: Duration,
}

impl Default for MixdownOptions {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            fade_in: Duration::ZERO,
            fade_out: Duration::ZERO,
        }
    }
}

/// Render `inputs` into a 16-bit stereo WAV at `out_path`
///
/// Inputs that fail to decode are skipped with a warning; only when every
/// input fails does the whole export error. The mix is zero-padded to the
/// longest track, so shorter tracks simply end early.
pub fn mixdown(inputs: &[MixInput], options: &MixdownOptions, out_path: &Path) -> Result<()> {
    let mut tracks: Vec<Vec<f32>> = Vec::with_capacity(inputs.len());
    for input in inputs {
        let decoded = match decode(&input.path) {
            Ok(decoded) => decoded,
            Err(err) => {
                warn!(file = %input.path.display(), %err, "skipping mixdown input");
                continue;
            }
        };
        let samples = if decoded.sample_rate == options.sample_rate {
            decoded.samples
        } else {
            resample_stereo(&decoded.samples, decoded.sample_rate, options.sample_rate)?
        };
        tracks.push(apply_pan(samples, input.pan));
    }
    if tracks.is_empty() {
        return Err(AudioError::NoUsableInput);
    }

    let len = tracks.iter().map(Vec::len).max().unwrap_or(0);
    let mut mix = vec![0.0f32; len];
    for track in &tracks {
        for (acc, &sample) in mix.iter_mut().zip(track.iter()) {
            *acc += sample;
        }
    }

    normalize(&mut mix);
    apply_fades(&mut mix, options);

    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: options.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(out_path, spec)
        .map_err(|e| AudioError::EncodeError(format!("cannot create wav: {e}")))?;
    for &sample in &mix {
        let value = (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)).round() as i16;
        writer
            .write_sample(value)
            .map_err(|e| AudioError::EncodeError(format!("wav write failed: {e}")))?;
    }
    writer
        .finalize()
        .map_err(|e| AudioError::EncodeError(format!("wav finalize failed: {e}")))?;

    info!(
        out = %out_path.display(),
        tracks = tracks.len(),
        frames = len / 2,
        sample_rate = options.sample_rate,
        "mixdown written"
    );
    Ok(())
}

/// Constant-power pan applied at full volume
fn apply_pan(mut samples: Vec<f32>, pan: i8) -> Vec<f32> {
    let (left, right) = channel_gains(100, pan);
    for frame in samples.chunks_exact_mut(2) {
        frame[0] *= left;
        frame[1] *= right;
    }
    samples
}

/// Scale the whole mix so its peak lands on the normalize target
fn normalize(mix: &mut [f32]) {
    let peak = mix.iter().fold(0.0f32, |acc, &v| acc.max(v.abs()));
    if peak > 0.0 {
        let scale = NORMALIZE_TARGET / peak;
        for sample in mix.iter_mut() {
            *sample *= scale;
        }
    }
}

/// Squared-linear ramps, each clamped to half the mix length
fn apply_fades(mix: &mut [f32], options: &MixdownOptions) {
    let frames = mix.len() / 2;
    let half = frames / 2;

    let fade_in = fade_frames(options.fade_in, options.sample_rate).min(half);
    for i in 0..fade_in {
        let gain = (i as f32 / fade_in as f32).powi(2);
        mix[i * 2] *= gain;
        mix[i * 2 + 1] *= gain;
    }

    let fade_out = fade_frames(options.fade_out, options.sample_rate).min(half);
    for i in 0..fade_out {
        let gain = (i as f32 / fade_out as f32).powi(2);
        let frame = frames - 1 - i;
        mix[frame * 2] *= gain;
        mix[frame * 2 + 1] *= gain;
    }
}

fn fade_frames(fade: Duration, sample_rate: u32) -> usize {
    (fade.as_secs_f64() * f64::from(sample_rate)).round() as usize
}

/// Offline sinc resample of an interleaved stereo buffer
fn resample_stereo(samples: &[f32], from: u32, to: u32) -> Result<Vec<f32>> {
    const CHUNK: usize = 1024;

    let ratio = f64::from(to) / f64::from(from);
    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, CHUNK, 2)
        .map_err(|e| AudioError::ResampleError(e.to_string()))?;

    let in_frames = samples.len() / 2;
    let expected = (in_frames as f64 * ratio).round() as usize;
    let delay = resampler.output_delay();

    // Deinterleave
    let mut input = [
        Vec::with_capacity(in_frames),
        Vec::with_capacity(in_frames),
    ];
    for frame in samples.chunks_exact(2) {
        input[0].push(frame[0]);
        input[1].push(frame[1]);
    }

    let mut output = [Vec::new(), Vec::new()];
    let mut chunk = [vec![0.0f32; CHUNK], vec![0.0f32; CHUNK]];
    let mut offset = 0;
    // Keep feeding (zero-padded) chunks until the sinc delay has flushed
    // through and the expected frame count is available.
    while output[0].len() < delay + expected {
        for side in 0..2 {
            for i in 0..CHUNK {
                chunk[side][i] = input[side].get(offset + i).copied().unwrap_or(0.0);
            }
        }
        offset += CHUNK;
        let processed = resampler
            .process(&chunk, None)
            .map_err(|e| AudioError::ResampleError(e.to_string()))?;
        output[0].extend_from_slice(&processed[0]);
        output[1].extend_from_slice(&processed[1]);
    }

    let mut out = Vec::with_capacity(expected * 2);
    for i in delay..delay + expected {
        out.push(output[0][i]);
        out.push(output[1][i]);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, sample_rate: u32, frames: usize, amplitude: f32) {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        let value = (amplitude * f32::from(i16::MAX)) as i16;
        for i in 0..frames {
            // Alternate sign so the signal has no DC offset.
            let sign = if i % 2 == 0 { 1 } else { -1 };
            writer.write_sample::<i16>(value * sign).unwrap();
            writer.write_sample::<i16>(value * sign).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn read_wav(path: &Path) -> (hound::WavSpec, Vec<f32>) {
        let mut reader = hound::WavReader::open(path).unwrap();
        let spec = reader.spec();
        let samples = reader
            .samples::<i16>()
            .map(|s| f32::from(s.unwrap()) / f32::from(i16::MAX))
            .collect();
        (spec, samples)
    }

    #[test]
    fn peak_normalizes_to_target() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a.wav");
        write_wav(&input, 44_100, 4_410, 0.25);
        let out = dir.path().join("mix.wav");

        mixdown(
            &[MixInput {
                path: input,
                pan: 0,
            }],
            &MixdownOptions::default(),
            &out,
        )
        .unwrap();

        let (spec, samples) = read_wav(&out);
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 44_100);
        let peak = samples.iter().fold(0.0f32, |acc, &v| acc.max(v.abs()));
        assert!((peak - NORMALIZE_TARGET).abs() < 1e-3, "peak was {peak}");
    }

    #[test]
    fn pan_law_splits_the_channels() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a.wav");
        write_wav(&input, 44_100, 1_000, 0.5);
        let out = dir.path().join("mix.wav");

        mixdown(
            &[MixInput {
                path: input,
                pan: 100,
            }],
            &MixdownOptions::default(),
            &out,
        )
        .unwrap();

        let (_, samples) = read_wav(&out);
        let left_peak = samples
            .chunks_exact(2)
            .fold(0.0f32, |acc, f| acc.max(f[0].abs()));
        let right_peak = samples
            .chunks_exact(2)
            .fold(0.0f32, |acc, f| acc.max(f[1].abs()));
        assert!(left_peak < 1e-3, "left should be silent, was {left_peak}");
        assert!((right_peak - NORMALIZE_TARGET).abs() < 1e-3);
    }

    #[test]
    fn fades_ramp_from_and_to_silence() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a.wav");
        write_wav(&input, 44_100, 44_100, 0.5);
        let out = dir.path().join("mix.wav");

        mixdown(
            &[MixInput {
                path: input,
                pan: 0,
            }],
            &MixdownOptions {
                sample_rate: 44_100,
                fade_in: Duration::from_millis(250),
                fade_out: Duration::from_millis(250),
            },
            &out,
        )
        .unwrap();

        let (_, samples) = read_wav(&out);
        let frames = samples.len() / 2;
        assert!(samples[0].abs() < 1e-3);
        assert!(samples[(frames - 1) * 2].abs() < 1e-3);
        // The middle is untouched by either ramp.
        let mid = frames / 2;
        assert!((samples[mid * 2].abs() - NORMALIZE_TARGET).abs() < 1e-2);
    }

    #[test]
    fn mismatched_rate_is_resampled() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a.wav");
        write_wav(&input, 22_050, 22_050, 0.5);
        let out = dir.path().join("mix.wav");

        mixdown(
            &[MixInput {
                path: input,
                pan: 0,
            }],
            &MixdownOptions::default(),
            &out,
        )
        .unwrap();

        let (spec, samples) = read_wav(&out);
        assert_eq!(spec.sample_rate, 44_100);
        let frames = samples.len() / 2;
        let drift = (frames as f64 - 44_100.0).abs() / 44_100.0;
        assert!(drift < 0.01, "got {frames} frames");
    }

    #[test]
    fn bad_input_is_skipped_good_input_survives() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.wav");
        write_wav(&good, 44_100, 1_000, 0.5);
        let out = dir.path().join("mix.wav");

        mixdown(
            &[
                MixInput {
                    path: dir.path().join("missing.wav"),
                    pan: 0,
                },
                MixInput {
                    path: good,
                    pan: 0,
                },
            ],
            &MixdownOptions::default(),
            &out,
        )
        .unwrap();
        assert!(out.exists());
    }

    #[test]
    fn all_inputs_failing_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("mix.wav");
        let err = mixdown(
            &[MixInput {
                path: dir.path().join("missing.wav"),
                pan: 0,
            }],
            &MixdownOptions::default(),
            &out,
        )
        .unwrap_err();
        assert!(matches!(err, AudioError::NoUsableInput));
    }

    #[test]
    fn identical_inputs_produce_identical_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a.wav");
        write_wav(&input, 44_100, 2_000, 0.4);

        let out_a = dir.path().join("mix_a.wav");
        let out_b = dir.path().join("mix_b.wav");
        let inputs = [MixInput {
            path: input,
            pan: 30,
        }];
        mixdown(&inputs, &MixdownOptions::default(), &out_a).unwrap();
        mixdown(&inputs, &MixdownOptions::default(), &out_b).unwrap();

        assert_eq!(
            std::fs::read(&out_a).unwrap(),
            std::fs::read(&out_b).unwrap()
        );
    }
}
