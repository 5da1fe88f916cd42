//! Waveform peak extraction
//!
//! Reduces a decoded buffer to `width` peak values in [0.0, 1.0] for a
//! waveform display. Rendering is the host's job; this is only the data.

/// Per-bucket peak amplitudes, normalized to the loudest bucket
///
/// `samples` is interleaved with `channels` channels; frames are folded
/// to mono before bucketing. Returns exactly `width` values, or an empty
/// vec when there is nothing to show. A silent buffer yields all zeros.
pub fn peaks(samples: &[f32], channels: usize, width: usize) -> Vec<f32> {
    if samples.is_empty() || channels == 0 || width == 0 {
        return Vec::new();
    }

    let frames = samples.len() / channels;
    if frames == 0 {
        return Vec::new();
    }

    let mut out = vec![0.0f32; width];
    for (bucket, slot) in out.iter_mut().enumerate() {
        let start = bucket * frames / width;
        let end = ((bucket + 1) * frames / width).max(start + 1).min(frames);

        let mut peak = 0.0f32;
        for frame in start..end {
            let mut mono = 0.0f32;
            for chan in 0..channels {
                mono += samples[frame * channels + chan];
            }
            mono /= channels as f32;
            peak = peak.max(mono.abs());
        }
        *slot = peak;
    }

    let max = out.iter().fold(0.0f32, |acc, &v| acc.max(v));
    if max > 0.0 {
        for value in &mut out {
            *value /= max;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(peaks(&[], 2, 100).is_empty());
        assert!(peaks(&[0.5], 0, 100).is_empty());
        assert!(peaks(&[0.5, 0.5], 2, 0).is_empty());
    }

    #[test]
    fn loudest_bucket_normalizes_to_one() {
        // Quiet first half, loud second half, mono.
        let mut samples = vec![0.1f32; 100];
        samples.extend(vec![0.8f32; 100]);

        let out = peaks(&samples, 1, 2);
        assert_eq!(out.len(), 2);
        assert!((out[1] - 1.0).abs() < 1e-6);
        assert!((out[0] - 0.125).abs() < 1e-6);
    }

    #[test]
    fn silence_stays_zero() {
        let out = peaks(&vec![0.0f32; 200], 2, 10);
        assert_eq!(out.len(), 10);
        assert!(out.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn stereo_frames_fold_to_mono() {
        // Opposite-phase stereo cancels to silence when folded.
        let samples: Vec<f32> = (0..100).flat_map(|_| [0.5f32, -0.5f32]).collect();
        let out = peaks(&samples, 2, 4);
        assert!(out.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn width_larger_than_frames_still_fills() {
        let samples = vec![0.4f32, 0.4, -0.9, -0.9];
        let out = peaks(&samples, 2, 8);
        assert_eq!(out.len(), 8);
        assert!((out.iter().cloned().fold(0.0f32, f32::max) - 1.0).abs() < 1e-6);
    }
}
