//! Volume/pan mixing into a stereo gain pair
//!
//! Combines the two independent sliders into the (left, right) gains the
//! channel applies. Uses a constant-power square-root pan law; a linear
//! pan law is audibly wrong (3 dB center bump) and must not be
//! substituted.

/// Compute the stereo gain pair for a volume/pan slider setting
///
/// `volume` is 0-100, `pan` is -100 (full left) to +100 (full right).
///
/// ```text
/// gain     = volume / 100
/// pan_norm = (pan + 100) / 200
/// left     = clamp(gain * sqrt(1 - pan_norm), 0, 1)
/// right    = clamp(gain * sqrt(pan_norm),     0, 1)
/// ```
#[inline]
pub fn channel_gains(volume: u8, pan: i8) -> (f32, f32) {
    let gain = f32::from(volume.min(100)) / 100.0;
    let pan = f32::from(pan.clamp(-100, 100));

    let pan_norm = (pan + 100.0) / 200.0;
    let left_mul = (1.0 - pan_norm).sqrt();
    let right_mul = pan_norm.sqrt();

    let left = (gain * left_mul).clamp(0.0, 1.0);
    let right = (gain * right_mul).clamp(0.0, 1.0);
    (left, right)
}

/// Cached volume/pan state for one player
///
/// Keeps the slider positions and the derived gain pair together so the
/// pair is recomputed once per change, not per apply.
#[derive(Debug, Clone)]
pub struct ChannelGain {
    volume: u8,
    pan: i8,
    gains: (f32, f32),
}

impl ChannelGain {
    /// Create from initial slider positions
    pub fn new(volume: u8, pan: i8) -> Self {
        Self {
            volume: volume.min(100),
            pan: pan.clamp(-100, 100),
            gains: channel_gains(volume, pan),
        }
    }

    /// Set volume (0-100, clamped)
    pub fn set_volume(&mut self, volume: u8) {
        self.volume = volume.min(100);
        self.gains = channel_gains(self.volume, self.pan);
    }

    /// Set pan (-100..=100, clamped)
    pub fn set_pan(&mut self, pan: i8) {
        self.pan = pan.clamp(-100, 100);
        self.gains = channel_gains(self.volume, self.pan);
    }

    /// Current volume slider position
    pub fn volume(&self) -> u8 {
        self.volume
    }

    /// Current pan slider position
    pub fn pan(&self) -> i8 {
        self.pan
    }

    /// Derived (left, right) gain pair
    pub fn gains(&self) -> (f32, f32) {
        self.gains
    }
}

impl Default for ChannelGain {
    fn default() -> Self {
        Self::new(70, 0)
    }
}
