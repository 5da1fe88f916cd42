//! Pause/resume time accounting
//!
//! Tracks how much *effective* playback time has elapsed for the current
//! track: wall time since playback started, minus every pause span. The
//! resume-rescheduling policy depends on these numbers being exact.

use std::time::{Duration, Instant};

/// Effective-elapsed-time tracker for one track
///
/// Invariant: `pause_start` is `Some` exactly while the player is Paused.
#[derive(Debug, Clone)]
pub struct Timeline {
    /// Instant playback of the current track began
    playback_start: Instant,

    /// Accumulated length of all completed pauses
    total_paused: Duration,

    /// Start of the in-progress pause, while paused
    pause_start: Option<Instant>,
}

impl Timeline {
    /// Start timing a track at `now`, resetting all pause accounting
    pub fn start(now: Instant) -> Self {
        Self {
            playback_start: now,
            total_paused: Duration::ZERO,
            pause_start: None,
        }
    }

    /// Record the beginning of a pause
    pub fn pause(&mut self, now: Instant) {
        if self.pause_start.is_none() {
            self.pause_start = Some(now);
        }
    }

    /// Record the end of a pause, folding its span into the total
    ///
    /// Returns the effective playtime that had elapsed *before* the pause
    /// began — the input to the resume rescheduling policy.
    pub fn resume(&mut self, now: Instant) -> Duration {
        let Some(pause_start) = self.pause_start.take() else {
            return self.elapsed(now);
        };
        let elapsed_before_pause =
            pause_start.saturating_duration_since(self.playback_start) - self.total_paused;
        self.total_paused += now.saturating_duration_since(pause_start);
        elapsed_before_pause
    }

    /// Effective playtime elapsed at `now`
    ///
    /// Excludes all completed pauses, and the in-progress one while paused.
    pub fn elapsed(&self, now: Instant) -> Duration {
        let reference = self.pause_start.unwrap_or(now);
        reference.saturating_duration_since(self.playback_start) - self.total_paused
    }

    /// Whether a pause is currently in progress
    pub fn is_paused(&self) -> bool {
        self.pause_start.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn elapsed_without_pauses() {
        let t0 = Instant::now();
        let timeline = Timeline::start(t0);
        assert_eq!(timeline.elapsed(t0 + ms(1500)), ms(1500));
    }

    #[test]
    fn elapsed_frozen_while_paused() {
        let t0 = Instant::now();
        let mut timeline = Timeline::start(t0);

        timeline.pause(t0 + ms(1000));
        assert!(timeline.is_paused());
        // Wall time keeps moving; effective elapsed does not.
        assert_eq!(timeline.elapsed(t0 + ms(5000)), ms(1000));
    }

    #[test]
    fn resume_returns_elapsed_before_pause() {
        let t0 = Instant::now();
        let mut timeline = Timeline::start(t0);

        timeline.pause(t0 + ms(1000));
        let before = timeline.resume(t0 + ms(4000));
        assert_eq!(before, ms(1000));
        assert!(!timeline.is_paused());

        // 3s of pause excluded from the ongoing count
        assert_eq!(timeline.elapsed(t0 + ms(6000)), ms(3000));
    }

    #[test]
    fn multiple_pauses_accumulate() {
        let t0 = Instant::now();
        let mut timeline = Timeline::start(t0);

        timeline.pause(t0 + ms(1000));
        timeline.resume(t0 + ms(2000)); // paused 1s

        timeline.pause(t0 + ms(3000));
        let before = timeline.resume(t0 + ms(3500)); // paused 0.5s

        // Played 1s, paused 1s, played 1s: 2s effective before second pause
        assert_eq!(before, ms(2000));
        assert_eq!(timeline.elapsed(t0 + ms(4500)), ms(3000));
    }

    #[test]
    fn double_pause_is_idempotent() {
        let t0 = Instant::now();
        let mut timeline = Timeline::start(t0);

        timeline.pause(t0 + ms(1000));
        timeline.pause(t0 + ms(2000)); // ignored; first pause stands
        assert_eq!(timeline.resume(t0 + ms(3000)), ms(1000));
        assert_eq!(timeline.elapsed(t0 + ms(3000)), ms(1000));
    }

    #[test]
    fn resume_without_pause_is_noop() {
        let t0 = Instant::now();
        let mut timeline = Timeline::start(t0);
        assert_eq!(timeline.resume(t0 + ms(800)), ms(800));
    }
}
