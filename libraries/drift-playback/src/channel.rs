//! Output channel abstraction
//!
//! The engine never talks to an audio device directly. Each player drives
//! one [`AudioChannel`], implemented by the embedding platform; tests use
//! [`MockChannel`] to observe every call without producing sound.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::error::Result;
use crate::types::LoadedTrack;

/// One platform output channel, owned by exactly one player
pub trait AudioChannel: Send {
    /// Begin playing `track`, optionally looping, with an optional fade-in
    fn play(&mut self, track: &LoadedTrack, looping: bool, fade_in: Duration) -> Result<()>;

    /// Hard stop, discarding the current track immediately
    fn stop(&mut self);

    /// Suspend playback, keeping position
    fn pause(&mut self);

    /// Continue from the paused position
    fn unpause(&mut self);

    /// Ramp the current track to silence over `fade`, then go idle
    fn fadeout(&mut self, fade: Duration);

    /// Apply per-channel gains (left, right), each in [0.0, 1.0]
    fn set_gains(&mut self, left: f32, right: f32);

    /// Whether the channel currently holds a track (playing or paused)
    fn is_busy(&self) -> bool;

    /// Arm or disarm delivery of the track-finished signal
    fn set_end_notification(&mut self, enabled: bool);

    /// Edge-triggered finished signal
    ///
    /// Returns `true` at most once per finished track, and only while the
    /// end notification is armed. The owner polls this each tick.
    fn take_finished(&mut self) -> bool;
}

/// Recorded [`MockChannel`] interactions, for test assertions
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelCall {
    Play {
        path: std::path::PathBuf,
        looping: bool,
        fade_in: Duration,
    },
    Stop,
    Pause,
    Unpause,
    Fadeout(Duration),
    SetGains(f32, f32),
}

#[derive(Debug, Default)]
struct MockState {
    busy: bool,
    paused: bool,
    end_notification: bool,
    finished: bool,
    calls: Vec<ChannelCall>,
    gains: (f32, f32),
}

/// In-memory channel double that records calls instead of playing audio
///
/// Clones share state, so a test can keep a handle after boxing one into
/// a player.
#[derive(Debug, Clone, Default)]
pub struct MockChannel {
    inner: Arc<Mutex<MockState>>,
}

impl MockChannel {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Simulate the platform reaching the end of the current track
    pub fn finish_track(&self) {
        let mut state = self.state();
        state.busy = false;
        state.paused = false;
        state.finished = true;
    }

    /// Every call made against this channel, in order
    pub fn calls(&self) -> Vec<ChannelCall> {
        self.state().calls.clone()
    }

    /// Paths of every `play` call, in order
    pub fn played_paths(&self) -> Vec<std::path::PathBuf> {
        self.state()
            .calls
            .iter()
            .filter_map(|call| match call {
                ChannelCall::Play { path, .. } => Some(path.clone()),
                _ => None,
            })
            .collect()
    }

    /// Last gains applied via `set_gains`
    pub fn gains(&self) -> (f32, f32) {
        self.state().gains
    }

    /// Whether playback is suspended
    pub fn is_paused(&self) -> bool {
        self.state().paused
    }

    /// Whether the end notification is currently armed
    pub fn end_notification_armed(&self) -> bool {
        self.state().end_notification
    }
}

impl AudioChannel for MockChannel {
    fn play(&mut self, track: &LoadedTrack, looping: bool, fade_in: Duration) -> Result<()> {
        let mut state = self.state();
        state.busy = true;
        state.paused = false;
        state.finished = false;
        state.calls.push(ChannelCall::Play {
            path: track.path.clone(),
            looping,
            fade_in,
        });
        Ok(())
    }

    fn stop(&mut self) {
        let mut state = self.state();
        state.busy = false;
        state.paused = false;
        state.calls.push(ChannelCall::Stop);
    }

    fn pause(&mut self) {
        let mut state = self.state();
        if state.busy {
            state.paused = true;
        }
        state.calls.push(ChannelCall::Pause);
    }

    fn unpause(&mut self) {
        let mut state = self.state();
        state.paused = false;
        state.calls.push(ChannelCall::Unpause);
    }

    fn fadeout(&mut self, fade: Duration) {
        self.state().calls.push(ChannelCall::Fadeout(fade));
    }

    fn set_gains(&mut self, left: f32, right: f32) {
        let mut state = self.state();
        state.gains = (left, right);
        state.calls.push(ChannelCall::SetGains(left, right));
    }

    fn is_busy(&self) -> bool {
        self.state().busy
    }

    fn set_end_notification(&mut self, enabled: bool) {
        let mut state = self.state();
        state.end_notification = enabled;
        if !enabled {
            state.finished = false;
        }
    }

    fn take_finished(&mut self) -> bool {
        let mut state = self.state();
        if state.end_notification && state.finished {
            state.finished = false;
            return true;
        }
        false
    }
}
