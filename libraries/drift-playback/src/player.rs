//! Per-player state machine
//!
//! One [`Player`] owns one output channel and one folder library, and
//! walks the Stopped/Playing/Paused states. All timing goes through the
//! shared scheduler; a player never sleeps and never touches wall time
//! except through the `now` it is handed.
//!
//! Timer discipline: at most one pending transition timer per player,
//! held in `timer`. Everything that arms a new one goes through
//! [`Player::arm_transition`] or explicitly cancels first, and every
//! firing is matched against the stored handle so a superseded timer
//! falls dead instead of double-advancing.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rand::RngCore;
use tracing::{debug, info, warn};

use crate::channel::AudioChannel;
use crate::error::{PlaybackError, Result};
use crate::events::PlayerEvent;
use crate::history::TrackHistory;
use crate::library::scan_folder;
use crate::loader::TrackLoader;
use crate::mixer::ChannelGain;
use crate::scheduler::{Firing, Scheduler, TimerAction, TimerId};
use crate::selector::select_next;
use crate::timeline::Timeline;
use crate::transition::{plan_transition, FADE_SETTLE};
use crate::types::{
    LoadedTrack, PlaybackState, PlayerConfig, PlayerId, PresetFolder, DEFAULT_WAVEFORM_COLOR,
};

/// One playback slot: channel, library, state, pending timer
pub struct Player {
    id: PlayerId,
    config: PlayerConfig,
    channel: Box<dyn AudioChannel>,
    gain: ChannelGain,

    folder: Option<PathBuf>,
    library: Vec<PathBuf>,
    history: TrackHistory,

    state: PlaybackState,
    looping: bool,
    current: Option<LoadedTrack>,
    timeline: Option<Timeline>,

    /// The single pending transition timer
    timer: Option<TimerId>,

    /// Track to start when a fade-out settles ("previous" target);
    /// `None` means the fade hands over to a fresh random pick
    pending_track: Option<PathBuf>,

    events: Vec<PlayerEvent>,
}

impl Player {
    pub fn new(id: PlayerId, channel: Box<dyn AudioChannel>, history_size: usize) -> Self {
        let config = PlayerConfig::default();
        let gain = ChannelGain::new(config.volume, config.pan);
        Self {
            id,
            config,
            channel,
            gain,
            folder: None,
            library: Vec::new(),
            history: TrackHistory::new(history_size),
            state: PlaybackState::Stopped,
            looping: false,
            current: None,
            timeline: None,
            timer: None,
            pending_track: None,
            events: Vec::new(),
        }
    }

    // ===== Accessors =====

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn current_track(&self) -> Option<&LoadedTrack> {
        self.current.as_ref()
    }

    pub fn folder(&self) -> Option<&Path> {
        self.folder.as_deref()
    }

    pub fn library(&self) -> &[PathBuf] {
        &self.library
    }

    pub fn history(&self) -> &TrackHistory {
        &self.history
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Drain buffered events for the embedding UI
    pub fn take_events(&mut self) -> Vec<PlayerEvent> {
        std::mem::take(&mut self.events)
    }

    /// Surface a failure that happened on this player's behalf
    pub(crate) fn record_error(&mut self, err: &PlaybackError) {
        self.events.push(PlayerEvent::PlayerError {
            player: self.id,
            message: err.to_string(),
        });
    }

    // ===== Settings =====

    /// Set volume (0-100) and apply it to the channel immediately
    pub fn set_volume(&mut self, volume: u8) {
        self.gain.set_volume(volume);
        self.config.volume = self.gain.volume();
        let (left, right) = self.gain.gains();
        self.channel.set_gains(left, right);
    }

    /// Set pan (-100..=100) and apply it to the channel immediately
    pub fn set_pan(&mut self, pan: i8) {
        self.gain.set_pan(pan);
        self.config.pan = self.gain.pan();
        let (left, right) = self.gain.gains();
        self.channel.set_gains(left, right);
    }

    /// Set the crossfade length; takes effect at the next arm
    pub fn set_fade(&mut self, fade: Duration) {
        self.config.fade = fade;
    }

    /// Set or clear the interval override; takes effect at the next arm
    pub fn set_interval(&mut self, interval: Option<Duration>) {
        self.config.interval = interval;
    }

    // ===== Transport =====

    /// Start playback from Stopped with a fresh random pick
    pub fn start(
        &mut self,
        now: Instant,
        scheduler: &mut Scheduler,
        loader: &dyn TrackLoader,
        rng: &mut dyn RngCore,
    ) -> Result<()> {
        if self.state != PlaybackState::Stopped {
            return Ok(());
        }
        let Some(path) = select_next(&self.library, &self.history, rng) else {
            return Err(PlaybackError::EmptyLibrary);
        };
        self.play_track(path, now, scheduler, loader)
    }

    /// Suspend playback, freezing elapsed time
    pub fn pause(&mut self, now: Instant, scheduler: &mut Scheduler) {
        if self.state != PlaybackState::Playing || !self.channel.is_busy() {
            return;
        }
        self.cancel_timer(scheduler);
        self.channel.pause();
        if let Some(timeline) = &mut self.timeline {
            timeline.pause(now);
        }
        self.set_state(PlaybackState::Paused);
    }

    /// Continue from a pause, re-arming against the remaining time
    pub fn resume(&mut self, now: Instant, scheduler: &mut Scheduler) {
        if self.state != PlaybackState::Paused {
            return;
        }
        self.channel.unpause();
        let elapsed = match &mut self.timeline {
            Some(timeline) => timeline.resume(now),
            None => Duration::ZERO,
        };
        self.set_state(PlaybackState::Playing);
        self.arm_transition(now, scheduler, elapsed);
    }

    /// Full stop: clears the track, the timer, and the looping flag
    pub fn stop(&mut self, scheduler: &mut Scheduler) {
        self.cancel_timer(scheduler);
        self.pending_track = None;
        self.channel.stop();
        self.channel.set_end_notification(false);
        if let Some(track) = self.current.take() {
            self.events.push(PlayerEvent::TrackFinished {
                player: self.id,
                path: track.path,
            });
        }
        self.timeline = None;
        self.looping = false;
        self.set_state(PlaybackState::Stopped);
    }

    /// Stop and forget everything: folder, library, history
    pub fn clear(&mut self, scheduler: &mut Scheduler) {
        self.stop(scheduler);
        self.folder = None;
        self.library.clear();
        self.history.clear();
    }

    /// Flip the looping flag; mid-play this restarts the current track
    ///
    /// While Stopped the flip is flag-only and applies on the next start.
    pub fn toggle_loop(
        &mut self,
        now: Instant,
        scheduler: &mut Scheduler,
    ) -> Result<()> {
        if self.current.is_none() && self.folder.is_none() {
            return Err(PlaybackError::NoTrackLoaded);
        }
        self.cancel_timer(scheduler);
        self.looping = !self.looping;
        info!(player = self.id, looping = self.looping, "loop toggled");

        if self.state == PlaybackState::Stopped {
            return Ok(());
        }

        // Hard restart from zero under the new setting, no fade-in.
        let Some(track) = self.current.clone() else {
            return Ok(());
        };
        self.channel.set_end_notification(false);
        if let Err(err) = self.channel.play(&track, self.looping, Duration::ZERO) {
            self.fail(scheduler, &err);
            return Err(err);
        }
        let (left, right) = self.gain.gains();
        self.channel.set_gains(left, right);
        self.timeline = Some(Timeline::start(now));
        self.set_state(PlaybackState::Playing);
        self.arm_transition(now, scheduler, Duration::ZERO);
        Ok(())
    }

    /// Skip to a fresh random pick immediately, no fade
    ///
    /// Works from Playing or Paused; a skip out of Paused starts the new
    /// track playing.
    pub fn next(
        &mut self,
        now: Instant,
        scheduler: &mut Scheduler,
        loader: &dyn TrackLoader,
        rng: &mut dyn RngCore,
    ) -> Result<()> {
        if self.state == PlaybackState::Stopped {
            return Ok(());
        }
        self.cancel_timer(scheduler);
        self.channel.set_end_notification(false);
        self.channel.stop();
        self.advance(now, scheduler, loader, rng);
        Ok(())
    }

    /// Return to the most recent history entry
    ///
    /// With a fade configured and audio flowing, the current track fades
    /// out first and the popped track starts after the ramp settles. From
    /// Paused the switch is immediate and starts the popped track playing.
    pub fn previous(
        &mut self,
        now: Instant,
        scheduler: &mut Scheduler,
        loader: &dyn TrackLoader,
    ) -> Result<()> {
        if self.state == PlaybackState::Stopped {
            return Ok(());
        }
        let Some(previous) = self.history.pop() else {
            debug!(player = self.id, "previous requested with empty history");
            return Ok(());
        };
        self.cancel_timer(scheduler);
        self.channel.set_end_notification(false);

        if self.state == PlaybackState::Playing
            && self.channel.is_busy()
            && self.config.fade > Duration::ZERO
        {
            self.channel.fadeout(self.config.fade);
            self.events.push(PlayerEvent::FadeOutStarted { player: self.id });
            self.pending_track = Some(previous);
            self.timer = Some(scheduler.schedule(
                now,
                self.config.fade + FADE_SETTLE,
                self.id,
                TimerAction::FadeOutDone,
            ));
            return Ok(());
        }

        self.channel.stop();
        // The current track is dropped without a history push, so a chain
        // of "previous" keeps walking backwards.
        self.current = None;
        if let Err(err) = self.play_track(previous, now, scheduler, loader) {
            self.fail(scheduler, &err);
            return Err(err);
        }
        Ok(())
    }

    /// Load `folder` as the new library and auto-start
    ///
    /// Stops any active playback, snapshots the folder contents, clears
    /// history, and resolves the waveform color from a matching preset.
    pub fn select_folder(
        &mut self,
        folder: &Path,
        presets: &[PresetFolder],
        now: Instant,
        scheduler: &mut Scheduler,
        loader: &dyn TrackLoader,
        rng: &mut dyn RngCore,
    ) -> Result<()> {
        if self.state != PlaybackState::Stopped {
            self.stop(scheduler);
        }

        let library = scan_folder(folder)?;
        self.folder = Some(folder.to_path_buf());
        self.library = library;
        self.history.clear();
        self.config.waveform_color = presets
            .iter()
            .find(|preset| preset.path == folder)
            .map(|preset| preset.color.clone())
            .unwrap_or_else(|| DEFAULT_WAVEFORM_COLOR.to_string());

        info!(
            player = self.id,
            folder = %folder.display(),
            tracks = self.library.len(),
            "library loaded"
        );
        self.events.push(PlayerEvent::LibraryLoaded {
            player: self.id,
            tracks: self.library.len(),
        });

        if self.library.is_empty() {
            return Err(PlaybackError::EmptyLibrary);
        }
        self.start(now, scheduler, loader, rng)
    }

    // ===== Timer and end-notification dispatch =====

    /// React to a fired timer
    ///
    /// A firing whose id does not match the stored handle belongs to a
    /// superseded generation and is dropped silently.
    pub fn handle_timer(
        &mut self,
        firing: Firing,
        now: Instant,
        scheduler: &mut Scheduler,
        loader: &dyn TrackLoader,
        rng: &mut dyn RngCore,
    ) {
        if self.timer != Some(firing.id) {
            debug!(player = self.id, id = ?firing.id, "stale timer ignored");
            return;
        }
        self.timer = None;

        if self.state != PlaybackState::Playing {
            debug!(player = self.id, state = ?self.state, "timer fired off-state");
            return;
        }

        match firing.action {
            TimerAction::BeginFadeOut => {
                // Nothing left to ramp down; hand over right away.
                if !self.channel.is_busy() {
                    self.advance(now, scheduler, loader, rng);
                    return;
                }
                self.channel.fadeout(self.config.fade);
                self.events.push(PlayerEvent::FadeOutStarted { player: self.id });
                self.timer = Some(scheduler.schedule(
                    now,
                    self.config.fade + FADE_SETTLE,
                    self.id,
                    TimerAction::FadeOutDone,
                ));
            }
            TimerAction::FadeOutDone => {
                if let Some(path) = self.pending_track.take() {
                    self.current = None;
                    if let Err(err) = self.play_track(path, now, scheduler, loader) {
                        self.fail(scheduler, &err);
                    }
                } else {
                    self.advance(now, scheduler, loader, rng);
                }
            }
            TimerAction::IntervalExpired => {
                self.channel.stop();
                self.advance(now, scheduler, loader, rng);
            }
        }
    }

    /// Poll the channel's edge-triggered end signal and advance on it
    pub fn poll_end(
        &mut self,
        now: Instant,
        scheduler: &mut Scheduler,
        loader: &dyn TrackLoader,
        rng: &mut dyn RngCore,
    ) {
        if self.state == PlaybackState::Playing && self.channel.take_finished() {
            self.advance(now, scheduler, loader, rng);
        }
    }

    /// Earliest pending work, so a host can size its tick sleep
    pub fn has_pending_timer(&self) -> bool {
        self.timer.is_some()
    }

    // ===== Internals =====

    /// Finish the current track and play a fresh random pick
    ///
    /// Stays inside Playing; an empty library drops to Stopped, a decode
    /// failure is reported as an event and drops to Stopped.
    fn advance(
        &mut self,
        now: Instant,
        scheduler: &mut Scheduler,
        loader: &dyn TrackLoader,
        rng: &mut dyn RngCore,
    ) {
        if let Some(track) = self.current.take() {
            self.history.push(track.path.clone());
            self.events.push(PlayerEvent::TrackFinished {
                player: self.id,
                path: track.path,
            });
        }

        let Some(path) = select_next(&self.library, &self.history, rng) else {
            warn!(player = self.id, "library is empty, stopping");
            self.stop(scheduler);
            return;
        };
        if let Err(err) = self.play_track(path, now, scheduler, loader) {
            self.fail(scheduler, &err);
        }
    }

    /// Load and start one specific track, then arm the handover
    fn play_track(
        &mut self,
        path: PathBuf,
        now: Instant,
        scheduler: &mut Scheduler,
        loader: &dyn TrackLoader,
    ) -> Result<()> {
        // Reuse the already-decoded buffer when replaying the same track.
        let track = match &self.current {
            Some(current) if current.path == path => current.clone(),
            _ => loader.load(&path)?,
        };
        self.channel.play(&track, self.looping, self.config.fade)?;
        let (left, right) = self.gain.gains();
        self.channel.set_gains(left, right);

        info!(
            player = self.id,
            track = %track.path.display(),
            duration = ?track.duration,
            "track started"
        );
        self.events.push(PlayerEvent::TrackStarted {
            player: self.id,
            path: track.path.clone(),
            duration: track.duration,
        });

        self.timeline = Some(Timeline::start(now));
        self.current = Some(track);
        self.set_state(PlaybackState::Playing);
        self.arm_transition(now, scheduler, Duration::ZERO);
        Ok(())
    }

    /// Cancel any pending timer and arm the handover mechanism for the
    /// current track with `elapsed` effective playtime already spent
    fn arm_transition(&mut self, now: Instant, scheduler: &mut Scheduler, elapsed: Duration) {
        self.cancel_timer(scheduler);

        let remaining = self
            .current
            .as_ref()
            .and_then(|track| track.duration)
            .map(|duration| duration.saturating_sub(elapsed));
        let interval = self
            .config
            .interval
            .map(|interval| interval.saturating_sub(elapsed));

        let plan = plan_transition(self.looping, remaining, self.config.fade, interval);
        self.channel.set_end_notification(plan.end_notification);
        if let Some((action, delay)) = plan.timer {
            self.timer = Some(scheduler.schedule(now, delay, self.id, action));
        }
    }

    fn cancel_timer(&mut self, scheduler: &mut Scheduler) {
        if let Some(id) = self.timer.take() {
            scheduler.cancel(id);
        }
    }

    fn set_state(&mut self, state: PlaybackState) {
        if self.state != state {
            debug!(player = self.id, from = ?self.state, to = ?state, "state change");
            self.state = state;
            self.events.push(PlayerEvent::StateChanged {
                player: self.id,
                state,
            });
        }
    }

    /// Report a per-player failure and drop to Stopped
    fn fail(&mut self, scheduler: &mut Scheduler, err: &PlaybackError) {
        warn!(player = self.id, %err, "player error");
        self.record_error(err);
        self.stop(scheduler);
    }
}
