//! Engine: player pool, shared scheduler, group operations
//!
//! The host owns one [`Engine`] and drives it from a single thread: call
//! transport methods on user input, call [`Engine::tick`] periodically
//! (or whenever [`Engine::next_deadline`] comes due), and drain
//! [`Engine::take_events`] for the UI.
//!
//! Group operations are best-effort iterations over independent players.
//! A failure on one player is logged and surfaced as an event; the others
//! proceed.

use std::path::Path;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::channel::AudioChannel;
use crate::clock::Clock;
use crate::error::{PlaybackError, Result};
use crate::events::PlayerEvent;
use crate::loader::TrackLoader;
use crate::player::Player;
use crate::scheduler::Scheduler;
use crate::types::{EngineConfig, PlaybackState, PlayerId, PresetFolder};

/// Multi-player playback engine
pub struct Engine {
    players: Vec<Player>,
    scheduler: Scheduler,
    clock: Box<dyn Clock>,
    loader: Box<dyn TrackLoader>,
    rng: StdRng,
}

impl Engine {
    /// Build an engine with one channel per player slot
    pub fn new(
        config: EngineConfig,
        clock: Box<dyn Clock>,
        loader: Box<dyn TrackLoader>,
        mut make_channel: impl FnMut(PlayerId) -> Box<dyn AudioChannel>,
    ) -> Self {
        let players = (0..config.players)
            .map(|id| Player::new(id, make_channel(id), config.history_size))
            .collect();
        Self {
            players,
            scheduler: Scheduler::new(),
            clock,
            loader,
            rng: StdRng::from_entropy(),
        }
    }

    /// Replace the selection RNG with a seeded one, for reproducible runs
    pub fn seed_rng(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn player(&self, id: PlayerId) -> Result<&Player> {
        self.players.get(id).ok_or(PlaybackError::UnknownPlayer(id))
    }

    fn check_player(&self, id: PlayerId) -> Result<()> {
        if id < self.players.len() {
            Ok(())
        } else {
            Err(PlaybackError::UnknownPlayer(id))
        }
    }

    // ===== Driving =====

    /// Fire due timers and poll end notifications
    ///
    /// Call this periodically; nothing advances between calls.
    pub fn tick(&mut self) {
        let now = self.clock.now();
        for firing in self.scheduler.due(now) {
            let Some(player) = self.players.get_mut(firing.player) else {
                debug!(player = firing.player, "timer for unknown player dropped");
                continue;
            };
            player.handle_timer(firing, now, &mut self.scheduler, &*self.loader, &mut self.rng);
        }
        for player in &mut self.players {
            player.poll_end(now, &mut self.scheduler, &*self.loader, &mut self.rng);
        }
    }

    /// Earliest pending timer deadline, for sizing the host's tick sleep
    pub fn next_deadline(&mut self) -> Option<std::time::Instant> {
        self.scheduler.next_deadline()
    }

    /// Drain buffered events from every player, in player order
    pub fn take_events(&mut self) -> Vec<PlayerEvent> {
        let mut events = Vec::new();
        for player in &mut self.players {
            events.extend(player.take_events());
        }
        events
    }

    // ===== Per-player transport =====

    pub fn start(&mut self, id: PlayerId) -> Result<()> {
        self.check_player(id)?;
        let now = self.clock.now();
        self.players[id].start(now, &mut self.scheduler, &*self.loader, &mut self.rng)
    }

    pub fn stop(&mut self, id: PlayerId) -> Result<()> {
        self.check_player(id)?;
        self.players[id].stop(&mut self.scheduler);
        Ok(())
    }

    pub fn pause(&mut self, id: PlayerId) -> Result<()> {
        self.check_player(id)?;
        let now = self.clock.now();
        self.players[id].pause(now, &mut self.scheduler);
        Ok(())
    }

    pub fn resume(&mut self, id: PlayerId) -> Result<()> {
        self.check_player(id)?;
        let now = self.clock.now();
        self.players[id].resume(now, &mut self.scheduler);
        Ok(())
    }

    /// Three-way transport toggle: start from Stopped, pause from
    /// Playing, resume from Paused
    pub fn play_pause(&mut self, id: PlayerId) -> Result<()> {
        self.check_player(id)?;
        let now = self.clock.now();
        match self.players[id].state() {
            PlaybackState::Stopped => {
                self.players[id].start(now, &mut self.scheduler, &*self.loader, &mut self.rng)
            }
            PlaybackState::Playing => {
                self.players[id].pause(now, &mut self.scheduler);
                Ok(())
            }
            PlaybackState::Paused => {
                self.players[id].resume(now, &mut self.scheduler);
                Ok(())
            }
        }
    }

    pub fn toggle_loop(&mut self, id: PlayerId) -> Result<()> {
        self.check_player(id)?;
        let now = self.clock.now();
        self.players[id].toggle_loop(now, &mut self.scheduler)
    }

    pub fn next(&mut self, id: PlayerId) -> Result<()> {
        self.check_player(id)?;
        let now = self.clock.now();
        self.players[id].next(now, &mut self.scheduler, &*self.loader, &mut self.rng)
    }

    pub fn previous(&mut self, id: PlayerId) -> Result<()> {
        self.check_player(id)?;
        let now = self.clock.now();
        self.players[id].previous(now, &mut self.scheduler, &*self.loader)
    }

    pub fn select_folder(
        &mut self,
        id: PlayerId,
        folder: &Path,
        presets: &[PresetFolder],
    ) -> Result<()> {
        self.check_player(id)?;
        let now = self.clock.now();
        self.players[id].select_folder(
            folder,
            presets,
            now,
            &mut self.scheduler,
            &*self.loader,
            &mut self.rng,
        )
    }

    pub fn set_volume(&mut self, id: PlayerId, volume: u8) -> Result<()> {
        self.check_player(id)?;
        self.players[id].set_volume(volume);
        Ok(())
    }

    pub fn set_pan(&mut self, id: PlayerId, pan: i8) -> Result<()> {
        self.check_player(id)?;
        self.players[id].set_pan(pan);
        Ok(())
    }

    pub fn set_fade(&mut self, id: PlayerId, fade: Duration) -> Result<()> {
        self.check_player(id)?;
        self.players[id].set_fade(fade);
        Ok(())
    }

    pub fn set_interval(&mut self, id: PlayerId, interval: Option<Duration>) -> Result<()> {
        self.check_player(id)?;
        self.players[id].set_interval(interval);
        Ok(())
    }

    // ===== Group operations =====

    /// Pause everything playing, or resume everything paused
    ///
    /// If at least one player is Playing the whole group pauses; only
    /// when none is Playing do the Paused ones resume.
    pub fn pause_resume_all(&mut self) {
        let now = self.clock.now();
        let any_playing = self
            .players
            .iter()
            .any(|p| p.state() == PlaybackState::Playing);

        if any_playing {
            for player in &mut self.players {
                if player.state() == PlaybackState::Playing {
                    player.pause(now, &mut self.scheduler);
                }
            }
        } else {
            for player in &mut self.players {
                if player.state() == PlaybackState::Paused {
                    player.resume(now, &mut self.scheduler);
                }
            }
        }
    }

    /// Toggle looping on every actively playing player
    pub fn loop_toggle_all(&mut self) {
        let now = self.clock.now();
        for player in &mut self.players {
            if player.state() == PlaybackState::Playing {
                if let Err(err) = player.toggle_loop(now, &mut self.scheduler) {
                    warn!(player = player.id(), %err, "group loop toggle skipped");
                }
            }
        }
    }

    /// Skip forward on every actively playing player
    pub fn next_group(&mut self) {
        let now = self.clock.now();
        for player in &mut self.players {
            if player.state() == PlaybackState::Playing {
                if let Err(err) =
                    player.next(now, &mut self.scheduler, &*self.loader, &mut self.rng)
                {
                    warn!(player = player.id(), %err, "group next skipped");
                }
            }
        }
    }

    /// Step back on every actively playing player
    pub fn previous_group(&mut self) {
        let now = self.clock.now();
        for player in &mut self.players {
            if player.state() == PlaybackState::Playing {
                if let Err(err) = player.previous(now, &mut self.scheduler, &*self.loader) {
                    warn!(player = player.id(), %err, "group previous skipped");
                }
            }
        }
    }

    /// Stop every player and forget all folders, libraries, and history
    pub fn stop_clear_all(&mut self) {
        for player in &mut self.players {
            player.clear(&mut self.scheduler);
        }
        info!("all players stopped and cleared");
    }

    /// Load a random preset into each of the first `count` players
    ///
    /// An out-of-range `count` falls back to the full player pool. The
    /// remaining players are stopped and cleared. Per-player load
    /// failures (empty folders, missing paths) are reported as events
    /// and do not stop the rest of the group.
    pub fn shuffle_load_presets(&mut self, count: usize, presets: &[PresetFolder]) {
        if presets.is_empty() {
            warn!("shuffle requested with no presets");
            return;
        }
        let total = self.players.len();
        let count = if (1..=total).contains(&count) {
            count
        } else {
            total
        };
        let now = self.clock.now();

        for id in 0..total {
            if id >= count {
                self.players[id].clear(&mut self.scheduler);
                continue;
            }
            let Some(preset) = presets.choose(&mut self.rng).cloned() else {
                continue;
            };
            let result = self.players[id].select_folder(
                &preset.path,
                presets,
                now,
                &mut self.scheduler,
                &*self.loader,
                &mut self.rng,
            );
            if let Err(err) = result {
                warn!(player = id, preset = %preset.name, %err, "shuffle load failed");
                self.players[id].record_error(&err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{ChannelCall, MockChannel};
    use crate::clock::ManualClock;
    use crate::loader::StubLoader;
    use std::fs::File;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    struct Rig {
        engine: Engine,
        clock: Arc<ManualClock>,
        channels: Vec<MockChannel>,
        dir: TempDir,
    }

    impl Rig {
        fn folder(&self) -> PathBuf {
            self.dir.path().to_path_buf()
        }

        fn advance_and_tick(&mut self, delta: Duration) {
            self.clock.advance(delta);
            self.engine.tick();
        }
    }

    fn rig(players: usize, tracks: &[&str], track_duration: Option<Duration>) -> Rig {
        let dir = tempfile::tempdir().unwrap();
        for name in tracks {
            File::create(dir.path().join(name)).unwrap();
        }

        let clock = Arc::new(ManualClock::new());
        let channels: Vec<MockChannel> = (0..players).map(|_| MockChannel::new()).collect();
        let handles = channels.clone();
        let mut engine = Engine::new(
            EngineConfig {
                players,
                history_size: 20,
            },
            Box::new(clock.clone()),
            Box::new(StubLoader::new(track_duration)),
            move |id| Box::new(handles[id].clone()),
        );
        engine.seed_rng(7);
        Rig {
            engine,
            clock,
            channels,
            dir,
        }
    }

    fn secs(v: u64) -> Duration {
        Duration::from_secs(v)
    }

    #[test]
    fn select_folder_auto_starts() {
        let mut rig = rig(1, &["a.mp3", "b.mp3", "c.mp3"], Some(secs(10)));
        rig.engine.select_folder(0, &rig.folder(), &[]).unwrap();

        let player = rig.engine.player(0).unwrap();
        assert_eq!(player.state(), PlaybackState::Playing);
        assert_eq!(player.library().len(), 3);
        assert_eq!(rig.channels[0].played_paths().len(), 1);
    }

    #[test]
    fn empty_folder_reports_and_stays_stopped() {
        let mut rig = rig(1, &[], Some(secs(10)));
        let err = rig.engine.select_folder(0, &rig.folder(), &[]).unwrap_err();
        assert!(matches!(err, PlaybackError::EmptyLibrary));
        assert_eq!(rig.engine.player(0).unwrap().state(), PlaybackState::Stopped);
    }

    #[test]
    fn natural_end_advances_exactly_once() {
        let mut rig = rig(1, &["a.mp3", "b.mp3", "c.mp3"], Some(secs(10)));
        rig.engine.select_folder(0, &rig.folder(), &[]).unwrap();
        let first = rig.channels[0].played_paths()[0].clone();

        // No fade, no interval: the end notification carries the handover.
        rig.channels[0].finish_track();
        rig.advance_and_tick(secs(10));

        let played = rig.channels[0].played_paths();
        assert_eq!(played.len(), 2);
        assert_ne!(played[1], first);
        let player = rig.engine.player(0).unwrap();
        assert!(player.history().contains(&first));
        assert_eq!(player.state(), PlaybackState::Playing);

        // Nothing further fires without another finished track.
        rig.advance_and_tick(secs(60));
        assert_eq!(rig.channels[0].played_paths().len(), 2);
    }

    #[test]
    fn interval_timer_advances_mid_track() {
        let mut rig = rig(1, &["a.mp3", "b.mp3"], Some(secs(300)));
        rig.engine.set_interval(0, Some(secs(5))).unwrap();
        rig.engine.select_folder(0, &rig.folder(), &[]).unwrap();

        rig.advance_and_tick(secs(4));
        assert_eq!(rig.channels[0].played_paths().len(), 1);

        rig.advance_and_tick(secs(1));
        assert_eq!(rig.channels[0].played_paths().len(), 2);
    }

    #[test]
    fn fade_fires_before_track_end_and_chains() {
        let mut rig = rig(1, &["a.mp3", "b.mp3"], Some(secs(10)));
        rig.engine.set_fade(0, secs(2)).unwrap();
        rig.engine.select_folder(0, &rig.folder(), &[]).unwrap();

        // Fade-out begins at duration - fade = 8s.
        rig.advance_and_tick(secs(8));
        assert!(rig.channels[0]
            .calls()
            .contains(&ChannelCall::Fadeout(secs(2))));
        assert_eq!(rig.channels[0].played_paths().len(), 1);

        // Successor starts after the ramp settles.
        rig.advance_and_tick(secs(2) + Duration::from_millis(50));
        assert_eq!(rig.channels[0].played_paths().len(), 2);
    }

    #[test]
    fn pause_resume_reschedules_remaining_interval() {
        let mut rig = rig(1, &["a.mp3", "b.mp3"], Some(secs(300)));
        rig.engine.set_interval(0, Some(secs(30))).unwrap();
        rig.engine.select_folder(0, &rig.folder(), &[]).unwrap();

        rig.advance_and_tick(secs(10));
        rig.engine.pause(0).unwrap();
        assert_eq!(rig.engine.player(0).unwrap().state(), PlaybackState::Paused);

        // A long pause must not burn interval time.
        rig.advance_and_tick(secs(120));
        assert_eq!(rig.channels[0].played_paths().len(), 1);

        rig.engine.resume(0).unwrap();
        // 10s of the 30s interval were used; 20s remain.
        rig.advance_and_tick(secs(19));
        assert_eq!(rig.channels[0].played_paths().len(), 1);
        rig.advance_and_tick(secs(1));
        assert_eq!(rig.channels[0].played_paths().len(), 2);
    }

    #[test]
    fn play_pause_dispatches_on_state() {
        let mut rig = rig(1, &["a.mp3", "b.mp3"], Some(secs(10)));
        rig.engine.select_folder(0, &rig.folder(), &[]).unwrap();
        rig.engine.stop(0).unwrap();

        // Stopped: starts a fresh pick.
        rig.engine.play_pause(0).unwrap();
        assert_eq!(rig.engine.player(0).unwrap().state(), PlaybackState::Playing);
        assert_eq!(rig.channels[0].played_paths().len(), 2);

        // Playing: pauses.
        rig.engine.play_pause(0).unwrap();
        assert_eq!(rig.engine.player(0).unwrap().state(), PlaybackState::Paused);

        // Paused: resumes.
        rig.engine.play_pause(0).unwrap();
        assert_eq!(rig.engine.player(0).unwrap().state(), PlaybackState::Playing);
        assert_eq!(rig.channels[0].played_paths().len(), 2);
    }

    #[test]
    fn pause_resume_all_prefers_pausing() {
        let mut rig = rig(2, &["a.mp3", "b.mp3"], Some(secs(10)));
        rig.engine.select_folder(0, &rig.folder(), &[]).unwrap();
        rig.engine.select_folder(1, &rig.folder(), &[]).unwrap();
        rig.engine.pause(1).unwrap();

        // One Playing, one Paused: the group pauses.
        rig.engine.pause_resume_all();
        assert_eq!(rig.engine.player(0).unwrap().state(), PlaybackState::Paused);
        assert_eq!(rig.engine.player(1).unwrap().state(), PlaybackState::Paused);

        // None Playing: the group resumes.
        rig.engine.pause_resume_all();
        assert_eq!(rig.engine.player(0).unwrap().state(), PlaybackState::Playing);
        assert_eq!(rig.engine.player(1).unwrap().state(), PlaybackState::Playing);
    }

    #[test]
    fn stop_clear_all_forgets_everything() {
        let mut rig = rig(2, &["a.mp3", "b.mp3"], Some(secs(10)));
        rig.engine.select_folder(0, &rig.folder(), &[]).unwrap();
        rig.engine.stop_clear_all();

        for id in 0..2 {
            let player = rig.engine.player(id).unwrap();
            assert_eq!(player.state(), PlaybackState::Stopped);
            assert!(player.folder().is_none());
            assert!(player.library().is_empty());
            assert!(player.history().is_empty());
        }
    }

    #[test]
    fn shuffle_clamps_count_and_clears_the_rest() {
        let mut rig = rig(3, &["a.mp3", "b.mp3"], Some(secs(10)));
        let presets = vec![PresetFolder {
            name: "pad".into(),
            path: rig.folder(),
            color: "#112233".into(),
        }];

        // 0 is out of range: all three players load.
        rig.engine.shuffle_load_presets(0, &presets);
        for id in 0..3 {
            assert_eq!(rig.engine.player(id).unwrap().state(), PlaybackState::Playing);
        }

        rig.engine.shuffle_load_presets(1, &presets);
        assert_eq!(rig.engine.player(0).unwrap().state(), PlaybackState::Playing);
        for id in 1..3 {
            let player = rig.engine.player(id).unwrap();
            assert_eq!(player.state(), PlaybackState::Stopped);
            assert!(player.library().is_empty());
        }
    }

    #[test]
    fn shuffle_survives_a_bad_preset() {
        let mut rig = rig(2, &["a.mp3"], Some(secs(10)));
        let presets = vec![PresetFolder {
            name: "gone".into(),
            path: rig.folder().join("missing"),
            color: "#112233".into(),
        }];

        rig.engine.shuffle_load_presets(2, &presets);
        for id in 0..2 {
            assert_eq!(rig.engine.player(id).unwrap().state(), PlaybackState::Stopped);
        }
        // Failures surface as events, not panics.
        let events = rig.engine.take_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, PlayerEvent::PlayerError { .. })));
    }

    #[test]
    fn unknown_player_is_an_error() {
        let mut rig = rig(1, &["a.mp3"], Some(secs(10)));
        assert!(matches!(
            rig.engine.start(5),
            Err(PlaybackError::UnknownPlayer(5))
        ));
    }

    #[test]
    fn events_report_track_lifecycle() {
        let mut rig = rig(1, &["a.mp3", "b.mp3"], Some(secs(10)));
        rig.engine.select_folder(0, &rig.folder(), &[]).unwrap();

        let events = rig.engine.take_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, PlayerEvent::LibraryLoaded { tracks: 2, .. })));
        assert!(events
            .iter()
            .any(|e| matches!(e, PlayerEvent::TrackStarted { .. })));
        assert!(events.iter().any(|e| matches!(
            e,
            PlayerEvent::StateChanged {
                state: PlaybackState::Playing,
                ..
            }
        )));
        // Drained means drained.
        assert!(rig.engine.take_events().is_empty());
    }

    #[test]
    fn waveform_color_resolves_from_matching_preset() {
        let mut rig = rig(1, &["a.mp3"], Some(secs(10)));
        let presets = vec![PresetFolder {
            name: "pad".into(),
            path: rig.folder(),
            color: "#ABCDEF".into(),
        }];
        rig.engine.select_folder(0, &rig.folder(), &presets).unwrap();
        assert_eq!(
            rig.engine.player(0).unwrap().config().waveform_color,
            "#ABCDEF"
        );
    }
}
