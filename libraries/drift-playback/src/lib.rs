//! Drift Player - Playback Engine
//!
//! Platform-agnostic multi-channel randomized playback for Drift Player.
//!
//! This crate provides:
//! - N independent players, each cycling one folder in random
//!   non-repeating order (bounded history window)
//! - Per-player volume and constant-power pan, crossfade, looping
//! - Scheduled transitions: fade-out timers, user intervals, or the
//!   channel's end notification, at most one armed per player
//! - Pause/resume with exact effective-time accounting and rescheduling
//! - Group operations across the player pool, including randomized
//!   preset loading
//!
//! # Architecture
//!
//! `drift-playback` is completely platform-agnostic:
//! - No audio device access; output goes through the [`AudioChannel`] trait
//! - No decoding; tracks arrive through the [`TrackLoader`] trait
//! - No threads and no sleeping; the host drives [`Engine::tick`] against
//!   a [`Clock`]
//!
//! Tests run the whole engine on a manual clock with mock channels, so
//! every timing path is deterministic.
//!
//! # Example
//!
//! ```rust,no_run
//! use drift_playback::{Engine, EngineConfig, MockChannel, StubLoader, SystemClock};
//! use std::path::Path;
//! use std::time::Duration;
//!
//! let mut engine = Engine::new(
//!     EngineConfig::default(),
//!     Box::new(SystemClock),
//!     Box::new(StubLoader::new(Some(Duration::from_secs(180)))),
//!     |_id| Box::new(MockChannel::new()),
//! );
//!
//! engine.select_folder(0, Path::new("/music/pads"), &[])?;
//! engine.set_volume(0, 60)?;
//! engine.set_fade(0, Duration::from_secs(2))?;
//!
//! for _ in 0..10 {
//!     engine.tick();
//!     for event in engine.take_events() {
//!         println!("{event:?}");
//!     }
//!     std::thread::sleep(Duration::from_millis(100));
//! }
//! # Ok::<(), drift_playback::PlaybackError>(())
//! ```

pub mod channel;
pub mod clock;
pub mod engine;
pub mod error;
pub mod events;
pub mod history;
pub mod library;
pub mod loader;
pub mod mixer;
pub mod player;
pub mod scheduler;
pub mod selector;
pub mod timeline;
pub mod transition;
pub mod types;

pub use channel::{AudioChannel, MockChannel};
pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::Engine;
pub use error::{PlaybackError, Result};
pub use events::PlayerEvent;
pub use history::TrackHistory;
pub use library::{is_audio_file, scan_folder, AUDIO_EXTENSIONS};
pub use loader::{StubLoader, TrackLoader};
pub use mixer::{channel_gains, ChannelGain};
pub use player::Player;
pub use scheduler::{Scheduler, TimerAction, TimerId};
pub use selector::select_next;
pub use timeline::Timeline;
pub use transition::{plan_transition, TransitionPlan, FADE_SETTLE};
pub use types::{
    EngineConfig, LoadedTrack, PcmBuffer, PlaybackState, PlayerConfig, PlayerId, PresetFolder,
};
