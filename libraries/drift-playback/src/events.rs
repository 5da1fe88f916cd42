//! Engine events
//!
//! Players record what happened; the embedding UI drains the buffer via
//! [`Engine::take_events`](crate::engine::Engine::take_events) and reacts.
//! Serde-serializable so hosts can forward them over IPC verbatim.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::types::{PlaybackState, PlayerId};

/// Something observable happened on a player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlayerEvent {
    /// The player moved between Stopped/Playing/Paused
    StateChanged {
        player: PlayerId,
        state: PlaybackState,
    },

    /// A new track began playing
    TrackStarted {
        player: PlayerId,
        path: PathBuf,
        duration: Option<Duration>,
    },

    /// The current track ended or was replaced
    TrackFinished { player: PlayerId, path: PathBuf },

    /// The fade-out ramp toward the next track began
    FadeOutStarted { player: PlayerId },

    /// A folder was scanned into the player's library
    LibraryLoaded { player: PlayerId, tracks: usize },

    /// A per-player failure; other players are unaffected
    PlayerError { player: PlayerId, message: String },
}
