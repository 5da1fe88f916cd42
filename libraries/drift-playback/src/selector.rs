//! Random track selection
//!
//! Uniform pick over the library minus the recency buffer, with a
//! full-library fallback once everything has cycled through history.

use crate::history::TrackHistory;
use rand::seq::SliceRandom;
use rand::Rng;
use std::path::PathBuf;

/// Pick the next track at random
///
/// Candidates are library entries not present in `history`; when that set
/// is empty (library smaller than the history window, or fully cycled),
/// the pick falls back to the whole library so playback never stalls.
/// Returns `None` only for an empty library.
pub fn select_next<R: Rng + ?Sized>(
    library: &[PathBuf],
    history: &TrackHistory,
    rng: &mut R,
) -> Option<PathBuf> {
    if library.is_empty() {
        return None;
    }

    let fresh: Vec<&PathBuf> = library.iter().filter(|p| !history.contains(p)).collect();
    if let Some(pick) = fresh.choose(rng) {
        return Some((**pick).clone());
    }

    // Exhaustion fallback: repeats become possible once every track has
    // passed through the history window.
    library.choose(rng).cloned()
}
