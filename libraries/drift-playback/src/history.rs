//! Playback history tracking
//!
//! Maintains a bounded recency buffer of played tracks. The selector uses
//! it to avoid immediate repeats; "previous" pops from it.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// Bounded FIFO of recently played track paths
///
/// Oldest entries are evicted when the buffer is full. The buffer only
/// biases selection; it never blocks playback (see the selector's
/// exhaustion fallback).
#[derive(Debug, Clone)]
pub struct TrackHistory {
    /// History buffer (most recent = back)
    tracks: VecDeque<PathBuf>,

    /// Maximum history size
    max_size: usize,
}

impl TrackHistory {
    /// Create new history with specified maximum size
    pub fn new(max_size: usize) -> Self {
        Self {
            tracks: VecDeque::with_capacity(max_size),
            max_size,
        }
    }

    /// Add a path to history, evicting the oldest entry when full
    ///
    /// A path equal to the most recent entry is skipped, so a track that
    /// repeats (exhaustion fallback) does not pad the buffer.
    pub fn push(&mut self, path: PathBuf) {
        if self.tracks.back() == Some(&path) {
            return;
        }
        if self.tracks.len() >= self.max_size {
            self.tracks.pop_front();
        }
        self.tracks.push_back(path);
    }

    /// Pop the most recent path, for "previous"
    pub fn pop(&mut self) -> Option<PathBuf> {
        self.tracks.pop_back()
    }

    /// Check whether a path is currently in the buffer
    pub fn contains(&self, path: &Path) -> bool {
        self.tracks.iter().any(|p| p == path)
    }

    /// Number of paths in history
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Check if history is empty
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Clear all history (on folder change, not on stop)
    pub fn clear(&mut self) {
        self.tracks.clear();
    }

    /// All paths, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.tracks.iter()
    }
}

impl Default for TrackHistory {
    fn default() -> Self {
        Self::new(crate::types::DEFAULT_HISTORY_SIZE)
    }
}
