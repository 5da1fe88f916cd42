//! Drift Player - Storage
//!
//! Preset and configuration persistence for Drift Player.
//!
//! This crate provides:
//! - A name-keyed preset store (folder + waveform color) saved as one
//!   JSON file, with transparent migration of the legacy bare-string
//!   format
//! - App configuration load/save with degrade-to-defaults semantics
//! - Platform user-data paths (`%LOCALAPPDATA%`, `~/Library/Application
//!   Support`, `~/.config`)
//!
//! Nothing in here is ever fatal to playback: unreadable or corrupt
//! files load as empty/defaults with a logged warning, and only explicit
//! saves report errors to the caller.

pub mod config;
pub mod error;
pub mod paths;
pub mod presets;

pub use config::AppConfig;
pub use error::{Result, StorageError};
pub use paths::{config_file, data_dir, ensure_data_dir, presets_file, APP_DIR_NAME};
pub use presets::{Preset, PresetStore};
