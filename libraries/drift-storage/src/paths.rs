//! Platform user-data locations
//!
//! Windows keeps app data in `%LOCALAPPDATA%`, macOS in
//! `~/Library/Application Support`, everything else in `~/.config`.
//! All files live in one `DriftPlayer` directory, created on demand.

use std::io;
use std::path::PathBuf;

/// Directory name under the platform data root
pub const APP_DIR_NAME: &str = "DriftPlayer";

/// Platform data directory for this app, without creating it
pub fn data_dir() -> PathBuf {
    platform_root()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

#[cfg(target_os = "windows")]
fn platform_root() -> Option<PathBuf> {
    dirs::data_local_dir()
        .or_else(dirs::data_dir)
        .or_else(dirs::config_dir)
}

#[cfg(target_os = "macos")]
fn platform_root() -> Option<PathBuf> {
    dirs::data_dir()
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn platform_root() -> Option<PathBuf> {
    dirs::config_dir()
}

/// Data directory, created if missing
pub fn ensure_data_dir() -> io::Result<PathBuf> {
    let dir = data_dir();
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Default location of the preset store
pub fn presets_file() -> PathBuf {
    data_dir().join("presets.json")
}

/// Default location of the app configuration
pub fn config_file() -> PathBuf {
    data_dir().join("config.json")
}
