//! App configuration persistence

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;

/// User-level settings that survive restarts
///
/// Unknown fields in the file are ignored, missing fields take defaults,
/// so the format can grow without migrations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Preferred recording device, `None` for the system default
    pub recording_device_name: Option<String>,
}

impl AppConfig {
    /// Load from `file`, degrading to defaults when unreadable
    pub fn load(file: &Path) -> Self {
        let data = match std::fs::read_to_string(file) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(err) => {
                warn!(file = %file.display(), %err, "cannot read config, using defaults");
                return Self::default();
            }
        };
        match serde_json::from_str(&data) {
            Ok(config) => config,
            Err(err) => {
                warn!(file = %file.display(), %err, "corrupt config, using defaults");
                Self::default()
            }
        }
    }

    /// Write to `file`, creating parent directories as needed
    pub fn save(&self, file: &Path) -> Result<()> {
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(file, data)?;
        Ok(())
    }
}
