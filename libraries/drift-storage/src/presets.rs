//! Preset persistence
//!
//! A preset names a folder and carries a waveform color tag. The store
//! is one JSON object mapping name to record. Older files wrote entries
//! as bare path strings; loading migrates those to the full record with
//! the default color, and any malformed color is replaced rather than
//! propagated.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use drift_playback::types::DEFAULT_WAVEFORM_COLOR;
use drift_playback::PresetFolder;

use crate::error::{Result, StorageError};

/// One saved folder preset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    /// Folder the preset points at
    pub path: PathBuf,

    /// Waveform color tag (`#RRGGBB`)
    pub color: String,
}

/// On-disk entry: either the full record, or a legacy bare path string
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PresetRecord {
    Full { path: PathBuf, color: String },
    Legacy(PathBuf),
}

impl PresetRecord {
    /// Lift any on-disk shape into the current record
    fn migrate(self) -> Preset {
        match self {
            Self::Full { path, color } => Preset {
                color: sanitize_color(&color),
                path,
            },
            Self::Legacy(path) => Preset {
                path,
                color: DEFAULT_WAVEFORM_COLOR.to_string(),
            },
        }
    }
}

/// `#RRGGBB` or bust
fn is_valid_color(color: &str) -> bool {
    let Some(hex) = color.strip_prefix('#') else {
        return false;
    };
    hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit())
}

fn sanitize_color(color: &str) -> String {
    if is_valid_color(color) {
        color.to_string()
    } else {
        warn!(color, "invalid preset color replaced with default");
        DEFAULT_WAVEFORM_COLOR.to_string()
    }
}

/// Name-keyed preset collection bound to one JSON file
#[derive(Debug, Clone)]
pub struct PresetStore {
    presets: BTreeMap<String, Preset>,
    file: PathBuf,
}

impl PresetStore {
    /// Empty store bound to `file`
    pub fn new(file: PathBuf) -> Self {
        Self {
            presets: BTreeMap::new(),
            file,
        }
    }

    /// Load from `file`, migrating legacy entries
    ///
    /// A missing or unreadable file degrades to an empty store; presets
    /// are never the reason the app fails to start.
    pub fn load(file: PathBuf) -> Self {
        let mut store = Self::new(file);
        let data = match std::fs::read_to_string(&store.file) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return store,
            Err(err) => {
                warn!(file = %store.file.display(), %err, "cannot read presets, starting empty");
                return store;
            }
        };
        let records: BTreeMap<String, PresetRecord> = match serde_json::from_str(&data) {
            Ok(records) => records,
            Err(err) => {
                warn!(file = %store.file.display(), %err, "corrupt presets, starting empty");
                return store;
            }
        };
        store.presets = records
            .into_iter()
            .map(|(name, record)| (name, record.migrate()))
            .collect();
        info!(
            file = %store.file.display(),
            presets = store.presets.len(),
            "presets loaded"
        );
        store
    }

    /// Write the full-record form back to the bound file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(&self.presets)?;
        std::fs::write(&self.file, data)?;
        Ok(())
    }

    /// Add a new preset after validating name, folder, and color
    pub fn add(&mut self, name: &str, path: &Path, color: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StorageError::InvalidName("empty name".to_string()));
        }
        if self.presets.contains_key(name) {
            return Err(StorageError::InvalidName(format!("{name} already exists")));
        }
        if !path.is_dir() {
            return Err(StorageError::InvalidFolder(path.display().to_string()));
        }
        if !is_valid_color(color) {
            return Err(StorageError::InvalidColor(color.to_string()));
        }
        self.presets.insert(
            name.to_string(),
            Preset {
                path: path.to_path_buf(),
                color: color.to_string(),
            },
        );
        Ok(())
    }

    /// Rename a preset, keeping its record
    pub fn rename(&mut self, from: &str, to: &str) -> Result<()> {
        let to = to.trim();
        if to.is_empty() {
            return Err(StorageError::InvalidName("empty name".to_string()));
        }
        if self.presets.contains_key(to) {
            return Err(StorageError::InvalidName(format!("{to} already exists")));
        }
        let preset = self
            .presets
            .remove(from)
            .ok_or_else(|| StorageError::UnknownPreset(from.to_string()))?;
        self.presets.insert(to.to_string(), preset);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<()> {
        self.presets
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StorageError::UnknownPreset(name.to_string()))
    }

    /// Change one preset's color tag
    pub fn set_color(&mut self, name: &str, color: &str) -> Result<()> {
        if !is_valid_color(color) {
            return Err(StorageError::InvalidColor(color.to_string()));
        }
        let preset = self
            .presets
            .get_mut(name)
            .ok_or_else(|| StorageError::UnknownPreset(name.to_string()))?;
        preset.color = color.to_string();
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Preset> {
        self.presets.get(name)
    }

    /// First preset pointing at `path`, for waveform color resolution
    pub fn find_by_path(&self, path: &Path) -> Option<(&str, &Preset)> {
        self.presets
            .iter()
            .find(|(_, preset)| preset.path == path)
            .map(|(name, preset)| (name.as_str(), preset))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Preset)> {
        self.presets
            .iter()
            .map(|(name, preset)| (name.as_str(), preset))
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    /// Resolved view the playback engine consumes
    pub fn folders(&self) -> Vec<PresetFolder> {
        self.presets
            .iter()
            .map(|(name, preset)| PresetFolder {
                name: name.clone(),
                path: preset.path.clone(),
                color: preset.color.clone(),
            })
            .collect()
    }
}
