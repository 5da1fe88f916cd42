//! Folder scanning
//!
//! A player's library is the set of playable audio files directly inside
//! one folder. Scans are non-recursive and deterministic (sorted by path)
//! so two scans of an unchanged folder always agree.

use std::path::{Path, PathBuf};

use crate::error::Result;

/// File extensions recognized as playable audio (case-insensitive)
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "flac", "aif", "aiff"];

/// Whether `path` names a file this engine will attempt to play
pub fn is_audio_file(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    AUDIO_EXTENSIONS
        .iter()
        .any(|candidate| ext.eq_ignore_ascii_case(candidate))
}

/// Scan `folder` for playable files
///
/// Skips subdirectories and hidden files (leading dot). The result is
/// sorted by path; it may be empty, which callers surface as
/// [`PlaybackError::EmptyLibrary`](crate::error::PlaybackError::EmptyLibrary)
/// when they try to play from it.
pub fn scan_folder(folder: &Path) -> Result<Vec<PathBuf>> {
    let mut tracks = Vec::new();
    for entry in std::fs::read_dir(folder)? {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type()?.is_file() {
            continue;
        }
        let hidden = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('.'));
        if hidden || !is_audio_file(&path) {
            continue;
        }
        tracks.push(path);
    }
    tracks.sort();
    Ok(tracks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn touch(dir: &Path, name: &str) {
        File::create(dir.join(name)).unwrap();
    }

    #[test]
    fn recognizes_supported_extensions() {
        assert!(is_audio_file(Path::new("a.mp3")));
        assert!(is_audio_file(Path::new("b.FLAC")));
        assert!(is_audio_file(Path::new("c.Aiff")));
        assert!(!is_audio_file(Path::new("d.txt")));
        assert!(!is_audio_file(Path::new("noext")));
    }

    #[test]
    fn scan_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b.mp3");
        touch(dir.path(), "a.wav");
        touch(dir.path(), "notes.txt");
        touch(dir.path(), ".hidden.mp3");
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        touch(&dir.path().join("sub"), "nested.mp3");

        let tracks = scan_folder(dir.path()).unwrap();
        let names: Vec<_> = tracks
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_owned())
            .collect();
        assert_eq!(names, vec!["a.wav", "b.mp3"]);
    }

    #[test]
    fn scan_of_empty_folder_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(scan_folder(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn scan_of_missing_folder_errors() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("missing");
        assert!(scan_folder(&gone).is_err());
    }
}
