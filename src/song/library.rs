// Song library - Saves and loads songs and setlists as JSON records
// Songs live in `<dir>/<name>.json`, setlists in `<dir>/setlists/<name>.json`

use super::{Setlist, Song};
use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const SETLISTS_DIR: &str = "setlists";
const EXTENSION: &str = "json";

/// Library error types
#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("Song '{0}' not found in library")]
    SongNotFound(String),

    #[error("Invalid library name: {0}")]
    InvalidName(String),
}

/// Setlist entry as stored on disk: songs are referenced by name
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetlistEntryRecord {
    song_name: String,
    #[serde(default)]
    delay_after_seconds: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SetlistRecord {
    name: String,
    entries: Vec<SetlistEntryRecord>,
}

/// Directory-backed song and setlist storage
#[derive(Debug, Clone)]
pub struct SongLibrary {
    root: PathBuf,
}

impl SongLibrary {
    /// Opens (and creates if needed) a library rooted at `dir`
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, LibraryError> {
        let root = dir.as_ref().to_path_buf();
        fs::create_dir_all(root.join(SETLISTS_DIR))?;
        Ok(Self { root })
    }

    /// Platform data directory used when no library path is given
    pub fn default_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("practice-metronome")
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn save_song(&self, song: &Song) -> Result<PathBuf, LibraryError> {
        song.validate()?;
        let path = self.song_path(song.name())?;
        fs::write(&path, serde_json::to_string_pretty(song)?)?;
        log::debug!("Saved song '{}' to {:?}", song.name(), path);
        Ok(path)
    }

    pub fn load_song(&self, name: &str) -> Result<Song, LibraryError> {
        let path = self.song_path(name)?;
        if !path.exists() {
            return Err(LibraryError::SongNotFound(name.to_string()));
        }
        let song: Song = serde_json::from_str(&fs::read_to_string(&path)?)?;
        song.validate()?;
        Ok(song)
    }

    /// Names of all stored songs, sorted
    pub fn list_songs(&self) -> Result<Vec<String>, LibraryError> {
        list_names(&self.root)
    }

    pub fn save_setlist(&self, setlist: &Setlist) -> Result<PathBuf, LibraryError> {
        let record = SetlistRecord {
            name: setlist.name.clone(),
            entries: setlist
                .entries()
                .iter()
                .map(|entry| SetlistEntryRecord {
                    song_name: entry.song.name().to_string(),
                    delay_after_seconds: entry.delay_after_seconds,
                })
                .collect(),
        };
        let path = self.setlist_path(&setlist.name)?;
        fs::write(&path, serde_json::to_string_pretty(&record)?)?;
        log::debug!("Saved setlist '{}' to {:?}", setlist.name, path);
        Ok(path)
    }

    /// Loads a setlist, resolving its songs through the library.
    /// A song used several times is loaded once and shared.
    pub fn load_setlist(&self, name: &str) -> Result<Setlist, LibraryError> {
        let path = self.setlist_path(name)?;
        let record: SetlistRecord = serde_json::from_str(&fs::read_to_string(&path)?)?;

        let mut songs: HashMap<String, Arc<Song>> = HashMap::new();
        let mut setlist = Setlist::new(record.name);
        for entry in record.entries {
            let song = match songs.get(&entry.song_name) {
                Some(song) => Arc::clone(song),
                None => {
                    let song = Arc::new(self.load_song(&entry.song_name)?);
                    songs.insert(entry.song_name.clone(), Arc::clone(&song));
                    song
                }
            };
            setlist.add_entry(song, entry.delay_after_seconds);
        }
        Ok(setlist)
    }

    pub fn list_setlists(&self) -> Result<Vec<String>, LibraryError> {
        list_names(&self.root.join(SETLISTS_DIR))
    }

    fn song_path(&self, name: &str) -> Result<PathBuf, LibraryError> {
        Ok(self.root.join(file_name(name)?))
    }

    fn setlist_path(&self, name: &str) -> Result<PathBuf, LibraryError> {
        Ok(self.root.join(SETLISTS_DIR).join(file_name(name)?))
    }
}

/// `<name>.json`, rejecting names that would escape the library directory
fn file_name(name: &str) -> Result<String, LibraryError> {
    let name = name.strip_suffix(".json").unwrap_or(name);
    if name.trim().is_empty() || name.contains(['/', '\\']) || name == ".." {
        return Err(LibraryError::InvalidName(name.to_string()));
    }
    Ok(format!("{}.{}", name, EXTENSION))
}

fn list_names(dir: &Path) -> Result<Vec<String>, LibraryError> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == EXTENSION) {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}
