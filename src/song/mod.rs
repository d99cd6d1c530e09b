// Song structure - Sections, songs and setlists
// Declarative input of the playback engine, validated before any run

pub mod library;

use crate::config::MAX_WAIT_SECONDS;
use crate::error::ConfigurationError;
use crate::sequencer::timeline::TimingConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub use library::{LibraryError, SongLibrary};

/// A contiguous run of bars sharing one timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub name: String,
    pub timing: TimingConfig,
    pub bars: u32,
}

impl Section {
    pub fn new(name: impl Into<String>, timing: TimingConfig, bars: u32) -> Self {
        Self {
            name: name.into(),
            timing,
            bars,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.bars == 0 {
            return Err(ConfigurationError::ZeroBars(self.name.clone()));
        }
        self.timing.validate()
    }
}

/// Ordered list of sections with an optional count-in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub(crate) name: String,
    pub(crate) sections: Vec<Section>,
    #[serde(default)]
    pub(crate) count_in_bars: u32,
}

impl Song {
    /// Builds a song, rejecting empty or invalid structure
    pub fn new(
        name: impl Into<String>,
        sections: Vec<Section>,
        count_in_bars: u32,
    ) -> Result<Self, ConfigurationError> {
        let song = Self {
            name: name.into(),
            sections,
            count_in_bars,
        };
        song.validate()?;
        Ok(song)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.name.trim().is_empty() {
            return Err(ConfigurationError::EmptySongName);
        }
        if self.sections.is_empty() {
            return Err(ConfigurationError::EmptySong(self.name.clone()));
        }
        self.sections.iter().try_for_each(Section::validate)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn count_in_bars(&self) -> u32 {
        self.count_in_bars
    }

    pub fn total_bars(&self) -> u64 {
        self.sections.iter().map(|s| s.bars as u64).sum()
    }
}

/// A song reference plus the pause that follows it
#[derive(Debug, Clone, PartialEq)]
pub struct SetlistEntry {
    pub song: Arc<Song>,
    pub delay_after_seconds: f64,
}

impl SetlistEntry {
    pub fn new(song: Arc<Song>, delay_after_seconds: f64) -> Self {
        Self {
            song,
            delay_after_seconds,
        }
    }

    /// Delay after this entry (0 when none), capped at `MAX_WAIT_SECONDS`
    pub fn delay_after(&self) -> Duration {
        Duration::from_secs_f64(self.delay_after_seconds.clamp(0.0, MAX_WAIT_SECONDS))
    }
}

/// Ordered songs played back to back
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Setlist {
    pub name: String,
    entries: Vec<SetlistEntry>,
}

impl Setlist {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    pub fn entries(&self) -> &[SetlistEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn add_entry(&mut self, song: Arc<Song>, delay_after_seconds: f64) {
        self.entries
            .push(SetlistEntry::new(song, delay_after_seconds));
    }

    /// Removes the entry at `index`; out-of-range indices are ignored
    pub fn remove_entry(&mut self, index: usize) -> Option<SetlistEntry> {
        (index < self.entries.len()).then(|| self.entries.remove(index))
    }

    /// Moves an entry; returns false when either index is out of range
    pub fn move_entry(&mut self, from: usize, to: usize) -> bool {
        if from >= self.entries.len() || to >= self.entries.len() {
            return false;
        }
        let entry = self.entries.remove(from);
        self.entries.insert(to, entry);
        true
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.entries.is_empty() {
            return Err(ConfigurationError::EmptySetlist(self.name.clone()));
        }
        for (index, entry) in self.entries.iter().enumerate() {
            let value = entry.delay_after_seconds;
            if !(0.0..=MAX_WAIT_SECONDS).contains(&value) {
                return Err(ConfigurationError::InvalidDelay { index, value });
            }
            entry.song.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verse() -> Section {
        Section::new("Verse", TimingConfig::new(100.0, 4, 1), 8)
    }

    fn song(name: &str) -> Arc<Song> {
        Arc::new(Song::new(name, vec![verse()], 0).unwrap())
    }

    #[test]
    fn test_song_rejects_empty_sections() {
        assert_eq!(
            Song::new("Empty", vec![], 1),
            Err(ConfigurationError::EmptySong("Empty".to_string()))
        );
    }

    #[test]
    fn test_song_rejects_zero_bar_section() {
        let bad = Section::new("Bridge", TimingConfig::default(), 0);
        assert_eq!(
            Song::new("Tune", vec![verse(), bad], 0),
            Err(ConfigurationError::ZeroBars("Bridge".to_string()))
        );
    }

    #[test]
    fn test_song_rejects_bad_timing_and_name() {
        let bad = Section::new("Fast", TimingConfig::new(300.0, 4, 1), 4);
        assert_eq!(
            Song::new("Tune", vec![bad], 0),
            Err(ConfigurationError::BpmOutOfRange(300.0))
        );
        assert_eq!(
            Song::new("  ", vec![verse()], 0),
            Err(ConfigurationError::EmptySongName)
        );
    }

    #[test]
    fn test_duplicate_section_names_allowed() {
        let song = Song::new("Tune", vec![verse(), verse()], 2).unwrap();
        assert_eq!(song.sections().len(), 2);
        assert_eq!(song.total_bars(), 16);
    }

    #[test]
    fn test_song_json_record() {
        let song = Song::new("Tune", vec![verse()], 1).unwrap();
        let json = serde_json::to_value(&song).unwrap();
        assert_eq!(json["countInBars"], 1);
        assert_eq!(json["sections"][0]["bars"], 8);
        assert_eq!(json["sections"][0]["timing"]["bpm"], 100.0);
    }

    #[test]
    fn test_setlist_editing() {
        let mut setlist = Setlist::new("Gig");
        setlist.add_entry(song("A"), 0.0);
        setlist.add_entry(song("B"), 2.0);
        setlist.add_entry(song("C"), 0.0);

        assert!(setlist.move_entry(2, 0));
        let names: Vec<&str> = setlist.entries().iter().map(|e| e.song.name()).collect();
        assert_eq!(names, vec!["C", "A", "B"]);

        assert!(!setlist.move_entry(0, 5));
        assert!(setlist.remove_entry(7).is_none());
        assert_eq!(setlist.remove_entry(0).unwrap().song.name(), "C");
        assert_eq!(setlist.len(), 2);
    }

    #[test]
    fn test_setlist_shares_songs() {
        let shared = song("Shared");
        let mut first = Setlist::new("One");
        let mut second = Setlist::new("Two");
        first.add_entry(Arc::clone(&shared), 0.0);
        second.add_entry(Arc::clone(&shared), 1.0);
        assert_eq!(Arc::strong_count(&shared), 3);
    }

    #[test]
    fn test_setlist_validation() {
        assert_eq!(
            Setlist::new("Empty").validate(),
            Err(ConfigurationError::EmptySetlist("Empty".to_string()))
        );

        let mut setlist = Setlist::new("Gig");
        setlist.add_entry(song("A"), 1.5);
        assert!(setlist.validate().is_ok());

        setlist.add_entry(song("B"), -1.0);
        assert_eq!(
            setlist.validate(),
            Err(ConfigurationError::InvalidDelay {
                index: 1,
                value: -1.0
            })
        );
    }

    #[test]
    fn test_setlist_rejects_delay_too_long_for_a_duration() {
        let mut setlist = Setlist::new("Gig");
        setlist.add_entry(song("A"), 1e20);
        setlist.add_entry(song("B"), 0.0);
        assert_eq!(
            setlist.validate(),
            Err(ConfigurationError::InvalidDelay {
                index: 0,
                value: 1e20
            })
        );

        let mut setlist = Setlist::new("Gig");
        setlist.add_entry(song("A"), MAX_WAIT_SECONDS);
        setlist.add_entry(song("B"), f64::NAN);
        assert!(matches!(
            setlist.validate(),
            Err(ConfigurationError::InvalidDelay { index: 1, .. })
        ));
    }

    #[test]
    fn test_delay_after() {
        let entry = SetlistEntry::new(song("A"), 1.5);
        assert_eq!(entry.delay_after(), Duration::from_millis(1500));

        // Unvalidated entries never panic
        let huge = SetlistEntry::new(song("A"), 1e20);
        assert_eq!(huge.delay_after(), Duration::from_secs(86_400));
        let negative = SetlistEntry::new(song("A"), -3.0);
        assert_eq!(negative.delay_after(), Duration::ZERO);
    }
}
