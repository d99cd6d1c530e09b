// Integration test for the song library
// Tests the complete save/load cycle of songs and setlists on disk

use practice_metronome::{
    ConfigurationError, LibraryError, PlaybackTarget, Schedule, Section, Setlist, Song,
    SongLibrary, TempoRampConfig, TimingConfig,
};
use std::fs;
use std::sync::Arc;

fn practice_song(name: &str) -> Song {
    Song::new(
        name,
        vec![
            Section::new("Intro", TimingConfig::new(90.0, 4, 1), 2),
            Section::new("Groove", TimingConfig::new(96.0, 4, 2).with_swing(true), 8),
            Section::new("Outro", TimingConfig::new(90.0, 3, 1), 1),
        ],
        1,
    )
    .unwrap()
}

#[test]
fn test_song_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let library = SongLibrary::open(dir.path()).unwrap();

    let song = practice_song("Shuffle");
    let path = library.save_song(&song).unwrap();
    assert!(path.ends_with("Shuffle.json"));

    // Records use camelCase keys
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("\"countInBars\""));
    assert!(text.contains("\"swingEnabled\""));

    let loaded = library.load_song("Shuffle").unwrap();
    assert_eq!(loaded, song);
    assert_eq!(library.list_songs().unwrap(), vec!["Shuffle".to_string()]);

    // A loaded song is directly playable
    assert!(Schedule::new(PlaybackTarget::Song(Arc::new(loaded)), TempoRampConfig::default()).is_ok());
}

#[test]
fn test_setlist_round_trip_shares_songs() {
    let dir = tempfile::tempdir().unwrap();
    let library = SongLibrary::open(dir.path()).unwrap();

    let warmup = Arc::new(practice_song("Warmup"));
    let tune = Arc::new(practice_song("Tune"));
    library.save_song(&warmup).unwrap();
    library.save_song(&tune).unwrap();

    let mut setlist = Setlist::new("Rehearsal");
    setlist.add_entry(warmup.clone(), 2.0);
    setlist.add_entry(tune, 0.0);
    setlist.add_entry(warmup, 0.0);
    library.save_setlist(&setlist).unwrap();

    let loaded = library.load_setlist("Rehearsal").unwrap();
    assert_eq!(loaded.name, "Rehearsal");
    assert_eq!(loaded.len(), 3);
    assert_eq!(loaded.entries()[0].delay_after_seconds, 2.0);
    assert_eq!(loaded.entries()[1].song.name(), "Tune");
    assert!(Arc::ptr_eq(&loaded.entries()[0].song, &loaded.entries()[2].song));
    assert_eq!(library.list_setlists().unwrap(), vec!["Rehearsal".to_string()]);
    // Setlists do not show up as songs
    assert_eq!(
        library.list_songs().unwrap(),
        vec!["Tune".to_string(), "Warmup".to_string()]
    );
}

#[test]
fn test_setlist_with_missing_song() {
    let dir = tempfile::tempdir().unwrap();
    let library = SongLibrary::open(dir.path()).unwrap();

    let mut setlist = Setlist::new("Broken");
    setlist.add_entry(Arc::new(practice_song("Ghost")), 0.0);
    library.save_setlist(&setlist).unwrap();

    assert!(matches!(
        library.load_setlist("Broken"),
        Err(LibraryError::SongNotFound(name)) if name == "Ghost"
    ));
}

#[test]
fn test_invalid_song_on_disk_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let library = SongLibrary::open(dir.path()).unwrap();

    let record = r#"{
        "name": "Fast",
        "sections": [
            { "name": "A", "timing": { "bpm": 400.0, "beatsPerBar": 4, "subdivisionsPerBeat": 1 }, "bars": 4 }
        ]
    }"#;
    fs::write(dir.path().join("Fast.json"), record).unwrap();

    assert!(matches!(
        library.load_song("Fast"),
        Err(LibraryError::Configuration(ConfigurationError::BpmOutOfRange(bpm))) if bpm == 400.0
    ));
}
