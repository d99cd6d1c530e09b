// Practice Metronome - Library exports for the CLI and integration tests

pub mod config;
pub mod error;
pub mod messaging;
pub mod sequencer;
pub mod song;
pub mod tap;
pub mod transport;

// Re-export commonly used types for convenience
pub use config::{EngineConfig, EngineConfigError, MAX_BPM, MIN_BPM};
pub use error::{ConfigurationError, PlaybackError};
pub use messaging::{
    ConcurrencyMisuse, Notification, NotificationConsumer, NotificationKind, NotificationLevel,
};
pub use sequencer::{
    ClickType, PlaybackPhase, PlaybackPosition, PlaybackTarget, Schedule, Step, TempoRampConfig,
    TimingConfig,
};
pub use song::{LibraryError, Section, Setlist, SetlistEntry, Song, SongLibrary};
pub use tap::TapTempo;
pub use transport::{
    BeatEvent, BeatSink, PlaybackController, PlaybackOptions, PlaybackState, StopReason,
};
