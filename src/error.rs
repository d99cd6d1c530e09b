// Error types shared across the engine

use crate::config::{MAX_BPM, MIN_BPM};

/// Invalid timing or song structure, detected before any run starts
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("BPM {0} is outside the supported range 20-250")]
    BpmOutOfRange(f64),

    #[error("Beats per bar must be > 0")]
    InvalidBeatsPerBar,

    #[error("Subdivisions per beat must be > 0")]
    InvalidSubdivisions,

    #[error("Swing requires exactly 2 subdivisions per beat (got {0})")]
    SwingRequiresTwoSubdivisions(u32),

    #[error("Section '{0}' must have at least one bar")]
    ZeroBars(String),

    #[error("Song '{0}' has no sections")]
    EmptySong(String),

    #[error("Song name cannot be empty")]
    EmptySongName,

    #[error("Setlist '{0}' has no entries")]
    EmptySetlist(String),

    #[error("Delay after entry {index} must be between 0 and 86400 seconds (got {value})")]
    InvalidDelay { index: usize, value: f64 },

    #[error("Invalid tempo ramp: {0}")]
    InvalidRamp(String),

    #[error("Auto-stop must be between 0 and 86400 seconds (got {0})")]
    InvalidAutoStop(f64),
}

/// Errors returned by `PlaybackController::start`
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("Failed to spawn the clock thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Clock thread exited before it reported ready")]
    LoopNotStarted,
}

/// Checks that a BPM value is inside the device range
pub fn validate_bpm(bpm: f64) -> Result<(), ConfigurationError> {
    if !bpm.is_finite() || !(MIN_BPM..=MAX_BPM).contains(&bpm) {
        return Err(ConfigurationError::BpmOutOfRange(bpm));
    }
    Ok(())
}
