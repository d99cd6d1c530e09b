// Engine configuration - tempo limits, defaults and runtime knobs
// Constants describe the device; EngineConfig holds the tunable parts and can be
// loaded from RON.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Lowest tempo the device supports
pub const MIN_BPM: f64 = 20.0;
/// Highest tempo the device supports
pub const MAX_BPM: f64 = 250.0;

pub const DEFAULT_BPM: f64 = 120.0;
pub const DEFAULT_BEATS_PER_BAR: u32 = 4;
pub const DEFAULT_SUBDIVISIONS: u32 = 1;
pub const DEFAULT_COUNT_IN_BARS: u32 = 2;

/// Default ramp step (BPM) and interval (bars)
pub const DEFAULT_TEMPO_CHANGE_STEP: f64 = 5.0;
pub const DEFAULT_TEMPO_CHANGE_INTERVAL: u32 = 4;

/// Longest inter-song delay or auto-stop timer accepted (one day)
pub const MAX_WAIT_SECONDS: f64 = 86_400.0;

/// Taps further apart than this start a new tap-tempo measurement
pub const TAP_RESET_WINDOW: Duration = Duration::from_secs(2);

/// Configuration errors for the engine config file
#[derive(Debug, thiserror::Error)]
pub enum EngineConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("Invalid engine configuration: {0}")]
    Invalid(String),
}

/// Runtime knobs for the playback engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Wake-up lateness tolerated before a timing degradation is reported
    pub timing_tolerance_ms: u64,
    /// Capacity of the notification ring buffer
    pub notification_capacity: usize,
    /// Count-in bars used by basic mode when the caller does not pick one
    pub count_in_bars: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timing_tolerance_ms: 5,
            notification_capacity: 256,
            count_in_bars: DEFAULT_COUNT_IN_BARS,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from RON text. Missing fields take their defaults.
    pub fn from_ron_str(text: &str) -> Result<Self, EngineConfigError> {
        let config: Self = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, EngineConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron_str(&text)
    }

    pub fn validate(&self) -> Result<(), EngineConfigError> {
        if self.notification_capacity == 0 {
            return Err(EngineConfigError::Invalid(
                "Notification capacity must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Lateness tolerance as a duration
    pub fn timing_tolerance(&self) -> Duration {
        Duration::from_millis(self.timing_tolerance_ms)
    }
}
