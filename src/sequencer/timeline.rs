// Timeline - Timing configuration and the tempo clock
// Converts BPM, subdivisions and swing into wall-clock tick intervals

use crate::config::{DEFAULT_BEATS_PER_BAR, DEFAULT_BPM, DEFAULT_SUBDIVISIONS};
use crate::error::{ConfigurationError, validate_bpm};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Tempo, meter and subdivision settings for one stretch of playback
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingConfig {
    pub bpm: f64,
    pub beats_per_bar: u32,
    pub subdivisions_per_beat: u32,
    #[serde(default)]
    pub swing_enabled: bool,
}

impl TimingConfig {
    /// Creates a straight (non-swing) timing
    pub fn new(bpm: f64, beats_per_bar: u32, subdivisions_per_beat: u32) -> Self {
        Self {
            bpm,
            beats_per_bar,
            subdivisions_per_beat,
            swing_enabled: false,
        }
    }

    /// Enables or disables swing. Enabling forces two subdivisions per beat.
    pub fn with_swing(mut self, enabled: bool) -> Self {
        self.set_swing(enabled);
        self
    }

    pub fn set_swing(&mut self, enabled: bool) {
        self.swing_enabled = enabled;
        if enabled {
            self.subdivisions_per_beat = 2;
        }
    }

    pub fn with_bpm(mut self, bpm: f64) -> Self {
        self.bpm = bpm;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        validate_bpm(self.bpm)?;
        if self.beats_per_bar == 0 {
            return Err(ConfigurationError::InvalidBeatsPerBar);
        }
        if self.subdivisions_per_beat == 0 {
            return Err(ConfigurationError::InvalidSubdivisions);
        }
        if self.swing_enabled && self.subdivisions_per_beat != 2 {
            return Err(ConfigurationError::SwingRequiresTwoSubdivisions(
                self.subdivisions_per_beat,
            ));
        }
        Ok(())
    }

    /// Duration of one beat in seconds
    pub fn beat_duration_seconds(&self) -> f64 {
        60.0 / self.bpm
    }

    /// Ticks per bar (beats times subdivisions)
    pub fn ticks_per_bar(&self) -> u32 {
        self.beats_per_bar * self.subdivisions_per_beat
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BPM, DEFAULT_BEATS_PER_BAR, DEFAULT_SUBDIVISIONS)
    }
}

impl fmt::Display for TimingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1} BPM, {} beats x {}",
            self.bpm, self.beats_per_bar, self.subdivisions_per_beat
        )?;
        if self.swing_enabled {
            write!(f, " (swing)")?;
        }
        Ok(())
    }
}

/// Interval in seconds between the tick at `subdivision_index` and the next one.
///
/// Straight timing splits the beat evenly. Swing (two subdivisions) gives the
/// first subdivision 2/3 of the beat and the second 1/3.
///
/// # Panics
/// If `bpm` is not a positive finite number or `subdivisions_per_beat` is 0.
pub fn interval_seconds(timing: &TimingConfig, subdivision_index: u32) -> f64 {
    assert!(
        timing.bpm.is_finite() && timing.bpm > 0.0,
        "BPM must be positive"
    );
    assert!(
        timing.subdivisions_per_beat > 0,
        "Subdivisions per beat must be > 0"
    );

    if timing.swing_enabled && timing.subdivisions_per_beat == 2 {
        let beat = timing.beat_duration_seconds();
        if subdivision_index % 2 == 0 {
            beat * 2.0 / 3.0
        } else {
            beat / 3.0
        }
    } else {
        60.0 / timing.bpm / timing.subdivisions_per_beat as f64
    }
}

/// Same as [`interval_seconds`], as a `Duration`
pub fn next_interval(timing: &TimingConfig, subdivision_index: u32) -> Duration {
    Duration::from_secs_f64(interval_seconds(timing, subdivision_index))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_straight_interval_is_exact() {
        for bpm in 20..=250 {
            for subdivisions in 1..=8 {
                let timing = TimingConfig::new(bpm as f64, 4, subdivisions);
                let expected = 60.0 / bpm as f64 / subdivisions as f64;
                for sub in 0..subdivisions {
                    assert_eq!(interval_seconds(&timing, sub), expected);
                }
            }
        }
    }

    #[test]
    fn test_swing_intervals_at_120() {
        let timing = TimingConfig::new(120.0, 4, 1).with_swing(true);
        assert_eq!(timing.subdivisions_per_beat, 2);

        let long = interval_seconds(&timing, 0);
        let short = interval_seconds(&timing, 1);
        assert!((long - 1.0 / 3.0).abs() < 1e-12);
        assert!((short - 1.0 / 6.0).abs() < 1e-12);
        assert!((long + short - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_swing_disabled_keeps_subdivisions() {
        let timing = TimingConfig::new(90.0, 3, 4).with_swing(true).with_swing(false);
        assert_eq!(timing.subdivisions_per_beat, 2);
        assert!(!timing.swing_enabled);
        assert_eq!(interval_seconds(&timing, 0), interval_seconds(&timing, 1));
    }

    #[test]
    fn test_next_interval_duration() {
        let timing = TimingConfig::new(120.0, 4, 1);
        assert_eq!(next_interval(&timing, 0), Duration::from_millis(500));
    }

    #[test]
    #[should_panic(expected = "BPM must be positive")]
    fn test_zero_bpm_panics() {
        let timing = TimingConfig::new(0.0, 4, 1);
        interval_seconds(&timing, 0);
    }

    #[test]
    #[should_panic(expected = "Subdivisions per beat must be > 0")]
    fn test_zero_subdivisions_panics() {
        let timing = TimingConfig::new(120.0, 4, 0);
        interval_seconds(&timing, 0);
    }

    #[test]
    fn test_validate() {
        assert!(TimingConfig::default().validate().is_ok());
        assert_eq!(
            TimingConfig::new(10.0, 4, 1).validate(),
            Err(ConfigurationError::BpmOutOfRange(10.0))
        );
        assert_eq!(
            TimingConfig::new(120.0, 0, 1).validate(),
            Err(ConfigurationError::InvalidBeatsPerBar)
        );
        assert_eq!(
            TimingConfig::new(120.0, 4, 0).validate(),
            Err(ConfigurationError::InvalidSubdivisions)
        );

        let mut timing = TimingConfig::new(120.0, 4, 3);
        timing.swing_enabled = true;
        assert_eq!(
            timing.validate(),
            Err(ConfigurationError::SwingRequiresTwoSubdivisions(3))
        );
    }

    #[test]
    fn test_serde_field_names() {
        let timing = TimingConfig::new(100.0, 3, 2).with_swing(true);
        let json = serde_json::to_value(timing).unwrap();
        assert_eq!(json["beatsPerBar"], 3);
        assert_eq!(json["subdivisionsPerBeat"], 2);
        assert_eq!(json["swingEnabled"], true);

        let back: TimingConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, timing);
    }

    #[test]
    fn test_display() {
        let timing = TimingConfig::new(120.0, 4, 2).with_swing(true);
        assert_eq!(timing.to_string(), "120.0 BPM, 4 beats x 2 (swing)");
    }
}
