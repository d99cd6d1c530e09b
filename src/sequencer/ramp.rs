// Tempo ramp - Gradual tempo change every N completed bars
// Speed-up and slow-down practice modes

use crate::config::{
    DEFAULT_TEMPO_CHANGE_INTERVAL, DEFAULT_TEMPO_CHANGE_STEP, MAX_BPM, MIN_BPM,
};
use crate::error::{ConfigurationError, validate_bpm};
use serde::{Deserialize, Serialize};

/// Ramp settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TempoRampConfig {
    pub enabled: bool,
    /// BPM added every `every_n_bars` bars (negative slows down)
    pub step_bpm: f64,
    pub every_n_bars: u32,
    pub min_bpm: f64,
    pub max_bpm: f64,
}

impl TempoRampConfig {
    /// Ramp that adds `step` BPM every `every_n_bars` bars
    pub fn speed_up(step: f64, every_n_bars: u32) -> Self {
        Self {
            enabled: true,
            step_bpm: step.abs(),
            every_n_bars,
            ..Self::default()
        }
    }

    /// Ramp that removes `step` BPM every `every_n_bars` bars
    pub fn slow_down(step: f64, every_n_bars: u32) -> Self {
        Self {
            enabled: true,
            step_bpm: -step.abs(),
            every_n_bars,
            ..Self::default()
        }
    }

    pub fn with_range(mut self, min_bpm: f64, max_bpm: f64) -> Self {
        self.min_bpm = min_bpm;
        self.max_bpm = max_bpm;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !self.enabled {
            return Ok(());
        }
        if self.every_n_bars == 0 {
            return Err(ConfigurationError::InvalidRamp(
                "interval must be at least one bar".to_string(),
            ));
        }
        if !self.step_bpm.is_finite() {
            return Err(ConfigurationError::InvalidRamp(
                "step must be a finite number".to_string(),
            ));
        }
        validate_bpm(self.min_bpm)?;
        validate_bpm(self.max_bpm)?;
        if self.min_bpm > self.max_bpm {
            return Err(ConfigurationError::InvalidRamp(format!(
                "minimum {} is above maximum {}",
                self.min_bpm, self.max_bpm
            )));
        }
        Ok(())
    }
}

impl Default for TempoRampConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            step_bpm: DEFAULT_TEMPO_CHANGE_STEP,
            every_n_bars: DEFAULT_TEMPO_CHANGE_INTERVAL,
            min_bpm: MIN_BPM,
            max_bpm: MAX_BPM,
        }
    }
}

/// Ramp state for one run
#[derive(Debug, Clone)]
pub struct TempoRamp {
    config: TempoRampConfig,
    bars_since_step: u32,
    bpm: f64,
}

impl TempoRamp {
    pub fn new(config: TempoRampConfig, initial_bpm: f64) -> Self {
        Self {
            config,
            bars_since_step: 0,
            bpm: initial_bpm,
        }
    }

    /// Current effective BPM
    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Feed one completed bar. Returns the new BPM when a step changed it.
    pub fn on_bar_boundary(&mut self) -> Option<f64> {
        if !self.config.enabled {
            return None;
        }

        self.bars_since_step += 1;
        if self.bars_since_step < self.config.every_n_bars {
            return None;
        }
        self.bars_since_step = 0;

        let next = (self.bpm + self.config.step_bpm).clamp(self.config.min_bpm, self.config.max_bpm);
        if next == self.bpm {
            // Bound reached
            return None;
        }
        self.bpm = next;
        Some(next)
    }

    /// New section tempo: restart counting from `bpm`
    pub fn rebase(&mut self, bpm: f64) {
        self.bpm = bpm;
        self.bars_since_step = 0;
    }

    /// Live tempo edit: take `bpm` but keep the bar count
    pub fn override_bpm(&mut self, bpm: f64) {
        self.bpm = bpm;
    }
}
