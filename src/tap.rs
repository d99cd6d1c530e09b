// Tap tempo - BPM from the average interval between taps

use crate::config::{MAX_BPM, MIN_BPM, TAP_RESET_WINDOW};
use std::time::Instant;

#[derive(Debug, Clone, Default)]
pub struct TapTempo {
    taps: Vec<Instant>,
}

impl TapTempo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a tap. Returns the tapped tempo once two or more taps are in
    /// the current measurement.
    pub fn tap(&mut self, now: Instant) -> Option<f64> {
        let stale = self
            .taps
            .last()
            .is_some_and(|last| now.saturating_duration_since(*last) > TAP_RESET_WINDOW);
        if stale {
            self.taps.clear();
        }
        self.taps.push(now);
        self.bpm()
    }

    /// Tempo of the current measurement, if any
    pub fn bpm(&self) -> Option<f64> {
        let (first, last) = (self.taps.first()?, self.taps.last()?);
        let intervals = self.taps.len() - 1;
        if intervals == 0 {
            return None;
        }

        // Mean of consecutive intervals == total span / count
        let mean = last.duration_since(*first).as_secs_f64() / intervals as f64;
        if mean <= 0.0 {
            return Some(MAX_BPM);
        }
        Some((60.0 / mean).round().clamp(MIN_BPM, MAX_BPM))
    }

    pub fn tap_count(&self) -> usize {
        self.taps.len()
    }

    pub fn reset(&mut self) {
        self.taps.clear();
    }
}
