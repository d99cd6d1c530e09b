// Bar/beat counter - Position inside the current section
// Advanced once per tick, reports bar boundaries and applies the accent policy

use super::timeline::TimingConfig;

/// Click type of a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickType {
    /// First subdivision of the first beat of a bar (downbeat)
    Accent,
    /// Any other tick
    Regular,
}

/// Subdivision/beat/bar counter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarBeatCounter {
    beats_per_bar: u32,
    subdivisions_per_beat: u32,
    bar_index: u32,
    beat_index: u32,
    subdivision_index: u32,
}

impl BarBeatCounter {
    pub fn new(timing: &TimingConfig) -> Self {
        Self {
            beats_per_bar: timing.beats_per_bar,
            subdivisions_per_beat: timing.subdivisions_per_beat,
            bar_index: 0,
            beat_index: 0,
            subdivision_index: 0,
        }
    }

    pub fn bar_index(&self) -> u32 {
        self.bar_index
    }

    pub fn beat_index(&self) -> u32 {
        self.beat_index
    }

    pub fn subdivision_index(&self) -> u32 {
        self.subdivision_index
    }

    /// Click type of the tick at the current position
    pub fn click_type(&self) -> ClickType {
        if self.beat_index == 0 && self.subdivision_index == 0 {
            ClickType::Accent
        } else {
            ClickType::Regular
        }
    }

    pub fn is_accent(&self) -> bool {
        self.click_type() == ClickType::Accent
    }

    /// Move to the next tick. Returns true when a bar was completed.
    pub fn advance(&mut self) -> bool {
        self.subdivision_index += 1;
        if self.subdivision_index < self.subdivisions_per_beat {
            return false;
        }
        self.subdivision_index = 0;

        self.beat_index += 1;
        if self.beat_index < self.beats_per_bar {
            return false;
        }
        self.beat_index = 0;
        self.bar_index += 1;
        true
    }

    /// Back to bar 0 with a (possibly new) meter
    pub fn reset(&mut self, timing: &TimingConfig) {
        *self = Self::new(timing);
    }
}
