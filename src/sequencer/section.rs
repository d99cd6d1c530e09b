// Section sequencer - Walks the sections of one song
// Count-in first (if any), then each section for its bar count, then done

use super::counter::BarBeatCounter;
use super::timeline::TimingConfig;
use crate::song::{Section, Song};
use std::sync::Arc;

/// Name of the single section used by basic mode
pub const BASIC_SECTION_NAME: &str = "Basic";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionState {
    /// Preparatory bars, `remaining_bars` left including the current one
    CountIn { remaining_bars: u32 },
    PlayingSection,
    /// Last bar of a section done; only observed inside `advance`
    SectionComplete,
    SongComplete,
}

/// What happened when the sequencer moved past a tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionAdvance {
    /// Still inside the current bar
    Tick,
    /// A count-in bar ended and more count-in follows
    CountInBar,
    /// Count-in finished; section 0 starts on the next tick
    CountInComplete,
    /// A musical bar ended inside the current section
    BarCompleted,
    /// The section ended and the next one starts on the next tick
    SectionChanged { index: usize, name: String },
    /// The last bar of the last section ended
    SongComplete,
}

/// Cursor over the sections of one song
#[derive(Debug, Clone)]
pub struct SectionSequencer {
    song: Arc<Song>,
    /// Basic mode: the single section never runs out
    unbounded: bool,
    state: SectionState,
    section_index: usize,
    counter: BarBeatCounter,
    timing: TimingConfig,
}

impl SectionSequencer {
    /// Activates `song` from its first section (count-in included)
    pub fn new(song: Arc<Song>) -> Self {
        Self::activate(song, false)
    }

    /// Basic mode: one never-ending section with the given timing
    pub fn basic(timing: TimingConfig, count_in_bars: u32) -> Self {
        // Bar count is irrelevant for an unbounded section
        let section = Section::new(BASIC_SECTION_NAME, timing, 1);
        let song = Song {
            name: BASIC_SECTION_NAME.to_string(),
            sections: vec![section],
            count_in_bars,
        };
        Self::activate(Arc::new(song), true)
    }

    fn activate(song: Arc<Song>, unbounded: bool) -> Self {
        let timing = song.sections()[0].timing;
        let state = match song.count_in_bars() {
            0 => SectionState::PlayingSection,
            bars => SectionState::CountIn {
                remaining_bars: bars,
            },
        };
        Self {
            counter: BarBeatCounter::new(&timing),
            song,
            unbounded,
            state,
            section_index: 0,
            timing,
        }
    }

    pub fn song(&self) -> &Arc<Song> {
        &self.song
    }

    pub fn state(&self) -> SectionState {
        self.state
    }

    pub fn section_index(&self) -> usize {
        self.section_index
    }

    pub fn counter(&self) -> &BarBeatCounter {
        &self.counter
    }

    /// Timing used for the current tick
    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    pub fn is_count_in(&self) -> bool {
        matches!(self.state, SectionState::CountIn { .. })
    }

    pub fn is_complete(&self) -> bool {
        self.state == SectionState::SongComplete
    }

    /// Changes the effective tempo (ramp or live edit)
    pub fn set_bpm(&mut self, bpm: f64) {
        self.timing.bpm = bpm;
    }

    /// Moves past the current tick
    pub fn advance(&mut self) -> SectionAdvance {
        if self.is_complete() {
            return SectionAdvance::SongComplete;
        }
        if !self.counter.advance() {
            return SectionAdvance::Tick;
        }

        match self.state {
            SectionState::CountIn { remaining_bars } if remaining_bars > 1 => {
                self.state = SectionState::CountIn {
                    remaining_bars: remaining_bars - 1,
                };
                SectionAdvance::CountInBar
            }
            SectionState::CountIn { .. } => {
                self.state = SectionState::PlayingSection;
                self.counter.reset(&self.timing);
                SectionAdvance::CountInComplete
            }
            SectionState::PlayingSection => {
                let section = &self.song.sections()[self.section_index];
                if self.unbounded || self.counter.bar_index() < section.bars {
                    return SectionAdvance::BarCompleted;
                }
                self.state = SectionState::SectionComplete;
                self.next_section()
            }
            SectionState::SectionComplete | SectionState::SongComplete => {
                SectionAdvance::SongComplete
            }
        }
    }

    fn next_section(&mut self) -> SectionAdvance {
        let next = self.section_index + 1;
        let Some(section) = self.song.sections().get(next) else {
            self.state = SectionState::SongComplete;
            return SectionAdvance::SongComplete;
        };

        self.section_index = next;
        self.timing = section.timing;
        self.counter.reset(&self.timing);
        self.state = SectionState::PlayingSection;
        SectionAdvance::SectionChanged {
            index: next,
            name: section.name.clone(),
        }
    }
}
