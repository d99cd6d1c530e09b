// Schedule - The playback cursor driven by the clock thread
// Combines the section/setlist sequencers, the tempo ramp and the tempo clock into
// a forward-only stream of steps. No threads and no clock: the caller decides when.

use super::ramp::{TempoRamp, TempoRampConfig};
use super::section::{SectionAdvance, SectionSequencer};
use super::setlist::{SetlistAdvance, SetlistSequencer};
use super::timeline::{TimingConfig, next_interval};
use crate::error::ConfigurationError;
use crate::messaging::NotificationKind;
use crate::song::{Setlist, Song};
use crate::transport::event::BeatEvent;
use crate::transport::state::StopReason;
use std::mem;
use std::sync::Arc;
use std::time::Duration;

/// What to play
#[derive(Debug, Clone)]
pub enum PlaybackTarget {
    /// A single timing, played until stopped
    Basic {
        timing: TimingConfig,
        count_in_bars: u32,
    },
    Song(Arc<Song>),
    Setlist(Arc<Setlist>),
}

impl PlaybackTarget {
    pub fn basic(timing: TimingConfig) -> Self {
        PlaybackTarget::Basic {
            timing,
            count_in_bars: 0,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match self {
            PlaybackTarget::Basic { timing, .. } => timing.validate(),
            PlaybackTarget::Song(song) => song.validate(),
            PlaybackTarget::Setlist(setlist) => setlist.validate(),
        }
    }

    pub fn is_basic(&self) -> bool {
        matches!(self, PlaybackTarget::Basic { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackPhase {
    CountIn,
    Playing,
    InterSongDelay,
    Complete,
}

/// Snapshot of where playback is
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackPosition {
    pub song_index: usize,
    pub section_index: usize,
    pub bar_index: u32,
    pub beat_index: u32,
    pub subdivision_index: u32,
    pub current_bpm: f64,
    pub phase: PlaybackPhase,
}

/// Next thing the clock thread has to do
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Deliver `notices`, emit `event` now, come back `interval` later
    Beat {
        event: BeatEvent,
        interval: Duration,
        notices: Vec<NotificationKind>,
    },
    /// Inter-song gap: emit nothing for `duration`
    Pause {
        duration: Duration,
        notices: Vec<NotificationKind>,
    },
    /// Nothing left to play
    Finished {
        reason: StopReason,
        notices: Vec<NotificationKind>,
    },
}

#[derive(Debug, Clone)]
enum Cursor {
    Song(SectionSequencer),
    Setlist(SetlistSequencer),
}

/// Work left over from the previous step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    None,
    /// Move past the tick that was just emitted
    Advance,
    /// The pause is over, activate the next setlist song
    NextSong,
}

#[derive(Debug, Clone)]
pub struct Schedule {
    cursor: Cursor,
    ramp: TempoRamp,
    basic: bool,
    pending: Pending,
    notices: Vec<NotificationKind>,
    finished: Option<StopReason>,
}

impl Schedule {
    /// Validates the target and positions the cursor on its first tick
    pub fn new(target: PlaybackTarget, ramp: TempoRampConfig) -> Result<Self, ConfigurationError> {
        target.validate()?;
        ramp.validate()?;

        let basic = target.is_basic();
        let cursor = match target {
            PlaybackTarget::Basic {
                timing,
                count_in_bars,
            } => Cursor::Song(SectionSequencer::basic(timing, count_in_bars)),
            PlaybackTarget::Song(song) => Cursor::Song(SectionSequencer::new(song)),
            PlaybackTarget::Setlist(setlist) => Cursor::Setlist(SetlistSequencer::new(setlist)),
        };

        let initial_bpm = match &cursor {
            Cursor::Song(sequencer) => sequencer.timing().bpm,
            Cursor::Setlist(setlist) => setlist.song().timing().bpm,
        };

        Ok(Self {
            cursor,
            ramp: TempoRamp::new(ramp, initial_bpm),
            basic,
            pending: Pending::None,
            notices: Vec::new(),
            finished: None,
        })
    }

    fn section(&self) -> &SectionSequencer {
        match &self.cursor {
            Cursor::Song(sequencer) => sequencer,
            Cursor::Setlist(setlist) => setlist.song(),
        }
    }

    /// Effective timing of the next tick
    pub fn timing(&self) -> &TimingConfig {
        self.section().timing()
    }

    pub fn is_finished(&self) -> bool {
        self.finished.is_some()
    }

    /// Applies a live tempo edit. Only basic mode accepts one.
    pub fn set_live_bpm(&mut self, bpm: f64) -> bool {
        if !self.basic || self.finished.is_some() {
            return false;
        }
        if let Cursor::Song(sequencer) = &mut self.cursor {
            sequencer.set_bpm(bpm);
            self.ramp.override_bpm(bpm);
        }
        true
    }

    pub fn position(&self) -> PlaybackPosition {
        let section = self.section();
        let counter = section.counter();
        let (song_index, awaiting) = match &self.cursor {
            Cursor::Song(_) => (0, false),
            Cursor::Setlist(setlist) => (setlist.entry_index(), self.pending == Pending::NextSong),
        };
        let phase = if self.finished.is_some() {
            PlaybackPhase::Complete
        } else if awaiting {
            PlaybackPhase::InterSongDelay
        } else if section.is_count_in() {
            PlaybackPhase::CountIn
        } else {
            PlaybackPhase::Playing
        };

        PlaybackPosition {
            song_index,
            section_index: section.section_index(),
            bar_index: counter.bar_index(),
            beat_index: counter.beat_index(),
            subdivision_index: counter.subdivision_index(),
            current_bpm: section.timing().bpm,
            phase,
        }
    }

    /// Produces the next step and moves the cursor
    pub fn next_step(&mut self) -> Step {
        if let Some(reason) = self.finished {
            return Step::Finished {
                reason,
                notices: mem::take(&mut self.notices),
            };
        }

        match mem::replace(&mut self.pending, Pending::None) {
            Pending::None => {}
            Pending::Advance => {
                if let Some(step) = self.advance() {
                    return step;
                }
            }
            Pending::NextSong => self.start_next_song(),
        }

        let section = self.section();
        let timing = *section.timing();
        let counter = section.counter();
        let event = BeatEvent {
            is_accent: counter.is_accent(),
            is_count_in: section.is_count_in(),
            bpm_at_emission: timing.bpm,
        };
        let interval = next_interval(&timing, counter.subdivision_index());

        self.pending = Pending::Advance;
        Step::Beat {
            event,
            interval,
            notices: mem::take(&mut self.notices),
        }
    }

    /// Moves past the emitted tick. Returns a step when the tick ended a song.
    fn advance(&mut self) -> Option<Step> {
        match &mut self.cursor {
            Cursor::Song(sequencer) => match sequencer.advance() {
                SectionAdvance::SongComplete => {
                    self.notices.push(NotificationKind::SongComplete { index: 0 });
                    Some(self.finish(StopReason::SongComplete))
                }
                advance => {
                    apply_bar_boundary(&mut self.ramp, sequencer, &mut self.notices, advance);
                    None
                }
            },
            Cursor::Setlist(setlist) => match setlist.advance() {
                SetlistAdvance::Song(advance) => {
                    apply_bar_boundary(
                        &mut self.ramp,
                        setlist.song_mut(),
                        &mut self.notices,
                        advance,
                    );
                    None
                }
                SetlistAdvance::SongComplete { index, delay } => {
                    self.notices.push(NotificationKind::SongComplete { index });
                    if delay.is_zero() {
                        self.start_next_song();
                        return None;
                    }
                    self.pending = Pending::NextSong;
                    Some(Step::Pause {
                        duration: delay,
                        notices: mem::take(&mut self.notices),
                    })
                }
                SetlistAdvance::SetlistComplete { index } => {
                    self.notices.push(NotificationKind::SongComplete { index });
                    self.notices.push(NotificationKind::SetlistComplete);
                    Some(self.finish(StopReason::SetlistComplete))
                }
            },
        }
    }

    fn start_next_song(&mut self) {
        let Cursor::Setlist(setlist) = &mut self.cursor else {
            return;
        };
        if let Some(index) = setlist.start_next_song() {
            let song = setlist.song();
            self.ramp.rebase(song.timing().bpm);
            self.notices.push(NotificationKind::SongChanged {
                index,
                name: song.song().name().to_string(),
            });
        }
    }

    fn finish(&mut self, reason: StopReason) -> Step {
        self.finished = Some(reason);
        Step::Finished {
            reason,
            notices: mem::take(&mut self.notices),
        }
    }
}

/// Bar-boundary handling: the ramp sees the bar, then the section change (if any)
/// loads its own tempo and the ramp restarts from it.
fn apply_bar_boundary(
    ramp: &mut TempoRamp,
    sequencer: &mut SectionSequencer,
    notices: &mut Vec<NotificationKind>,
    advance: SectionAdvance,
) {
    match advance {
        SectionAdvance::Tick | SectionAdvance::CountInBar | SectionAdvance::SongComplete => {}
        SectionAdvance::CountInComplete => notices.push(NotificationKind::CountInComplete),
        SectionAdvance::BarCompleted => {
            if let Some(bpm) = ramp.on_bar_boundary() {
                sequencer.set_bpm(bpm);
                notices.push(NotificationKind::TempoChanged { bpm });
            }
        }
        SectionAdvance::SectionChanged { index, name } => {
            ramp.rebase(sequencer.timing().bpm);
            notices.push(NotificationKind::SectionChanged { index, name });
        }
    }
}
