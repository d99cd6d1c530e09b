// Setlist sequencer - Chains songs with optional pauses between them

use super::section::{SectionAdvance, SectionSequencer};
use crate::song::Setlist;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetlistState {
    PlayingSong,
    /// Song finished; the next one starts after `delay`
    AwaitingNextSong { delay: Duration },
    SetlistComplete,
}

/// What happened when the setlist moved past a tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetlistAdvance {
    /// Position change inside the current song
    Song(SectionAdvance),
    /// Current song done; `delay` must elapse before `start_next_song`
    SongComplete { index: usize, delay: Duration },
    /// Last song done
    SetlistComplete { index: usize },
}

/// Cursor over the entries of a setlist
#[derive(Debug, Clone)]
pub struct SetlistSequencer {
    setlist: Arc<Setlist>,
    entry_index: usize,
    song: SectionSequencer,
    state: SetlistState,
}

impl SetlistSequencer {
    /// Starts at the first entry. The setlist must be validated (non-empty).
    pub fn new(setlist: Arc<Setlist>) -> Self {
        let song = SectionSequencer::new(Arc::clone(&setlist.entries()[0].song));
        Self {
            setlist,
            entry_index: 0,
            song,
            state: SetlistState::PlayingSong,
        }
    }

    pub fn entry_index(&self) -> usize {
        self.entry_index
    }

    pub fn state(&self) -> SetlistState {
        self.state
    }

    pub fn song(&self) -> &SectionSequencer {
        &self.song
    }

    pub fn song_mut(&mut self) -> &mut SectionSequencer {
        &mut self.song
    }

    /// Moves past the current tick of the active song
    pub fn advance(&mut self) -> SetlistAdvance {
        match self.state {
            SetlistState::PlayingSong => {}
            SetlistState::AwaitingNextSong { delay } => {
                return SetlistAdvance::SongComplete {
                    index: self.entry_index,
                    delay,
                };
            }
            SetlistState::SetlistComplete => {
                return SetlistAdvance::SetlistComplete {
                    index: self.entry_index,
                };
            }
        }

        match self.song.advance() {
            SectionAdvance::SongComplete => self.finish_song(),
            other => SetlistAdvance::Song(other),
        }
    }

    fn finish_song(&mut self) -> SetlistAdvance {
        let index = self.entry_index;
        if index + 1 >= self.setlist.len() {
            self.state = SetlistState::SetlistComplete;
            return SetlistAdvance::SetlistComplete { index };
        }

        let delay = self.setlist.entries()[index].delay_after();
        self.state = SetlistState::AwaitingNextSong { delay };
        SetlistAdvance::SongComplete { index, delay }
    }

    /// Activates the next entry once the pause is over.
    /// Returns the new entry index, or None when not awaiting a song.
    pub fn start_next_song(&mut self) -> Option<usize> {
        if !matches!(self.state, SetlistState::AwaitingNextSong { .. }) {
            return None;
        }
        self.entry_index += 1;
        let song = Arc::clone(&self.setlist.entries()[self.entry_index].song);
        self.song = SectionSequencer::new(song);
        self.state = SetlistState::PlayingSong;
        Some(self.entry_index)
    }
}
