// Controller state, shared between the caller and the clock thread

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

/// Top-level playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle = 0,
    Running = 1,
    Stopping = 2,
    Stopped = 3,
}

impl PlaybackState {
    /// Running or about to stop
    pub fn is_active(&self) -> bool {
        matches!(self, PlaybackState::Running | PlaybackState::Stopping)
    }
}

impl From<u8> for PlaybackState {
    fn from(value: u8) -> Self {
        match value {
            1 => PlaybackState::Running,
            2 => PlaybackState::Stopping,
            3 => PlaybackState::Stopped,
            _ => PlaybackState::Idle,
        }
    }
}

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// `stop()` was called
    UserRequested,
    /// `cancel()` was called
    Cancelled,
    /// The auto-stop timer expired
    AutoStop,
    /// Song or basic structure ran out
    SongComplete,
    SetlistComplete,
    /// The clock thread unwound, e.g. from a panicking sink
    Aborted,
}

impl StopReason {
    /// True for natural completion, false for external stops
    pub fn is_completion(&self) -> bool {
        matches!(self, StopReason::SongComplete | StopReason::SetlistComplete)
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StopReason::UserRequested => "stopped",
            StopReason::Cancelled => "cancelled",
            StopReason::AutoStop => "timer expired",
            StopReason::SongComplete => "song complete",
            StopReason::SetlistComplete => "setlist complete",
            StopReason::Aborted => "aborted",
        };
        f.write_str(text)
    }
}

/// Atomic wrapper to share the playback state between threads
#[derive(Debug, Clone)]
pub struct AtomicPlaybackState {
    inner: Arc<AtomicU8>,
}

impl AtomicPlaybackState {
    pub fn new(state: PlaybackState) -> Self {
        Self {
            inner: Arc::new(AtomicU8::new(state as u8)),
        }
    }

    pub fn get(&self) -> PlaybackState {
        PlaybackState::from(self.inner.load(Ordering::Acquire))
    }

    pub fn set(&self, state: PlaybackState) {
        self.inner.store(state as u8, Ordering::Release);
    }

    /// Sets `new` only if the current state is `current`
    pub fn transition(&self, current: PlaybackState, new: PlaybackState) -> bool {
        self.inner
            .compare_exchange(current as u8, new as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl Default for AtomicPlaybackState {
    fn default() -> Self {
        Self::new(PlaybackState::Idle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_round_trip() {
        for state in [
            PlaybackState::Idle,
            PlaybackState::Running,
            PlaybackState::Stopping,
            PlaybackState::Stopped,
        ] {
            assert_eq!(PlaybackState::from(state as u8), state);
        }
        assert_eq!(PlaybackState::from(42), PlaybackState::Idle);
    }

    #[test]
    fn test_shared_between_clones() {
        let state = AtomicPlaybackState::default();
        let clone = state.clone();
        clone.set(PlaybackState::Running);
        assert_eq!(state.get(), PlaybackState::Running);
        assert!(state.get().is_active());
    }

    #[test]
    fn test_transition() {
        let state = AtomicPlaybackState::new(PlaybackState::Running);
        assert!(!state.transition(PlaybackState::Idle, PlaybackState::Stopped));
        assert!(state.transition(PlaybackState::Running, PlaybackState::Stopping));
        assert_eq!(state.get(), PlaybackState::Stopping);
    }

    #[test]
    fn test_stop_reason() {
        assert!(StopReason::SetlistComplete.is_completion());
        assert!(!StopReason::AutoStop.is_completion());
        assert_eq!(StopReason::AutoStop.to_string(), "timer expired");
    }
}
