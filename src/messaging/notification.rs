// Notifications - Engine → UI structural and diagnostic messages

use crate::transport::state::StopReason;
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
}

/// Racing or out-of-place control commands, ignored by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcurrencyMisuse {
    /// `start` while a run is active
    AlreadyRunning,
    /// `stop`/`cancel` with no active run
    NotRunning,
    /// Live tempo edit outside a basic-mode run
    LiveBpmUnavailable,
}

impl fmt::Display for ConcurrencyMisuse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConcurrencyMisuse::AlreadyRunning => write!(f, "playback is already running"),
            ConcurrencyMisuse::NotRunning => write!(f, "no active playback to stop"),
            ConcurrencyMisuse::LiveBpmUnavailable => {
                write!(f, "live tempo changes need a running basic-mode playback")
            }
        }
    }
}

/// What the notification is about
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationKind {
    /// The count-in is over; the first section starts now
    CountInComplete,
    /// A new section started (never sent for a song's first section)
    SectionChanged { index: usize, name: String },
    /// A new setlist song started (never sent for the first song)
    SongChanged { index: usize, name: String },
    SongComplete { index: usize },
    SetlistComplete,
    /// The tempo ramp moved the effective tempo
    TempoChanged { bpm: f64 },
    /// A tick fired later than the tolerance allows
    TimingDegraded { lateness: Duration },
    Misuse(ConcurrencyMisuse),
    Stopped(StopReason),
}

impl NotificationKind {
    pub fn level(&self) -> NotificationLevel {
        match self {
            NotificationKind::TimingDegraded { .. } | NotificationKind::Misuse(_) => {
                NotificationLevel::Warning
            }
            _ => NotificationLevel::Info,
        }
    }
}

/// Notification with timestamp
#[derive(Debug, Clone)]
pub struct Notification {
    pub level: NotificationLevel,
    pub kind: NotificationKind,
    pub timestamp: u64, // Unix timestamp in milliseconds
}

impl Notification {
    pub fn new(kind: NotificationKind) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        Self {
            level: kind.level(),
            kind,
            timestamp,
        }
    }
}

impl From<NotificationKind> for Notification {
    fn from(kind: NotificationKind) -> Self {
        Self::new(kind)
    }
}
