// Transport - Real-time playback of a schedule on a dedicated clock thread

pub mod clock;
pub mod controller;
pub mod event;
pub mod live;
pub mod state;

pub use controller::{PlaybackController, PlaybackOptions};
pub use event::{BeatEvent, BeatSink};
pub use live::{LiveTempoControl, SharedLiveTempo};
pub use state::{AtomicPlaybackState, PlaybackState, StopReason};
