// Sequencer module
// Tempo clock, counters and the song/setlist traversal driven by the clock thread

pub mod counter;
pub mod ramp;
pub mod schedule;
pub mod section;
pub mod setlist;
pub mod timeline;

pub use counter::{BarBeatCounter, ClickType};
pub use ramp::{TempoRamp, TempoRampConfig};
pub use schedule::{PlaybackPhase, PlaybackPosition, PlaybackTarget, Schedule, Step};
pub use section::{SectionAdvance, SectionSequencer, SectionState};
pub use setlist::{SetlistAdvance, SetlistSequencer, SetlistState};
pub use timeline::{TimingConfig, interval_seconds, next_interval};
