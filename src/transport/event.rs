// Beat events and the audio collaborator interface

use crate::sequencer::counter::ClickType;

/// One emitted tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatEvent {
    pub is_accent: bool,
    pub is_count_in: bool,
    pub bpm_at_emission: f64,
}

impl BeatEvent {
    pub fn click_type(&self) -> ClickType {
        if self.is_accent {
            ClickType::Accent
        } else {
            ClickType::Regular
        }
    }
}

/// Receiver of beat events, called on the clock thread.
///
/// Implementations pick and trigger the sample (accent, regular or count-in).
/// They must return quickly: time spent here delays the next tick.
pub trait BeatSink: Send + Sync {
    fn on_beat(&self, event: &BeatEvent);
}

impl<F> BeatSink for F
where
    F: Fn(&BeatEvent) + Send + Sync,
{
    fn on_beat(&self, event: &BeatEvent) {
        self(event)
    }
}
