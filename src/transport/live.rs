// Live tempo handoff - caller thread → clock thread
// The caller swaps in a new snapshot; the loop applies it at the next tick boundary.

use arc_swap::ArcSwap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug)]
pub struct LiveTempoControl {
    bpm: ArcSwap<f64>,
    version: AtomicU64,
}

pub type SharedLiveTempo = Arc<LiveTempoControl>;

impl LiveTempoControl {
    pub fn new(initial_bpm: f64) -> Self {
        Self {
            bpm: ArcSwap::from_pointee(initial_bpm),
            version: AtomicU64::new(0),
        }
    }

    /// Publishes a new tempo; returns the new version
    pub fn update(&self, bpm: f64) -> u64 {
        self.bpm.store(Arc::new(bpm));
        self.version.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Returns the tempo if it changed since `seen_version`, updating it
    pub fn take_if_newer(&self, seen_version: &mut u64) -> Option<f64> {
        let version = self.version();
        if version == *seen_version {
            return None;
        }
        *seen_version = version;
        Some(**self.bpm.load())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_if_newer() {
        let control = LiveTempoControl::new(120.0);
        let mut seen = control.version();
        assert_eq!(control.take_if_newer(&mut seen), None);

        control.update(90.0);
        control.update(95.0);
        assert_eq!(control.take_if_newer(&mut seen), Some(95.0));
        assert_eq!(control.take_if_newer(&mut seen), None);
    }
}
