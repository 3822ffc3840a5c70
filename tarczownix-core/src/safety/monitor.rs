//! Trigger timeout watchdog
//!
//! Tracks one deadline per pair while the pair waits for its trigger.
//! The watchdog itself only keeps time; the supervisor acts on an expiry.

use crate::channel::PAIR_COUNT;

/// Per-pair trigger deadlines
#[derive(Debug, Clone)]
pub struct TimeoutWatchdog {
    deadlines: [Option<u64>; PAIR_COUNT],
}

impl Default for TimeoutWatchdog {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeoutWatchdog {
    /// Create a watchdog with nothing registered
    pub const fn new() -> Self {
        Self {
            deadlines: [None; PAIR_COUNT],
        }
    }

    /// Arm (or re-arm) the deadline of a pair
    ///
    /// Out-of-range pairs are ignored.
    pub fn register(&mut self, pair: u8, deadline_ms: u64) {
        if let Some(slot) = self.deadlines.get_mut(pair as usize) {
            *slot = Some(deadline_ms);
        }
    }

    /// Disarm the deadline of a pair
    pub fn cancel(&mut self, pair: u8) {
        if let Some(slot) = self.deadlines.get_mut(pair as usize) {
            *slot = None;
        }
    }

    /// Disarm every deadline
    pub fn cancel_all(&mut self) {
        self.deadlines = [None; PAIR_COUNT];
    }

    /// Armed deadline of a pair
    pub fn pending(&self, pair: u8) -> Option<u64> {
        self.deadlines.get(pair as usize).copied().flatten()
    }

    /// Check for an expired deadline
    ///
    /// Returns the pair whose deadline passed first, or `None` if all
    /// armed deadlines are still in the future. Expiry does not disarm
    /// the deadline.
    pub fn check(&self, now_ms: u64) -> Option<u8> {
        self.deadlines
            .iter()
            .enumerate()
            .filter_map(|(pair, deadline)| deadline.map(|d| (pair, d)))
            .filter(|&(_, deadline)| now_ms >= deadline)
            .min_by_key(|&(_, deadline)| deadline)
            .map(|(pair, _)| pair as u8)
    }
}
