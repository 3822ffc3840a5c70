//! Per-pair runtime state

use super::events::PairEvent;
use super::machine::PairPhase;
use crate::channel::Role;

/// Runtime state of one relay pair
///
/// Owned by the supervisor. Only the pair's controller commits changes,
/// except for the emergency stop which forces every pair inactive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PairState {
    pub phase: PairPhase,
    /// Role the pair is currently cycling on
    pub role: Role,
    /// Relay confirmed energized by the bus, if any
    pub energized: Option<Role>,
    /// When the current activation was confirmed (ms)
    pub activated_at_ms: Option<u64>,
    /// Watchdog deadline while awaiting the trigger (ms)
    pub trigger_deadline_ms: Option<u64>,
    /// End of the current dwell (ms)
    pub dwell_deadline_ms: Option<u64>,
    /// Most recently sampled dwell (ms)
    pub last_dwell_ms: Option<u32>,
    /// Completed activate/trigger cycles
    pub cycles: u32,
    /// Run epoch this state belongs to
    pub epoch: u32,
}

impl Default for PairState {
    fn default() -> Self {
        Self::new()
    }
}

impl PairState {
    /// Idle pair at role A
    pub const fn new() -> Self {
        Self {
            phase: PairPhase::Inactive,
            role: Role::A,
            energized: None,
            activated_at_ms: None,
            trigger_deadline_ms: None,
            dwell_deadline_ms: None,
            last_dwell_ms: None,
            cycles: 0,
            epoch: 0,
        }
    }

    /// Role being cycled on, or `None` while inactive
    pub fn active_role(&self) -> Option<Role> {
        self.phase.is_running().then_some(self.role)
    }

    /// Apply a phase event, clearing timing fields that no longer apply
    pub fn apply(&mut self, event: PairEvent) {
        let next = self.phase.transition(event);
        if next == self.phase {
            return;
        }
        self.phase = next;

        if !next.is_watched() {
            self.trigger_deadline_ms = None;
        }
        if next != PairPhase::Dwelling {
            self.dwell_deadline_ms = None;
        }
        if next == PairPhase::Inactive {
            self.activated_at_ms = None;
        }
    }

    /// Force the pair inactive at role A with nothing energized
    pub fn reset(&mut self) {
        self.apply(PairEvent::ForceStop);
        self.role = Role::A;
        self.energized = None;
    }

    /// Restart the cycle at role A under a new epoch
    pub fn restart(&mut self, epoch: u32) {
        self.reset();
        self.epoch = epoch;
        self.apply(PairEvent::Enable);
    }
}
