//! Pair phase machine
//!
//! The phase of a pair is a pure function of its previous phase and an
//! event. Side effects (bus writes, deadlines, dwell sampling) belong to
//! the pair controller, which only feeds events that it has confirmed.

use super::events::PairEvent;

/// Phases of one relay pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PairPhase {
    /// Sequence disabled; nothing energized
    Inactive,
    /// About to energize the active role's relay
    Activating,
    /// Relay energized; waiting for the role's sensor
    AwaitingTrigger,
    /// Relay released; waiting out the randomized dwell
    Dwelling,
}

impl PairPhase {
    /// Check if the active role's relay is energized in this phase
    pub fn relay_energized(&self) -> bool {
        matches!(self, PairPhase::AwaitingTrigger)
    }

    /// Check if the pair is taking part in the sequence
    pub fn is_running(&self) -> bool {
        !matches!(self, PairPhase::Inactive)
    }

    /// Check if the watchdog should be timing this phase
    pub fn is_watched(&self) -> bool {
        matches!(self, PairPhase::AwaitingTrigger)
    }

    /// Short name for logs and status lines
    pub fn name(&self) -> &'static str {
        match self {
            PairPhase::Inactive => "INACTIVE",
            PairPhase::Activating => "ACTIVATING",
            PairPhase::AwaitingTrigger => "AWAITING_TRIGGER",
            PairPhase::Dwelling => "DWELLING",
        }
    }

    /// Process an event and return the next phase
    pub fn transition(self, event: PairEvent) -> Self {
        use PairEvent::*;
        use PairPhase::*;

        match (self, event) {
            // Disable and emergency stop win from anywhere
            (_, Disable) | (_, ForceStop) => Inactive,

            (Inactive, Enable) => Activating,
            (Activating, EnergizeConfirmed) => AwaitingTrigger,
            (AwaitingTrigger, TriggerDetected) => Dwelling,
            (Dwelling, DwellElapsed) => Activating,

            // Default: stay in current phase
            _ => self,
        }
    }
}
