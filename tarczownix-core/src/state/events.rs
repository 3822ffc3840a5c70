//! Events that drive pair phase transitions

/// Events fed to [`super::PairPhase::transition`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PairEvent {
    /// Sequence enabled (start, or restart after a stop)
    Enable,
    /// Sequence disabled by the operator
    Disable,
    /// Energize write for the active role was confirmed by the bus
    EnergizeConfirmed,
    /// Active role's sensor went (debounced) ACTIVE and the relay was released
    TriggerDetected,
    /// Dwell duration has elapsed
    DwellElapsed,
    /// Emergency stop from the watchdog
    ForceStop,
}

impl PairEvent {
    /// Check if this event comes from outside the pair's own cycle
    pub fn is_external(&self) -> bool {
        matches!(
            self,
            PairEvent::Enable | PairEvent::Disable | PairEvent::ForceStop
        )
    }
}
