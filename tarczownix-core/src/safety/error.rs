//! Error records kept by the supervisor

/// What caused the sequencer to record an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorKind {
    /// A pair did not see its trigger before the deadline
    TriggerTimeout,
    /// Fatal bus failure (boot bring-up)
    BusFault,
}

impl ErrorKind {
    /// Short name for logs and status lines
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::TriggerTimeout => "TRIGGER_TIMEOUT",
            ErrorKind::BusFault => "BUS_FAULT",
        }
    }
}

/// Last error seen by the sequencer; persists until cleared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ErrorRecord {
    /// Pair that caused the error, if it is pair-specific
    pub pair: Option<u8>,
    pub kind: ErrorKind,
    /// Time the error was recorded (ms since boot)
    pub at_ms: u64,
}

impl ErrorRecord {
    pub const fn trigger_timeout(pair: u8, at_ms: u64) -> Self {
        Self {
            pair: Some(pair),
            kind: ErrorKind::TriggerTimeout,
            at_ms,
        }
    }

    pub const fn bus_fault(at_ms: u64) -> Self {
        Self {
            pair: None,
            kind: ErrorKind::BusFault,
            at_ms,
        }
    }
}
