//! Status snapshot types

use crate::channel::{Level, Role, GROUP_WIDTH, PAIR_COUNT};
use crate::config::DelayConfig;
use crate::safety::ErrorRecord;
use crate::state::PairPhase;

/// Status of one pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PairStatus {
    pub phase: PairPhase,
    /// Role being cycled on, `None` while inactive
    pub active_role: Option<Role>,
    /// Relay confirmed energized, if any
    pub energized: Option<Role>,
    pub delay: DelayConfig,
    pub cycles: u32,
    pub last_dwell_ms: Option<u32>,
}

/// Raw and debounced level of one sensor line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelStatus {
    pub raw: Level,
    pub debounced: Level,
    /// Logical state of the debounced level
    pub active: bool,
}

/// Full sequencer status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusReport {
    pub enabled: bool,
    pub pairs: [PairStatus; PAIR_COUNT],
    pub sensors: [ChannelStatus; GROUP_WIDTH],
    /// Logical relay states read back from the bus; `None` if the read failed
    pub relays: Option<[bool; GROUP_WIDTH]>,
    pub last_error: Option<ErrorRecord>,
    /// An emergency release is still waiting for the bus
    pub release_pending: bool,
}
