//! Inter-task communication channels

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use tarczownix_core::sequencer::PhaseChange;

/// Channel capacity for phase changes
const PHASE_CHANNEL_SIZE: usize = 8;

/// Phase changes made by pair controllers (for logging)
pub static PHASE_EVENTS: Channel<CriticalSectionRawMutex, PhaseChange, PHASE_CHANNEL_SIZE> =
    Channel::new();
