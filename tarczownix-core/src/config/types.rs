//! Sequencer timing configuration
//!
//! Compile-time defaults for the poll loops, the debounce window and the
//! safety timeouts. Only the dwell bounds are runtime-configurable
//! (see [`super::DelayConfig`]).

use crate::channel::ChannelMap;

/// Poll interval of each pair controller and the watchdog (ms)
pub const DEFAULT_POLL_INTERVAL_MS: u32 = 10;

/// Sensor stability window (ms)
pub const DEFAULT_DEBOUNCE_MS: u32 = 100;

/// Maximum time a pair may wait for its trigger (ms)
pub const DEFAULT_TRIGGER_TIMEOUT_MS: u32 = 30_000;

/// Upper bound on acquiring the bus (ms)
pub const DEFAULT_BUS_LOCK_TIMEOUT_MS: u32 = 100;

/// Interval of the periodic status log (ms)
pub const DEFAULT_STATUS_INTERVAL_MS: u32 = 1_000;

/// Sequencer configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SequencerConfig {
    /// Poll interval of pair controllers and watchdog (ms)
    pub poll_interval_ms: u32,
    /// Debounce stability window (ms)
    pub debounce_ms: u32,
    /// Trigger timeout T (ms)
    pub trigger_timeout_ms: u32,
    /// Bus acquisition bound (ms)
    pub bus_lock_timeout_ms: u32,
    /// Status log interval (ms)
    pub status_interval_ms: u32,
    /// Polarity of the relay and sensor groups
    pub channels: ChannelMap,
}

impl SequencerConfig {
    /// Defaults for the PCF8574 relay board
    pub const fn new() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            trigger_timeout_ms: DEFAULT_TRIGGER_TIMEOUT_MS,
            bus_lock_timeout_ms: DEFAULT_BUS_LOCK_TIMEOUT_MS,
            status_interval_ms: DEFAULT_STATUS_INTERVAL_MS,
            channels: ChannelMap::relay_board(),
        }
    }

    /// Same configuration with a different trigger timeout
    pub const fn with_trigger_timeout(mut self, timeout_ms: u32) -> Self {
        self.trigger_timeout_ms = timeout_ms;
        self
    }

    /// Same configuration with a different debounce window
    pub const fn with_debounce(mut self, window_ms: u32) -> Self {
        self.debounce_ms = window_ms;
        self
    }
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self::new()
    }
}
