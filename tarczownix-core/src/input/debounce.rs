//! Time-window debounce filter
//!
//! Converts raw line samples into stable levels. A raw change restarts the
//! line's stability timer; the stable level only follows the raw level
//! once the raw level has held for the whole window. A glitch shorter than
//! the window is therefore never visible, and the stable level changes at
//! most once per window.

use crate::channel::{ChannelId, Level, Polarity};

/// Per-line debounce state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DebounceRecord {
    /// Most recent raw sample
    pub last_raw: Level,
    /// Time of the most recent raw change (ms)
    pub last_change_ms: u64,
    /// Reported stable level
    pub stable: Level,
}

impl DebounceRecord {
    const fn idle(level: Level) -> Self {
        Self {
            last_raw: level,
            last_change_ms: 0,
            stable: level,
        }
    }
}

/// Debounce filter over `N` lines
#[derive(Debug, Clone)]
pub struct DebounceFilter<const N: usize> {
    records: [DebounceRecord; N],
    window_ms: u32,
    polarity: Polarity,
}

impl<const N: usize> DebounceFilter<N> {
    /// Create a filter with every line stable at its INACTIVE level
    pub const fn new(window_ms: u32, polarity: Polarity) -> Self {
        let idle = match polarity {
            Polarity::ActiveHigh => Level::Low,
            Polarity::ActiveLow => Level::High,
        };
        Self {
            records: [DebounceRecord::idle(idle); N],
            window_ms,
            polarity,
        }
    }

    /// Stability window (ms)
    pub fn window_ms(&self) -> u32 {
        self.window_ms
    }

    /// Feed one raw sample
    ///
    /// Returns the new stable level when this sample completes a
    /// transition, `None` otherwise. Out-of-range lines are ignored.
    pub fn sample(&mut self, line: usize, raw: Level, now_ms: u64) -> Option<Level> {
        let window = u64::from(self.window_ms);
        let record = self.records.get_mut(line)?;

        if raw != record.last_raw {
            record.last_raw = raw;
            record.last_change_ms = now_ms;
        }

        let held = now_ms.saturating_sub(record.last_change_ms);
        if held >= window && record.stable != raw {
            record.stable = raw;
            return Some(raw);
        }
        None
    }

    /// Stable level of a line
    pub fn stable(&self, line: usize) -> Option<Level> {
        self.records.get(line).map(|r| r.stable)
    }

    /// Last raw sample of a line
    pub fn raw(&self, line: usize) -> Option<Level> {
        self.records.get(line).map(|r| r.last_raw)
    }

    /// Debounce state of a line
    pub fn record(&self, line: usize) -> Option<&DebounceRecord> {
        self.records.get(line)
    }

    /// Logical ACTIVE state of a sensor channel
    pub fn is_active(&self, channel: ChannelId) -> bool {
        self.stable(channel.line() as usize)
            .is_some_and(|level| self.polarity.is_active(level))
    }
}
