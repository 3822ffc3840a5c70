//! Per-pair dwell bounds
//!
//! The dwell is the randomized pause between one channel's deactivation
//! and its counterpart's activation. It is drawn uniformly from
//! `[min_dwell_ms, max_dwell_ms)`; the upper bound is exclusive.

use rand::{Rng, RngCore};

/// Smallest accepted lower bound (ms)
pub const MIN_DWELL_FLOOR_MS: u32 = 100;

/// Largest accepted upper bound (ms)
pub const MAX_DWELL_CEILING_MS: u32 = 20_000;

/// Default bounds applied when nothing valid is stored
pub const DEFAULT_MIN_DWELL_MS: u32 = 1_000;
pub const DEFAULT_MAX_DWELL_MS: u32 = 5_000;

/// Why a delay update was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DelayError {
    /// `min` below [`MIN_DWELL_FLOOR_MS`]
    MinTooSmall,
    /// `max` above [`MAX_DWELL_CEILING_MS`]
    MaxTooLarge,
    /// `min` not strictly below `max`
    NotOrdered,
    /// Pair index out of range
    UnknownPair,
}

/// Dwell bounds of one pair
///
/// Construction validates `100 <= min < max <= 20000`, so every value of
/// this type satisfies the invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DelayConfig {
    min_dwell_ms: u32,
    max_dwell_ms: u32,
}

impl DelayConfig {
    /// Default bounds (1 s .. 5 s)
    pub const DEFAULT: Self = Self {
        min_dwell_ms: DEFAULT_MIN_DWELL_MS,
        max_dwell_ms: DEFAULT_MAX_DWELL_MS,
    };

    /// Validate and build a delay configuration
    pub fn new(min_dwell_ms: u32, max_dwell_ms: u32) -> Result<Self, DelayError> {
        if min_dwell_ms < MIN_DWELL_FLOOR_MS {
            return Err(DelayError::MinTooSmall);
        }
        if max_dwell_ms > MAX_DWELL_CEILING_MS {
            return Err(DelayError::MaxTooLarge);
        }
        if min_dwell_ms >= max_dwell_ms {
            return Err(DelayError::NotOrdered);
        }
        Ok(Self {
            min_dwell_ms,
            max_dwell_ms,
        })
    }

    /// Lower bound (inclusive)
    pub fn min_ms(&self) -> u32 {
        self.min_dwell_ms
    }

    /// Upper bound (exclusive)
    pub fn max_ms(&self) -> u32 {
        self.max_dwell_ms
    }

    /// Draw a dwell duration uniformly from `[min, max)`
    pub fn sample<R: RngCore>(&self, rng: &mut R) -> u32 {
        rng.gen_range(self.min_dwell_ms..self.max_dwell_ms)
    }
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
