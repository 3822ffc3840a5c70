//! Dwell configuration persistence
//!
//! Loads and stores the per-pair [`DelayConfig`] through the hal
//! [`FlashStorage`] trait. Each pair is one item under `Delay(idx)`
//! holding the postcard-encoded `(min, max)` tuple, so an update either
//! lands whole or not at all.

use tarczownix_hal::{FlashError, FlashStorage, StorageKey};

use super::delay::{DelayConfig, DelayError};
use crate::channel::PAIR_COUNT;

/// Maximum encoded size of a `(u32, u32)` record (two postcard varints)
const MAX_RECORD_SIZE: usize = 10;

/// Configuration persistence errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Flash operation failed
    Flash(FlashError),
    /// Value could not be encoded
    Encode,
    /// Stored bytes are not a valid value
    Decode,
    /// Stored bounds violate the delay invariant
    Invalid(DelayError),
}

impl From<FlashError> for ConfigError {
    fn from(e: FlashError) -> Self {
        ConfigError::Flash(e)
    }
}

impl From<DelayError> for ConfigError {
    fn from(e: DelayError) -> Self {
        ConfigError::Invalid(e)
    }
}

/// Outcome of loading one pair's bounds at boot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoadOutcome {
    /// Valid bounds were found in flash
    Stored,
    /// Nothing stored; defaults applied
    Missing,
    /// Stored data unusable; defaults applied
    Fallback(ConfigError),
}

/// Delay persistence manager
pub struct DelayStore<S> {
    storage: S,
}

impl<S: FlashStorage> DelayStore<S> {
    /// Create a new persistence manager
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Load one pair's bounds
    pub async fn load(&mut self, pair: u8) -> Result<DelayConfig, ConfigError> {
        if pair as usize >= PAIR_COUNT {
            return Err(ConfigError::Invalid(DelayError::UnknownPair));
        }
        let (min, max) = self.read_record(StorageKey::Delay(pair)).await?;
        Ok(DelayConfig::new(min, max)?)
    }

    /// Load every pair's bounds, falling back to defaults per pair
    pub async fn load_all(&mut self) -> [(DelayConfig, LoadOutcome); PAIR_COUNT] {
        let mut out = [(DelayConfig::DEFAULT, LoadOutcome::Missing); PAIR_COUNT];
        for (idx, slot) in out.iter_mut().enumerate() {
            *slot = match self.load(idx as u8).await {
                Ok(cfg) => (cfg, LoadOutcome::Stored),
                Err(ConfigError::Flash(FlashError::NotFound)) => {
                    (DelayConfig::DEFAULT, LoadOutcome::Missing)
                }
                Err(e) => (DelayConfig::DEFAULT, LoadOutcome::Fallback(e)),
            };
        }
        out
    }

    /// Persist one pair's bounds
    ///
    /// On error the previously stored bounds are left as they were.
    pub async fn save(&mut self, pair: u8, config: DelayConfig) -> Result<(), ConfigError> {
        if pair as usize >= PAIR_COUNT {
            return Err(ConfigError::Invalid(DelayError::UnknownPair));
        }
        self.write_record(StorageKey::Delay(pair), (config.min_ms(), config.max_ms()))
            .await
    }

    async fn read_record(&mut self, key: StorageKey) -> Result<(u32, u32), ConfigError> {
        let mut buffer = [0u8; MAX_RECORD_SIZE];
        let len = self.storage.read(key, &mut buffer).await.map_err(|e| match e {
            FlashError::BufferTooSmall => ConfigError::Decode,
            e => ConfigError::Flash(e),
        })?;
        postcard::from_bytes(&buffer[..len]).map_err(|_| ConfigError::Decode)
    }

    async fn write_record(&mut self, key: StorageKey, record: (u32, u32)) -> Result<(), ConfigError> {
        let mut buffer = [0u8; MAX_RECORD_SIZE];
        let encoded = postcard::to_slice(&record, &mut buffer).map_err(|_| ConfigError::Encode)?;
        self.storage.write(key, encoded).await?;
        Ok(())
    }
}
