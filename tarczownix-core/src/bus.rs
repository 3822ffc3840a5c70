//! Bus arbiter
//!
//! Serializes every transaction on the shared expander bus. Each public
//! method acquires the bus, performs exactly one bank transaction and
//! releases it when the guard drops, on success and error paths alike.
//! Acquisition is bounded; a caller that cannot get the bus in time gets
//! [`BusError::LockTimeout`] instead of waiting indefinitely.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};
use embassy_time::{with_timeout, Duration};

use crate::channel::{ChannelId, ChannelKind, ChannelMap, Level};
use crate::traits::{BusError, ChannelBank};

/// Mutual-exclusion domain around a [`ChannelBank`]
pub struct BusArbiter<M: RawMutex, B> {
    bank: Mutex<M, B>,
    channels: ChannelMap,
    lock_timeout: Duration,
}

impl<M: RawMutex, B: ChannelBank> BusArbiter<M, B> {
    /// Create an arbiter owning the bank
    pub const fn new(bank: B, channels: ChannelMap, lock_timeout: Duration) -> Self {
        Self {
            bank: Mutex::new(bank),
            channels,
            lock_timeout,
        }
    }

    /// Polarity map used for logical writes
    pub fn channels(&self) -> &ChannelMap {
        &self.channels
    }

    async fn acquire(&self) -> Result<MutexGuard<'_, M, B>, BusError> {
        with_timeout(self.lock_timeout, self.bank.lock())
            .await
            .map_err(|_| BusError::LockTimeout)
    }

    /// Bring the bank up with every relay de-energized
    pub async fn init(&self) -> Result<(), BusError> {
        let idle = self.channels.relay.inactive_level();
        self.acquire().await?.init(idle)
    }

    /// Read the raw level of any line
    pub async fn read(&self, channel: ChannelId) -> Result<Level, BusError> {
        self.acquire().await?.read(channel)
    }

    /// Drive a relay line to a raw level
    pub async fn write(&self, channel: ChannelId, level: Level) -> Result<(), BusError> {
        if channel.kind != ChannelKind::Relay {
            return Err(BusError::InvalidChannel);
        }
        self.acquire().await?.write(channel, level)
    }

    /// De-energize a relay
    pub async fn de_energize(&self, channel: ChannelId) -> Result<(), BusError> {
        self.write(channel, self.channels.relay.level_for(false))
            .await
    }

    /// Energize a relay only if `guard` still holds once the bus is owned
    ///
    /// The guard runs inside the critical section, so a concurrent disable
    /// that completes before this transaction starts is always observed.
    /// Returns `Ok(false)` without touching the bus when the guard fails.
    pub async fn energize_if(
        &self,
        channel: ChannelId,
        guard: impl FnOnce() -> bool,
    ) -> Result<bool, BusError> {
        if channel.kind != ChannelKind::Relay {
            return Err(BusError::InvalidChannel);
        }
        let mut bank = self.acquire().await?;
        if !guard() {
            return Ok(false);
        }
        bank.write(channel, self.channels.relay.level_for(true))?;
        Ok(true)
    }

    /// De-energize every relay of every pair in one transaction
    pub async fn release_all(&self) -> Result<(), BusError> {
        let idle = self.channels.relay.inactive_level();
        self.acquire().await?.write_all_relays(idle)
    }
}
