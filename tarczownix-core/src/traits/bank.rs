//! Channel bank trait
//!
//! A channel bank is the raw hardware behind both channel groups. Every
//! method is exactly one bus transaction; the bank knows nothing about
//! polarity or sequencing.

use tarczownix_hal::I2cError;

use crate::channel::{ChannelId, Level};

/// Errors from bus transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// Bus could not be acquired within the lock bound
    LockTimeout,
    /// Expander did not acknowledge
    Nack,
    /// Lost arbitration on the bus
    ArbitrationLost,
    /// Transaction timed out
    Timeout,
    /// Any other bus fault
    Io,
    /// Channel does not exist on this bank
    InvalidChannel,
}

impl From<I2cError> for BusError {
    fn from(e: I2cError) -> Self {
        match e {
            I2cError::Nack => BusError::Nack,
            I2cError::ArbitrationLost => BusError::ArbitrationLost,
            I2cError::Timeout => BusError::Timeout,
            I2cError::Bus => BusError::Io,
        }
    }
}

/// Raw access to the relay and sensor groups
pub trait ChannelBank {
    /// Bring the bank up: every relay line to `relay_idle`, sensor lines
    /// armed as inputs. Relays are written first.
    fn init(&mut self, relay_idle: Level) -> Result<(), BusError>;

    /// Read the electrical level of a line
    fn read(&mut self, channel: ChannelId) -> Result<Level, BusError>;

    /// Drive a relay line
    fn write(&mut self, channel: ChannelId, level: Level) -> Result<(), BusError>;

    /// Drive every relay line to the same level in one transaction
    fn write_all_relays(&mut self, level: Level) -> Result<(), BusError>;
}
