//! I2C bus abstractions
//!
//! Blocking I2C master operations. Each call is one complete bus
//! transaction; callers that share the bus are responsible for
//! serializing access (see the core crate's bus arbiter).

/// Errors from I2C transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2cError {
    /// Device did not acknowledge its address or a data byte
    Nack,
    /// Another master won arbitration
    ArbitrationLost,
    /// Transaction did not complete in time
    Timeout,
    /// Any other controller fault
    Bus,
}

/// Blocking I2C master
pub trait I2cBus {
    /// Write `data` to the device at 7-bit `address`
    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), I2cError>;

    /// Fill `buf` from the device at 7-bit `address`
    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), I2cError>;
}
