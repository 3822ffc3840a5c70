//! Blocking I2C master for RP2040
//!
//! The PCF8574 expanders are polled with single-byte transfers, so the
//! blocking driver is used; transactions are serialized by the sequencer's
//! bus arbiter rather than by the peripheral.

use embassy_rp::i2c::{AbortReason, Blocking, Error, I2c, Instance};

use tarczownix_hal::{I2cBus, I2cError};

/// RP2040 I2C controller wrapper
pub struct Rp2040I2c<'d, T: Instance> {
    i2c: I2c<'d, T, Blocking>,
}

impl<'d, T: Instance> Rp2040I2c<'d, T> {
    /// Wrap an already-configured blocking I2C controller
    pub fn new(i2c: I2c<'d, T, Blocking>) -> Self {
        Self { i2c }
    }
}

fn map_error(e: Error) -> I2cError {
    match e {
        Error::Abort(AbortReason::NoAcknowledge) => I2cError::Nack,
        Error::Abort(AbortReason::ArbitrationLoss) => I2cError::ArbitrationLost,
        Error::AddressOutOfRange(_) | Error::AddressReserved(_) => I2cError::Nack,
        _ => I2cError::Bus,
    }
}

impl<'d, T: Instance> I2cBus for Rp2040I2c<'d, T> {
    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), I2cError> {
        self.i2c.blocking_write(address, data).map_err(map_error)
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), I2cError> {
        self.i2c.blocking_read(address, buf).map_err(map_error)
    }
}
