//! PCF8574 8-bit I²C port expander
//!
//! The PCF8574 has no registers: a one-byte write sets all eight
//! quasi-bidirectional pins, a one-byte read returns their levels.
//!
//! # Pin behaviour
//!
//! - Writing 0 drives the pin low (strong sink)
//! - Writing 1 releases the pin to a weak pull-up; the pin can then be
//!   used as an input and pulled low externally
//!
//! Power-on state is all pins high.

use tarczownix_hal::{I2cBus, I2cError};

/// Default address of the relay expander
pub const RELAY_ADDRESS: u8 = 0x24;

/// Default address of the sensor expander
pub const SENSOR_ADDRESS: u8 = 0x22;

/// Port value at power-on: every pin released high
pub const PORT_IDLE: u8 = 0xFF;

/// Set or clear one bit of a port value
pub fn with_pin(port: u8, pin: u8, high: bool) -> u8 {
    let mask = 1u8 << (pin & 0x07);
    if high {
        port | mask
    } else {
        port & !mask
    }
}

/// Level of one pin in a port value
pub fn pin_is_high(port: u8, pin: u8) -> bool {
    port & (1u8 << (pin & 0x07)) != 0
}

/// One PCF8574 on a shared bus
///
/// Keeps a shadow of the last byte successfully written, so single-pin
/// writes leave the other pins as they were.
#[derive(Debug, Clone)]
pub struct Pcf8574 {
    address: u8,
    shadow: u8,
}

impl Pcf8574 {
    /// Create a driver for the expander at `address`
    pub const fn new(address: u8) -> Self {
        Self {
            address,
            shadow: PORT_IDLE,
        }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Last byte successfully written
    pub fn shadow(&self) -> u8 {
        self.shadow
    }

    /// Write the whole port
    ///
    /// The shadow only changes once the expander acknowledged the byte.
    pub fn write_port<I: I2cBus>(&mut self, bus: &mut I, value: u8) -> Result<(), I2cError> {
        bus.write(self.address, &[value])?;
        self.shadow = value;
        Ok(())
    }

    /// Drive one pin, leaving the others at their shadow level
    pub fn write_pin<I: I2cBus>(&mut self, bus: &mut I, pin: u8, high: bool) -> Result<(), I2cError> {
        let value = with_pin(self.shadow, pin, high);
        self.write_port(bus, value)
    }

    /// Read the level of every pin
    pub fn read_port<I: I2cBus>(&self, bus: &mut I) -> Result<u8, I2cError> {
        let mut buf = [0u8; 1];
        bus.read(self.address, &mut buf)?;
        Ok(buf[0])
    }
}
