//! Two-expander channel bank
//!
//! Relays on one PCF8574, sensors on another, both on the same I²C bus.
//! Line `n` of a group is pin `n` of its expander; the two spare pins of
//! each expander are left released high.

use tarczownix_core::channel::{ChannelId, ChannelKind, Level, GROUP_WIDTH};
use tarczownix_core::traits::{BusError, ChannelBank};
use tarczownix_hal::I2cBus;

use super::pcf8574::{pin_is_high, Pcf8574, PORT_IDLE, RELAY_ADDRESS, SENSOR_ADDRESS};

/// Relay and sensor expanders sharing one bus
pub struct ExpanderBank<I> {
    i2c: I,
    relays: Pcf8574,
    sensors: Pcf8574,
}

impl<I: I2cBus> ExpanderBank<I> {
    /// Bank at the board's default addresses
    pub fn new(i2c: I) -> Self {
        Self::with_addresses(i2c, RELAY_ADDRESS, SENSOR_ADDRESS)
    }

    pub fn with_addresses(i2c: I, relay_address: u8, sensor_address: u8) -> Self {
        Self {
            i2c,
            relays: Pcf8574::new(relay_address),
            sensors: Pcf8574::new(sensor_address),
        }
    }

    /// Release the bus
    pub fn into_inner(self) -> I {
        self.i2c
    }

    fn expander(&self, kind: ChannelKind) -> &Pcf8574 {
        match kind {
            ChannelKind::Relay => &self.relays,
            ChannelKind::Sensor => &self.sensors,
        }
    }
}

fn check_line(channel: ChannelId) -> Result<u8, BusError> {
    let line = channel.line();
    if (line as usize) < GROUP_WIDTH {
        Ok(line)
    } else {
        Err(BusError::InvalidChannel)
    }
}

/// Port byte with every relay line at `level` and spare pins released
fn relay_port(level: Level) -> u8 {
    let lines = (1u8 << GROUP_WIDTH) - 1;
    match level {
        Level::High => PORT_IDLE,
        Level::Low => PORT_IDLE & !lines,
    }
}

impl<I: I2cBus> ChannelBank for ExpanderBank<I> {
    fn init(&mut self, relay_idle: Level) -> Result<(), BusError> {
        // Relays first so no output is ever asserted by the bring-up
        self.relays
            .write_port(&mut self.i2c, relay_port(relay_idle))?;
        // Writing ones arms the sensor pins as pulled-up inputs
        self.sensors.write_port(&mut self.i2c, PORT_IDLE)?;
        Ok(())
    }

    fn read(&mut self, channel: ChannelId) -> Result<Level, BusError> {
        let line = check_line(channel)?;
        let expander = self.expander(channel.kind).clone();
        let port = expander.read_port(&mut self.i2c)?;
        Ok(Level::from_high(pin_is_high(port, line)))
    }

    fn write(&mut self, channel: ChannelId, level: Level) -> Result<(), BusError> {
        if channel.kind != ChannelKind::Relay {
            return Err(BusError::InvalidChannel);
        }
        let line = check_line(channel)?;
        self.relays
            .write_pin(&mut self.i2c, line, level.is_high())?;
        Ok(())
    }

    fn write_all_relays(&mut self, level: Level) -> Result<(), BusError> {
        self.relays
            .write_port(&mut self.i2c, relay_port(level))?;
        Ok(())
    }
}
