//! Mock I²C bus with PCF8574 semantics

use heapless::Vec;
use tarczownix_hal::{I2cBus, I2cError};

pub struct MockI2c {
    ports: [(u8, u8); 2],
    nack: Option<u8>,
    writes: Vec<(u8, u8), 32>,
}

impl MockI2c {
    pub fn new() -> Self {
        Self {
            ports: [(0x24, 0xFF), (0x22, 0xFF)],
            nack: None,
            writes: Vec::new(),
        }
    }

    fn slot(&mut self, address: u8) -> Option<&mut u8> {
        self.ports
            .iter_mut()
            .find(|(a, _)| *a == address)
            .map(|(_, v)| v)
    }

    pub fn port(&self, address: u8) -> u8 {
        self.ports
            .iter()
            .find(|(a, _)| *a == address)
            .map_or(0, |&(_, v)| v)
    }

    pub fn set_port(&mut self, address: u8, value: u8) {
        if let Some(slot) = self.slot(address) {
            *slot = value;
        }
    }

    pub fn nack(&mut self, address: u8) {
        self.nack = Some(address);
    }

    pub fn writes(&self) -> &[(u8, u8)] {
        &self.writes
    }
}

impl I2cBus for MockI2c {
    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), I2cError> {
        if self.nack == Some(address) {
            return Err(I2cError::Nack);
        }
        let value = *data.first().ok_or(I2cError::Bus)?;
        let slot = self.slot(address).ok_or(I2cError::Nack)?;
        *slot = value;
        let _ = self.writes.push((address, value));
        Ok(())
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), I2cError> {
        if self.nack == Some(address) {
            return Err(I2cError::Nack);
        }
        if !self.ports.iter().any(|(a, _)| *a == address) {
            return Err(I2cError::Nack);
        }
        buf.fill(self.port(address));
        Ok(())
    }
}
