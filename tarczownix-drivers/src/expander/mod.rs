//! I²C port expanders

pub mod bank;
pub mod pcf8574;

#[cfg(test)]
mod mock;

pub use bank::ExpanderBank;
pub use pcf8574::{Pcf8574, RELAY_ADDRESS, SENSOR_ADDRESS};
