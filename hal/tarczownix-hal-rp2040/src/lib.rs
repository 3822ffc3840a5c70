//! RP2040-specific HAL for the relay sequencer firmware
//!
//! This crate provides RP2040 implementations of the shared
//! `tarczownix-hal` traits:
//!
//! - Blocking I2C master for the PCF8574 expanders (implements `tarczownix_hal::I2cBus`)
//! - Flash storage driver (implements `tarczownix_hal::FlashStorage`)

#![no_std]

pub mod flash;
pub mod i2c;

// Re-export shared traits from tarczownix-hal for convenience
pub use tarczownix_hal::{FlashStorage as FlashStorageTrait, I2cBus, StorageKey};
