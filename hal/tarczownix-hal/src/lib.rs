//! Tarczownix Hardware Abstraction Layer
//!
//! This crate defines the hardware abstraction traits the sequencer needs
//! from the board: a blocking I2C master for the relay/sensor expanders and
//! a key-value flash store for the per-pair dwell configuration.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │  tarczownix-core / tarczownix-drivers    │
//! └──────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌──────────────────────────────────────────┐
//! │  tarczownix-hal (this crate - traits)    │
//! └──────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌──────────────────────────────────────────┐
//! │  tarczownix-hal-rp2040                   │
//! └──────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`i2c::I2cBus`] - I2C bus operations
//! - [`flash::FlashStorage`] - Persistent storage

#![no_std]
#![deny(unsafe_code)]

pub mod flash;
pub mod i2c;

// Re-export key traits at crate root for convenience
pub use flash::{FlashError, FlashStorage, StorageKey};
pub use i2c::{I2cBus, I2cError};
