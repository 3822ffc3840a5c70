//! Board-agnostic core logic for the Tarczownix relay pair sequencer
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Channel model and polarity handling
//! - Bus arbitration over the expander bank
//! - Sensor debouncing
//! - Pair state machine, controllers and supervisor
//! - Trigger timeout watchdog
//! - Dwell configuration and its persistence
//! - Operator commands

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod bus;
pub mod channel;
pub mod config;
pub mod control;
pub mod input;
pub mod safety;
pub mod sequencer;
pub mod state;
pub mod traits;

#[cfg(test)]
mod testing;
