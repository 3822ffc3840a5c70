//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in tarczownix-core for the relay board hardware:
//!
//! - PCF8574 I²C port expander
//! - Two-expander channel bank (relays + sensors)

#![no_std]
#![deny(unsafe_code)]

pub mod expander;
