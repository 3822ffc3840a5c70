//! Hardware abstraction traits
//!
//! These traits define the interface between the sequencer logic
//! and the board-specific expander drivers.

pub mod bank;

pub use bank::{BusError, ChannelBank};
