//! Relay pair sequencing
//!
//! The [`Supervisor`] holds the shared run state; one [`PairController`]
//! per pair advances that pair's cycle against the bus.

pub mod controller;
pub mod status;
pub mod supervisor;

pub use controller::{PairController, PhaseChange};
pub use status::{ChannelStatus, PairStatus, StatusReport};
pub use supervisor::Supervisor;
