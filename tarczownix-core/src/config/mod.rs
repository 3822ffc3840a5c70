//! Configuration types
//!
//! Compile-time sequencer timing plus the runtime-configurable,
//! flash-persisted dwell bounds.

pub mod delay;
pub mod persistence;
pub mod types;

pub use delay::{DelayConfig, DelayError, MAX_DWELL_CEILING_MS, MIN_DWELL_FLOOR_MS};
pub use persistence::{ConfigError, DelayStore, LoadOutcome};
pub use types::*;
