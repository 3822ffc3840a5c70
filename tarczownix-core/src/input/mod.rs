//! Sensor input conditioning

pub mod debounce;

pub use debounce::{DebounceFilter, DebounceRecord};
