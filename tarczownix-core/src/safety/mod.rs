//! Safety monitoring
//!
//! Trigger timeout tracking and the error record it produces.

pub mod error;
pub mod monitor;

pub use error::{ErrorKind, ErrorRecord};
pub use monitor::TimeoutWatchdog;
