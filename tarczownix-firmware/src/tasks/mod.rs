//! Embassy async tasks
//!
//! Each task runs independently and shares the bus and supervisor by
//! `'static` reference; phase changes flow to the log over a channel.

pub mod console;
pub mod pair;
pub mod phase_log;
pub mod status;
pub mod watchdog;

pub use console::console_task;
pub use pair::pair_task;
pub use phase_log::phase_log_task;
pub use status::status_task;
pub use watchdog::watchdog_task;
