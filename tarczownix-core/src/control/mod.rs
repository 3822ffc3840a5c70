//! Operator control surface
//!
//! Transport-agnostic: the firmware feeds console bytes through a
//! [`LineBuffer`], parses each line into a [`Command`] and runs it with
//! [`execute`].

pub mod command;
pub mod execute;
pub mod line;
pub mod render;

pub use command::{Command, ParseError, HELP};
pub use execute::{execute, ControlError, Reply};
pub use line::{LineBuffer, LineError, MAX_LINE_LEN};
pub use render::{write_error, write_line_error, write_reply, write_status};
