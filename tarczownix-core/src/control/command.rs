//! Operator commands
//!
//! Commands arrive as text lines. Keywords are case-insensitive and
//! surrounding whitespace is ignored.

/// Parsed operator command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    Start,
    Stop,
    Status,
    /// Replace a pair's dwell bounds (`delay <pair> <min> <max>`)
    SetDelay { pair: u8, min_ms: u32, max_ms: u32 },
    /// Clear the last error record
    ClearError,
    Help,
    /// List every pair's dwell bounds
    Delays,
    /// Jog one relay line while the sequence is stopped
    Toggle { relay: u8 },
}

/// Command line parse errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Blank line
    Empty,
    /// First word is not a known command
    UnknownCommand,
    /// A required argument is missing
    MissingArgument,
    /// An argument is not a decimal number
    InvalidNumber,
    /// More arguments than the command takes
    TrailingInput,
}

/// Command summary for the `help` reply
pub const HELP: &[(&str, &str)] = &[
    ("start", "Start the sequence"),
    ("stop", "Stop any running sequence"),
    ("status", "Show sequencer status"),
    ("delay <pair> <min> <max>", "Set dwell bounds of a pair (ms)"),
    ("delays", "Show dwell bounds of every pair"),
    ("clear", "Clear the last error"),
    ("toggle <relay>", "Toggle a relay (0-5) while stopped"),
    ("help", "Show this help"),
];

impl Command {
    /// Parse one command line
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let mut words = line.split_ascii_whitespace();
        let keyword = words.next().ok_or(ParseError::Empty)?;
        let is = |name: &str| keyword.eq_ignore_ascii_case(name);

        let command = if is("start") {
            Command::Start
        } else if is("stop") {
            Command::Stop
        } else if is("status") {
            Command::Status
        } else if is("delay") || is("setdelay") {
            Command::SetDelay {
                pair: parse_arg(words.next())?,
                min_ms: parse_arg(words.next())?,
                max_ms: parse_arg(words.next())?,
            }
        } else if is("clear") || is("clearerror") {
            Command::ClearError
        } else if is("help") {
            Command::Help
        } else if is("delays") {
            Command::Delays
        } else if is("toggle") {
            Command::Toggle {
                relay: parse_arg(words.next())?,
            }
        } else {
            return Err(ParseError::UnknownCommand);
        };

        if words.next().is_some() {
            return Err(ParseError::TrailingInput);
        }
        Ok(command)
    }
}

fn parse_arg<T: core::str::FromStr>(word: Option<&str>) -> Result<T, ParseError> {
    word.ok_or(ParseError::MissingArgument)?
        .parse()
        .map_err(|_| ParseError::InvalidNumber)
}
