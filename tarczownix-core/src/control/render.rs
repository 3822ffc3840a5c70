//! Console text for replies and errors

use core::fmt::{self, Write};

use super::command::{ParseError, HELP};
use super::execute::{ControlError, Reply};
use super::line::LineError;
use crate::channel::{Level, Role};
use crate::config::{ConfigError, DelayError};
use crate::safety::ErrorRecord;
use crate::sequencer::StatusReport;

fn role_name(role: Option<Role>) -> &'static str {
    match role {
        Some(Role::A) => "A",
        Some(Role::B) => "B",
        None => "-",
    }
}

fn level_digit(level: Level) -> char {
    if level.is_high() {
        '1'
    } else {
        '0'
    }
}

fn write_error_record<W: Write>(out: &mut W, record: &ErrorRecord) -> fmt::Result {
    write!(out, "{}", record.kind.name())?;
    if let Some(pair) = record.pair {
        write!(out, " pair {}", pair)?;
    }
    write!(out, " at {} ms", record.at_ms)
}

/// Write a status report, one item per line
pub fn write_status<W: Write>(out: &mut W, report: &StatusReport) -> fmt::Result {
    writeln!(
        out,
        "State: {}",
        if report.enabled { "RUNNING" } else { "STOPPED" }
    )?;

    for (idx, pair) in report.pairs.iter().enumerate() {
        write!(
            out,
            "Pair {}: {} role={} energized={} delay={}..{} cycles={}",
            idx,
            pair.phase.name(),
            role_name(pair.active_role),
            role_name(pair.energized),
            pair.delay.min_ms(),
            pair.delay.max_ms(),
            pair.cycles,
        )?;
        if let Some(dwell) = pair.last_dwell_ms {
            write!(out, " last_dwell={}", dwell)?;
        }
        writeln!(out)?;
    }

    out.write_str("Inputs (raw):")?;
    for sensor in report.sensors.iter() {
        write!(out, " {}", level_digit(sensor.raw))?;
    }
    out.write_str("\nInputs (debounced):")?;
    for sensor in report.sensors.iter() {
        write!(out, " {}", level_digit(sensor.debounced))?;
    }

    out.write_str("\nRelays:")?;
    match report.relays {
        Some(relays) => {
            for on in relays {
                out.write_str(if on { " ON" } else { " OFF" })?;
            }
        }
        None => out.write_str(" read failed")?,
    }

    out.write_str("\nError: ")?;
    match &report.last_error {
        Some(record) => write_error_record(out, record)?,
        None => out.write_str("none")?,
    }
    if report.release_pending {
        out.write_str(" (relay release pending)")?;
    }
    writeln!(out)
}

/// Write the reply to a successful command
pub fn write_reply<W: Write>(out: &mut W, reply: &Reply) -> fmt::Result {
    match reply {
        Reply::Started => writeln!(out, "OK: sequence started"),
        Reply::Stopped => writeln!(out, "OK: sequence stopped"),
        Reply::Status(report) => write_status(out, report),
        Reply::DelaySet { pair, delay } => writeln!(
            out,
            "OK: pair {} delay {}..{} ms",
            pair,
            delay.min_ms(),
            delay.max_ms()
        ),
        Reply::ErrorCleared(Some(record)) => {
            out.write_str("OK: cleared ")?;
            write_error_record(out, record)?;
            writeln!(out)
        }
        Reply::ErrorCleared(None) => writeln!(out, "OK: no error to clear"),
        Reply::Help => {
            writeln!(out, "Available commands:")?;
            for (usage, description) in HELP {
                writeln!(out, "  {:<26}{}", usage, description)?;
            }
            Ok(())
        }
        Reply::Delays(delays) => {
            for (idx, delay) in delays.iter().enumerate() {
                writeln!(
                    out,
                    "Pair {}: {}..{} ms",
                    idx,
                    delay.min_ms(),
                    delay.max_ms()
                )?;
            }
            Ok(())
        }
        Reply::Toggled { relay, on } => writeln!(
            out,
            "ACTION: relay {} {}",
            relay,
            if *on { "ON" } else { "OFF" }
        ),
    }
}

fn delay_reason(e: DelayError) -> &'static str {
    match e {
        DelayError::MinTooSmall => "min must be at least 100 ms",
        DelayError::MaxTooLarge => "max must be at most 20000 ms",
        DelayError::NotOrdered => "min must be below max",
        DelayError::UnknownPair => "no such pair",
    }
}

/// Write a command failure
pub fn write_error<W: Write>(out: &mut W, error: &ControlError) -> fmt::Result {
    out.write_str("ERROR: ")?;
    match error {
        ControlError::Parse(ParseError::Empty) => out.write_str("empty command")?,
        ControlError::Parse(ParseError::UnknownCommand) => {
            out.write_str("unknown command, type 'help'")?
        }
        ControlError::Parse(ParseError::MissingArgument) => out.write_str("missing argument")?,
        ControlError::Parse(ParseError::InvalidNumber) => out.write_str("invalid number")?,
        ControlError::Parse(ParseError::TrailingInput) => out.write_str("too many arguments")?,
        ControlError::Delay(e) | ControlError::Config(ConfigError::Invalid(e)) => {
            out.write_str(delay_reason(*e))?
        }
        ControlError::Config(e) => write!(out, "could not save delay ({:?})", e)?,
        ControlError::Bus(e) => write!(out, "bus failure ({:?})", e)?,
        ControlError::UnknownRelay => out.write_str("relay must be 0-5")?,
        ControlError::SequenceRunning => out.write_str("stop the sequence first")?,
    }
    writeln!(out)
}

/// Write a console line assembly failure
pub fn write_line_error<W: Write>(out: &mut W, error: &LineError) -> fmt::Result {
    match error {
        LineError::TooLong => writeln!(out, "ERROR: line too long"),
        LineError::InvalidUtf8 => writeln!(out, "ERROR: invalid characters"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::PAIR_COUNT;
    use crate::config::{DelayConfig, SequencerConfig};
    use crate::sequencer::Supervisor;
    use crate::testing::TestMutex;
    use std::string::String;

    fn render(f: impl FnOnce(&mut String) -> fmt::Result) -> String {
        let mut out = String::new();
        f(&mut out).unwrap();
        out
    }

    #[test]
    fn test_status_layout() {
        let sup: Supervisor<TestMutex> =
            Supervisor::new(SequencerConfig::new(), [DelayConfig::DEFAULT; PAIR_COUNT]);
        sup.emergency_stop(ErrorRecord::trigger_timeout(2, 1500));
        let mut report = sup.snapshot();
        report.relays = Some([false, true, false, false, false, false]);

        let text = render(|out| write_status(out, &report));
        let lines: std::vec::Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "State: STOPPED");
        assert_eq!(
            lines[1],
            "Pair 0: INACTIVE role=- energized=- delay=1000..5000 cycles=0"
        );
        assert_eq!(lines[4], "Inputs (raw): 1 1 1 1 1 1");
        assert_eq!(lines[6], "Relays: OFF ON OFF OFF OFF OFF");
        assert_eq!(
            lines[7],
            "Error: TRIGGER_TIMEOUT pair 2 at 1500 ms (relay release pending)"
        );
    }

    #[test]
    fn test_reply_text() {
        let delay = DelayConfig::new(700, 3000).unwrap();
        assert_eq!(
            render(|out| write_reply(out, &Reply::DelaySet { pair: 2, delay })),
            "OK: pair 2 delay 700..3000 ms\n"
        );
        assert_eq!(
            render(|out| write_reply(out, &Reply::Toggled { relay: 4, on: false })),
            "ACTION: relay 4 OFF\n"
        );
        let help = render(|out| write_reply(out, &Reply::Help));
        assert_eq!(help.lines().count(), HELP.len() + 1);
    }

    #[test]
    fn test_error_text() {
        assert_eq!(
            render(|out| write_error(out, &ControlError::Parse(ParseError::UnknownCommand))),
            "ERROR: unknown command, type 'help'\n"
        );
        assert_eq!(
            render(|out| write_error(out, &ControlError::Delay(DelayError::NotOrdered))),
            "ERROR: min must be below max\n"
        );
    }
}
