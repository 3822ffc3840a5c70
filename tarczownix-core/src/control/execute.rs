//! Command execution against the supervisor, bus and delay store

use embassy_sync::blocking_mutex::raw::RawMutex;
use tarczownix_hal::FlashStorage;

use super::command::{Command, ParseError};
use crate::bus::BusArbiter;
use crate::channel::{ChannelId, ChannelKind, PAIR_COUNT};
use crate::config::{ConfigError, DelayConfig, DelayError, DelayStore};
use crate::safety::ErrorRecord;
use crate::sequencer::{StatusReport, Supervisor};
use crate::traits::{BusError, ChannelBank};

/// Why a command failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlError {
    Parse(ParseError),
    /// Dwell bounds rejected; the running config is unchanged
    Delay(DelayError),
    /// Dwell bounds could not be persisted; the running config is unchanged
    Config(ConfigError),
    Bus(BusError),
    /// Relay index out of range
    UnknownRelay,
    /// Manual relay control refused while the sequence runs
    SequenceRunning,
}

impl From<ParseError> for ControlError {
    fn from(e: ParseError) -> Self {
        ControlError::Parse(e)
    }
}

impl From<DelayError> for ControlError {
    fn from(e: DelayError) -> Self {
        ControlError::Delay(e)
    }
}

impl From<ConfigError> for ControlError {
    fn from(e: ConfigError) -> Self {
        ControlError::Config(e)
    }
}

impl From<BusError> for ControlError {
    fn from(e: BusError) -> Self {
        ControlError::Bus(e)
    }
}

/// Result of a successful command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reply {
    Started,
    Stopped,
    Status(StatusReport),
    DelaySet { pair: u8, delay: DelayConfig },
    /// Error record that was cleared, if there was one
    ErrorCleared(Option<ErrorRecord>),
    Help,
    Delays([DelayConfig; PAIR_COUNT]),
    Toggled { relay: u8, on: bool },
}

/// Execute one command
///
/// `delay` validates first, persists second and only then updates the
/// running configuration, so a rejected or unpersisted update never takes
/// effect.
pub async fn execute<M, BM, B, S>(
    command: Command,
    sup: &Supervisor<M>,
    bus: &BusArbiter<BM, B>,
    store: &mut DelayStore<S>,
) -> Result<Reply, ControlError>
where
    M: RawMutex,
    BM: RawMutex,
    B: ChannelBank,
    S: FlashStorage,
{
    match command {
        Command::Start => {
            sup.start();
            Ok(Reply::Started)
        }
        Command::Stop => {
            sup.stop();
            Ok(Reply::Stopped)
        }
        Command::Status => Ok(Reply::Status(sup.status(bus).await)),
        Command::SetDelay {
            pair,
            min_ms,
            max_ms,
        } => {
            if pair as usize >= PAIR_COUNT {
                return Err(DelayError::UnknownPair.into());
            }
            let delay = DelayConfig::new(min_ms, max_ms)?;
            store.save(pair, delay).await?;
            sup.set_delay(pair, delay)?;
            Ok(Reply::DelaySet { pair, delay })
        }
        Command::ClearError => Ok(Reply::ErrorCleared(sup.clear_error())),
        Command::Help => Ok(Reply::Help),
        Command::Delays => Ok(Reply::Delays(sup.delays())),
        Command::Toggle { relay } => toggle(relay, sup, bus).await,
    }
}

async fn toggle<M: RawMutex, BM: RawMutex, B: ChannelBank>(
    relay: u8,
    sup: &Supervisor<M>,
    bus: &BusArbiter<BM, B>,
) -> Result<Reply, ControlError> {
    if sup.is_enabled() {
        return Err(ControlError::SequenceRunning);
    }
    let channel =
        ChannelId::from_line(ChannelKind::Relay, relay).ok_or(ControlError::UnknownRelay)?;

    let polarity = bus.channels().relay;
    if polarity.is_active(bus.read(channel).await?) {
        bus.de_energize(channel).await?;
        return Ok(Reply::Toggled { relay, on: false });
    }

    // Partner off first so the pair never has both relays energized
    bus.de_energize(channel.partner()).await?;
    if !bus.energize_if(channel, || !sup.is_enabled()).await? {
        return Err(ControlError::SequenceRunning);
    }
    Ok(Reply::Toggled { relay, on: true })
}
