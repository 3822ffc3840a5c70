//! Sequencer supervisor
//!
//! Owns everything the pair controllers, the watchdog and the control
//! surface share: the enabled flag, the run epoch, per-pair state, dwell
//! bounds, debounce records, watchdog deadlines and the last error.
//!
//! `enabled` and `epoch` are atomics readable from inside a bus critical
//! section. Everything else sits behind a blocking mutex that is never
//! held across an `.await`. Every start, stop and emergency stop bumps the
//! epoch inside that mutex; controller commits carry the epoch they were
//! computed under and are dropped when it is stale.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use portable_atomic::{AtomicBool, AtomicU32, Ordering};

use super::status::{ChannelStatus, PairStatus, StatusReport};
use crate::bus::BusArbiter;
use crate::channel::{ChannelId, ChannelKind, Level, GROUP_WIDTH, PAIR_COUNT};
use crate::config::{DelayConfig, DelayError, SequencerConfig};
use crate::input::DebounceFilter;
use crate::safety::{ErrorRecord, TimeoutWatchdog};
use crate::state::{PairPhase, PairState};
use crate::traits::{BusError, ChannelBank};

struct Shared {
    pairs: [PairState; PAIR_COUNT],
    delays: [DelayConfig; PAIR_COUNT],
    debounce: DebounceFilter<GROUP_WIDTH>,
    watchdog: TimeoutWatchdog,
    last_error: Option<ErrorRecord>,
}

/// Shared sequencer state and its mutation entry points
pub struct Supervisor<M: RawMutex> {
    config: SequencerConfig,
    enabled: AtomicBool,
    epoch: AtomicU32,
    release_pending: AtomicBool,
    shared: Mutex<M, RefCell<Shared>>,
}

impl<M: RawMutex> Supervisor<M> {
    /// Create a stopped supervisor with the given dwell bounds
    pub fn new(config: SequencerConfig, delays: [DelayConfig; PAIR_COUNT]) -> Self {
        Self {
            config,
            enabled: AtomicBool::new(false),
            epoch: AtomicU32::new(0),
            release_pending: AtomicBool::new(false),
            shared: Mutex::new(RefCell::new(Shared {
                pairs: [PairState::new(); PAIR_COUNT],
                delays,
                debounce: DebounceFilter::new(config.debounce_ms, config.channels.sensor),
                watchdog: TimeoutWatchdog::new(),
                last_error: None,
            })),
        }
    }

    fn with_shared<R>(&self, f: impl FnOnce(&mut Shared) -> R) -> R {
        self.shared.lock(|cell| f(&mut cell.borrow_mut()))
    }

    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    /// Check if the sequence is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Current run epoch
    pub fn epoch(&self) -> u32 {
        self.epoch.load(Ordering::Acquire)
    }

    /// Enable the sequence
    ///
    /// Every controller notices the new epoch on its next tick, releases
    /// both of its relays and restarts at role A. An existing error record
    /// is left in place.
    pub fn start(&self) -> u32 {
        self.with_shared(|shared| {
            shared.watchdog.cancel_all();
            self.enabled.store(true, Ordering::Release);
            self.epoch.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
        })
    }

    /// Disable the sequence
    ///
    /// Controllers de-energize their relays on their next tick. The error
    /// record is left untouched.
    pub fn stop(&self) {
        self.with_shared(|shared| {
            shared.watchdog.cancel_all();
            self.enabled.store(false, Ordering::Release);
            self.epoch.fetch_add(1, Ordering::AcqRel);
        });
    }

    /// Clear the error record, returning what was cleared
    pub fn clear_error(&self) -> Option<ErrorRecord> {
        self.with_shared(|shared| shared.last_error.take())
    }

    pub fn last_error(&self) -> Option<ErrorRecord> {
        self.with_shared(|shared| shared.last_error)
    }

    /// Record a fatal bus failure (boot bring-up)
    pub fn record_bus_fault(&self, now_ms: u64) {
        self.with_shared(|shared| shared.last_error = Some(ErrorRecord::bus_fault(now_ms)));
    }

    /// Replace a pair's dwell bounds in the running configuration
    pub fn set_delay(&self, pair: u8, delay: DelayConfig) -> Result<(), DelayError> {
        self.with_shared(|shared| {
            let slot = shared
                .delays
                .get_mut(pair as usize)
                .ok_or(DelayError::UnknownPair)?;
            *slot = delay;
            Ok(())
        })
    }

    pub fn delay(&self, pair: u8) -> Option<DelayConfig> {
        self.with_shared(|shared| shared.delays.get(pair as usize).copied())
    }

    pub fn delays(&self) -> [DelayConfig; PAIR_COUNT] {
        self.with_shared(|shared| shared.delays)
    }

    /// Snapshot of a pair's state
    pub fn pair(&self, pair: u8) -> Option<PairState> {
        self.with_shared(|shared| shared.pairs.get(pair as usize).copied())
    }

    /// Commit a change computed under `epoch`
    ///
    /// The closure runs only while the sequence is enabled and neither the
    /// supervisor nor the pair has moved on to another epoch. Returns
    /// whether it ran.
    pub fn update_pair(
        &self,
        pair: u8,
        epoch: u32,
        f: impl FnOnce(&mut PairState, &mut TimeoutWatchdog),
    ) -> bool {
        self.with_shared(|shared| {
            if !self.is_enabled() || self.epoch() != epoch {
                return false;
            }
            match shared.pairs.get_mut(pair as usize) {
                Some(state) if state.epoch == epoch => {
                    f(state, &mut shared.watchdog);
                    true
                }
                _ => false,
            }
        })
    }

    /// Restart a pair under the current epoch if still enabled
    pub(crate) fn restart_pair(&self, pair: u8, epoch: u32) -> bool {
        self.with_shared(|shared| {
            if !self.is_enabled() || self.epoch() != epoch {
                return false;
            }
            match shared.pairs.get_mut(pair as usize) {
                Some(state) => {
                    state.restart(epoch);
                    true
                }
                None => false,
            }
        })
    }

    /// Force a pair back to idle after its relays were released
    pub(crate) fn reset_pair(&self, pair: u8) {
        self.with_shared(|shared| {
            shared.watchdog.cancel(pair);
            if let Some(state) = shared.pairs.get_mut(pair as usize) {
                state.reset();
            }
        });
    }

    /// Feed a raw sensor sample into the debounce filter
    pub fn sample_sensor(&self, channel: ChannelId, raw: Level, now_ms: u64) -> Option<Level> {
        self.with_shared(|shared| {
            shared
                .debounce
                .sample(channel.line() as usize, raw, now_ms)
        })
    }

    /// Debounced logical state of a sensor
    pub fn sensor_active(&self, channel: ChannelId) -> bool {
        self.with_shared(|shared| shared.debounce.is_active(channel))
    }

    /// Check the watchdog and trip the emergency stop on expiry
    ///
    /// Returns the error record when this check tripped. The relays are
    /// released separately by [`Self::release_if_pending`].
    pub fn check_timeouts(&self, now_ms: u64) -> Option<ErrorRecord> {
        self.with_shared(|shared| {
            let pair = shared.watchdog.check(now_ms)?;
            let record = ErrorRecord::trigger_timeout(pair, now_ms);
            self.trip(shared, record);
            Some(record)
        })
    }

    /// Emergency stop with the given record
    pub fn emergency_stop(&self, record: ErrorRecord) {
        self.with_shared(|shared| self.trip(shared, record));
    }

    fn trip(&self, shared: &mut Shared, record: ErrorRecord) {
        self.enabled.store(false, Ordering::Release);
        self.epoch.fetch_add(1, Ordering::AcqRel);
        for state in shared.pairs.iter_mut() {
            state.reset();
        }
        shared.watchdog.cancel_all();
        shared.last_error = Some(record);
        self.release_pending.store(true, Ordering::Release);
    }

    /// Check if an emergency release still has to reach the relays
    pub fn release_pending(&self) -> bool {
        self.release_pending.load(Ordering::Acquire)
    }

    /// De-energize every relay if an emergency release is pending
    ///
    /// Returns `Ok(true)` when the release went out. On failure the
    /// release stays pending for the next call.
    pub async fn release_if_pending<B: ChannelBank, BM: RawMutex>(
        &self,
        bus: &BusArbiter<BM, B>,
    ) -> Result<bool, BusError> {
        if !self.release_pending() {
            return Ok(false);
        }
        bus.release_all().await?;
        self.release_pending.store(false, Ordering::Release);
        Ok(true)
    }

    /// Status without touching the bus
    pub fn snapshot(&self) -> StatusReport {
        let enabled = self.is_enabled();
        let release_pending = self.release_pending();
        let sensor_polarity = self.config.channels.sensor;

        self.with_shared(|shared| {
            let mut pairs = [PairStatus {
                phase: PairPhase::Inactive,
                active_role: None,
                energized: None,
                delay: DelayConfig::DEFAULT,
                cycles: 0,
                last_dwell_ms: None,
            }; PAIR_COUNT];
            for (slot, (state, delay)) in pairs
                .iter_mut()
                .zip(shared.pairs.iter().zip(shared.delays.iter()))
            {
                *slot = PairStatus {
                    phase: state.phase,
                    active_role: state.active_role(),
                    energized: state.energized,
                    delay: *delay,
                    cycles: state.cycles,
                    last_dwell_ms: state.last_dwell_ms,
                };
            }

            let idle = sensor_polarity.inactive_level();
            let mut sensors = [ChannelStatus {
                raw: idle,
                debounced: idle,
                active: false,
            }; GROUP_WIDTH];
            for (line, slot) in sensors.iter_mut().enumerate() {
                if let Some(record) = shared.debounce.record(line) {
                    *slot = ChannelStatus {
                        raw: record.last_raw,
                        debounced: record.stable,
                        active: sensor_polarity.is_active(record.stable),
                    };
                }
            }

            StatusReport {
                enabled,
                pairs,
                sensors,
                relays: None,
                last_error: shared.last_error,
                release_pending,
            }
        })
    }

    /// Full status, with relay levels read back through the bus
    pub async fn status<B: ChannelBank, BM: RawMutex>(
        &self,
        bus: &BusArbiter<BM, B>,
    ) -> StatusReport {
        let mut report = self.snapshot();
        report.relays = read_relays(bus).await.ok();
        report
    }
}

async fn read_relays<B: ChannelBank, BM: RawMutex>(
    bus: &BusArbiter<BM, B>,
) -> Result<[bool; GROUP_WIDTH], BusError> {
    let polarity = bus.channels().relay;
    let mut relays = [false; GROUP_WIDTH];
    for (line, slot) in relays.iter_mut().enumerate() {
        let channel =
            ChannelId::from_line(ChannelKind::Relay, line as u8).ok_or(BusError::InvalidChannel)?;
        *slot = polarity.is_active(bus.read(channel).await?);
    }
    Ok(relays)
}
