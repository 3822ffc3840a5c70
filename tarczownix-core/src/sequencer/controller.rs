//! Pair controller
//!
//! One controller per pair, ticked from its own task at the poll interval.
//! A tick samples both of the pair's sensors, then advances the pair by at
//! most one activation. Bus writes happen first; the matching state change
//! is committed only once the write is confirmed, and only if the run epoch
//! has not moved in the meantime.

use embassy_sync::blocking_mutex::raw::RawMutex;
use rand::RngCore;

use super::supervisor::Supervisor;
use crate::bus::BusArbiter;
use crate::channel::{ChannelId, Role};
use crate::state::{PairEvent, PairPhase, PairState};
use crate::traits::{BusError, ChannelBank};

/// Phase change made by one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PhaseChange {
    pub pair: u8,
    pub event: PairEvent,
    /// Phase after the change
    pub phase: PairPhase,
    pub role: Role,
    /// Dwell drawn on a trigger
    pub dwell_ms: Option<u32>,
}

/// Drives one relay pair
pub struct PairController<R> {
    index: u8,
    rng: R,
}

impl<R: RngCore> PairController<R> {
    pub fn new(index: u8, rng: R) -> Self {
        Self { index, rng }
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    /// Run one poll cycle
    ///
    /// A bus error aborts the cycle with the pair state unchanged; the
    /// same step is retried on the next tick.
    pub async fn tick<M: RawMutex, BM: RawMutex, B: ChannelBank>(
        &mut self,
        sup: &Supervisor<M>,
        bus: &BusArbiter<BM, B>,
        now_ms: u64,
    ) -> Result<Option<PhaseChange>, BusError> {
        let sampled = self.sample_sensors(sup, bus, now_ms).await;
        let change = self.step(sup, bus, now_ms).await?;
        match sampled {
            Err(e) if change.is_none() => Err(e),
            _ => Ok(change),
        }
    }

    async fn sample_sensors<M: RawMutex, BM: RawMutex, B: ChannelBank>(
        &self,
        sup: &Supervisor<M>,
        bus: &BusArbiter<BM, B>,
        now_ms: u64,
    ) -> Result<(), BusError> {
        for role in Role::ALL {
            let sensor = ChannelId::sensor(self.index, role);
            let raw = bus.read(sensor).await?;
            sup.sample_sensor(sensor, raw, now_ms);
        }
        Ok(())
    }

    async fn step<M: RawMutex, BM: RawMutex, B: ChannelBank>(
        &mut self,
        sup: &Supervisor<M>,
        bus: &BusArbiter<BM, B>,
        now_ms: u64,
    ) -> Result<Option<PhaseChange>, BusError> {
        let Some(mut state) = sup.pair(self.index) else {
            return Err(BusError::InvalidChannel);
        };
        let epoch = sup.epoch();

        if !sup.is_enabled() {
            if !state.phase.is_running() && state.energized.is_none() {
                return Ok(None);
            }
            self.release_both(bus).await?;
            sup.reset_pair(self.index);
            return Ok(Some(self.change(PairEvent::Disable, PairPhase::Inactive, state.role)));
        }

        if state.epoch != epoch {
            // New run: whatever this pair had on (or was jogged on) goes off
            self.release_both(bus).await?;
            if !sup.restart_pair(self.index, epoch) {
                return Ok(None);
            }
            match sup.pair(self.index) {
                Some(restarted) => state = restarted,
                None => return Ok(None),
            }
        }

        match state.phase {
            PairPhase::Inactive => {
                sup.update_pair(self.index, epoch, |s, _| s.apply(PairEvent::Enable));
                Ok(None)
            }
            PairPhase::Activating => self.activate(sup, bus, &state, epoch, now_ms).await,
            PairPhase::AwaitingTrigger => self.await_trigger(sup, bus, &state, epoch, now_ms).await,
            PairPhase::Dwelling => {
                let elapsed = state.dwell_deadline_ms.map_or(true, |d| now_ms >= d);
                if !elapsed {
                    return Ok(None);
                }
                let role = state.role.opposite();
                let committed = sup.update_pair(self.index, epoch, |s, _| {
                    s.apply(PairEvent::DwellElapsed);
                    s.role = role;
                });
                if !committed {
                    return Ok(None);
                }
                match sup.pair(self.index) {
                    Some(next) => self.activate(sup, bus, &next, epoch, now_ms).await,
                    None => Ok(None),
                }
            }
        }
    }

    async fn activate<M: RawMutex, BM: RawMutex, B: ChannelBank>(
        &mut self,
        sup: &Supervisor<M>,
        bus: &BusArbiter<BM, B>,
        state: &PairState,
        epoch: u32,
        now_ms: u64,
    ) -> Result<Option<PhaseChange>, BusError> {
        let role = state.role;
        bus.de_energize(ChannelId::relay(self.index, role.opposite()))
            .await?;

        let relay = ChannelId::relay(self.index, role);
        let confirmed = bus
            .energize_if(relay, || sup.is_enabled() && sup.epoch() == epoch)
            .await?;
        if !confirmed {
            return Ok(None);
        }

        let pair = self.index;
        let deadline = now_ms + u64::from(sup.config().trigger_timeout_ms);
        let committed = sup.update_pair(pair, epoch, |s, watchdog| {
            s.apply(PairEvent::EnergizeConfirmed);
            s.energized = Some(role);
            s.activated_at_ms = Some(now_ms);
            s.trigger_deadline_ms = Some(deadline);
            watchdog.register(pair, deadline);
        });

        Ok(committed.then(|| {
            self.change(PairEvent::EnergizeConfirmed, PairPhase::AwaitingTrigger, role)
        }))
    }

    async fn await_trigger<M: RawMutex, BM: RawMutex, B: ChannelBank>(
        &mut self,
        sup: &Supervisor<M>,
        bus: &BusArbiter<BM, B>,
        state: &PairState,
        epoch: u32,
        now_ms: u64,
    ) -> Result<Option<PhaseChange>, BusError> {
        let role = state.role;
        if !sup.sensor_active(ChannelId::sensor(self.index, role)) {
            return Ok(None);
        }

        bus.de_energize(ChannelId::relay(self.index, role)).await?;

        let delay = sup.delay(self.index).unwrap_or_default();
        let dwell = delay.sample(&mut self.rng);
        let pair = self.index;
        let committed = sup.update_pair(pair, epoch, |s, watchdog| {
            s.apply(PairEvent::TriggerDetected);
            s.energized = None;
            s.dwell_deadline_ms = Some(now_ms + u64::from(dwell));
            s.last_dwell_ms = Some(dwell);
            s.cycles = s.cycles.wrapping_add(1);
            watchdog.cancel(pair);
        });

        Ok(committed.then(|| PhaseChange {
            dwell_ms: Some(dwell),
            ..self.change(PairEvent::TriggerDetected, PairPhase::Dwelling, role)
        }))
    }

    async fn release_both<BM: RawMutex, B: ChannelBank>(
        &self,
        bus: &BusArbiter<BM, B>,
    ) -> Result<(), BusError> {
        for role in Role::ALL {
            bus.de_energize(ChannelId::relay(self.index, role)).await?;
        }
        Ok(())
    }

    fn change(&self, event: PairEvent, phase: PairPhase, role: Role) -> PhaseChange {
        PhaseChange {
            pair: self.index,
            event,
            phase,
            role,
            dwell_ms: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::PAIR_COUNT;
    use crate::config::{DelayConfig, SequencerConfig};
    use crate::safety::{ErrorKind, ErrorRecord};
    use crate::testing::{MockBank, TestMutex};
    use embassy_futures::block_on;
    use embassy_time::Duration;
    use proptest::prelude::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::rc::Rc;

    const TICK: u64 = 10;

    struct Rig {
        sup: Rc<Supervisor<TestMutex>>,
        bus: BusArbiter<TestMutex, MockBank>,
        bank: MockBank,
        controllers: Vec<PairController<SmallRng>>,
    }

    impl Rig {
        fn new(config: SequencerConfig, delays: [DelayConfig; PAIR_COUNT], pairs: &[u8]) -> Self {
            let bank = MockBank::new();
            let bus = BusArbiter::new(bank.clone(), config.channels, Duration::from_millis(5));
            block_on(bus.init()).unwrap();
            Self {
                sup: Rc::new(Supervisor::new(config, delays)),
                bus,
                bank,
                controllers: pairs
                    .iter()
                    .map(|&p| PairController::new(p, SmallRng::seed_from_u64(u64::from(p) + 1)))
                    .collect(),
            }
        }

        fn tick(&mut self, now: u64) {
            for controller in self.controllers.iter_mut() {
                let _ = block_on(controller.tick(&*self.sup, &self.bus, now));
            }
            self.sup.check_timeouts(now);
            let _ = block_on(self.sup.release_if_pending(&self.bus));
        }

        fn phase(&self, pair: u8) -> PairPhase {
            self.sup.pair(pair).unwrap().phase
        }
    }

    fn default_rig(pairs: &[u8]) -> Rig {
        Rig::new(SequencerConfig::new(), [DelayConfig::DEFAULT; PAIR_COUNT], pairs)
    }

    #[test]
    fn test_disabled_controller_stays_idle() {
        let mut rig = default_rig(&[0, 1, 2]);
        rig.tick(0);
        rig.tick(10);
        assert_eq!(rig.bank.energized_relays(), 0);
        assert_eq!(rig.phase(0), PairPhase::Inactive);
    }

    #[test]
    fn test_start_energizes_role_a() {
        let mut rig = default_rig(&[0, 1, 2]);
        rig.sup.start();
        rig.tick(0);
        for pair in 0..PAIR_COUNT as u8 {
            assert!(rig.bank.relay_on(pair, Role::A));
            assert!(!rig.bank.relay_on(pair, Role::B));
            let state = rig.sup.pair(pair).unwrap();
            assert_eq!(state.phase, PairPhase::AwaitingTrigger);
            assert_eq!(state.energized, Some(Role::A));
            assert_eq!(state.trigger_deadline_ms, Some(30_000));
        }
    }

    #[test]
    fn test_trigger_then_dwell_then_opposite_role() {
        let mut rig = default_rig(&[0]);
        rig.sup.start();
        rig.tick(0);
        assert!(rig.bank.relay_on(0, Role::A));

        let mut now = 0;
        let mut released_at = None;
        while released_at.is_none() && now < 1_000 {
            now += TICK;
            if now == 200 {
                rig.bank.set_sensor(0, Role::A, true);
            }
            rig.tick(now);
            if !rig.bank.relay_on(0, Role::A) {
                released_at = Some(now);
            }
        }
        // Sensor seen at 200 ms, stable after the 100 ms window, off the same tick
        assert_eq!(released_at, Some(300));
        let state = rig.sup.pair(0).unwrap();
        assert_eq!(state.phase, PairPhase::Dwelling);
        let dwell = u64::from(state.last_dwell_ms.unwrap());
        assert!((1_000..5_000).contains(&dwell));

        let mut energized_at = None;
        while energized_at.is_none() && now < 10_000 {
            now += TICK;
            rig.tick(now);
            if rig.bank.relay_on(0, Role::B) {
                energized_at = Some(now);
            }
        }
        let energized_at = energized_at.unwrap();
        assert!(energized_at >= 300 + dwell);
        assert!(energized_at < 300 + dwell + TICK);
        assert!(!rig.bank.relay_on(0, Role::A));
        assert_eq!(rig.sup.pair(0).unwrap().cycles, 1);
        assert_eq!(rig.sup.last_error(), None);
        assert!(!rig.bank.interlock_violated());
    }

    #[test]
    fn test_missing_trigger_forces_emergency_stop() {
        let config = SequencerConfig::new().with_trigger_timeout(500);
        let delays = [DelayConfig::new(100, 101).unwrap(); PAIR_COUNT];
        let mut rig = Rig::new(config, delays, &[0, 1, 2]);
        // Pairs 1 and 2 get their A trigger and move on to role B
        rig.bank.set_sensor(1, Role::A, true);
        rig.bank.set_sensor(2, Role::A, true);
        rig.sup.start();

        let mut now = 0;
        while now < 500 {
            rig.tick(now);
            assert!(rig.sup.is_enabled());
            now += TICK;
        }
        assert!(rig.bank.relay_on(0, Role::A));
        for pair in [1, 2] {
            assert!(rig.bank.relay_on(pair, Role::B));
            assert!(!rig.bank.relay_on(pair, Role::A));
            assert_eq!(rig.phase(pair), PairPhase::AwaitingTrigger);
        }
        assert_eq!(rig.bank.energized_relays(), 3);

        // Pair 0 misses its trigger; the trip takes every pair down
        rig.tick(500);
        assert!(!rig.sup.is_enabled());
        assert_eq!(rig.bank.energized_relays(), 0);
        let error = rig.sup.last_error().unwrap();
        assert_eq!(error.pair, Some(0));
        assert_eq!(error.kind, ErrorKind::TriggerTimeout);
        for pair in 0..PAIR_COUNT as u8 {
            assert_eq!(rig.phase(pair), PairPhase::Inactive);
            assert_eq!(rig.sup.pair(pair).unwrap().energized, None);
        }

        // Nothing comes back on while stopped
        rig.tick(510);
        assert_eq!(rig.bank.energized_relays(), 0);
        assert!(!rig.bank.interlock_violated());
    }

    #[test]
    fn test_stop_releases_within_one_tick() {
        let mut rig = default_rig(&[0, 1, 2]);
        rig.sup.start();
        rig.tick(0);
        assert_eq!(rig.bank.energized_relays(), PAIR_COUNT);

        rig.sup.stop();
        rig.tick(TICK);
        assert_eq!(rig.bank.energized_relays(), 0);
        for pair in 0..PAIR_COUNT as u8 {
            assert_eq!(rig.phase(pair), PairPhase::Inactive);
        }
    }

    // After a start, pair 0's first tick makes four relay writes: both
    // relays off, then the partner (B) off again, then A on.

    #[test]
    fn test_stop_before_energize_blocks_the_write() {
        let mut rig = default_rig(&[0]);
        rig.sup.start();
        let sup = rig.sup.clone();
        rig.bank.on_write(3, move || sup.stop());

        let change = block_on(rig.controllers[0].tick(&*rig.sup, &rig.bus, 0)).unwrap();
        assert_eq!(change, None);
        assert_eq!(rig.bank.write_count(), 3);
        assert_eq!(rig.bank.energized_relays(), 0);
        let state = rig.sup.pair(0).unwrap();
        assert_eq!(state.energized, None);
        assert_eq!(state.trigger_deadline_ms, None);
        assert_eq!(rig.sup.check_timeouts(60_000), None);

        rig.tick(TICK);
        assert_eq!(rig.phase(0), PairPhase::Inactive);
        assert_eq!(rig.bank.energized_relays(), 0);
    }

    #[test]
    fn test_stop_after_energize_is_released_next_tick() {
        let mut rig = default_rig(&[0]);
        rig.sup.start();
        let sup = rig.sup.clone();
        rig.bank.on_write(4, move || sup.stop());

        let change = block_on(rig.controllers[0].tick(&*rig.sup, &rig.bus, 0)).unwrap();
        assert_eq!(change, None);
        // The write went out but the commit was refused
        assert!(rig.bank.relay_on(0, Role::A));
        let state = rig.sup.pair(0).unwrap();
        assert_eq!(state.phase, PairPhase::Activating);
        assert_eq!(state.energized, None);
        assert_eq!(state.trigger_deadline_ms, None);
        assert_eq!(rig.sup.check_timeouts(60_000), None);

        let change = block_on(rig.controllers[0].tick(&*rig.sup, &rig.bus, TICK)).unwrap();
        assert_eq!(change.map(|c| c.event), Some(PairEvent::Disable));
        assert_eq!(rig.bank.energized_relays(), 0);
        let state = rig.sup.pair(0).unwrap();
        assert_eq!(state.phase, PairPhase::Inactive);
        assert_eq!(state.energized, None);
        assert_eq!(rig.sup.last_error(), None);
    }

    #[test]
    fn test_emergency_stop_after_energize_releases_everything() {
        let mut rig = default_rig(&[0]);
        rig.sup.start();
        let sup = rig.sup.clone();
        rig.bank.on_write(4, move || {
            sup.emergency_stop(ErrorRecord::trigger_timeout(1, 0));
        });

        let change = block_on(rig.controllers[0].tick(&*rig.sup, &rig.bus, 0)).unwrap();
        assert_eq!(change, None);
        assert!(rig.bank.relay_on(0, Role::A));
        assert!(rig.sup.release_pending());
        assert_eq!(rig.sup.pair(0).unwrap().energized, None);

        assert_eq!(block_on(rig.sup.release_if_pending(&rig.bus)), Ok(true));
        assert_eq!(rig.bank.energized_relays(), 0);
        assert!(!rig.sup.release_pending());

        rig.tick(TICK);
        assert_eq!(rig.bank.energized_relays(), 0);
        assert_eq!(rig.phase(0), PairPhase::Inactive);
        assert_eq!(rig.sup.last_error().and_then(|e| e.pair), Some(1));
    }

    #[test]
    fn test_failed_write_leaves_state_unchanged() {
        let mut rig = default_rig(&[0]);
        rig.sup.start();
        rig.bank.fail_writes(true);

        let result = block_on(rig.controllers[0].tick(&*rig.sup, &rig.bus, 0));
        assert_eq!(result, Err(BusError::Io));
        let state = rig.sup.pair(0).unwrap();
        assert_eq!(state.phase, PairPhase::Inactive);
        assert_eq!(state.energized, None);

        rig.bank.fail_writes(false);
        let change = block_on(rig.controllers[0].tick(&*rig.sup, &rig.bus, TICK)).unwrap();
        assert_eq!(change.map(|c| c.phase), Some(PairPhase::AwaitingTrigger));
        assert!(rig.bank.relay_on(0, Role::A));
    }

    #[test]
    fn test_restart_after_error_resumes_role_a() {
        let config = SequencerConfig::new().with_trigger_timeout(5_000);
        let delays = [DelayConfig::new(100, 101).unwrap(); PAIR_COUNT];
        let mut rig = Rig::new(config, delays, &[0]);
        rig.sup.start();
        rig.bank.set_sensor(0, Role::A, true);

        let mut now = 0;
        while rig.sup.pair(0).unwrap().role != Role::B {
            rig.tick(now);
            now += TICK;
        }
        assert!(rig.bank.relay_on(0, Role::B));

        // Sensor B never asserts
        while rig.sup.is_enabled() {
            rig.tick(now);
            now += TICK;
        }
        assert_eq!(rig.sup.clear_error().and_then(|e| e.pair), Some(0));
        rig.bank.set_sensor(0, Role::A, false);

        rig.sup.start();
        rig.tick(now);
        let state = rig.sup.pair(0).unwrap();
        assert_eq!(state.role, Role::A);
        assert_eq!(state.phase, PairPhase::AwaitingTrigger);
        assert!(rig.bank.relay_on(0, Role::A));
        assert!(!rig.bank.relay_on(0, Role::B));
    }

    #[test]
    fn test_start_releases_jogged_relays() {
        let mut rig = default_rig(&[0]);
        rig.bank.set_relay_raw(ChannelId::relay(0, Role::B).line(), crate::channel::Level::Low);
        rig.sup.start();
        rig.tick(0);
        assert!(rig.bank.relay_on(0, Role::A));
        assert!(!rig.bank.relay_on(0, Role::B));
    }

    #[test]
    fn test_sensor_read_failure_reported() {
        let mut rig = default_rig(&[0]);
        rig.bank.fail_reads(true);
        let result = block_on(rig.controllers[0].tick(&*rig.sup, &rig.bus, 0));
        assert_eq!(result, Err(BusError::Io));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// No schedule of sensor edges, stops and starts ever energizes
        /// both relays of a pair
        #[test]
        fn prop_relay_interlock_holds(
            steps in prop::collection::vec((any::<u8>(), 0u8..40), 1..400),
        ) {
            let config = SequencerConfig::new()
                .with_debounce(20)
                .with_trigger_timeout(400);
            let delays = [DelayConfig::new(100, 200).unwrap(); PAIR_COUNT];
            let mut rig = Rig::new(config, delays, &[0, 1, 2]);
            rig.sup.start();

            for (i, (sensors, action)) in steps.into_iter().enumerate() {
                for line in 0..6u8 {
                    let pair = line / 2;
                    let role = if line % 2 == 0 { Role::A } else { Role::B };
                    rig.bank.set_sensor(pair, role, sensors & (1 << line) != 0);
                }
                match action {
                    0 => rig.sup.stop(),
                    1 => {
                        rig.sup.start();
                    }
                    2 => {
                        rig.sup.clear_error();
                    }
                    _ => {}
                }
                rig.tick(i as u64 * TICK);
                prop_assert!(!rig.bank.interlock_violated());
                if !rig.sup.is_enabled() && action == 0 {
                    prop_assert_eq!(rig.bank.energized_relays(), 0);
                }
            }
        }
    }
}
