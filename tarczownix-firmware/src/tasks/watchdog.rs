//! Trigger timeout watchdog task
//!
//! Polls the supervisor's deadlines. An expired deadline trips the
//! emergency stop; the relay release is then retried every tick until it
//! reaches the bus.

use defmt::*;
use embassy_time::{Duration, Instant, Ticker};

use crate::board::{Bus, Sup};

/// Watchdog task
#[embassy_executor::task]
pub async fn watchdog_task(sup: &'static Sup, bus: &'static Bus) {
    info!("Watchdog task started");

    let poll = Duration::from_millis(sup.config().poll_interval_ms as u64);
    let mut ticker = Ticker::every(poll);

    loop {
        ticker.next().await;

        let now_ms = Instant::now().as_millis();
        if let Some(record) = sup.check_timeouts(now_ms) {
            error!(
                "EMERGENCY STOP: no trigger on pair {:?} within {} ms",
                record.pair,
                sup.config().trigger_timeout_ms
            );
        }

        match sup.release_if_pending(bus).await {
            Ok(true) => info!("Emergency release: all relays OFF"),
            Ok(false) => {}
            Err(e) => warn!("Emergency release failed: {:?}, retrying", e),
        }
    }
}
