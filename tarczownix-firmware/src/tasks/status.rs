//! Periodic status log task

use defmt::*;
use embassy_time::{Duration, Ticker};

use crate::board::{Bus, Sup};

/// Status task - logs a full status snapshot every status interval
#[embassy_executor::task]
pub async fn status_task(sup: &'static Sup, bus: &'static Bus) {
    info!("Status task started");

    let interval = Duration::from_millis(sup.config().status_interval_ms as u64);
    let mut ticker = Ticker::every(interval);

    loop {
        ticker.next().await;

        let report = sup.status(bus).await;
        debug!(
            "State: {}",
            if report.enabled { "RUNNING" } else { "STOPPED" }
        );
        for (idx, pair) in report.pairs.iter().enumerate() {
            debug!(
                "Pair {}: {} role={:?} energized={:?} cycles={}",
                idx,
                pair.phase.name(),
                pair.active_role,
                pair.energized,
                pair.cycles
            );
        }
        debug!("Sensors: {:?}", report.sensors);
        match report.relays {
            Some(relays) => debug!("Relays: {:?}", relays),
            None => warn!("Relay read-back failed"),
        }
        if let Some(err) = report.last_error {
            debug!("Error: {:?}", err);
        }
    }
}
