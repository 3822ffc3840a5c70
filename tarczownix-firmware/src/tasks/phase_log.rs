//! Phase change log task

use defmt::*;

use crate::channels::PHASE_EVENTS;

/// Drains [`PHASE_EVENTS`] into the log
#[embassy_executor::task]
pub async fn phase_log_task() {
    info!("Phase log task started");

    loop {
        let change = PHASE_EVENTS.receive().await;
        match change.dwell_ms {
            Some(dwell) => info!(
                "Pair {}: {:?} -> {} (role {:?}, dwell {} ms)",
                change.pair,
                change.event,
                change.phase.name(),
                change.role,
                dwell
            ),
            None => info!(
                "Pair {}: {:?} -> {} (role {:?})",
                change.pair,
                change.event,
                change.phase.name(),
                change.role
            ),
        }
    }
}
