//! Pair controller task
//!
//! One instance per relay pair. Each poll tick samples the pair's sensors
//! and advances its phase machine; bus errors are logged and the same step
//! is retried on the next tick.

use defmt::*;
use embassy_time::{Duration, Instant, Ticker};
use rand::rngs::SmallRng;

use tarczownix_core::channel::PAIR_COUNT;
use tarczownix_core::sequencer::PairController;

use crate::board::{Bus, Sup};
use crate::channels::PHASE_EVENTS;

/// Pair controller task
#[embassy_executor::task(pool_size = PAIR_COUNT)]
pub async fn pair_task(
    mut controller: PairController<SmallRng>,
    sup: &'static Sup,
    bus: &'static Bus,
) {
    let pair = controller.index();
    info!("Pair {} task started", pair);

    let poll = Duration::from_millis(sup.config().poll_interval_ms as u64);
    let mut ticker = Ticker::every(poll);
    let mut failing = false;

    loop {
        ticker.next().await;

        let now_ms = Instant::now().as_millis();
        match controller.tick(sup, bus, now_ms).await {
            Ok(change) => {
                if failing {
                    info!("Pair {}: bus recovered", pair);
                    failing = false;
                }
                if let Some(change) = change {
                    if PHASE_EVENTS.try_send(change).is_err() {
                        trace!("Phase channel full, dropping change");
                    }
                }
            }
            Err(e) => {
                // Only log the first failure of a run of errors
                if !failing {
                    warn!("Pair {}: bus error {:?}, retrying", pair, e);
                    failing = true;
                }
            }
        }
    }
}
