//! Tarczownix - Relay Pair Sequencer Firmware
//!
//! Main firmware binary for the RP2040 relay controller. Three relay pairs
//! on a PCF8574 expander alternate between their two actuators, each step
//! gated by a sensor on a second expander, with randomized dwell pauses
//! and a trigger-timeout watchdog that stops everything on a missed
//! trigger.
//!
//! The sequence boots stopped; `start` on the serial console runs it.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::clocks::RoscRng;
use embassy_rp::i2c::{self, I2c};
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use embassy_time::{Duration, Instant, Timer};
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use tarczownix_core::bus::BusArbiter;
use tarczownix_core::channel::PAIR_COUNT;
use tarczownix_core::config::{DelayConfig, DelayStore, LoadOutcome, SequencerConfig};
use tarczownix_core::sequencer::{PairController, Supervisor};
use tarczownix_drivers::expander::ExpanderBank;
use tarczownix_hal_rp2040::flash::FlashStorage;
use tarczownix_hal_rp2040::i2c::Rp2040I2c;

use crate::board::{Bus, Store, Sup, CONSOLE_BAUD, I2C_FREQUENCY_HZ};

mod board;
mod channels;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

/// Compile-time sequencer configuration
const CONFIG: SequencerConfig = SequencerConfig::new();

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 512]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 128]> = StaticCell::new();

// Shared between every task
static BUS: StaticCell<Bus> = StaticCell::new();
static SUPERVISOR: StaticCell<Sup> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Tarczownix firmware starting...");

    // Initialize RP2040 peripherals
    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // Expander bus on I2C0 (GPIO4 SDA, GPIO5 SCL)
    let mut i2c_config = i2c::Config::default();
    i2c_config.frequency = I2C_FREQUENCY_HZ;
    let i2c = I2c::new_blocking(p.I2C0, p.PIN_5, p.PIN_4, i2c_config);
    let bank = ExpanderBank::new(Rp2040I2c::new(i2c));
    let bus: &'static Bus = BUS.init(BusArbiter::new(
        bank,
        CONFIG.channels,
        Duration::from_millis(CONFIG.bus_lock_timeout_ms as u64),
    ));

    let sup: &'static Sup =
        SUPERVISOR.init(Supervisor::new(CONFIG, [DelayConfig::DEFAULT; PAIR_COUNT]));

    // Relays OFF first, then the sensor pull-ups; nothing runs on a bad bus
    if let Err(e) = bus.init().await {
        sup.record_bus_fault(Instant::now().as_millis());
        error!("Expander bring-up failed: {:?}", e);
        halt().await;
    }
    info!("Expanders initialized, all relays OFF");

    // Dwell bounds from flash, defaults where missing
    let mut store: Store = DelayStore::new(FlashStorage::new(p.FLASH, p.DMA_CH0));
    load_delays(&mut store, sup).await;

    // Serial console on UART0
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = CONSOLE_BAUD;

    let tx_buf = TX_BUF.init([0u8; 512]);
    let rx_buf = RX_BUF.init([0u8; 128]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();

    info!("UART initialized for the console");

    // One controller per pair, each with its own dwell RNG
    let mut seed_source = RoscRng;
    for pair in 0..PAIR_COUNT as u8 {
        let rng = SmallRng::seed_from_u64(seed_source.next_u64());
        spawner
            .spawn(tasks::pair_task(PairController::new(pair, rng), sup, bus))
            .unwrap();
    }
    spawner.spawn(tasks::watchdog_task(sup, bus)).unwrap();
    spawner.spawn(tasks::phase_log_task()).unwrap();
    spawner.spawn(tasks::status_task(sup, bus)).unwrap();
    spawner
        .spawn(tasks::console_task(rx, tx, sup, bus, store))
        .unwrap();

    info!("All tasks spawned, sequence STOPPED until 'start'");

    loop {
        Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}

/// Apply every pair's stored dwell bounds, logging what was used
async fn load_delays(store: &mut Store, sup: &Sup) {
    for (idx, (delay, outcome)) in store.load_all().await.into_iter().enumerate() {
        match outcome {
            LoadOutcome::Stored => info!(
                "Pair {}: delay {}..{} ms from flash",
                idx,
                delay.min_ms(),
                delay.max_ms()
            ),
            LoadOutcome::Missing => info!("Pair {}: no stored delay, using defaults", idx),
            LoadOutcome::Fallback(e) => {
                warn!("Pair {}: stored delay unusable ({:?}), using defaults", idx, e)
            }
        }
        if let Err(e) = sup.set_delay(idx as u8, delay) {
            warn!("Pair {}: delay rejected ({:?})", idx, e);
        }
    }
}

/// Stop here without touching the relays again
async fn halt() -> ! {
    error!("Halted: check the expander wiring and reset");
    loop {
        Timer::after_secs(5).await;
        error!("Halted after bus fault");
    }
}
