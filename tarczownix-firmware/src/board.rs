//! Board wiring for the Raspberry Pi Pico relay controller
//!
//! - I2C0: GPIO4 SDA, GPIO5 SCL, relay expander @ 0x24, sensor expander @ 0x22
//! - UART0: GPIO0 TX, GPIO1 RX, serial console
//! - Flash: last 64 KiB hold the dwell configuration

use embassy_rp::peripherals::I2C0;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use tarczownix_core::bus::BusArbiter;
use tarczownix_core::config::DelayStore;
use tarczownix_core::sequencer::Supervisor;
use tarczownix_drivers::expander::ExpanderBank;
use tarczownix_hal_rp2040::flash::FlashStorage;
use tarczownix_hal_rp2040::i2c::Rp2040I2c;

/// Expander bus clock (Hz); PCF8574 is rated for standard mode only
pub const I2C_FREQUENCY_HZ: u32 = 100_000;

/// Console baud rate
pub const CONSOLE_BAUD: u32 = 115_200;

/// Both PCF8574s on I2C0
pub type Bank = ExpanderBank<Rp2040I2c<'static, I2C0>>;

/// Arbitrated expander bus shared by every task
pub type Bus = BusArbiter<CriticalSectionRawMutex, Bank>;

/// Sequencer state shared by every task
pub type Sup = Supervisor<CriticalSectionRawMutex>;

/// Dwell persistence over the config partition
pub type Store = DelayStore<FlashStorage<'static>>;
