//! Host test doubles
//!
//! A shared-state [`MockBank`] standing in for the two expanders and an
//! in-memory [`MemoryFlash`]. Clones share their state, so a test keeps
//! one handle while the code under test owns the other.

use std::boxed::Box;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::vec::Vec;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use tarczownix_hal::{FlashError, FlashStorage, StorageKey};

use crate::channel::{ChannelId, ChannelKind, Level, Role, GROUP_WIDTH, PAIR_COUNT};
use crate::traits::{BusError, ChannelBank};

/// Raw mutex used by host tests
pub type TestMutex = CriticalSectionRawMutex;

/// Callback run once after a given relay write
struct WriteHook {
    at_write: usize,
    action: Box<dyn FnMut()>,
}

impl core::fmt::Debug for WriteHook {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WriteHook")
            .field("at_write", &self.at_write)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
struct BankState {
    relays: [Level; GROUP_WIDTH],
    sensors: [Level; GROUP_WIDTH],
    initialized: bool,
    writes: usize,
    fail_writes: bool,
    fail_reads: bool,
    interlock_violated: bool,
    hook: Option<WriteHook>,
}

/// Mock relay board: active-low relays, pulled-up active-low sensors
#[derive(Debug, Clone)]
pub struct MockBank {
    state: Rc<RefCell<BankState>>,
}

impl MockBank {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(BankState {
                relays: [Level::High; GROUP_WIDTH],
                sensors: [Level::High; GROUP_WIDTH],
                initialized: false,
                writes: 0,
                fail_writes: false,
                fail_reads: false,
                interlock_violated: false,
                hook: None,
            })),
        }
    }

    pub fn set_relay_raw(&self, line: u8, level: Level) {
        self.state.borrow_mut().relays[line as usize] = level;
    }

    pub fn relay_raw(&self, line: u8) -> Level {
        self.state.borrow().relays[line as usize]
    }

    pub fn relay_on(&self, pair: u8, role: Role) -> bool {
        self.relay_raw(ChannelId::relay(pair, role).line()) == Level::Low
    }

    /// Number of relay lines currently energized
    pub fn energized_relays(&self) -> usize {
        self.state
            .borrow()
            .relays
            .iter()
            .filter(|&&l| l == Level::Low)
            .count()
    }

    /// Drive a sensor line to its logical state
    pub fn set_sensor(&self, pair: u8, role: Role, active: bool) {
        let line = ChannelId::sensor(pair, role).line() as usize;
        self.state.borrow_mut().sensors[line] = Level::from_high(!active);
    }

    pub fn initialized(&self) -> bool {
        self.state.borrow().initialized
    }

    /// Successful relay writes so far
    pub fn write_count(&self) -> usize {
        self.state.borrow().writes
    }

    pub fn fail_writes(&self, fail: bool) {
        self.state.borrow_mut().fail_writes = fail;
    }

    pub fn fail_reads(&self, fail: bool) {
        self.state.borrow_mut().fail_reads = fail;
    }

    /// Whether both relays of any pair were ever energized together
    pub fn interlock_violated(&self) -> bool {
        self.state.borrow().interlock_violated
    }

    /// Run `action` right after the `n`th relay write from now
    ///
    /// The action runs with the bus still locked by the writer, which lets
    /// a test land a stop between two steps of the same tick.
    pub fn on_write(&self, n: usize, action: impl FnMut() + 'static) {
        let mut state = self.state.borrow_mut();
        state.hook = Some(WriteHook {
            at_write: state.writes + n,
            action: Box::new(action),
        });
    }

    /// Take the hook if the write just made is the one it waits for
    fn due_hook(state: &mut BankState) -> Option<WriteHook> {
        match &state.hook {
            Some(hook) if hook.at_write == state.writes => state.hook.take(),
            _ => None,
        }
    }

    fn after_write(state: &mut BankState) {
        state.writes += 1;
        for pair in 0..PAIR_COUNT as u8 {
            let a = state.relays[ChannelId::relay(pair, Role::A).line() as usize];
            let b = state.relays[ChannelId::relay(pair, Role::B).line() as usize];
            if a == Level::Low && b == Level::Low {
                state.interlock_violated = true;
            }
        }
    }
}

impl ChannelBank for MockBank {
    fn init(&mut self, relay_idle: Level) -> Result<(), BusError> {
        let mut state = self.state.borrow_mut();
        if state.fail_writes {
            return Err(BusError::Nack);
        }
        state.relays = [relay_idle; GROUP_WIDTH];
        state.initialized = true;
        Ok(())
    }

    fn read(&mut self, channel: ChannelId) -> Result<Level, BusError> {
        let state = self.state.borrow();
        if state.fail_reads {
            return Err(BusError::Io);
        }
        let line = channel.line() as usize;
        match channel.kind {
            ChannelKind::Relay => state.relays.get(line),
            ChannelKind::Sensor => state.sensors.get(line),
        }
        .copied()
        .ok_or(BusError::InvalidChannel)
    }

    fn write(&mut self, channel: ChannelId, level: Level) -> Result<(), BusError> {
        let mut state = self.state.borrow_mut();
        if state.fail_writes {
            return Err(BusError::Io);
        }
        let slot = state
            .relays
            .get_mut(channel.line() as usize)
            .ok_or(BusError::InvalidChannel)?;
        *slot = level;
        Self::after_write(&mut state);
        let hook = Self::due_hook(&mut state);
        drop(state);
        if let Some(mut hook) = hook {
            (hook.action)();
        }
        Ok(())
    }

    fn write_all_relays(&mut self, level: Level) -> Result<(), BusError> {
        let mut state = self.state.borrow_mut();
        if state.fail_writes {
            return Err(BusError::Io);
        }
        state.relays = [level; GROUP_WIDTH];
        Self::after_write(&mut state);
        let hook = Self::due_hook(&mut state);
        drop(state);
        if let Some(mut hook) = hook {
            (hook.action)();
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct FlashState {
    entries: HashMap<[u8; StorageKey::LEN], Vec<u8>>,
    fail_writes: bool,
    /// Writes still accepted; `None` means unlimited
    writes_left: Option<usize>,
}

/// In-memory key-value flash
#[derive(Debug, Clone, Default)]
pub struct MemoryFlash {
    state: Rc<RefCell<FlashState>>,
}

impl MemoryFlash {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw bytes under a key, bypassing encoding
    pub fn insert(&self, key: StorageKey, data: &[u8]) {
        self.state
            .borrow_mut()
            .entries
            .insert(key.to_bytes(), data.to_vec());
    }

    pub fn fail_writes(&self, fail: bool) {
        self.state.borrow_mut().fail_writes = fail;
    }

    /// Accept `count` more writes, then fail every later one
    pub fn allow_writes(&self, count: usize) {
        self.state.borrow_mut().writes_left = Some(count);
    }
}

impl FlashStorage for MemoryFlash {
    async fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, FlashError> {
        let state = self.state.borrow();
        let data = state
            .entries
            .get(&key.to_bytes())
            .ok_or(FlashError::NotFound)?;
        let dest = buffer
            .get_mut(..data.len())
            .ok_or(FlashError::BufferTooSmall)?;
        dest.copy_from_slice(data);
        Ok(data.len())
    }

    async fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), FlashError> {
        let mut state = self.state.borrow_mut();
        if state.fail_writes || state.writes_left == Some(0) {
            return Err(FlashError::Storage);
        }
        if let Some(left) = state.writes_left.as_mut() {
            *left -= 1;
        }
        state.entries.insert(key.to_bytes(), data.to_vec());
        Ok(())
    }
}

