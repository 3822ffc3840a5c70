//! Flash storage abstractions
//!
//! Provides traits for persistent key-value storage that can be implemented
//! by chip-specific HALs using their flash memory.

/// Namespace byte for the per-pair dwell bounds
///
/// Keeps the sequencer's delay entries apart from any other data that
/// shares the same flash map.
pub const DELAY_NAMESPACE: u8 = 0xD1;

/// Storage keys for configuration data
///
/// Each key serializes to two bytes: a namespace tag and the pair index
/// the value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageKey {
    /// Dwell bounds of a pair, both stored in one item so a single
    /// write replaces them together
    Delay(u8),
}

impl StorageKey {
    /// Encoded key length in bytes
    pub const LEN: usize = 2;

    /// Get the key as its two-byte wire form
    pub fn to_bytes(self) -> [u8; Self::LEN] {
        match self {
            StorageKey::Delay(idx) => [DELAY_NAMESPACE, idx],
        }
    }

    /// Create a key from its two-byte wire form
    pub fn from_bytes(bytes: [u8; Self::LEN]) -> Option<Self> {
        match bytes[0] {
            DELAY_NAMESPACE => Some(StorageKey::Delay(bytes[1])),
            _ => None,
        }
    }

    /// Pair index this key belongs to
    pub fn pair(self) -> u8 {
        match self {
            StorageKey::Delay(idx) => idx,
        }
    }
}

/// Errors from flash storage operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashError {
    /// Flash operation failed
    Flash,
    /// Storage operation failed
    Storage,
    /// Key not found
    NotFound,
    /// Buffer too small for the data
    BufferTooSmall,
    /// Data corrupted or invalid
    Corrupted,
    /// Storage is full
    Full,
}

/// Flash storage trait
///
/// Wear-leveled key-value storage. A single key's write must be atomic;
/// nothing is promised across keys, so callers validate related values
/// together when loading.
pub trait FlashStorage {
    /// Read a value by key into the provided buffer
    ///
    /// # Returns
    /// The number of bytes read, or an error.
    fn read(
        &mut self,
        key: StorageKey,
        buffer: &mut [u8],
    ) -> impl core::future::Future<Output = Result<usize, FlashError>>;

    /// Write a value by key, replacing any previous value
    fn write(
        &mut self,
        key: StorageKey,
        data: &[u8],
    ) -> impl core::future::Future<Output = Result<(), FlashError>>;
}

// Implement the sequential-storage Key trait when the feature is enabled
#[cfg(feature = "sequential-storage")]
impl sequential_storage::map::Key for StorageKey {
    fn serialize_into(
        &self,
        buffer: &mut [u8],
    ) -> Result<usize, sequential_storage::map::SerializationError> {
        if buffer.len() < Self::LEN {
            return Err(sequential_storage::map::SerializationError::BufferTooSmall);
        }
        buffer[..Self::LEN].copy_from_slice(&self.to_bytes());
        Ok(Self::LEN)
    }

    fn deserialize_from(
        buffer: &[u8],
    ) -> Result<(Self, usize), sequential_storage::map::SerializationError> {
        if buffer.len() < Self::LEN {
            return Err(sequential_storage::map::SerializationError::BufferTooSmall);
        }
        match StorageKey::from_bytes([buffer[0], buffer[1]]) {
            Some(key) => Ok((key, Self::LEN)),
            None => Err(sequential_storage::map::SerializationError::InvalidFormat),
        }
    }
}
