//! Console line assembly
//!
//! Collects bytes from a serial stream into lines terminated by CR or LF.

use heapless::{String, Vec};

/// Longest accepted command line
pub const MAX_LINE_LEN: usize = 64;

/// Line assembly errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineError {
    /// Line exceeded the buffer and was discarded
    TooLong,
    /// Line is not valid UTF-8
    InvalidUtf8,
}

/// Byte-at-a-time line accumulator
pub struct LineBuffer<const N: usize = MAX_LINE_LEN> {
    buffer: Vec<u8, N>,
    overflowed: bool,
}

impl<const N: usize> Default for LineBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> LineBuffer<N> {
    pub const fn new() -> Self {
        Self {
            buffer: Vec::new(),
            overflowed: false,
        }
    }

    /// Feed one byte
    ///
    /// Returns `Ok(Some(line))` on a terminator that ends a non-empty
    /// line and `Ok(None)` while the line is still open. An overlong line
    /// is dropped whole and reported once its terminator arrives.
    pub fn feed(&mut self, byte: u8) -> Result<Option<String<N>>, LineError> {
        if byte == b'\r' || byte == b'\n' {
            let overflowed = core::mem::replace(&mut self.overflowed, false);
            if overflowed {
                self.buffer.clear();
                return Err(LineError::TooLong);
            }
            if self.buffer.is_empty() {
                return Ok(None);
            }
            let bytes = core::mem::take(&mut self.buffer);
            return String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| LineError::InvalidUtf8);
        }

        if self.overflowed {
            return Ok(None);
        }
        if self.buffer.push(byte).is_err() {
            self.buffer.clear();
            self.overflowed = true;
        }
        Ok(None)
    }
}
