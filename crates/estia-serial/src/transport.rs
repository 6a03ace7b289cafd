//! Capability traits the engine runs on.
//!
//! The engine never touches a serial port or the system clock directly: the
//! host hands it a [`Transport`], a [`Clock`] and optionally an
//! [`Indicator`]. The simulated implementations in [`crate::sim`] drive every
//! timeout path in tests without hardware.

use std::io;

use serde::{Deserialize, Serialize};

/// Parity setting of the serial line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Serial line settings. The bus runs at 2400 baud, 8E1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialSettings {
    pub baud_rate: u32,
    pub data_bits: u8,
    pub parity: Parity,
    pub stop_bits: u8,
}

impl Default for SerialSettings {
    fn default() -> Self {
        SerialSettings {
            baud_rate: 2400,
            data_bits: 8,
            parity: Parity::Even,
            stop_bits: 1,
        }
    }
}

/// Byte-oriented half-duplex serial transport.
pub trait Transport {
    /// Open or configure the line.
    fn begin(&mut self, settings: &SerialSettings) -> io::Result<()>;

    /// Write a whole frame.
    ///
    /// With `suspend_rx` set, reception is disabled for the duration of the
    /// write so the node does not read back its own bytes.
    fn write(&mut self, bytes: &[u8], suspend_rx: bool) -> io::Result<()>;

    /// Pop one received byte, if any is buffered.
    fn read_byte(&mut self) -> Option<u8>;

    /// Whether at least one received byte is buffered.
    fn bytes_available(&mut self) -> bool;
}

/// Monotonic millisecond clock with a blocking sleep.
pub trait Clock {
    fn now_ms(&self) -> u64;

    fn sleep_ms(&self, ms: u64);
}

/// Activity light toggled around transmission and reception.
pub trait Indicator {
    fn set(&mut self, on: bool);
}

/// Indicator that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIndicator;

impl Indicator for NoIndicator {
    fn set(&mut self, _on: bool) {}
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn begin(&mut self, settings: &SerialSettings) -> io::Result<()> {
        (**self).begin(settings)
    }

    fn write(&mut self, bytes: &[u8], suspend_rx: bool) -> io::Result<()> {
        (**self).write(bytes, suspend_rx)
    }

    fn read_byte(&mut self) -> Option<u8> {
        (**self).read_byte()
    }

    fn bytes_available(&mut self) -> bool {
        (**self).bytes_available()
    }
}
