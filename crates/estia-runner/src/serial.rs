//! Host implementations of the engine's capability traits.

use std::io::{self, Read, Write};
use std::thread;
use std::time::{Duration, Instant};

use estia_serial::{Clock, Parity, SerialSettings, Transport};
use serialport::{ClearBuffer, DataBits, SerialPort, StopBits};
use tracing::{debug, warn};

/// Transport over a local serial device.
///
/// The port is opened by [`Transport::begin`]; until then reads return
/// nothing and writes fail.
pub struct SerialTransport {
    path: String,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialTransport {
    pub fn new(path: impl Into<String>) -> Self {
        SerialTransport {
            path: path.into(),
            port: None,
        }
    }

    fn port(&mut self) -> io::Result<&mut Box<dyn SerialPort>> {
        self.port
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "serial port not open"))
    }
}

fn builder(path: &str, settings: &SerialSettings) -> serialport::SerialPortBuilder {
    let data_bits = match settings.data_bits {
        5 => DataBits::Five,
        6 => DataBits::Six,
        7 => DataBits::Seven,
        _ => DataBits::Eight,
    };
    let stop_bits = match settings.stop_bits {
        2 => StopBits::Two,
        _ => StopBits::One,
    };
    let parity = match settings.parity {
        Parity::None => serialport::Parity::None,
        Parity::Even => serialport::Parity::Even,
        Parity::Odd => serialport::Parity::Odd,
    };
    serialport::new(path, settings.baud_rate)
        .data_bits(data_bits)
        .stop_bits(stop_bits)
        .parity(parity)
        .timeout(Duration::from_millis(50))
}

impl Transport for SerialTransport {
    fn begin(&mut self, settings: &SerialSettings) -> io::Result<()> {
        let port = builder(&self.path, settings).open()?;
        debug!(path = %self.path, ?settings, "serial port open");
        self.port = Some(port);
        Ok(())
    }

    fn write(&mut self, bytes: &[u8], suspend_rx: bool) -> io::Result<()> {
        let port = self.port()?;
        port.write_all(bytes)?;
        port.flush()?;
        if suspend_rx {
            // The bus echoes our own bytes back
            port.clear(ClearBuffer::Input)?;
        }
        Ok(())
    }

    fn read_byte(&mut self) -> Option<u8> {
        let port = self.port.as_mut()?;
        let mut byte = [0u8; 1];
        match port.read(&mut byte) {
            Ok(1) => Some(byte[0]),
            Ok(_) => None,
            Err(e) if e.kind() == io::ErrorKind::TimedOut => None,
            Err(e) => {
                warn!(error = %e, "serial read failed");
                None
            }
        }
    }

    fn bytes_available(&mut self) -> bool {
        let Some(port) = self.port.as_ref() else {
            return false;
        };
        match port.bytes_to_read() {
            Ok(n) => n > 0,
            Err(e) => {
                warn!(error = %e, "serial status query failed");
                false
            }
        }
    }
}

/// Wall clock measured from construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        SystemClock {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    fn sleep_ms(&self, ms: u64) {
        thread::sleep(Duration::from_millis(ms));
    }
}
