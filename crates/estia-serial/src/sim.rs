//! Simulated transport and clock.
//!
//! [`SimTransport`] is a cloneable handle over shared state, so a test keeps
//! one handle to inject bytes and inspect writes while the engine owns
//! another. A responder closure plays the heat pump: it sees every written
//! frame and may queue a reply. [`ManualClock`] advances only when slept on
//! or advanced explicitly, which keeps every timeout path deterministic.

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::transport::{Clock, SerialSettings, Transport};

type Responder = Box<dyn FnMut(&[u8]) -> Option<Vec<u8>> + Send>;

struct Inner {
    rx: VecDeque<u8>,
    writes: Vec<Vec<u8>>,
    responder: Option<Responder>,
    settings: Option<SerialSettings>,
    fail_writes: bool,
}

/// In-memory serial line.
#[derive(Clone)]
pub struct SimTransport {
    inner: Arc<Mutex<Inner>>,
}

impl Default for SimTransport {
    fn default() -> Self {
        SimTransport::new()
    }
}

impl std::fmt::Debug for SimTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("SimTransport")
            .field("rx", &inner.rx.len())
            .field("writes", &inner.writes.len())
            .finish()
    }
}

impl SimTransport {
    pub fn new() -> Self {
        SimTransport {
            inner: Arc::new(Mutex::new(Inner {
                rx: VecDeque::new(),
                writes: Vec::new(),
                responder: None,
                settings: None,
                fail_writes: false,
            })),
        }
    }

    /// Install the closure that answers written frames.
    pub fn set_responder<F>(&self, responder: F)
    where
        F: FnMut(&[u8]) -> Option<Vec<u8>> + Send + 'static,
    {
        self.inner.lock().responder = Some(Box::new(responder));
    }

    /// Append bytes to the receive buffer.
    pub fn inject(&self, bytes: &[u8]) {
        self.inner.lock().rx.extend(bytes.iter().copied());
    }

    /// Frames written so far.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.inner.lock().writes.clone()
    }

    /// Frames written so far, clearing the record.
    pub fn take_writes(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.inner.lock().writes)
    }

    /// Bytes still waiting to be read.
    pub fn pending_rx(&self) -> usize {
        self.inner.lock().rx.len()
    }

    /// Settings passed to the last `begin`.
    pub fn settings(&self) -> Option<SerialSettings> {
        self.inner.lock().settings.clone()
    }

    /// Make every following write fail.
    pub fn fail_writes(&self, fail: bool) {
        self.inner.lock().fail_writes = fail;
    }
}

impl Transport for SimTransport {
    fn begin(&mut self, settings: &SerialSettings) -> io::Result<()> {
        self.inner.lock().settings = Some(settings.clone());
        Ok(())
    }

    fn write(&mut self, bytes: &[u8], suspend_rx: bool) -> io::Result<()> {
        let mut inner = self.inner.lock();
        if inner.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "simulated write failure"));
        }
        inner.writes.push(bytes.to_vec());
        if suspend_rx {
            inner.rx.clear();
        }
        let reply = inner.responder.as_mut().and_then(|respond| respond(bytes));
        if let Some(reply) = reply {
            inner.rx.extend(reply);
        }
        Ok(())
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.inner.lock().rx.pop_front()
    }

    fn bytes_available(&mut self) -> bool {
        !self.inner.lock().rx.is_empty()
    }
}

/// Virtual millisecond clock.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        ManualClock {
            now: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    fn sleep_ms(&self, ms: u64) {
        self.advance(ms);
    }
}
