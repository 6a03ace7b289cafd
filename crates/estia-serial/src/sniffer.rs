//! Stream framer.
//!
//! The bus has no out-of-band framing: every frame starts with the `A0 00`
//! sentinel and its length is only known once the declared-length byte has
//! arrived. [`Framer`] rebuilds frames from raw bytes as they are read,
//! closing a frame when the next sentinel shows up, splitting frames that
//! were joined without one, and merging a short frame with an interrupting
//! sentinel until the declared length is reached.
//!
//! Candidate frames are not validated here; decoders reject them by checksum,
//! kind or length.

use std::collections::VecDeque;

use bytes::{Buf, BufMut, BytesMut};
use estia_frame::{crc16, expected_len, Frame, FRAME_MAX_LEN, FRAME_SENTINEL};
use tracing::{trace, warn};

/// Default capacity of the completed-frame queue.
pub const DEFAULT_FRAME_QUEUE_LEN: usize = 10;

/// Rebuilds frames out of a raw byte stream.
#[derive(Debug)]
pub struct Framer {
    /// Bytes read but not yet consumed.
    raw: BytesMut,
    /// Frame currently being rebuilt.
    acc: BytesMut,
    completed: VecDeque<Frame>,
    capacity: usize,
    dropped: u64,
}

impl Default for Framer {
    fn default() -> Self {
        Framer::new(DEFAULT_FRAME_QUEUE_LEN)
    }
}

impl Framer {
    /// Create a framer whose completed queue holds at most `capacity` frames.
    pub fn new(capacity: usize) -> Self {
        Framer {
            raw: BytesMut::with_capacity(FRAME_MAX_LEN),
            acc: BytesMut::with_capacity(FRAME_MAX_LEN),
            completed: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            dropped: 0,
        }
    }

    /// Consume `bytes` and return the frames completed by them.
    ///
    /// Completed frames are also queued for [`Framer::pop`]. A trailing lone
    /// `A0` is held back until the next byte shows whether it starts a
    /// sentinel.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Frame> {
        self.raw.extend_from_slice(bytes);
        let mut emitted = Vec::new();

        loop {
            let expected = expected_len(&self.acc);

            // Two frames joined without an interrupting sentinel
            if let Some(expected) = expected {
                if self.acc.len() > expected {
                    if let Some(pos) = find_sentinel(&self.acc[1..]) {
                        let frame = self.acc.split_to(pos + 1);
                        self.emit(frame, &mut emitted);
                        continue;
                    }
                }
            }

            if self.raw.is_empty() {
                break;
            }
            if self.raw.len() == 1 && self.raw[0] == FRAME_SENTINEL[0] && !self.acc.is_empty() {
                break;
            }

            if self.raw.starts_with(&FRAME_SENTINEL) && !self.acc.is_empty() {
                match expected {
                    Some(expected) if self.acc.len() < expected && self.acc.len() < FRAME_MAX_LEN => {
                        // Short frame interrupted by a sentinel: keep going
                        // until the declared length is reached
                        let sentinel = self.raw.split_to(FRAME_SENTINEL.len());
                        self.acc.extend_from_slice(&sentinel);
                    }
                    _ => self.close(&mut emitted),
                }
                continue;
            }

            if self.acc.len() >= FRAME_MAX_LEN {
                self.close(&mut emitted);
                continue;
            }

            let byte = self.raw.get_u8();
            self.acc.put_u8(byte);
        }

        emitted
    }

    /// Close whatever is buffered as a candidate frame.
    ///
    /// Called once the line has gone quiet; a frame that reached its declared
    /// length is otherwise only closed by the next sentinel.
    pub fn flush(&mut self) -> Vec<Frame> {
        let mut emitted = self.feed(&[]);
        if !self.raw.is_empty() {
            let held = self.raw.split();
            self.acc.extend_from_slice(&held);
        }
        self.close(&mut emitted);
        emitted
    }

    /// Next completed frame, oldest first.
    pub fn pop(&mut self) -> Option<Frame> {
        self.completed.pop_front()
    }

    /// Number of completed frames waiting.
    pub fn pending(&self) -> usize {
        self.completed.len()
    }

    /// Whether a frame is part-way rebuilt.
    pub fn is_accumulating(&self) -> bool {
        !self.acc.is_empty() || !self.raw.is_empty()
    }

    /// Frames evicted from a full queue so far.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Discard every buffered byte and queued frame.
    pub fn clear(&mut self) {
        self.raw.clear();
        self.acc.clear();
        self.completed.clear();
    }

    /// Close the accumulator. Unless it holds exactly one checksum-valid
    /// frame, it is split at every sentinel after its first byte, so a frame
    /// merged into a truncated one still comes out on its own.
    fn close(&mut self, emitted: &mut Vec<Frame>) {
        let mut bytes = self.acc.split();
        if bytes.is_empty() {
            return;
        }
        while !is_whole_frame(&bytes) {
            let Some(pos) = find_sentinel(&bytes[1..]) else {
                break;
            };
            let head = bytes.split_to(pos + 1);
            self.emit(head, emitted);
        }
        self.emit(bytes, emitted);
    }

    fn emit(&mut self, bytes: BytesMut, emitted: &mut Vec<Frame>) {
        if bytes.is_empty() {
            return;
        }
        let frame = Frame::from_bytes(bytes.to_vec());
        trace!(len = frame.len(), "frame candidate: {}", frame);
        if self.completed.len() >= self.capacity {
            self.completed.pop_front();
            self.dropped += 1;
            warn!(capacity = self.capacity, "completed frame queue full, dropping oldest");
        }
        self.completed.push_back(frame.clone());
        emitted.push(frame);
    }
}

/// Whether `bytes` is one frame of its declared length with a matching checksum.
fn is_whole_frame(bytes: &[u8]) -> bool {
    if expected_len(bytes) != Some(bytes.len()) {
        return false;
    }
    let (body, crc) = bytes.split_at(bytes.len() - 2);
    crc16(body) == u16::from_be_bytes([crc[0], crc[1]])
}

/// Position of the first sentinel in `bytes`.
fn find_sentinel(bytes: &[u8]) -> Option<usize> {
    bytes.windows(FRAME_SENTINEL.len()).position(|w| w == FRAME_SENTINEL)
}
