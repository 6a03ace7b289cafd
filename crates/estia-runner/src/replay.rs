//! Offline replay of captured bus traffic.
//!
//! A capture is a text file of hex bytes. Whitespace and `#` comments are
//! ignored, so both `a0 00 10 07 ...` and one unbroken hex string per line work.

use estia_frame::{Frame, FrameError, Message};
use estia_serial::sim::{ManualClock, SimTransport};
use estia_serial::{EstiaConfig, EstiaSerial, SniffState};

use crate::error::Result;

/// Virtual time between sniff ticks.
const TICK_MS: u64 = 10;

/// Parse a hex dump into raw bytes.
pub fn parse_hex_dump(text: &str) -> Result<Vec<u8>> {
    let digits: String = text
        .lines()
        .map(|line| line.split('#').next().unwrap_or_default())
        .flat_map(str::split_whitespace)
        .map(|token| token.trim_start_matches("0x"))
        .collect();
    Ok(hex::decode(digits)?)
}

/// A replayed frame with its decode result.
#[derive(Debug)]
pub struct ReplayedFrame {
    pub frame: Frame,
    pub message: std::result::Result<Message, FrameError>,
}

/// Run `bytes` through the sniffer on a simulated line and decode every
/// frame it closes.
pub fn replay(bytes: &[u8], config: EstiaConfig) -> Vec<ReplayedFrame> {
    let sim = SimTransport::new();
    let clock = ManualClock::new(0);
    let mut estia = EstiaSerial::new(sim.clone(), clock.clone(), config);
    sim.inject(bytes);

    let mut frames = Vec::new();
    // Keep ticking until the line is drained and the framer has flushed
    let mut quiet_ticks = 0;
    while quiet_ticks < 2 {
        match estia.sniff() {
            SniffState::FramePending => {
                quiet_ticks = 0;
                frames.extend(std::iter::from_fn(|| estia.next_frame()).map(|frame| {
                    let message = Message::decode(frame.as_bytes());
                    ReplayedFrame { frame, message }
                }));
            }
            SniffState::Busy => quiet_ticks = 0,
            SniffState::Idle => quiet_ticks += 1,
        }
        clock.advance(TICK_MS);
    }
    frames
}
