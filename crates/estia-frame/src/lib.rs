//! Estia Serial Bus Frames
//!
//! This crate provides the wire model for the serial bus spoken between an
//! Estia heat pump unit and its wired controllers. Every message on the bus is
//! a single binary frame:
//!
//! ```text
//! +-------+------+-----+----------+----------+-----+-----------+--------+-------+
//! | A0 00 | type | len | src (2)  | dst (2)  | 00  | dtype (2) | fields | crc16 |
//! +-------+------+-----+----------+----------+-----+-----------+--------+-------+
//! ```
//!
//! - **Frames** are wrapped byte buffers ([`Frame`]) that are stamped and
//!   sealed for transmission or read back from the wire.
//! - **Messages** ([`Message`]) are the typed view of a frame, one variant per
//!   frame kind the bus carries.
//! - **Status** frames decode into a [`StatusData`] snapshot.
//!
//! # Example
//!
//! ```rust,ignore
//! use estia_frame::{Message, Mode, ModeSwitch};
//!
//! // Build a command frame
//! let frame = ModeSwitch::new(Mode::Quiet, true).encode();
//!
//! // Decode whatever arrived on the bus
//! let message = Message::decode(frame.as_bytes())?;
//! ```

mod checksum;
mod commands;
mod constants;
mod data;
mod error;
mod frame;
mod kind;
mod message;
mod status;

pub use checksum::*;
pub use commands::*;
pub use constants::*;
pub use data::*;
pub use error::*;
pub use frame::*;
pub use kind::*;
pub use message::*;
pub use status::*;
