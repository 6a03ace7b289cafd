//! Estia Serial Engine
//!
//! Drives the heat pump serial bus on top of the frame model in
//! [`estia_frame`]:
//!
//! - **Sniffing**: [`EstiaSerial::sniff`] rebuilds frames from the byte
//!   stream, tracks the latest status and matches acks to queued commands.
//! - **Commands**: mode, operation, temperature and defrost commands are
//!   queued and sent one at a time, retried until acknowledged or dropped.
//! - **Sensor polling**: [`EstiaSerial::request_sensors`] walks a sensor list
//!   one synchronous request per call.
//!
//! The engine is single-threaded and tick-driven. It reaches the outside
//! world only through the [`Transport`] and [`Clock`] traits; [`sim`] has
//! in-memory implementations for tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use estia_serial::{EstiaConfig, EstiaSerial, SniffState};
//!
//! let mut estia = EstiaSerial::new(transport, clock, EstiaConfig::default());
//! estia.begin()?;
//! estia.set_mode("quiet", true);
//!
//! loop {
//!     if estia.sniff() == SniffState::FramePending {
//!         while let Some(frame) = estia.next_frame() {
//!             println!("{}", frame);
//!         }
//!     }
//! }
//! ```

mod command;
mod config;
mod error;
mod estia;
mod mailbox;
pub mod metrics;
mod poll;
pub mod sensors;
pub mod sim;
mod sniffer;
mod transport;

pub use command::*;
pub use config::*;
pub use error::*;
pub use estia::*;
pub use mailbox::*;
pub use poll::*;
pub use sniffer::*;
pub use transport::*;

pub use estia_frame;
