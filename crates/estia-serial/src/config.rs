//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::sensors::DEFAULT_SENSORS;
use crate::transport::SerialSettings;

/// Timing and capacity settings for [`crate::EstiaSerial`].
///
/// Every field has a default, so a configuration file only needs to name the
/// values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstiaConfig {
    /// Serial line settings.
    pub serial: SerialSettings,

    /// Pause after each byte read (milliseconds).
    pub byte_delay_ms: u64,
    /// Minimum interval between sniff reads (milliseconds).
    pub read_interval_ms: u64,

    /// How long a data request waits for the first response byte (milliseconds).
    pub request_timeout_ms: u64,
    /// Poll interval while waiting for a response (milliseconds).
    pub request_poll_ms: u64,
    /// Settle time between the first response byte and reading (milliseconds).
    pub request_settle_ms: u64,
    /// Extra attempts for a failing sensor before its error is recorded.
    pub request_retries: u8,

    /// How long a sent command waits for its ack (milliseconds).
    pub command_timeout_ms: u64,
    /// Extra transmissions of an unacknowledged command before it is dropped.
    pub command_retries: u8,
    pub command_queue_len: usize,

    pub frame_queue_len: usize,

    /// Sensors polled when the caller names none.
    pub sensors: Vec<String>,
    /// Clear previous readings at the start of each polling round.
    pub clear_sensors_each_round: bool,
}

impl Default for EstiaConfig {
    fn default() -> Self {
        EstiaConfig {
            serial: SerialSettings::default(),
            byte_delay_ms: 5,
            read_interval_ms: 55,
            request_timeout_ms: 200,
            request_poll_ms: 5,
            request_settle_ms: 10,
            request_retries: 2,
            command_timeout_ms: 1000,
            command_retries: 2,
            command_queue_len: 10,
            frame_queue_len: 10,
            sensors: DEFAULT_SENSORS.iter().map(|s| s.to_string()).collect(),
            clear_sensors_each_round: false,
        }
    }
}

impl EstiaConfig {
    /// Replace the default sensor list.
    pub fn with_sensors<I, S>(mut self, sensors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sensors = sensors.into_iter().map(Into::into).collect();
        self
    }

    /// Set the inter-byte delay.
    pub fn with_byte_delay_ms(mut self, byte_delay_ms: u64) -> Self {
        self.byte_delay_ms = byte_delay_ms;
        self
    }
}
