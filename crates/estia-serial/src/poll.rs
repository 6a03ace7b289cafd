//! Sensor poll engine.
//!
//! One round walks an ordered sensor list, issuing one synchronous data
//! request per call of [`SensorPoller::step`]. A request that times out or
//! returns a bad response is retried on the following calls; once the
//! retries are spent the error code itself is stored as the reading so that
//! the round always completes.

use std::collections::BTreeMap;

use estia_frame::ERR_NOT_EXIST;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::RequestError;
use crate::metrics::{inc, SENSOR_FAILURES, SENSOR_ROUNDS};
use crate::sensors;

/// Default number of extra attempts for a failing sensor.
pub const DEFAULT_REQUEST_RETRIES: u8 = 2;

/// A raw sensor value and the multiplier that scales it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensorReading {
    pub value: i16,
    pub multiplier: f32,
}

impl SensorReading {
    pub fn new(value: i16, multiplier: f32) -> Self {
        SensorReading { value, multiplier }
    }

    /// Value in physical units.
    pub fn scaled(&self) -> f32 {
        f32::from(self.value) * self.multiplier
    }

    /// Whether the value is one of the signed error codes.
    pub fn is_error(&self) -> bool {
        (-206..=-200).contains(&self.value)
    }
}

/// Readings by sensor name, accumulated across rounds.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct SensorTable {
    readings: BTreeMap<String, SensorReading>,
}

impl SensorTable {
    pub fn insert(&mut self, name: impl Into<String>, reading: SensorReading) {
        self.readings.insert(name.into(), reading);
    }

    pub fn get(&self, name: &str) -> Option<&SensorReading> {
        self.readings.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SensorReading)> {
        self.readings.iter().map(|(name, reading)| (name.as_str(), reading))
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn clear(&mut self) {
        self.readings.clear();
    }
}

/// Round-robin position over a sensor list.
#[derive(Debug, Clone)]
pub struct SensorPoller {
    index: usize,
    retries: u8,
    retry_limit: u8,
    done: bool,
}

impl Default for SensorPoller {
    fn default() -> Self {
        SensorPoller::new(DEFAULT_REQUEST_RETRIES)
    }
}

impl SensorPoller {
    pub fn new(retry_limit: u8) -> Self {
        SensorPoller {
            index: 0,
            retries: 0,
            retry_limit,
            done: false,
        }
    }

    /// Handle at most one sensor of `names`, recording into `table`.
    ///
    /// `request` performs the exchange for a sensor code. Returns `true`
    /// when this call completed the round. With `clear` set, the table is
    /// emptied before the first sensor of the next round is polled.
    pub fn step<S, F>(&mut self, names: &[S], table: &mut SensorTable, clear: bool, mut request: F) -> bool
    where
        S: AsRef<str>,
        F: FnMut(u8) -> Result<i16, RequestError>,
    {
        if self.done {
            if clear {
                table.clear();
            }
            self.done = false;
        }
        if names.is_empty() {
            self.finish_round();
            return self.done;
        }
        if self.index >= names.len() {
            self.index = 0;
        }

        let name = names[self.index].as_ref();
        let Some(sensor) = sensors::lookup(name) else {
            warn!(sensor = name, "unknown sensor");
            table.insert(name, SensorReading::new(ERR_NOT_EXIST, 1.0));
            self.advance(names.len());
            return self.done;
        };

        let value = match request(sensor.code) {
            Ok(value) => {
                debug!(sensor = name, value, "sensor reading");
                value
            }
            Err(err) if err.is_retryable() && self.retries < self.retry_limit => {
                self.retries += 1;
                debug!(sensor = name, retry = self.retries, "sensor request failed: {}", err);
                return self.done;
            }
            Err(err) => {
                inc(SENSOR_FAILURES);
                warn!(sensor = name, code = err.code(), "sensor request failed: {}", err);
                err.code()
            }
        };
        table.insert(name, SensorReading::new(value, sensor.multiplier));
        self.advance(names.len());
        self.done
    }

    /// Whether the last call completed a round.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Index of the sensor the next call will poll.
    pub fn position(&self) -> usize {
        self.index
    }

    pub fn reset(&mut self) {
        self.index = 0;
        self.retries = 0;
        self.done = false;
    }

    fn advance(&mut self, len: usize) {
        self.retries = 0;
        self.index += 1;
        if self.index >= len {
            self.finish_round();
        }
    }

    fn finish_round(&mut self) {
        self.index = 0;
        self.done = true;
        inc(SENSOR_ROUNDS);
    }
}
