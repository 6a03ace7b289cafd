//! Metric definitions for the serial engine.
//!
//! Counters are recorded through the `metrics` facade; without an installed
//! recorder they cost nothing. Call [`describe_metrics`] once at startup to
//! register descriptions with whatever recorder the host installs.

use ::metrics::{counter, describe_counter, Unit};

/// A counter declaration with its metadata.
#[derive(Debug, Clone, Copy)]
pub struct Metric {
    pub name: &'static str,
    pub description: &'static str,
}

impl Metric {
    pub const fn counter(name: &'static str) -> Self {
        Metric {
            name,
            description: "",
        }
    }

    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn describe(&self) {
        describe_counter!(self.name, Unit::Count, self.description);
    }
}

// ============================================================================
// Sniffer
// ============================================================================

pub const FRAMES_RECEIVED: Metric = Metric::counter("estia.sniffer.frames")
    .with_description("Candidate frames closed by the stream framer");

pub const FRAMES_INVALID: Metric = Metric::counter("estia.sniffer.invalid_frames")
    .with_description("Candidate frames no decoder accepted");

pub const STATUS_UPDATES: Metric = Metric::counter("estia.sniffer.status_updates")
    .with_description("Status frames decoded");

// ============================================================================
// Commands
// ============================================================================

pub const COMMANDS_SENT: Metric = Metric::counter("estia.command.sent")
    .with_description("Command transmissions, retries included");

pub const COMMANDS_ACKED: Metric = Metric::counter("estia.command.acked")
    .with_description("Commands completed by a matching ack");

pub const COMMANDS_DROPPED: Metric = Metric::counter("estia.command.dropped")
    .with_description("Commands dropped after exhausting their retries");

pub const COMMANDS_REJECTED: Metric = Metric::counter("estia.command.rejected")
    .with_description("Commands discarded because the queue was full");

// ============================================================================
// Sensor Polling
// ============================================================================

pub const SENSOR_REQUESTS: Metric = Metric::counter("estia.sensor.requests")
    .with_description("Data requests written to the bus");

pub const SENSOR_FAILURES: Metric = Metric::counter("estia.sensor.failures")
    .with_description("Data requests that timed out or returned an invalid response");

pub const SENSOR_ROUNDS: Metric = Metric::counter("estia.sensor.rounds")
    .with_description("Completed sensor polling rounds");

/// Every metric this crate records.
pub const ALL_METRICS: &[Metric] = &[
    FRAMES_RECEIVED,
    FRAMES_INVALID,
    STATUS_UPDATES,
    COMMANDS_SENT,
    COMMANDS_ACKED,
    COMMANDS_DROPPED,
    COMMANDS_REJECTED,
    SENSOR_REQUESTS,
    SENSOR_FAILURES,
    SENSOR_ROUNDS,
];

/// Register descriptions for every metric.
pub fn describe_metrics() {
    for metric in ALL_METRICS {
        metric.describe();
    }
}

pub(crate) fn inc(metric: Metric) {
    counter!(metric.name).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_metric_names_unique_and_prefixed() {
        let names: HashSet<_> = ALL_METRICS.iter().map(|m| m.name).collect();
        assert_eq!(names.len(), ALL_METRICS.len());
        assert!(ALL_METRICS.iter().all(|m| m.name.starts_with("estia.")));
        assert!(ALL_METRICS.iter().all(|m| !m.description.is_empty()));
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        describe_metrics();
        inc(COMMANDS_SENT);
    }
}
