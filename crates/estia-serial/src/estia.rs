//! Protocol facade.
//!
//! [`EstiaSerial`] owns the transport and clock and composes the framer,
//! command engine and sensor poller behind two entry points: the periodic
//! [`EstiaSerial::sniff`] tick and the imperative command and polling calls.
//!
//! Sniffing and polling share one half-duplex line. A data request blocks
//! until its response arrives or times out, and nothing is sniffed or sent
//! meanwhile.

use std::io;

use estia_frame::{
    Ack, DataRequest, DataResponse, ForcedDefrost, Frame, Message, Mode, ModeSwitch, Operation,
    OperationSwitch, StatusData, TemperatureCommand, Zone, FRAME_SENTINEL,
};
use tracing::{debug, trace, warn};

use crate::command::CommandEngine;
use crate::config::EstiaConfig;
use crate::error::RequestError;
use crate::mailbox::Mailbox;
use crate::metrics::{inc, FRAMES_INVALID, FRAMES_RECEIVED, SENSOR_REQUESTS, STATUS_UPDATES};
use crate::poll::{SensorPoller, SensorTable};
use crate::sensors;
use crate::sniffer::Framer;
use crate::transport::{Clock, Indicator, NoIndicator, Transport};

/// Outcome of one sniff tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SniffState {
    /// Nothing buffered, nothing pending and no command was sent.
    Idle,
    /// Bytes are mid-frame, the line has unread bytes, or a command was just
    /// written.
    Busy,
    /// Completed frames are waiting in [`EstiaSerial::next_frame`].
    FramePending,
}

/// Heat pump bus engine over a transport `T` and clock `C`.
pub struct EstiaSerial<T, C, I = NoIndicator> {
    transport: T,
    clock: C,
    indicator: I,
    config: EstiaConfig,

    framer: Framer,
    commands: CommandEngine,
    poller: SensorPoller,
    sensors: SensorTable,

    status: Mailbox<StatusData>,
    status_seen: bool,
    ack: Mailbox<u16>,
    last_read_ms: Option<u64>,
}

impl<T: Transport, C: Clock> EstiaSerial<T, C, NoIndicator> {
    pub fn new(transport: T, clock: C, config: EstiaConfig) -> Self {
        EstiaSerial::with_indicator(transport, clock, NoIndicator, config)
    }
}

impl<T: Transport, C: Clock, I: Indicator> EstiaSerial<T, C, I> {
    pub fn with_indicator(transport: T, clock: C, indicator: I, config: EstiaConfig) -> Self {
        EstiaSerial {
            framer: Framer::new(config.frame_queue_len),
            commands: CommandEngine::new(
                config.command_queue_len,
                config.command_timeout_ms,
                config.command_retries,
            ),
            poller: SensorPoller::new(config.request_retries),
            sensors: SensorTable::default(),
            status: Mailbox::default(),
            status_seen: false,
            ack: Mailbox::default(),
            last_read_ms: None,
            transport,
            clock,
            indicator,
            config,
        }
    }

    /// Configure the serial line.
    pub fn begin(&mut self) -> io::Result<()> {
        debug!(settings = ?self.config.serial, "opening serial line");
        self.transport.begin(&self.config.serial)
    }

    pub fn config(&self) -> &EstiaConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    // ========================================================================
    // Sniffing
    // ========================================================================

    /// Run one sniff tick.
    ///
    /// Reads are throttled to one per `read_interval_ms`. Every frame closed
    /// by the framer is checked for an ack and a status update. When nothing
    /// is pending or buffered, the next queued command is written.
    pub fn sniff(&mut self) -> SniffState {
        let now = self.clock.now_ms();
        let due = self
            .last_read_ms
            .map_or(true, |last| now.saturating_sub(last) > self.config.read_interval_ms);

        if due {
            self.last_read_ms = Some(now);
            let bytes = self.read_burst();
            let frames = if !bytes.is_empty() {
                self.framer.feed(&bytes)
            } else if !self.transport.bytes_available() {
                self.framer.flush()
            } else {
                Vec::new()
            };
            for frame in &frames {
                self.inspect(frame);
            }
        }

        if self.framer.pending() > 0 {
            return SniffState::FramePending;
        }
        if self.framer.is_accumulating() || self.transport.bytes_available() {
            return SniffState::Busy;
        }
        if self.send_command() {
            return SniffState::Busy;
        }
        SniffState::Idle
    }

    /// Next completed frame, oldest first.
    pub fn next_frame(&mut self) -> Option<Frame> {
        self.framer.pop()
    }

    /// Latest status and whether it is new, leaving the flag set.
    pub fn status(&self) -> (&StatusData, bool) {
        self.status.peek()
    }

    /// Latest status and whether it was new; the flag is cleared.
    pub fn take_status(&mut self) -> (StatusData, bool) {
        self.status.take()
    }

    /// Last observed ack code, cleared on read.
    pub fn take_ack(&mut self) -> Option<u16> {
        match self.ack.take() {
            (code, true) => Some(code),
            _ => None,
        }
    }

    /// Commands waiting for transmission or acknowledgement.
    pub fn pending_commands(&self) -> usize {
        self.commands.len()
    }

    fn inspect(&mut self, frame: &Frame) {
        inc(FRAMES_RECEIVED);
        match Message::decode(frame.as_bytes()) {
            Ok(Message::Ack(Ack { data_type })) => {
                trace!(data_type, "ack observed");
                self.ack.put(data_type);
                self.commands.on_ack(data_type);
            }
            Ok(Message::Status(status)) => {
                inc(STATUS_UPDATES);
                trace!(extended = status.extended_data, "status observed");
                self.status.put(status);
                self.status_seen = true;
            }
            Ok(message) => trace!("observed {}", message),
            Err(err) => {
                inc(FRAMES_INVALID);
                trace!(code = err.code(), "undecodable frame {}: {}", frame, err);
            }
        }
    }

    fn send_command(&mut self) -> bool {
        let now = self.clock.now_ms();
        match self.commands.next_transmission(now) {
            Some(frame) => {
                self.write(frame.as_bytes(), false);
                true
            }
            None => false,
        }
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Switch a mode or an operation by name.
    ///
    /// Mode names (`auto`, `quiet`, `night`) and operation names (`heating`,
    /// `hot_water`) are accepted; anything else is ignored. Returns whether a
    /// command was queued.
    pub fn set_mode(&mut self, name: &str, on: bool) -> bool {
        if let Ok(mode) = name.parse::<Mode>() {
            return self.switch_mode(mode, on);
        }
        if let Ok(operation) = name.parse::<Operation>() {
            return self.switch_operation(operation, on);
        }
        debug!(name, "ignoring unknown mode");
        false
    }

    pub fn switch_mode(&mut self, mode: Mode, on: bool) -> bool {
        self.commands.enqueue_frame(ModeSwitch::new(mode, on).encode())
    }

    pub fn switch_operation(&mut self, operation: Operation, on: bool) -> bool {
        self.commands.enqueue_frame(OperationSwitch::new(operation, on).encode())
    }

    /// Set a zone's target temperature.
    ///
    /// The heating frame also carries the other targets, taken from the
    /// latest status, so it is refused until a status has been observed.
    /// Out-of-range values are clamped.
    pub fn set_temperature(&mut self, zone: Zone, celsius: u8) -> bool {
        if zone == Zone::Heating && !self.status_seen {
            warn!("no status observed yet, refusing heating target change");
            return false;
        }
        let status = self.status.peek().0;
        let command = match zone {
            Zone::Heating => TemperatureCommand::Heating {
                heating: celsius,
                zone2: status.zone2_target,
                hot_water: status.hot_water_target,
            },
            Zone::HotWater => TemperatureCommand::HotWater { hot_water: celsius },
        };
        self.commands.enqueue_frame(command.encode())
    }

    /// [`EstiaSerial::set_temperature`] by zone name; unknown names are
    /// ignored.
    pub fn set_temperature_by_name(&mut self, zone: &str, celsius: u8) -> bool {
        match zone.parse::<Zone>() {
            Ok(zone) => self.set_temperature(zone, celsius),
            Err(_) => {
                debug!(zone, "ignoring unknown zone");
                false
            }
        }
    }

    /// Force a defrost at the next operation start.
    pub fn force_defrost(&mut self, on: bool) -> bool {
        self.commands.enqueue_frame(ForcedDefrost::new(on).encode())
    }

    // ========================================================================
    // Data Requests
    // ========================================================================

    /// Request one sensor value by code, blocking until it arrives or the
    /// request times out.
    pub fn request_data(&mut self, code: u8) -> Result<i16, RequestError> {
        request_data(
            &mut self.transport,
            &self.clock,
            &mut self.indicator,
            &self.config,
            code,
        )
    }

    /// Request a sensor by name, returning its scaled value.
    pub fn request_data_by_name(&mut self, name: &str) -> Result<f32, RequestError> {
        let sensor =
            sensors::lookup(name).ok_or_else(|| RequestError::UnknownSensor(name.to_string()))?;
        let value = self.request_data(sensor.code)?;
        Ok(f32::from(value) * sensor.multiplier)
    }

    /// Poll the next sensor of the configured list. Returns `true` when the
    /// call completed a round.
    pub fn request_sensors(&mut self) -> bool {
        let names = self.config.sensors.clone();
        self.request_sensors_from(&names)
    }

    /// Poll the next sensor of `names`. Returns `true` when the call
    /// completed a round.
    pub fn request_sensors_from<S: AsRef<str>>(&mut self, names: &[S]) -> bool {
        let EstiaSerial {
            transport,
            clock,
            indicator,
            config,
            poller,
            sensors,
            ..
        } = self;
        poller.step(names, sensors, config.clear_sensors_each_round, |code| {
            request_data(transport, clock, indicator, config, code)
        })
    }

    pub fn sensors(&self) -> &SensorTable {
        &self.sensors
    }

    pub fn clear_sensors(&mut self) {
        self.sensors.clear();
    }

    // ========================================================================
    // Line I/O
    // ========================================================================

    fn write(&mut self, bytes: &[u8], suspend_rx: bool) {
        write_frame(&mut self.transport, &mut self.indicator, bytes, suspend_rx);
    }

    /// Drain available bytes, stopping once the next frame's sentinel has
    /// been read.
    fn read_burst(&mut self) -> Vec<u8> {
        read_burst(
            &mut self.transport,
            &self.clock,
            &mut self.indicator,
            self.config.byte_delay_ms,
        )
    }
}

fn write_frame<T: Transport, I: Indicator>(
    transport: &mut T,
    indicator: &mut I,
    bytes: &[u8],
    suspend_rx: bool,
) {
    indicator.set(true);
    if let Err(err) = transport.write(bytes, suspend_rx) {
        warn!("serial write failed: {}", err);
    }
    indicator.set(false);
}

fn read_burst<T: Transport, C: Clock, I: Indicator>(
    transport: &mut T,
    clock: &C,
    indicator: &mut I,
    byte_delay_ms: u64,
) -> Vec<u8> {
    let mut buffer = Vec::new();
    if !transport.bytes_available() {
        return buffer;
    }
    indicator.set(true);
    while let Some(byte) = transport.read_byte() {
        buffer.push(byte);
        if buffer.len() > FRAME_SENTINEL.len() && buffer.ends_with(&FRAME_SENTINEL) {
            break;
        }
        if byte_delay_ms > 0 {
            clock.sleep_ms(byte_delay_ms);
        }
    }
    indicator.set(false);
    buffer
}

fn request_data<T: Transport, C: Clock, I: Indicator>(
    transport: &mut T,
    clock: &C,
    indicator: &mut I,
    config: &EstiaConfig,
    code: u8,
) -> Result<i16, RequestError> {
    let request = DataRequest::new(code).encode();
    inc(SENSOR_REQUESTS);
    trace!(code, "data request {}", request);
    write_frame(transport, indicator, request.as_bytes(), true);

    let started = clock.now_ms();
    while !transport.bytes_available() {
        if clock.now_ms().saturating_sub(started) > config.request_timeout_ms {
            debug!(code, "data request timed out");
            return Err(RequestError::Timeout(config.request_timeout_ms));
        }
        clock.sleep_ms(config.request_poll_ms.max(1));
    }
    clock.sleep_ms(config.request_settle_ms);

    let response = read_burst(transport, clock, indicator, config.byte_delay_ms);
    trace!(code, "data response {:02x?}", response);
    let DataResponse { value } = DataResponse::decode(&response)?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{ManualClock, SimTransport};
    use estia_frame::{FrameKind, DATA_TYPE_MODE_CHANGE, ERR_TIMEOUT};

    const STATUS_LONG: [u8; 31] = [
        0xa0, 0x00, 0x58, 0x19, 0x08, 0x00, 0x00, 0xfe, 0x00, 0x03, 0xc6, 0xc1, 0x04, 0x12, 0x84,
        0x66, 0x5c, 0x84, 0x66, 0x5c, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x31,
        0x58,
    ];

    fn engine() -> (EstiaSerial<SimTransport, ManualClock>, SimTransport, ManualClock) {
        let sim = SimTransport::new();
        let clock = ManualClock::new(1_000);
        let estia = EstiaSerial::new(sim.clone(), clock.clone(), EstiaConfig::default());
        (estia, sim, clock)
    }

    /// Tick until the engine goes idle, draining frames as they complete.
    fn settle(estia: &mut EstiaSerial<SimTransport, ManualClock>, clock: &ManualClock) -> Vec<Frame> {
        let mut frames = Vec::new();
        for _ in 0..50 {
            match estia.sniff() {
                SniffState::FramePending => frames.extend(std::iter::from_fn(|| estia.next_frame())),
                SniffState::Busy => clock.advance(60),
                SniffState::Idle => break,
            }
        }
        frames
    }

    #[test]
    fn test_begin_applies_settings() {
        let (mut estia, sim, _) = engine();
        estia.begin().expect("begin");
        assert_eq!(sim.settings().map(|s| s.baud_rate), Some(2400));
    }

    #[test]
    fn test_sniff_decodes_status() {
        let (mut estia, sim, clock) = engine();
        sim.inject(&STATUS_LONG);

        let frames = settle(&mut estia, &clock);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].kind(), Some(FrameKind::Status));

        let (status, fresh) = estia.take_status();
        assert!(fresh);
        assert!(status.heating);
        assert_eq!(status.heating_target, 35);
        assert!(!estia.take_status().1);
    }

    #[test]
    fn test_set_temperature_uses_latest_status() {
        let (mut estia, sim, clock) = engine();
        sim.inject(&STATUS_LONG);
        settle(&mut estia, &clock);

        assert!(estia.set_temperature(Zone::Heating, 40));
        settle(&mut estia, &clock);

        let writes = sim.writes();
        let frame = writes.last().expect("temperature frame written");
        assert_eq!(
            TemperatureCommand::decode(frame),
            Ok(TemperatureCommand::Heating { heating: 40, zone2: 30, hot_water: 50 })
        );
    }

    #[test]
    fn test_heating_target_needs_a_status() {
        let (mut estia, sim, clock) = engine();
        assert!(!estia.set_temperature(Zone::Heating, 40));
        assert_eq!(estia.pending_commands(), 0);

        // Hot water frames carry no other targets
        assert!(estia.set_temperature(Zone::HotWater, 45));
        settle(&mut estia, &clock);
        let writes = sim.writes();
        assert_eq!(
            TemperatureCommand::decode(writes.last().expect("hot water frame written")),
            Ok(TemperatureCommand::HotWater { hot_water: 45 })
        );

        sim.inject(&STATUS_LONG);
        settle(&mut estia, &clock);
        assert!(estia.set_temperature(Zone::Heating, 40));
    }

    #[test]
    fn test_command_acked_by_heat_pump() {
        let (mut estia, sim, clock) = engine();
        sim.set_responder(|frame| {
            let data_type = Frame::from_bytes(frame.to_vec()).data_type()?;
            Some(Ack::new(data_type).encode().into_bytes())
        });

        assert!(estia.set_mode("quiet", true));
        assert_eq!(estia.pending_commands(), 1);

        // First tick writes the command, later ticks read the ack
        assert_eq!(estia.sniff(), SniffState::Busy);
        settle(&mut estia, &clock);

        assert_eq!(estia.pending_commands(), 0);
        assert_eq!(estia.take_ack(), Some(DATA_TYPE_MODE_CHANGE));
        assert_eq!(estia.take_ack(), None);
        assert_eq!(sim.writes().len(), 1);
    }

    #[test]
    fn test_unknown_names_are_ignored() {
        let (mut estia, _, _) = engine();
        assert!(!estia.set_mode("cooling", true));
        assert!(!estia.set_temperature_by_name("garage", 30));
        assert_eq!(estia.pending_commands(), 0);
    }

    #[test]
    fn test_request_data_timeout_and_response() {
        let (mut estia, sim, clock) = engine();
        let started = clock.now_ms();
        assert_eq!(estia.request_data(0x61), Err(RequestError::Timeout(200)));
        assert!(clock.now_ms() - started > 200);
        assert_eq!(RequestError::Timeout(200).code(), ERR_TIMEOUT);

        sim.set_responder(|frame| {
            let code = DataRequest::decode(frame).ok()?.code;
            Some(DataResponse::encode(Some(i16::from(code))).into_bytes())
        });
        assert_eq!(estia.request_data(0x61), Ok(0x61));
        assert_eq!(sim.writes().last().map(|w| w[16]), Some(0x61));
    }

    #[test]
    fn test_read_burst_pauses_after_each_byte() {
        let sim = SimTransport::new();
        let mut transport = sim.clone();
        let clock = ManualClock::new(0);
        sim.inject(&[0x01, 0x02, 0x03]);

        let bytes = read_burst(&mut transport, &clock, &mut NoIndicator, 5);
        assert_eq!(bytes, vec![0x01, 0x02, 0x03]);
        assert_eq!(clock.now_ms(), 15);
    }

    #[test]
    fn test_write_failure_does_not_panic() {
        let (mut estia, sim, _) = engine();
        sim.fail_writes(true);
        estia.force_defrost(true);
        assert_eq!(estia.sniff(), SniffState::Busy);
    }
}
