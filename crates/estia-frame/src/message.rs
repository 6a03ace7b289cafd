//! Typed view over every frame kind.

use log::trace;

use crate::commands::{ForcedDefrost, ModeSwitch, OperationSwitch, TemperatureCommand};
use crate::constants::*;
use crate::data::{Ack, DataRequest, DataResponse, Heartbeat};
use crate::error::{FrameError, FrameResult};
use crate::frame::Frame;
use crate::kind::FrameKind;
use crate::status::{decode_status, StatusData};

/// A decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Heartbeat,
    SetMode(ModeSwitch),
    Switch(OperationSwitch),
    Temperature(TemperatureCommand),
    ForcedDefrost(ForcedDefrost),
    DataRequest(DataRequest),
    DataResponse(DataResponse),
    Ack(Ack),
    /// Long status or short status update; `extended_data` tells them apart.
    Status(StatusData),
}

impl Message {
    /// Classify `bytes` by their header and decode the matching kind.
    pub fn decode(bytes: &[u8]) -> FrameResult<Message> {
        let result = Self::decode_inner(bytes);
        if let Err(err) = &result {
            trace!("frame rejected ({}): {}", err, hex::encode(bytes));
        }
        result
    }

    fn decode_inner(bytes: &[u8]) -> FrameResult<Message> {
        if bytes.len() < FRAME_HEADER_LEN || !bytes.starts_with(&FRAME_SENTINEL) {
            return Err(FrameError::WrongDataLength {
                expected: FRAME_MIN_LEN,
                actual: bytes.len(),
            });
        }
        let frame_type = bytes[FRAME_TYPE_OFFSET];
        let data_len = bytes[FRAME_DATA_LEN_OFFSET];
        let kind = FrameKind::from_header(frame_type, data_len)
            .ok_or(FrameError::UnknownKind { frame_type, data_len })?;

        let message = match kind {
            FrameKind::Heartbeat => Heartbeat::decode(bytes).map(|_| Message::Heartbeat)?,
            FrameKind::SetMode => Message::SetMode(ModeSwitch::decode(bytes)?),
            FrameKind::Switch => Message::Switch(OperationSwitch::decode(bytes)?),
            FrameKind::Temperature => Message::Temperature(TemperatureCommand::decode(bytes)?),
            FrameKind::ForcedDefrost => Message::ForcedDefrost(ForcedDefrost::decode(bytes)?),
            FrameKind::DataRequest => Message::DataRequest(DataRequest::decode(bytes)?),
            FrameKind::DataResponse => Message::DataResponse(DataResponse::decode(bytes)?),
            FrameKind::Ack => Message::Ack(Ack::decode(bytes)?),
            FrameKind::Status | FrameKind::StatusUpdate => Message::Status(decode_status(bytes)?),
        };
        Ok(message)
    }

    /// Frame kind of this message.
    pub fn kind(&self) -> FrameKind {
        match self {
            Message::Heartbeat => FrameKind::Heartbeat,
            Message::SetMode(_) => FrameKind::SetMode,
            Message::Switch(_) => FrameKind::Switch,
            Message::Temperature(_) => FrameKind::Temperature,
            Message::ForcedDefrost(_) => FrameKind::ForcedDefrost,
            Message::DataRequest(_) => FrameKind::DataRequest,
            Message::DataResponse(_) => FrameKind::DataResponse,
            Message::Ack(_) => FrameKind::Ack,
            Message::Status(status) if status.extended_data => FrameKind::Status,
            Message::Status(_) => FrameKind::StatusUpdate,
        }
    }

    /// Build the sealed frame for kinds this node transmits or simulates.
    ///
    /// Status snapshots are lossy and are not re-encoded.
    pub fn encode(&self) -> Option<Frame> {
        match self {
            Message::Heartbeat => Some(Heartbeat.encode()),
            Message::SetMode(cmd) => Some(cmd.encode()),
            Message::Switch(cmd) => Some(cmd.encode()),
            Message::Temperature(cmd) => Some(cmd.encode()),
            Message::ForcedDefrost(cmd) => Some(cmd.encode()),
            Message::DataRequest(req) => Some(req.encode()),
            Message::DataResponse(res) => Some(DataResponse::encode(Some(res.value))),
            Message::Ack(ack) => Some(ack.encode()),
            Message::Status(_) => None,
        }
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Message::Heartbeat => write!(f, "heartbeat"),
            Message::SetMode(cmd) => {
                write!(f, "set-mode {} {}", cmd.mode.name(), on_off(cmd.on))
            }
            Message::Switch(cmd) => {
                write!(f, "switch {} {}", cmd.operation.name(), on_off(cmd.on))
            }
            Message::Temperature(TemperatureCommand::Heating { heating, zone2, hot_water }) => {
                write!(f, "temperature heating={heating} zone2={zone2} hot_water={hot_water}")
            }
            Message::Temperature(TemperatureCommand::HotWater { hot_water }) => {
                write!(f, "temperature hot_water={hot_water}")
            }
            Message::ForcedDefrost(cmd) => write!(f, "forced-defrost {}", on_off(cmd.on)),
            Message::DataRequest(req) => write!(f, "data-request 0x{:02x}", req.code),
            Message::DataResponse(res) => write!(f, "data-response {}", res.value),
            Message::Ack(ack) => write!(f, "ack 0x{:04x}", ack.data_type),
            Message::Status(status) => write!(
                f,
                "{} heating={} hot_water={} targets={}/{}/{}",
                self.kind(),
                status.heating,
                status.hot_water,
                status.heating_target,
                status.zone2_target,
                status.hot_water_target,
            ),
        }
    }
}

fn on_off(on: bool) -> &'static str {
    if on {
        "on"
    } else {
        "off"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{Mode, Operation};

    #[test]
    fn test_decode_dispatches_by_header() {
        let ack = [0xa0, 0x00, 0x18, 0x09, 0x40, 0x08, 0x00, 0x00, 0x00, 0x00, 0xa1, 0x00, 0x41, 0x06, 0xae];
        assert_eq!(
            Message::decode(&ack),
            Ok(Message::Ack(Ack::new(DATA_TYPE_OPERATION_SWITCH)))
        );

        let defrost = [0xa0, 0x00, 0x11, 0x0a, 0x00, 0x00, 0x40, 0x08, 0x00, 0x00, 0x15, 0x46, 0x01, 0x00, 0x2d, 0x6d];
        assert_eq!(
            Message::decode(&defrost),
            Ok(Message::ForcedDefrost(ForcedDefrost::new(true)))
        );

        let heartbeat = [0xa0, 0x00, 0x10, 0x07, 0x08, 0x00, 0x00, 0xfe, 0x00, 0x00, 0x8a, 0xcf, 0xf7];
        assert_eq!(Message::decode(&heartbeat), Ok(Message::Heartbeat));
    }

    #[test]
    fn test_decode_status_kinds() {
        let short = [
            0xa0, 0x00, 0x1c, 0x0f, 0x08, 0x00, 0x00, 0xfe, 0x00, 0x00, 0x2b, 0xc2, 0x20, 0x0c,
            0x84, 0x66, 0x5c, 0x12, 0x00, 0x6b, 0xb8,
        ];
        let message = Message::decode(&short).expect("status update");
        assert_eq!(message.kind(), FrameKind::StatusUpdate);
        assert!(message.encode().is_none());
        assert_eq!(
            message.to_string(),
            "status-update heating=false hot_water=true targets=35/30/50"
        );
    }

    #[test]
    fn test_encode_matches_builders() {
        let messages = [
            Message::SetMode(ModeSwitch::new(Mode::Quiet, false)),
            Message::Switch(OperationSwitch::new(Operation::HotWater, true)),
            Message::Temperature(TemperatureCommand::HotWater { hot_water: 55 }),
            Message::DataRequest(DataRequest::new(0x0e)),
            Message::DataResponse(DataResponse { value: -3 }),
            Message::Heartbeat,
        ];
        for message in messages {
            let frame = message.encode().expect("transmittable kind");
            assert_eq!(frame.kind(), Some(message.kind()));
            assert_eq!(Message::decode(frame.as_bytes()), Ok(message));
        }
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(
            Message::decode(&[0xa0, 0x00, 0x30, 0x07, 0, 0, 0, 0, 0, 0, 0, 0, 0]),
            Err(FrameError::UnknownKind { frame_type: 0x30, data_len: 0x07 })
        ));
        assert_eq!(Message::decode(&[0x12, 0x34]).unwrap_err().code(), ERR_DATA_LEN);

        // An undefined switch value is rejected after the header checks pass
        let mut frame = OperationSwitch::new(Operation::Heating, true).encode();
        frame.set_byte(SWITCH_VALUE_OFFSET, 0x55);
        frame.seal();
        assert_eq!(
            Message::decode(frame.as_bytes()),
            Err(FrameError::InvalidField { offset: SWITCH_VALUE_OFFSET, value: 0x55 })
        );
    }
}
