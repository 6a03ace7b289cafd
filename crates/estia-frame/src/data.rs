//! Data request/response exchange, acknowledgements and heartbeats.

use crate::constants::*;
use crate::error::{FrameError, FrameResult};
use crate::frame::{check_frame, read_u16, Frame};
use crate::kind::FrameKind;

/// Request for a single sensor value by its one-byte code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataRequest {
    pub code: u8,
}

impl DataRequest {
    pub fn new(code: u8) -> Self {
        DataRequest { code }
    }

    pub fn encode(&self) -> Frame {
        let mut frame = Frame::new(FrameKind::DataRequest);
        frame.insert_data(&REQ_DATA_TEMPLATE);
        frame.set_byte(REQ_DATA_CODE_OFFSET, self.code);
        frame.seal();
        frame
    }

    pub fn decode(bytes: &[u8]) -> FrameResult<Self> {
        let frame = check_frame(bytes, FrameKind::DataRequest)?;
        Ok(DataRequest {
            code: frame[REQ_DATA_CODE_OFFSET],
        })
    }
}

/// Reply to a [`DataRequest`] carrying a signed 16-bit value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataResponse {
    pub value: i16,
}

impl DataResponse {
    /// Decode a response. A response flagged empty yields
    /// [`FrameError::DataEmpty`].
    pub fn decode(bytes: &[u8]) -> FrameResult<Self> {
        let frame = check_frame(bytes, FrameKind::DataResponse)?;
        if frame[RES_DATA_EMPTY_OFFSET] == RES_DATA_EMPTY_FLAG {
            return Err(FrameError::DataEmpty);
        }
        let raw = read_u16(frame, RES_DATA_VALUE_OFFSET).ok_or(FrameError::WrongDataLength {
            expected: FRAME_RES_DATA_LEN,
            actual: frame.len(),
        })?;
        Ok(DataResponse { value: raw as i16 })
    }

    /// Build a response frame the way the heat pump answers. Used when
    /// simulating the unit.
    pub fn encode(value: Option<i16>) -> Frame {
        let mut frame = Frame::new(FrameKind::DataResponse);
        frame.set_byte(FRAME_DATA_TYPE_OFFSET + 2, (DATA_TYPE_DATA_REQUEST >> 8) as u8);
        frame.set_byte(FRAME_DATA_TYPE_OFFSET + 3, DATA_TYPE_DATA_REQUEST as u8);
        match value {
            Some(value) => {
                frame.set_byte(RES_DATA_EMPTY_OFFSET, 0x2c);
                let [hi, lo] = value.to_be_bytes();
                frame.set_byte(RES_DATA_VALUE_OFFSET, hi);
                frame.set_byte(RES_DATA_VALUE_OFFSET + 1, lo);
            }
            None => {
                frame.set_byte(RES_DATA_EMPTY_OFFSET, RES_DATA_EMPTY_FLAG);
            }
        }
        frame.seal();
        frame
    }
}

/// Acknowledgement of a command, naming the data-type it acknowledges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ack {
    pub data_type: u16,
}

impl Ack {
    pub fn new(data_type: u16) -> Self {
        Ack { data_type }
    }

    pub fn encode(&self) -> Frame {
        let mut frame = Frame::new(FrameKind::Ack);
        let [hi, lo] = self.data_type.to_be_bytes();
        frame.set_byte(ACK_FRAME_CODE_OFFSET, hi);
        frame.set_byte(ACK_FRAME_CODE_OFFSET + 1, lo);
        frame.seal();
        frame
    }

    pub fn decode(bytes: &[u8]) -> FrameResult<Self> {
        let frame = check_frame(bytes, FrameKind::Ack)?;
        let data_type = read_u16(frame, ACK_FRAME_CODE_OFFSET).ok_or(FrameError::WrongDataLength {
            expected: FRAME_ACK_LEN,
            actual: frame.len(),
        })?;
        Ok(Ack { data_type })
    }
}

/// Periodic keep-alive broadcast by the master controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Heartbeat;

impl Heartbeat {
    pub fn encode(&self) -> Frame {
        let mut frame = Frame::new(FrameKind::Heartbeat);
        frame.seal();
        frame
    }

    pub fn decode(bytes: &[u8]) -> FrameResult<Self> {
        check_frame(bytes, FrameKind::Heartbeat)?;
        Ok(Heartbeat)
    }
}
