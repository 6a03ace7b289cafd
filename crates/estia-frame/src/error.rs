//! Frame decoding errors.

use thiserror::Error;

use crate::constants::*;

/// Errors that can occur when validating or decoding a frame.
///
/// Checks run in a fixed order (checksum, frame type, declared data length,
/// data type, payload) and the first failing check is reported.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// Stored checksum does not match the computed one.
    #[error("checksum mismatch: expected 0x{expected:04X}, got 0x{actual:04X}")]
    ChecksumMismatch {
        /// Checksum computed over the frame body.
        expected: u16,
        /// Checksum stored in the trailing two bytes.
        actual: u16,
    },

    /// Frame type byte is not the one the decoder expects.
    #[error("wrong frame type: expected 0x{expected:02X}, got 0x{actual:02X}")]
    WrongFrameType {
        /// Expected type code.
        expected: u8,
        /// Received type code.
        actual: u8,
    },

    /// Declared data length is inconsistent with the frame kind, or the
    /// buffer is too short to hold the kind.
    #[error("wrong data length: expected {expected}, got {actual}")]
    WrongDataLength {
        /// Expected length.
        expected: usize,
        /// Received length.
        actual: usize,
    },

    /// Data-type code at the fixed payload offset does not match.
    #[error("wrong data type: expected 0x{expected:04X}, got 0x{actual:04X}")]
    WrongDataType {
        /// Expected data-type code.
        expected: u16,
        /// Received data-type code.
        actual: u16,
    },

    /// Data response carries the "empty data" flag.
    #[error("response carries no data")]
    DataEmpty,

    /// A kind-specific field holds a value the kind does not define.
    #[error("invalid value 0x{value:02X} at offset {offset}")]
    InvalidField {
        /// Byte offset of the field.
        offset: usize,
        /// Received value.
        value: u8,
    },

    /// Type and declared length match no known frame kind.
    #[error("unknown frame kind: type 0x{frame_type:02X}, data length {data_len}")]
    UnknownKind {
        /// Received type code.
        frame_type: u8,
        /// Received declared data length.
        data_len: u8,
    },
}

impl FrameError {
    /// The signed sentinel code reported for this error.
    pub fn code(&self) -> i16 {
        match self {
            FrameError::ChecksumMismatch { .. } => ERR_CRC,
            FrameError::WrongFrameType { .. } | FrameError::UnknownKind { .. } => ERR_FRAME_TYPE,
            FrameError::WrongDataLength { .. } => ERR_DATA_LEN,
            FrameError::WrongDataType { .. } | FrameError::InvalidField { .. } => ERR_DATA_TYPE,
            FrameError::DataEmpty => ERR_DATA_EMPTY,
        }
    }
}

/// A symbolic name that is not in the relevant name table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown name: {0}")]
pub struct UnknownName(pub String);

/// Result type alias for frame operations.
pub type FrameResult<T> = Result<T, FrameError>;
