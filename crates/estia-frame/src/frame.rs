//! Frame buffer shared by every frame kind.
//!
//! A [`Frame`] is an owned byte buffer. Frames built for transmission are
//! stamped with the header of their kind, filled at fixed offsets and sealed
//! with the checksum last. Frames read from the wire wrap whatever bytes the
//! stream framer produced and are only interpreted through [`check_frame`].

use crate::checksum::crc16;
use crate::constants::*;
use crate::error::{FrameError, FrameResult};
use crate::kind::FrameKind;

/// An owned protocol frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Frame {
    buf: Vec<u8>,
}

impl Frame {
    /// Allocate a frame of the given kind with its header, addresses and
    /// data-type stamped and all fields zeroed. The checksum is not sealed.
    pub fn new(kind: FrameKind) -> Self {
        let mut buf = vec![0u8; kind.len()];
        buf[..2].copy_from_slice(&FRAME_SENTINEL);
        buf[FRAME_TYPE_OFFSET] = kind.frame_type();
        buf[FRAME_DATA_LEN_OFFSET] = kind.data_len();
        let (src, dst) = kind.addresses();
        buf[FRAME_SRC_OFFSET..FRAME_SRC_OFFSET + 2].copy_from_slice(&src.to_be_bytes());
        buf[FRAME_DST_OFFSET..FRAME_DST_OFFSET + 2].copy_from_slice(&dst.to_be_bytes());
        buf[FRAME_DATA_TYPE_OFFSET..FRAME_DATA_TYPE_OFFSET + 2]
            .copy_from_slice(&kind.data_type().to_be_bytes());
        Frame { buf }
    }

    /// Wrap bytes received from the wire. No validation is performed.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Frame { buf: bytes.into() }
    }

    /// Get the underlying bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the frame, returning its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Total length in bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the frame holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Read a byte, if present.
    pub fn byte(&self, position: usize) -> Option<u8> {
        self.buf.get(position).copied()
    }

    /// Read a big-endian u16 starting at `offset`, if present.
    pub fn read_u16(&self, offset: usize) -> Option<u16> {
        read_u16(&self.buf, offset)
    }

    /// Overwrite a byte. Returns `false` if `position` is out of range.
    ///
    /// The checksum is left stale; call [`Frame::seal`] once every field is
    /// written.
    pub fn set_byte(&mut self, position: usize, value: u8) -> bool {
        match self.buf.get_mut(position) {
            Some(byte) => {
                *byte = value;
                true
            }
            None => false,
        }
    }

    /// Copy `data` over the frame body starting at the source address.
    pub fn insert_data(&mut self, data: &[u8]) -> bool {
        let end = FRAME_DATA_OFFSET + data.len();
        if end + FRAME_CRC_LEN > self.buf.len() {
            return false;
        }
        self.buf[FRAME_DATA_OFFSET..end].copy_from_slice(data);
        true
    }

    /// Recompute the checksum and stamp it into the trailing two bytes.
    pub fn seal(&mut self) {
        if self.buf.len() < FRAME_CRC_LEN {
            return;
        }
        let body = self.buf.len() - FRAME_CRC_LEN;
        let crc = crc16(&self.buf[..body]);
        self.buf[body..].copy_from_slice(&crc.to_be_bytes());
    }

    /// Whether the frame begins with the sentinel.
    pub fn starts_with_sentinel(&self) -> bool {
        self.buf.starts_with(&FRAME_SENTINEL)
    }

    /// Frame type byte.
    pub fn frame_type(&self) -> Option<u8> {
        self.byte(FRAME_TYPE_OFFSET)
    }

    /// Declared data length byte.
    pub fn declared_data_len(&self) -> Option<u8> {
        self.byte(FRAME_DATA_LEN_OFFSET)
    }

    /// Length implied by the declared data length.
    pub fn expected_len(&self) -> Option<usize> {
        expected_len(&self.buf)
    }

    /// Data-type code.
    pub fn data_type(&self) -> Option<u16> {
        self.read_u16(FRAME_DATA_TYPE_OFFSET)
    }

    /// Checksum stored in the trailing two bytes.
    pub fn stored_crc(&self) -> Option<u16> {
        let len = self.buf.len();
        (len >= FRAME_CRC_LEN).then(|| read_u16(&self.buf, len - FRAME_CRC_LEN)).flatten()
    }

    /// Checksum computed over everything but the trailing two bytes.
    pub fn computed_crc(&self) -> Option<u16> {
        let len = self.buf.len();
        (len >= FRAME_CRC_LEN).then(|| crc16(&self.buf[..len - FRAME_CRC_LEN]))
    }

    /// Whether the stored checksum matches the frame body.
    pub fn has_valid_crc(&self) -> bool {
        matches!((self.stored_crc(), self.computed_crc()), (Some(s), Some(c)) if s == c)
    }

    /// Kind named by the header, if any.
    pub fn kind(&self) -> Option<FrameKind> {
        FrameKind::classify(&self.buf)
    }

    /// Compact lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.buf)
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.buf
    }
}

impl From<Vec<u8>> for Frame {
    fn from(buf: Vec<u8>) -> Self {
        Frame { buf }
    }
}

impl std::fmt::Display for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, byte) in self.buf.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Read a big-endian u16 from a byte slice.
pub(crate) fn read_u16(bytes: &[u8], offset: usize) -> Option<u16> {
    let hi = *bytes.get(offset)?;
    let lo = *bytes.get(offset + 1)?;
    Some(u16::from_be_bytes([hi, lo]))
}

/// Total length implied by a header, when the bytes start with the sentinel
/// and the declared-length byte has arrived.
pub fn expected_len(bytes: &[u8]) -> Option<usize> {
    if bytes.len() < FRAME_HEADER_LEN || !bytes.starts_with(&FRAME_SENTINEL) {
        return None;
    }
    Some(FRAME_HEAD_AND_CRC_LEN + bytes[FRAME_DATA_LEN_OFFSET] as usize)
}

/// Validate `bytes` as a frame of `kind`, returning the frame-sized slice.
///
/// Bytes beyond the kind's length are ignored. Checks run in order:
/// checksum, frame type, declared data length, data type. A buffer shorter
/// than the kind is reported as a data-length error before any checksum is
/// computed; it is never zero-padded.
pub fn check_frame(bytes: &[u8], kind: FrameKind) -> FrameResult<&[u8]> {
    let len = kind.len();
    if bytes.len() < len {
        return Err(FrameError::WrongDataLength {
            expected: len,
            actual: bytes.len(),
        });
    }
    let frame = &bytes[..len];

    let body = len - FRAME_CRC_LEN;
    let expected = crc16(&frame[..body]);
    let actual = u16::from_be_bytes([frame[body], frame[body + 1]]);
    if expected != actual {
        return Err(FrameError::ChecksumMismatch { expected, actual });
    }

    let frame_type = frame[FRAME_TYPE_OFFSET];
    if frame_type != kind.frame_type() {
        return Err(FrameError::WrongFrameType {
            expected: kind.frame_type(),
            actual: frame_type,
        });
    }

    let data_len = frame[FRAME_DATA_LEN_OFFSET];
    if data_len != kind.data_len() {
        return Err(FrameError::WrongDataLength {
            expected: kind.data_len() as usize,
            actual: data_len as usize,
        });
    }

    let data_type = u16::from_be_bytes([
        frame[FRAME_DATA_TYPE_OFFSET],
        frame[FRAME_DATA_TYPE_OFFSET + 1],
    ]);
    if data_type != kind.data_type() {
        return Err(FrameError::WrongDataType {
            expected: kind.data_type(),
            actual: data_type,
        });
    }

    Ok(frame)
}
