//! Frame kinds and their fixed layouts.

use serde::{Deserialize, Serialize};

use crate::constants::*;

/// Every kind of frame carried on the bus.
///
/// The `(type, declared length)` pair identifies a kind on its own; the
/// data-type code is checked after the kind has been chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameKind {
    Heartbeat,
    SetMode,
    Switch,
    Temperature,
    ForcedDefrost,
    DataRequest,
    DataResponse,
    Ack,
    Status,
    StatusUpdate,
}

impl FrameKind {
    /// All kinds, in classification order.
    pub const ALL: [FrameKind; 10] = [
        FrameKind::Status,
        FrameKind::StatusUpdate,
        FrameKind::Ack,
        FrameKind::DataResponse,
        FrameKind::DataRequest,
        FrameKind::Heartbeat,
        FrameKind::SetMode,
        FrameKind::Switch,
        FrameKind::Temperature,
        FrameKind::ForcedDefrost,
    ];

    /// Frame type byte.
    pub const fn frame_type(self) -> u8 {
        match self {
            FrameKind::Heartbeat => FRAME_TYPE_HEARTBEAT,
            FrameKind::SetMode
            | FrameKind::Switch
            | FrameKind::Temperature
            | FrameKind::ForcedDefrost => FRAME_TYPE_SET,
            FrameKind::DataRequest => FRAME_TYPE_REQ_DATA,
            FrameKind::DataResponse => FRAME_TYPE_RES_DATA,
            FrameKind::Ack => FRAME_TYPE_ACK,
            FrameKind::Status => FRAME_TYPE_STATUS,
            FrameKind::StatusUpdate => FRAME_TYPE_UPDATE,
        }
    }

    /// Declared data length byte.
    pub const fn data_len(self) -> u8 {
        match self {
            FrameKind::Heartbeat => HEARTBEAT_DATA_LEN,
            FrameKind::SetMode => SET_MODE_DATA_LEN,
            FrameKind::Switch => SWITCH_DATA_LEN,
            FrameKind::Temperature => TEMPERATURE_DATA_LEN,
            FrameKind::ForcedDefrost => FORCE_DEFROST_DATA_LEN,
            FrameKind::DataRequest => REQ_DATA_DATA_LEN,
            FrameKind::DataResponse => RES_DATA_DATA_LEN,
            FrameKind::Ack => ACK_DATA_LEN,
            FrameKind::Status => STATUS_DATA_LEN,
            FrameKind::StatusUpdate => UPDATE_DATA_LEN,
        }
    }

    /// Data-type code at [`FRAME_DATA_TYPE_OFFSET`].
    pub const fn data_type(self) -> u16 {
        match self {
            FrameKind::Heartbeat => DATA_TYPE_HEARTBEAT,
            FrameKind::SetMode => DATA_TYPE_MODE_CHANGE,
            FrameKind::Switch => DATA_TYPE_OPERATION_SWITCH,
            FrameKind::Temperature => DATA_TYPE_TEMPERATURE_CHANGE,
            FrameKind::ForcedDefrost => DATA_TYPE_FORCE_DEFROST,
            FrameKind::DataRequest => DATA_TYPE_DATA_REQUEST,
            FrameKind::DataResponse => DATA_TYPE_DATA_RESPONSE,
            FrameKind::Ack => DATA_TYPE_ACK,
            FrameKind::Status => DATA_TYPE_STATUS,
            FrameKind::StatusUpdate => DATA_TYPE_SHORT_STATUS,
        }
    }

    /// Total frame length, header and checksum included.
    pub const fn len(self) -> usize {
        FRAME_HEAD_AND_CRC_LEN + self.data_len() as usize
    }

    /// Source and destination addresses stamped on frames of this kind.
    pub const fn addresses(self) -> (u16, u16) {
        match self {
            FrameKind::Heartbeat | FrameKind::Status | FrameKind::StatusUpdate => {
                (ADDR_MASTER, ADDR_BROADCAST)
            }
            FrameKind::Ack | FrameKind::DataResponse => (ADDR_HEAT_PUMP, ADDR_REMOTE),
            FrameKind::SetMode
            | FrameKind::Switch
            | FrameKind::Temperature
            | FrameKind::ForcedDefrost
            | FrameKind::DataRequest => (ADDR_REMOTE, ADDR_HEAT_PUMP),
        }
    }

    /// Look up the kind for a type byte and declared data length.
    pub fn from_header(frame_type: u8, data_len: u8) -> Option<FrameKind> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.frame_type() == frame_type && kind.data_len() == data_len)
    }

    /// Classify raw bytes by their header, if enough of it is present.
    ///
    /// Only the type and declared length are consulted; the buffer must be at
    /// least as long as the kind it names.
    pub fn classify(bytes: &[u8]) -> Option<FrameKind> {
        if bytes.len() < FRAME_HEADER_LEN || bytes[..2] != FRAME_SENTINEL {
            return None;
        }
        let kind = Self::from_header(bytes[FRAME_TYPE_OFFSET], bytes[FRAME_DATA_LEN_OFFSET])?;
        (bytes.len() >= kind.len()).then_some(kind)
    }

    /// Whether this node may build and transmit frames of this kind.
    pub const fn is_command(self) -> bool {
        matches!(
            self,
            FrameKind::SetMode
                | FrameKind::Switch
                | FrameKind::Temperature
                | FrameKind::ForcedDefrost
        )
    }
}

impl std::fmt::Display for FrameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FrameKind::Heartbeat => "heartbeat",
            FrameKind::SetMode => "set-mode",
            FrameKind::Switch => "switch",
            FrameKind::Temperature => "temperature",
            FrameKind::ForcedDefrost => "forced-defrost",
            FrameKind::DataRequest => "data-request",
            FrameKind::DataResponse => "data-response",
            FrameKind::Ack => "ack",
            FrameKind::Status => "status",
            FrameKind::StatusUpdate => "status-update",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lengths_match_table() {
        assert_eq!(FrameKind::Heartbeat.len(), FRAME_HEARTBEAT_LEN);
        assert_eq!(FrameKind::SetMode.len(), FRAME_SET_MODE_LEN);
        assert_eq!(FrameKind::Switch.len(), FRAME_SWITCH_LEN);
        assert_eq!(FrameKind::Temperature.len(), FRAME_TEMPERATURE_LEN);
        assert_eq!(FrameKind::ForcedDefrost.len(), FRAME_FORCE_DEFROST_LEN);
        assert_eq!(FrameKind::DataRequest.len(), FRAME_REQ_DATA_LEN);
        assert_eq!(FrameKind::DataResponse.len(), FRAME_RES_DATA_LEN);
        assert_eq!(FrameKind::Ack.len(), FRAME_ACK_LEN);
        assert_eq!(FrameKind::Status.len(), FRAME_STATUS_LEN);
        assert_eq!(FrameKind::StatusUpdate.len(), FRAME_UPDATE_LEN);
    }

    #[test]
    fn test_header_pair_is_unique() {
        for a in FrameKind::ALL {
            for b in FrameKind::ALL {
                if a != b {
                    assert!(a.frame_type() != b.frame_type() || a.data_len() != b.data_len());
                }
            }
        }
    }

    #[test]
    fn test_classify() {
        let switch = [0xa0, 0x00, 0x11, 0x08, 0x00, 0x00, 0x40, 0x08, 0x00, 0x00, 0x41, 0x23, 0x8f, 0x38];
        assert_eq!(FrameKind::classify(&switch), Some(FrameKind::Switch));
        // Too short for the kind it names
        assert_eq!(FrameKind::classify(&switch[..10]), None);
        // Missing sentinel
        assert_eq!(FrameKind::classify(&switch[1..]), None);
        // Unknown header pair
        assert_eq!(FrameKind::classify(&[0xa0, 0x00, 0x11, 0x30, 0, 0, 0, 0, 0, 0, 0, 0, 0]), None);
    }
}
