//! Status decoder.
//!
//! The master broadcasts operating state in two layouts: the long status
//! frame (which also repeats the three targets) and the short status update.
//! Both decode into one [`StatusData`] snapshot.

use log::trace;
use serde::{Deserialize, Serialize};

use crate::commands::decode_temperature;
use crate::constants::*;
use crate::error::{FrameError, FrameResult};
use crate::frame::check_frame;
use crate::kind::FrameKind;

/// Decoded operating state of the heat pump.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusData {
    /// Decode error code, `0` when the snapshot is valid.
    pub error: i16,
    /// Whether the snapshot came from the long status frame.
    pub extended_data: bool,

    pub heating: bool,
    pub hot_water: bool,

    pub auto_mode: bool,
    pub quiet_mode: bool,
    pub night_mode: bool,

    pub backup_heater: bool,
    pub heating_compressor: bool,
    pub hot_water_heater: bool,
    pub hot_water_compressor: bool,
    pub pump1: bool,

    pub hot_water_target: u8,
    pub heating_target: u8,
    pub zone2_target: u8,

    /// Secondary targets, only carried by the long status frame.
    pub hot_water_target2: Option<u8>,
    pub heating_target2: Option<u8>,
    pub zone2_target2: Option<u8>,

    pub defrost_in_progress: bool,
    pub night_mode_active: bool,
}

impl StatusData {
    /// A snapshot that only records a decode failure.
    pub fn from_error(err: FrameError) -> Self {
        StatusData {
            error: err.code(),
            ..Default::default()
        }
    }

    pub fn is_valid(&self) -> bool {
        self.error == 0
    }

    /// Primary `(heating, zone2, hot water)` targets.
    pub fn targets(&self) -> (u8, u8, u8) {
        (self.heating_target, self.zone2_target, self.hot_water_target)
    }

    fn from_frame(frame: &[u8], kind: FrameKind) -> Self {
        let operation = frame[STATUS_OPERATION_OFFSET];
        let modes = frame[STATUS_MODE_OFFSET];
        let actuators = frame[STATUS_ACTUATOR_OFFSET];
        let extended = kind == FrameKind::Status;
        let flags = if extended {
            frame[STATUS_FLAGS_OFFSET]
        } else {
            frame[UPDATE_FLAGS_OFFSET]
        };
        let secondary = |offset: usize| extended.then(|| decode_temperature(frame[offset]));

        StatusData {
            error: 0,
            extended_data: extended,
            heating: operation & STATUS_HEATING_MASK == STATUS_HEATING_MASK,
            hot_water: operation & STATUS_HOT_WATER_MASK == STATUS_HOT_WATER_MASK,
            auto_mode: modes & STATUS_AUTO_MODE_MASK != 0,
            quiet_mode: modes & STATUS_QUIET_MODE_MASK != 0,
            night_mode: modes & STATUS_NIGHT_MODE_MASK != 0,
            backup_heater: actuators & STATUS_BACKUP_HEATER_MASK != 0,
            heating_compressor: actuators & STATUS_HEATING_COMPRESSOR_MASK != 0,
            hot_water_heater: actuators & STATUS_HOT_WATER_HEATER_MASK != 0,
            hot_water_compressor: actuators & STATUS_HOT_WATER_COMPRESSOR_MASK != 0,
            pump1: actuators & STATUS_PUMP1_MASK != 0,
            hot_water_target: decode_temperature(frame[STATUS_HOT_WATER_TARGET_OFFSET]),
            heating_target: decode_temperature(frame[STATUS_HEATING_TARGET_OFFSET]),
            zone2_target: decode_temperature(frame[STATUS_ZONE2_TARGET_OFFSET]),
            hot_water_target2: secondary(STATUS_HOT_WATER_TARGET2_OFFSET),
            heating_target2: secondary(STATUS_HEATING_TARGET2_OFFSET),
            zone2_target2: secondary(STATUS_ZONE2_TARGET2_OFFSET),
            defrost_in_progress: flags & STATUS_DEFROST_MASK != 0,
            night_mode_active: flags & STATUS_NIGHT_ACTIVE_MASK != 0,
        }
    }
}

/// Decode a long status frame or a short status update.
///
/// Each layout is checked against the buffer truncated to its own length,
/// the long layout first. When neither validates, the error reported is the
/// one for the layout named by the frame type byte.
pub fn decode_status(bytes: &[u8]) -> FrameResult<StatusData> {
    let long = match check_frame(bytes, FrameKind::Status) {
        Ok(frame) => return Ok(StatusData::from_frame(frame, FrameKind::Status)),
        Err(err) => err,
    };
    let short = match check_frame(bytes, FrameKind::StatusUpdate) {
        Ok(frame) => return Ok(StatusData::from_frame(frame, FrameKind::StatusUpdate)),
        Err(err) => err,
    };
    let err = match bytes.get(FRAME_TYPE_OFFSET) {
        Some(&FRAME_TYPE_UPDATE) => short,
        _ => long,
    };
    trace!("status decode rejected: {}", err);
    Err(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATUS_LONG: [u8; 31] = [
        0xa0, 0x00, 0x58, 0x19, 0x08, 0x00, 0x00, 0xfe, 0x00, 0x03, 0xc6, 0xc1, 0x04, 0x12, 0x84,
        0x66, 0x5c, 0x84, 0x66, 0x5c, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x31,
        0x58,
    ];
    const STATUS_SHORT: [u8; 21] = [
        0xa0, 0x00, 0x1c, 0x0f, 0x08, 0x00, 0x00, 0xfe, 0x00, 0x00, 0x2b, 0xc2, 0x20, 0x0c, 0x84,
        0x66, 0x5c, 0x12, 0x00, 0x6b, 0xb8,
    ];

    #[test]
    fn test_decode_long_status_heating_on() {
        let status = decode_status(&STATUS_LONG).expect("long status");
        assert!(status.is_valid());
        assert!(status.extended_data);
        assert!(status.heating);
        assert!(!status.hot_water);
        assert!(status.auto_mode);
        assert!(!status.quiet_mode);
        assert!(!status.night_mode);
        assert!(status.heating_compressor);
        assert!(status.pump1);
        assert!(!status.backup_heater);
        assert!(!status.hot_water_heater);
        assert_eq!(status.hot_water_target, 50);
        assert_eq!(status.heating_target, 35);
        assert_eq!(status.zone2_target, 30);
        assert_eq!(status.hot_water_target2, Some(50));
        assert_eq!(status.heating_target2, Some(35));
        assert_eq!(status.zone2_target2, Some(30));
        assert!(!status.defrost_in_progress);
        assert!(!status.night_mode_active);
    }

    #[test]
    fn test_decode_short_status() {
        let status = decode_status(&STATUS_SHORT).expect("short status");
        assert!(!status.extended_data);
        assert!(!status.heating);
        assert!(status.hot_water);
        assert!(status.night_mode);
        assert!(!status.auto_mode);
        assert!(status.hot_water_heater);
        assert!(status.hot_water_compressor);
        assert!(!status.pump1);
        assert_eq!(status.targets(), (35, 30, 50));
        assert_eq!(status.hot_water_target2, None);
        assert!(status.defrost_in_progress);
        assert!(status.night_mode_active);
    }

    #[test]
    fn test_heating_mask_needs_every_bit() {
        // 0xc0 lacks bit 0 of the heating mask
        let mut frame = crate::frame::Frame::from_bytes(STATUS_LONG.to_vec());
        frame.set_byte(STATUS_OPERATION_OFFSET, 0xc0);
        frame.seal();
        let status = decode_status(frame.as_bytes()).expect("resealed status");
        assert!(!status.heating);
        assert!(!status.hot_water);

        frame.set_byte(STATUS_OPERATION_OFFSET, 0xc3);
        frame.seal();
        let status = decode_status(frame.as_bytes()).expect("resealed status");
        assert!(status.heating);
        assert!(status.hot_water);
    }

    #[test]
    fn test_trailing_bytes_are_ignored() {
        let mut bytes = STATUS_SHORT.to_vec();
        bytes.extend_from_slice(&[0xa0, 0x00, 0x10]);
        let status = decode_status(&bytes).expect("short status with trailing bytes");
        assert!(!status.extended_data);
        assert!(status.hot_water);
    }

    #[test]
    fn test_rejects_bad_frames() {
        let mut corrupt = STATUS_LONG;
        corrupt[14] = 0x90;
        let err = decode_status(&corrupt).unwrap_err();
        assert!(matches!(err, FrameError::ChecksumMismatch { .. }));
        assert_eq!(StatusData::from_error(err).error, ERR_CRC);

        let err = decode_status(&STATUS_SHORT[..20]).unwrap_err();
        assert_eq!(err.code(), ERR_DATA_LEN);

        let heartbeat = [0xa0, 0x00, 0x10, 0x07, 0x08, 0x00, 0x00, 0xfe, 0x00, 0x00, 0x8a, 0xcf, 0xf7];
        assert!(decode_status(&heartbeat).is_err());
    }
}
