//! Protocol constants
//!
//! Frame type codes, data-type codes, lengths and field offsets used on the
//! Estia serial bus. All multi-byte values on the wire are big-endian.

// ============================================================================
// Frame Layout
// ============================================================================

/// Two-byte marker that begins every frame.
pub const FRAME_SENTINEL: [u8; 2] = [0xa0, 0x00];
/// Offset of the frame type code.
pub const FRAME_TYPE_OFFSET: usize = 2;
/// Offset of the declared data length.
pub const FRAME_DATA_LEN_OFFSET: usize = 3;
/// Offset of the first data byte (source address).
pub const FRAME_DATA_OFFSET: usize = 4;
/// Offset of the source address (u16).
pub const FRAME_SRC_OFFSET: usize = 4;
/// Offset of the destination address (u16).
pub const FRAME_DST_OFFSET: usize = 6;
/// Offset of the data-type code (u16).
pub const FRAME_DATA_TYPE_OFFSET: usize = 9;
/// Header length: sentinel, type and declared length.
pub const FRAME_HEADER_LEN: usize = 4;
/// Trailing checksum length.
pub const FRAME_CRC_LEN: usize = 2;
/// Bytes of a frame that are not counted by the declared data length.
pub const FRAME_HEAD_AND_CRC_LEN: usize = FRAME_HEADER_LEN + FRAME_CRC_LEN;
/// Shortest frame the bus carries (a heartbeat).
pub const FRAME_MIN_LEN: usize = FRAME_HEARTBEAT_LEN;
/// Upper bound on a frame being accumulated from the stream.
pub const FRAME_MAX_LEN: usize = 64;

// ============================================================================
// Addresses
// ============================================================================

/// Wired remote controller (this node when transmitting).
pub const ADDR_REMOTE: u16 = 0x0000;
/// Heat pump unit.
pub const ADDR_HEAT_PUMP: u16 = 0x4008;
/// Bus master (origin of status broadcasts).
pub const ADDR_MASTER: u16 = 0x0800;
/// Broadcast destination.
pub const ADDR_BROADCAST: u16 = 0x00fe;

// ============================================================================
// Frame Types
// ============================================================================

/// Periodic heartbeat.
pub const FRAME_TYPE_HEARTBEAT: u8 = 0x10;
/// Set commands (mode, switch, temperature, defrost).
pub const FRAME_TYPE_SET: u8 = 0x11;
/// Sensor data request.
pub const FRAME_TYPE_REQ_DATA: u8 = 0x17;
/// Command acknowledgement.
pub const FRAME_TYPE_ACK: u8 = 0x18;
/// Sensor data response.
pub const FRAME_TYPE_RES_DATA: u8 = 0x1a;
/// Short status update.
pub const FRAME_TYPE_UPDATE: u8 = 0x1c;
/// Full status.
pub const FRAME_TYPE_STATUS: u8 = 0x58;

// ============================================================================
// Data Types
// ============================================================================

pub const DATA_TYPE_HEARTBEAT: u16 = 0x008a;
pub const DATA_TYPE_STATUS: u16 = 0x03c6;
pub const DATA_TYPE_MODE_CHANGE: u16 = 0x03c4;
pub const DATA_TYPE_OPERATION_SWITCH: u16 = 0x0041;
pub const DATA_TYPE_TEMPERATURE_CHANGE: u16 = 0x03c1;
pub const DATA_TYPE_FORCE_DEFROST: u16 = 0x0015;
pub const DATA_TYPE_DATA_REQUEST: u16 = 0x0080;
pub const DATA_TYPE_DATA_RESPONSE: u16 = 0x00ef;
pub const DATA_TYPE_ACK: u16 = 0x00a1;
pub const DATA_TYPE_SHORT_STATUS: u16 = 0x002b;

// ============================================================================
// Declared Data Lengths
// ============================================================================

pub const HEARTBEAT_DATA_LEN: u8 = 0x07;
pub const SET_MODE_DATA_LEN: u8 = 0x0b;
pub const SWITCH_DATA_LEN: u8 = 0x08;
pub const TEMPERATURE_DATA_LEN: u8 = 0x0c;
pub const FORCE_DEFROST_DATA_LEN: u8 = 0x0a;
pub const REQ_DATA_DATA_LEN: u8 = 0x0f;
pub const ACK_DATA_LEN: u8 = 0x09;
pub const RES_DATA_DATA_LEN: u8 = 0x0d;
pub const UPDATE_DATA_LEN: u8 = 0x0f;
pub const STATUS_DATA_LEN: u8 = 0x19;

// ============================================================================
// Total Frame Lengths
// ============================================================================

pub const FRAME_HEARTBEAT_LEN: usize = 13;
pub const FRAME_SET_MODE_LEN: usize = 17;
pub const FRAME_SWITCH_LEN: usize = 14;
pub const FRAME_TEMPERATURE_LEN: usize = 18;
pub const FRAME_FORCE_DEFROST_LEN: usize = 16;
pub const FRAME_REQ_DATA_LEN: usize = 21;
pub const FRAME_ACK_LEN: usize = 15;
pub const FRAME_RES_DATA_LEN: usize = 19;
pub const FRAME_UPDATE_LEN: usize = 21;
pub const FRAME_STATUS_LEN: usize = 31;

// ============================================================================
// Command Fields
// ============================================================================

// auto mode on/off
// a0 00 11 0b 00 00 40 08 00 03 c4 01 01 00 00 84 03 -> on,  offset 12 value 0x01
// a0 00 11 0b 00 00 40 08 00 03 c4 01 00 00 00 de df -> off, offset 12 value 0x00
// quiet mode on/off
// a0 00 11 0b 00 00 40 08 00 03 c4 04 04 00 00 d3 e9 -> on,  offset 12 value 0x04
// night mode on/off
// a0 00 11 0b 00 00 40 08 00 03 c4 88 08 00 00 cc 10 -> on,  offset 12 value 0x08

pub const SET_MODE_CODE_OFFSET: usize = 11;
pub const SET_MODE_VALUE_OFFSET: usize = 12;
pub const SET_AUTO_MODE_CODE: u8 = 0x01;
pub const SET_QUIET_MODE_CODE: u8 = 0x04;
pub const SET_NIGHT_MODE_CODE: u8 = 0x88;

// heating on/off
// a0 00 11 08 00 00 40 08 00 00 41 23 8f 38 -> on  0x23
// a0 00 11 08 00 00 40 08 00 00 41 22 9e b1 -> off 0x22
// hot water on/off
// a0 00 11 08 00 00 40 08 00 00 41 2c 77 cf -> on  0x2c
// a0 00 11 08 00 00 40 08 00 00 41 28 31 eb -> off 0x28

pub const SWITCH_VALUE_OFFSET: usize = 11;
pub const SWITCH_OPERATION_HEATING: u8 = 0x22;
pub const SWITCH_OPERATION_HOT_WATER: u8 = 0x28;

// heating temperature, value = (temp + 16) * 2
// a0 00 11 0c 00 00 40 08 00 03 c1 02 5c 7a 76 5c b2 d1
// hot water temperature
// a0 00 11 0c 00 00 40 08 00 03 c1 08 00 00 70 00 83 c0

pub const TEMPERATURE_CODE_OFFSET: usize = 11;
pub const TEMPERATURE_HEATING_CODE: u8 = 0x02;
pub const TEMPERATURE_HOT_WATER_CODE: u8 = 0x08;
pub const TEMPERATURE_HEATING_VALUE_OFFSET: usize = 12;
pub const TEMPERATURE_ZONE2_VALUE_OFFSET: usize = 13;
pub const TEMPERATURE_HOT_WATER_VALUE_OFFSET: usize = 14;
pub const TEMPERATURE_HEATING_VALUE2_OFFSET: usize = 15;

pub const MIN_HEATING_TEMP: u8 = 20;
pub const MAX_HEATING_TEMP: u8 = 65;
pub const MIN_HOT_WATER_TEMP: u8 = 40;
pub const MAX_HOT_WATER_TEMP: u8 = 75;

pub const FORCE_DEFROST_CODE_OFFSET: usize = 11;
pub const FORCE_DEFROST_VALUE_OFFSET: usize = 12;
pub const FORCE_DEFROST_CODE: u8 = 0x46;

// ============================================================================
// Data Request / Response Fields
// ============================================================================

/// Data request body from the source address up to the checksum.
pub const REQ_DATA_TEMPLATE: [u8; REQ_DATA_DATA_LEN as usize] = [
    0x00, 0x00, 0x40, 0x08, 0x00, 0x00, 0x80, 0x00, 0xef, 0x00, 0x2c, 0x08, 0x00, 0x00, 0x00,
];
pub const REQ_DATA_CODE_OFFSET: usize = 16;

pub const RES_DATA_EMPTY_OFFSET: usize = 13;
pub const RES_DATA_EMPTY_FLAG: u8 = 0xa2;
pub const RES_DATA_VALUE_OFFSET: usize = 15;

pub const ACK_FRAME_CODE_OFFSET: usize = 11;

// ============================================================================
// Status Fields
// ============================================================================

pub const STATUS_OPERATION_OFFSET: usize = 11;
pub const STATUS_MODE_OFFSET: usize = 12;
pub const STATUS_ACTUATOR_OFFSET: usize = 13;
pub const STATUS_HOT_WATER_TARGET_OFFSET: usize = 14;
pub const STATUS_HEATING_TARGET_OFFSET: usize = 15;
pub const STATUS_ZONE2_TARGET_OFFSET: usize = 16;
pub const STATUS_HOT_WATER_TARGET2_OFFSET: usize = 17;
pub const STATUS_HEATING_TARGET2_OFFSET: usize = 18;
pub const STATUS_ZONE2_TARGET2_OFFSET: usize = 19;
/// Defrost / night flags in the long status frame.
pub const STATUS_FLAGS_OFFSET: usize = 21;
/// Defrost / night flags in the short status update.
pub const UPDATE_FLAGS_OFFSET: usize = 17;

pub const STATUS_HEATING_MASK: u8 = 0xc1;
pub const STATUS_HOT_WATER_MASK: u8 = 0xc2;
pub const STATUS_AUTO_MODE_MASK: u8 = 0x04;
pub const STATUS_QUIET_MODE_MASK: u8 = 0x10;
pub const STATUS_NIGHT_MODE_MASK: u8 = 0x20;

pub const STATUS_BACKUP_HEATER_MASK: u8 = 0x01;
pub const STATUS_HEATING_COMPRESSOR_MASK: u8 = 0x02;
pub const STATUS_HOT_WATER_HEATER_MASK: u8 = 0x04;
pub const STATUS_HOT_WATER_COMPRESSOR_MASK: u8 = 0x08;
pub const STATUS_PUMP1_MASK: u8 = 0x10;

pub const STATUS_DEFROST_MASK: u8 = 0x02;
pub const STATUS_NIGHT_ACTIVE_MASK: u8 = 0x10;

// ============================================================================
// Error Codes
// ============================================================================

// Signed sentinel codes reported in place of a value by request paths.

pub const ERR_NOT_EXIST: i16 = -200;
pub const ERR_TIMEOUT: i16 = -201;
pub const ERR_CRC: i16 = -202;
pub const ERR_FRAME_TYPE: i16 = -203;
pub const ERR_DATA_LEN: i16 = -204;
pub const ERR_DATA_TYPE: i16 = -205;
pub const ERR_DATA_EMPTY: i16 = -206;
