//! Command frames sent to the heat pump unit.
//!
//! Symbolic names ("auto", "hot_water", ...) are only accepted at the
//! boundary through [`std::str::FromStr`]; everything past that works with
//! the typed enums below.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{FrameError, FrameResult, UnknownName};
use crate::frame::{check_frame, Frame};
use crate::kind::FrameKind;

/// Encode whole degrees Celsius as the wire value `(celsius + 16) * 2`.
pub fn encode_temperature(celsius: u8) -> u8 {
    celsius.saturating_add(16).saturating_mul(2)
}

/// Decode a wire temperature back to whole degrees Celsius.
pub fn decode_temperature(raw: u8) -> u8 {
    (raw / 2).saturating_sub(16)
}

// ============================================================================
// Mode
// ============================================================================

/// Operating modes toggled by a set-mode frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Auto,
    Quiet,
    Night,
}

impl Mode {
    /// Mode code at [`SET_MODE_CODE_OFFSET`].
    pub const fn code(self) -> u8 {
        match self {
            Mode::Auto => SET_AUTO_MODE_CODE,
            Mode::Quiet => SET_QUIET_MODE_CODE,
            Mode::Night => SET_NIGHT_MODE_CODE,
        }
    }

    pub fn from_code(code: u8) -> Option<Mode> {
        match code {
            SET_AUTO_MODE_CODE => Some(Mode::Auto),
            SET_QUIET_MODE_CODE => Some(Mode::Quiet),
            SET_NIGHT_MODE_CODE => Some(Mode::Night),
            _ => None,
        }
    }

    /// Bit position of the on/off value for this mode.
    const fn value_shift(self) -> u8 {
        match self {
            Mode::Auto => 0,
            Mode::Quiet => 2,
            Mode::Night => 3,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Mode::Auto => "auto",
            Mode::Quiet => "quiet",
            Mode::Night => "night",
        }
    }
}

impl FromStr for Mode {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Mode::Auto),
            "quiet" => Ok(Mode::Quiet),
            "night" => Ok(Mode::Night),
            _ => Err(UnknownName(s.to_string())),
        }
    }
}

/// Switch an operating mode on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeSwitch {
    pub mode: Mode,
    pub on: bool,
}

impl ModeSwitch {
    pub fn new(mode: Mode, on: bool) -> Self {
        ModeSwitch { mode, on }
    }

    pub fn encode(&self) -> Frame {
        let mut frame = Frame::new(FrameKind::SetMode);
        frame.set_byte(SET_MODE_CODE_OFFSET, self.mode.code());
        frame.set_byte(SET_MODE_VALUE_OFFSET, u8::from(self.on) << self.mode.value_shift());
        frame.seal();
        frame
    }

    pub fn decode(bytes: &[u8]) -> FrameResult<Self> {
        let frame = check_frame(bytes, FrameKind::SetMode)?;
        let code = frame[SET_MODE_CODE_OFFSET];
        let mode = Mode::from_code(code).ok_or(FrameError::InvalidField {
            offset: SET_MODE_CODE_OFFSET,
            value: code,
        })?;
        Ok(ModeSwitch {
            mode,
            on: frame[SET_MODE_VALUE_OFFSET] != 0,
        })
    }
}

// ============================================================================
// Operation
// ============================================================================

/// Operations started or stopped by a switch frame.
///
/// Only heating and hot water have switch codes on this bus; there is no
/// cooling switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Heating,
    HotWater,
}

impl Operation {
    /// Base switch value; the on/off bit is added to it.
    pub const fn code(self) -> u8 {
        match self {
            Operation::Heating => SWITCH_OPERATION_HEATING,
            Operation::HotWater => SWITCH_OPERATION_HOT_WATER,
        }
    }

    fn switch_value(self, on: bool) -> u8 {
        match self {
            Operation::Heating => self.code() + u8::from(on),
            Operation::HotWater => self.code() + (u8::from(on) << 2),
        }
    }

    fn from_switch_value(value: u8) -> Option<(Operation, bool)> {
        if value & !0x01 == SWITCH_OPERATION_HEATING {
            Some((Operation::Heating, value & 0x01 != 0))
        } else if value & !0x04 == SWITCH_OPERATION_HOT_WATER {
            Some((Operation::HotWater, value & 0x04 != 0))
        } else {
            None
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Operation::Heating => "heating",
            Operation::HotWater => "hot_water",
        }
    }
}

impl FromStr for Operation {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "heating" => Ok(Operation::Heating),
            "hot_water" => Ok(Operation::HotWater),
            _ => Err(UnknownName(s.to_string())),
        }
    }
}

/// Switch an operation on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationSwitch {
    pub operation: Operation,
    pub on: bool,
}

impl OperationSwitch {
    pub fn new(operation: Operation, on: bool) -> Self {
        OperationSwitch { operation, on }
    }

    pub fn encode(&self) -> Frame {
        let mut frame = Frame::new(FrameKind::Switch);
        frame.set_byte(SWITCH_VALUE_OFFSET, self.operation.switch_value(self.on));
        frame.seal();
        frame
    }

    pub fn decode(bytes: &[u8]) -> FrameResult<Self> {
        let frame = check_frame(bytes, FrameKind::Switch)?;
        let value = frame[SWITCH_VALUE_OFFSET];
        let (operation, on) = Operation::from_switch_value(value).ok_or(FrameError::InvalidField {
            offset: SWITCH_VALUE_OFFSET,
            value,
        })?;
        Ok(OperationSwitch { operation, on })
    }
}

// ============================================================================
// Temperature
// ============================================================================

/// Zones whose target temperature can be set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    Heating,
    HotWater,
}

impl Zone {
    pub const fn code(self) -> u8 {
        match self {
            Zone::Heating => TEMPERATURE_HEATING_CODE,
            Zone::HotWater => TEMPERATURE_HOT_WATER_CODE,
        }
    }

    /// Inclusive range accepted for this zone.
    pub const fn range(self) -> (u8, u8) {
        match self {
            Zone::Heating => (MIN_HEATING_TEMP, MAX_HEATING_TEMP),
            Zone::HotWater => (MIN_HOT_WATER_TEMP, MAX_HOT_WATER_TEMP),
        }
    }

    /// Clamp a temperature into this zone's range.
    pub fn clamp(self, celsius: u8) -> u8 {
        let (min, max) = self.range();
        celsius.clamp(min, max)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Zone::Heating => "heating",
            Zone::HotWater => "hot_water",
        }
    }
}

impl FromStr for Zone {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "heating" => Ok(Zone::Heating),
            "hot_water" => Ok(Zone::HotWater),
            _ => Err(UnknownName(s.to_string())),
        }
    }
}

/// Set a zone's target temperature.
///
/// A heating frame always carries all three targets, so the caller supplies
/// the current zone2 and hot-water targets alongside the new heating one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureCommand {
    Heating { heating: u8, zone2: u8, hot_water: u8 },
    HotWater { hot_water: u8 },
}

impl TemperatureCommand {
    pub fn zone(&self) -> Zone {
        match self {
            TemperatureCommand::Heating { .. } => Zone::Heating,
            TemperatureCommand::HotWater { .. } => Zone::HotWater,
        }
    }

    /// Build the frame. Values outside a zone's range are clamped.
    pub fn encode(&self) -> Frame {
        let mut frame = Frame::new(FrameKind::Temperature);
        frame.set_byte(TEMPERATURE_CODE_OFFSET, self.zone().code());
        match *self {
            TemperatureCommand::Heating { heating, zone2, hot_water } => {
                let heating = encode_temperature(Zone::Heating.clamp(heating));
                frame.set_byte(TEMPERATURE_HEATING_VALUE_OFFSET, heating);
                frame.set_byte(
                    TEMPERATURE_ZONE2_VALUE_OFFSET,
                    encode_temperature(Zone::Heating.clamp(zone2)),
                );
                frame.set_byte(
                    TEMPERATURE_HOT_WATER_VALUE_OFFSET,
                    encode_temperature(Zone::HotWater.clamp(hot_water)),
                );
                frame.set_byte(TEMPERATURE_HEATING_VALUE2_OFFSET, heating);
            }
            TemperatureCommand::HotWater { hot_water } => {
                frame.set_byte(
                    TEMPERATURE_HOT_WATER_VALUE_OFFSET,
                    encode_temperature(Zone::HotWater.clamp(hot_water)),
                );
            }
        }
        frame.seal();
        frame
    }

    pub fn decode(bytes: &[u8]) -> FrameResult<Self> {
        let frame = check_frame(bytes, FrameKind::Temperature)?;
        let hot_water = decode_temperature(frame[TEMPERATURE_HOT_WATER_VALUE_OFFSET]);
        match frame[TEMPERATURE_CODE_OFFSET] {
            TEMPERATURE_HEATING_CODE => Ok(TemperatureCommand::Heating {
                heating: decode_temperature(frame[TEMPERATURE_HEATING_VALUE_OFFSET]),
                zone2: decode_temperature(frame[TEMPERATURE_ZONE2_VALUE_OFFSET]),
                hot_water,
            }),
            TEMPERATURE_HOT_WATER_CODE => Ok(TemperatureCommand::HotWater { hot_water }),
            value => Err(FrameError::InvalidField {
                offset: TEMPERATURE_CODE_OFFSET,
                value,
            }),
        }
    }
}

// ============================================================================
// Forced Defrost
// ============================================================================

/// Request a defrost cycle at the next operation start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForcedDefrost {
    pub on: bool,
}

impl ForcedDefrost {
    pub fn new(on: bool) -> Self {
        ForcedDefrost { on }
    }

    pub fn encode(&self) -> Frame {
        let mut frame = Frame::new(FrameKind::ForcedDefrost);
        frame.set_byte(FORCE_DEFROST_CODE_OFFSET, FORCE_DEFROST_CODE);
        frame.set_byte(FORCE_DEFROST_VALUE_OFFSET, u8::from(self.on));
        frame.seal();
        frame
    }

    pub fn decode(bytes: &[u8]) -> FrameResult<Self> {
        let frame = check_frame(bytes, FrameKind::ForcedDefrost)?;
        let code = frame[FORCE_DEFROST_CODE_OFFSET];
        if code != FORCE_DEFROST_CODE {
            return Err(FrameError::InvalidField {
                offset: FORCE_DEFROST_CODE_OFFSET,
                value: code,
            });
        }
        Ok(ForcedDefrost {
            on: frame[FORCE_DEFROST_VALUE_OFFSET] != 0,
        })
    }
}
