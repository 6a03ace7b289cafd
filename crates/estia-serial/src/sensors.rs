//! Sensor name table.
//!
//! Maps the stable names callers use to the one-byte request code and the
//! multiplier that converts the raw reading into physical units.

/// One entry of the sensor table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorDef {
    pub name: &'static str,
    pub code: u8,
    pub multiplier: f32,
    pub description: &'static str,
}

const fn def(name: &'static str, code: u8, multiplier: f32, description: &'static str) -> SensorDef {
    SensorDef {
        name,
        code,
        multiplier,
        description,
    }
}

pub const SENSORS: &[SensorDef] = &[
    def("remote_temp", 0x03, 1.0, "remote controller sensor temperature"),
    def("tc", 0x06, 1.0, "condensed refrigerant temperature"),
    def("twi", 0x08, 1.0, "water inlet temperature"),
    def("two", 0x09, 1.0, "water outlet temperature"),
    def("tho", 0x0a, 1.0, "water heater outlet temperature"),
    def("tfi", 0x0b, 1.0, "floor inlet temperature"),
    def("ttw", 0x0c, 1.0, "hot water cylinder temperature"),
    def("mixing_valve", 0x0d, 1.0, "mixing valve position"),
    def("low_pressure", 0x0e, 0.01, "low pressure (MPa)"),
    def("te", 0x60, 1.0, "outdoor heat exchanger temperature"),
    def("to", 0x61, 1.0, "outside air temperature"),
    def("td", 0x62, 1.0, "compressor discharge temperature"),
    def("ts", 0x63, 1.0, "compressor suction temperature"),
    def("ths", 0x65, 1.0, "heat sink temperature"),
    def("current", 0x6a, 0.1, "compressor current (A)"),
    def("compressor_freq", 0x70, 1.0, "compressor operating frequency (Hz)"),
    def("fan_lower", 0x72, 1.0, "lower outdoor fan speed (rpm)"),
    def("fan_upper", 0x73, 1.0, "upper outdoor fan speed (rpm)"),
    def("pmv", 0x74, 10.0, "pulse motor valve opening"),
];

/// Sensors polled when no list is configured.
pub const DEFAULT_SENSORS: &[&str] = &["twi", "two", "tho", "to", "td", "ts", "te", "compressor_freq", "pmv"];

/// Look up a sensor by name.
pub fn lookup(name: &str) -> Option<&'static SensorDef> {
    SENSORS.iter().find(|s| s.name == name)
}
