//! Sensor subsystem: channel identity, the per-cycle [`TelemetryFilter`]
//! and the DS18B20 file reader.
//!
//! The filter owns every [`SensorChannel`] and turns one [`RawReadings`]
//! array per cycle into accepted temperatures.

pub mod ds18b20;
pub mod filter;

use core::fmt;

use serde::{Deserialize, Serialize};

pub use filter::TelemetryFilter;

/// Sentinel for "no valid reading".
pub const UNKNOWN_TEMP: f32 = -200.0;

/// One fixed sensor position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SensorId {
    Ac1Compressor = 0,
    Ac1Condenser = 1,
    He1In = 2,
    He1Out = 3,
    Ac2Compressor = 4,
    Ac2Condenser = 5,
    He2In = 6,
    He2Out = 7,
    WaterIn = 8,
    WaterOut = 9,
    Ambient = 10,
}

impl SensorId {
    pub const COUNT: usize = 11;

    pub const ALL: [Self; Self::COUNT] = [
        Self::Ac1Compressor,
        Self::Ac1Condenser,
        Self::He1In,
        Self::He1Out,
        Self::Ac2Compressor,
        Self::Ac2Condenser,
        Self::He2In,
        Self::He2Out,
        Self::WaterIn,
        Self::WaterOut,
        Self::Ambient,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Short label used in log lines and the snapshot file.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ac1Compressor => "AC1COMP",
            Self::Ac1Condenser => "AC1CND",
            Self::He1In => "HE1I",
            Self::He1Out => "HE1O",
            Self::Ac2Compressor => "AC2COMP",
            Self::Ac2Condenser => "AC2CND",
            Self::He2In => "HE2I",
            Self::He2Out => "HE2O",
            Self::WaterIn => "WaterIN",
            Self::WaterOut => "WaterOUT",
            Self::Ambient => "Tenv",
        }
    }
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One cycle's worth of raw readings, `None` where the read failed.
pub type RawReadings = [Option<f32>; SensorId::COUNT];

/// Per-channel filter state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorChannel {
    pub id: SensorId,
    /// Last accepted value, or [`UNKNOWN_TEMP`].
    pub value: f32,
    /// Value accepted the cycle before `value`.
    pub previous: f32,
    /// Consecutive-ish failures: +1 per miss or implausible jump, -1 per good read.
    pub failures: u16,
}

impl SensorChannel {
    pub const fn new(id: SensorId, failures: u16) -> Self {
        Self {
            id,
            value: UNKNOWN_TEMP,
            previous: UNKNOWN_TEMP,
            failures,
        }
    }

    pub fn is_known(&self) -> bool {
        self.value != UNKNOWN_TEMP
    }
}

/// Accepted temperatures after filtering, indexed by [`SensorId`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Temperatures(pub [f32; SensorId::COUNT]);

impl Default for Temperatures {
    fn default() -> Self {
        Self([UNKNOWN_TEMP; SensorId::COUNT])
    }
}

impl Temperatures {
    pub fn get(&self, id: SensorId) -> f32 {
        self.0[id.index()]
    }

    pub fn set(&mut self, id: SensorId, value: f32) {
        self.0[id.index()] = value;
    }

    pub fn compressor(&self, circuit: crate::actuators::CircuitId) -> f32 {
        match circuit {
            crate::actuators::CircuitId::One => self.get(SensorId::Ac1Compressor),
            crate::actuators::CircuitId::Two => self.get(SensorId::Ac2Compressor),
        }
    }

    pub fn condenser(&self, circuit: crate::actuators::CircuitId) -> f32 {
        match circuit {
            crate::actuators::CircuitId::One => self.get(SensorId::Ac1Condenser),
            crate::actuators::CircuitId::Two => self.get(SensorId::Ac2Condenser),
        }
    }
}
