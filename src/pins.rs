//! GPIO pin assignments for the heat-pump controller board.
//!
//! Single source of truth: every driver references a [`PinMap`] rather than
//! hard-coding pin numbers.  Numbers are BCM GPIO numbers on the 40-pin
//! header.
//!
//! ```text
//!   AC1  compressor  5   fan  6   valve 13      (outputs, relays)
//!   AC2  compressor 16   fan 19   valve 20      (outputs, relays)
//!   COMMS  1 = 17  demand low   (input)
//!          2 = 18  demand high  (input)
//!          3 = 27  handshake b0 (output)
//!          4 = 22  handshake b1 (output)
//!   POWER  optional grid/battery input
//! ```

use log::warn;
use serde::{Deserialize, Serialize};

/// Lowest BCM number accepted (0..=3 carry I²C and ID EEPROM).
pub const BCM_MIN: u8 = 4;
/// Highest BCM number on the header.
pub const BCM_MAX: u8 = 27;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

pub const AC1_COMPRESSOR: u8 = 5;
pub const AC1_FAN: u8 = 6;
pub const AC1_VALVE: u8 = 13;
pub const AC2_COMPRESSOR: u8 = 16;
pub const AC2_FAN: u8 = 19;
pub const AC2_VALVE: u8 = 20;

/// HIGH = peer asks for one unit.
pub const COMMS_DEMAND_LOW: u8 = 17;
/// HIGH = peer asks for both units.
pub const COMMS_DEMAND_HIGH: u8 = 18;
pub const COMMS_HANDSHAKE_BIT0: u8 = 27;
pub const COMMS_HANDSHAKE_BIT1: u8 = 22;

/// Every GPIO line the controller owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinMap {
    pub ac1_compressor: u8,
    pub ac1_fan: u8,
    pub ac1_valve: u8,
    pub ac2_compressor: u8,
    pub ac2_fan: u8,
    pub ac2_valve: u8,
    pub comms_demand_low: u8,
    pub comms_demand_high: u8,
    pub comms_handshake_bit0: u8,
    pub comms_handshake_bit1: u8,
    /// HIGH = running on battery.  Absent when the peer has no such line.
    pub power_source: Option<u8>,
}

impl Default for PinMap {
    fn default() -> Self {
        Self {
            ac1_compressor: AC1_COMPRESSOR,
            ac1_fan: AC1_FAN,
            ac1_valve: AC1_VALVE,
            ac2_compressor: AC2_COMPRESSOR,
            ac2_fan: AC2_FAN,
            ac2_valve: AC2_VALVE,
            comms_demand_low: COMMS_DEMAND_LOW,
            comms_demand_high: COMMS_DEMAND_HIGH,
            comms_handshake_bit0: COMMS_HANDSHAKE_BIT0,
            comms_handshake_bit1: COMMS_HANDSHAKE_BIT1,
            power_source: None,
        }
    }
}

impl PinMap {
    /// Actuator outputs in mask bit order (see [`ActuatorMask`](crate::actuators::ActuatorMask)).
    pub fn actuator_pins(&self) -> [u8; 6] {
        [
            self.ac1_compressor,
            self.ac1_fan,
            self.ac1_valve,
            self.ac2_compressor,
            self.ac2_fan,
            self.ac2_valve,
        ]
    }

    /// All lines in use, outputs first.
    pub fn all(&self) -> heapless::Vec<u8, 11> {
        let mut v: heapless::Vec<u8, 11> = heapless::Vec::new();
        for p in self.actuator_pins() {
            let _ = v.push(p);
        }
        let _ = v.push(self.comms_handshake_bit0);
        let _ = v.push(self.comms_handshake_bit1);
        let _ = v.push(self.comms_demand_low);
        let _ = v.push(self.comms_demand_high);
        if let Some(p) = self.power_source {
            let _ = v.push(p);
        }
        v
    }

    /// Clamp every pin to the header range and reject double assignment.
    ///
    /// A pin used twice would let one relay follow another, so the whole
    /// map falls back to defaults rather than guessing which entry is right.
    pub fn sanitize(&self) -> Self {
        let clamp = |p: u8| p.clamp(BCM_MIN, BCM_MAX);
        let clamped = Self {
            ac1_compressor: clamp(self.ac1_compressor),
            ac1_fan: clamp(self.ac1_fan),
            ac1_valve: clamp(self.ac1_valve),
            ac2_compressor: clamp(self.ac2_compressor),
            ac2_fan: clamp(self.ac2_fan),
            ac2_valve: clamp(self.ac2_valve),
            comms_demand_low: clamp(self.comms_demand_low),
            comms_demand_high: clamp(self.comms_demand_high),
            comms_handshake_bit0: clamp(self.comms_handshake_bit0),
            comms_handshake_bit1: clamp(self.comms_handshake_bit1),
            power_source: self.power_source.map(clamp),
        };
        if clamped != *self {
            warn!("WARNING: GPIO pin numbers clamped to {BCM_MIN}..={BCM_MAX}");
        }

        let pins = clamped.all();
        let duplicated = pins
            .iter()
            .enumerate()
            .any(|(i, p)| pins[i + 1..].contains(p));
        if duplicated {
            warn!("ALERT: GPIO pin assigned twice, falling back to default pin map");
            return Self::default();
        }
        clamped
    }
}
