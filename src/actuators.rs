//! Actuator identity and state.
//!
//! Each circuit owns a compressor, a fan and a four-way reversing valve.
//! Every actuator carries a dwell counter (cycles since its last flip) that
//! the guard predicates in [`safety`](crate::safety) read.

use core::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Circuit identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CircuitId {
    One,
    Two,
}

impl CircuitId {
    pub const ALL: [Self; 2] = [Self::One, Self::Two];

    pub const fn index(self) -> usize {
        match self {
            Self::One => 0,
            Self::Two => 1,
        }
    }

    /// The companion circuit.
    pub const fn other(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }
}

impl fmt::Display for CircuitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One => write!(f, "AC1"),
            Self::Two => write!(f, "AC2"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actuator {
    Compressor,
    Fan,
    Valve,
}

// ---------------------------------------------------------------------------
// ActuatorState
// ---------------------------------------------------------------------------

/// Boolean output plus cycles since it last changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActuatorState {
    on: bool,
    dwell: u32,
}

impl ActuatorState {
    pub const fn new(on: bool, dwell: u32) -> Self {
        Self { on, dwell }
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn dwell(&self) -> u32 {
        self.dwell
    }

    /// Drive to `on`.  Returns `true` and restarts the dwell on a flip.
    pub fn set(&mut self, on: bool) -> bool {
        if self.on == on {
            return false;
        }
        self.on = on;
        self.dwell = 0;
        true
    }

    /// One more cycle in the current state.
    pub fn tick(&mut self) {
        self.dwell = self.dwell.saturating_add(1);
    }
}

/// The three actuators of one circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CircuitActuators {
    pub compressor: ActuatorState,
    pub fan: ActuatorState,
    pub valve: ActuatorState,
}

impl CircuitActuators {
    pub fn get(&self, which: Actuator) -> &ActuatorState {
        match which {
            Actuator::Compressor => &self.compressor,
            Actuator::Fan => &self.fan,
            Actuator::Valve => &self.valve,
        }
    }

    pub fn tick(&mut self) {
        self.compressor.tick();
        self.fan.tick();
        self.valve.tick();
    }

    /// Current outputs as an intent.
    pub fn intent(&self) -> Intent {
        Intent {
            compressor: self.compressor.is_on(),
            fan: self.fan.is_on(),
            valve: self.valve.is_on(),
        }
    }
}

// ---------------------------------------------------------------------------
// Intent
// ---------------------------------------------------------------------------

/// Desired outputs for one circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Intent {
    pub compressor: bool,
    pub fan: bool,
    pub valve: bool,
}

impl Intent {
    pub const OFF: Self = Self {
        compressor: false,
        fan: false,
        valve: false,
    };

    /// Compressor and fan running with the valve at `valve`.
    pub const fn running(valve: bool) -> Self {
        Self {
            compressor: true,
            fan: true,
            valve,
        }
    }

    /// Same intent with compressor and fan forced off.
    pub const fn shed(self) -> Self {
        Self {
            compressor: false,
            fan: false,
            valve: self.valve,
        }
    }
}

// ---------------------------------------------------------------------------
// ActuatorMask
// ---------------------------------------------------------------------------

/// Six actuator bits, one byte.
///
/// ```text
///   bit  0 AC1 compressor   3 AC2 compressor
///        1 AC1 fan          4 AC2 fan
///        2 AC1 valve        5 AC2 valve
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct ActuatorMask(u8);

impl ActuatorMask {
    pub const NONE: Self = Self(0);

    const fn bit(circuit: CircuitId, which: Actuator) -> u8 {
        let base = match circuit {
            CircuitId::One => 0,
            CircuitId::Two => 3,
        };
        let offset = match which {
            Actuator::Compressor => 0,
            Actuator::Fan => 1,
            Actuator::Valve => 2,
        };
        1 << (base + offset)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0b11_1111)
    }

    pub fn get(self, circuit: CircuitId, which: Actuator) -> bool {
        self.0 & Self::bit(circuit, which) != 0
    }

    pub fn set(&mut self, circuit: CircuitId, which: Actuator, on: bool) {
        let b = Self::bit(circuit, which);
        if on {
            self.0 |= b;
        } else {
            self.0 &= !b;
        }
    }

    pub fn compressor(self, circuit: CircuitId) -> bool {
        self.get(circuit, Actuator::Compressor)
    }

    pub fn fan(self, circuit: CircuitId) -> bool {
        self.get(circuit, Actuator::Fan)
    }

    pub fn valve(self, circuit: CircuitId) -> bool {
        self.get(circuit, Actuator::Valve)
    }

    pub fn circuit(self, circuit: CircuitId) -> Intent {
        Intent {
            compressor: self.compressor(circuit),
            fan: self.fan(circuit),
            valve: self.valve(circuit),
        }
    }

    pub fn with_circuit(mut self, circuit: CircuitId, intent: Intent) -> Self {
        self.set(circuit, Actuator::Compressor, intent.compressor);
        self.set(circuit, Actuator::Fan, intent.fan);
        self.set(circuit, Actuator::Valve, intent.valve);
        self
    }

    /// Snapshot of both circuits' outputs.
    pub fn from_actuators(circuits: &[CircuitActuators; 2]) -> Self {
        CircuitId::ALL.iter().fold(Self::NONE, |m, &c| {
            m.with_circuit(c, circuits[c.index()].intent())
        })
    }
}

impl fmt::Display for ActuatorMask {
    /// `1COMP 1FAN 2V` style listing of what is on.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [&str; 6] = ["1COMP", "1FAN", "1V", "2COMP", "2FAN", "2V"];
        let mut first = true;
        for (i, name) in NAMES.iter().enumerate() {
            if self.0 & (1 << i) != 0 {
                if !first {
                    f.write_str(" ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        if first {
            f.write_str("-")?;
        }
        Ok(())
    }
}
