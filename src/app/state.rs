//! The single owner of mutable control state.
//!
//! Everything the loop changes from one cycle to the next lives in
//! [`ControllerState`]; the service threads it through every cycle step.
//! Only [`RunCounters`] survives a restart.

use serde::{Deserialize, Serialize};

use crate::actuators::{ActuatorMask, CircuitActuators, CircuitId};
use crate::config::ControlConfig;
use crate::control::demand::{DemandSignal, PowerSource};
use crate::control::handshake::HandshakeResponse;
use crate::fsm::context::CircuitContext;
use crate::fsm::states::build_mode_table;
use crate::fsm::{CircuitMode, ModeMachine};
use crate::sensors::TelemetryFilter;

/// Cumulative compressor run cycles per circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunCounters {
    pub ac1: u64,
    pub ac2: u64,
}

impl RunCounters {
    pub fn get(&self, circuit: CircuitId) -> u64 {
        match circuit {
            CircuitId::One => self.ac1,
            CircuitId::Two => self.ac2,
        }
    }

    pub fn bump(&mut self, circuit: CircuitId) {
        let slot = match circuit {
            CircuitId::One => &mut self.ac1,
            CircuitId::Two => &mut self.ac2,
        };
        *slot = slot.saturating_add(1);
    }
}

/// One compressor circuit: its mode machine and handler context.
pub struct Circuit {
    pub machine: ModeMachine,
    pub ctx: CircuitContext,
}

impl Circuit {
    pub fn new(id: CircuitId, config: &ControlConfig) -> Self {
        Self {
            machine: ModeMachine::new(build_mode_table(), CircuitMode::Off),
            ctx: CircuitContext::new(id, config.clone()),
        }
    }

    pub fn mode(&self) -> CircuitMode {
        self.machine.current_mode()
    }
}

pub struct ControllerState {
    pub filter: TelemetryFilter,
    pub actuators: [CircuitActuators; 2],
    pub circuits: [Circuit; 2],
    pub counters: RunCounters,
    /// Outputs last written to GPIO.
    pub committed: ActuatorMask,
    /// Handshake last written to GPIO.
    pub handshake: HandshakeResponse,
    pub demand: DemandSignal,
    pub power: PowerSource,
    /// Completed cycles since start.
    pub cycle: u64,
    /// Cycle at which counters were last flushed.
    pub flushed_at: u64,
}

impl ControllerState {
    /// Fresh state: everything off with zero dwell, so the minimum off
    /// time applies after every restart.
    pub fn new(config: &ControlConfig, counters: RunCounters) -> Self {
        Self::with_actuators(config, counters, [CircuitActuators::default(); 2])
    }

    /// Fresh state with known actuator history.
    pub fn with_actuators(
        config: &ControlConfig,
        counters: RunCounters,
        actuators: [CircuitActuators; 2],
    ) -> Self {
        Self {
            filter: TelemetryFilter::new(config),
            actuators,
            circuits: [
                Circuit::new(CircuitId::One, config),
                Circuit::new(CircuitId::Two, config),
            ],
            counters,
            committed: ActuatorMask::from_actuators(&actuators),
            handshake: HandshakeResponse::NoChangeAllowed,
            demand: DemandSignal::None,
            power: PowerSource::Grid,
            cycle: 0,
            flushed_at: 0,
        }
    }

    pub fn modes(&self) -> [CircuitMode; 2] {
        [self.circuits[0].mode(), self.circuits[1].mode()]
    }

    pub fn circuit(&self, id: CircuitId) -> &Circuit {
        &self.circuits[id.index()]
    }
}
