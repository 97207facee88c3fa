//! Outbound application events.
//!
//! The [`ControlService`](super::service::ControlService) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log lines, the JSON snapshot file.

use serde::Serialize;

use crate::actuators::{ActuatorMask, CircuitId};
use crate::control::demand::{DemandSignal, PowerSource};
use crate::control::handshake::HandshakeResponse;
use crate::error::SensorFault;
use crate::fsm::CircuitMode;
use crate::sensors::Temperatures;

use super::state::RunCounters;

#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The service has started (carries both circuits' initial modes).
    Started([CircuitMode; 2]),

    /// Per-cycle telemetry snapshot.
    Telemetry(TelemetryData),

    ModeChanged {
        circuit: CircuitId,
        from: CircuitMode,
        to: CircuitMode,
    },

    /// Committed actuator outputs changed and were written.
    ActuatorsChanged(ActuatorMask),

    HandshakeChanged(HandshakeResponse),

    DemandChanged {
        demand: DemandSignal,
        power: PowerSource,
    },

    /// Sustained sensor loss; outputs have been switched off.
    FatalFault(SensorFault),

    CountersFlushed(RunCounters),

    ConfigReloaded,
}

/// A point-in-time snapshot for logging or the snapshot file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryData {
    pub cycle: u64,
    pub temperatures: Temperatures,
    pub actuators: ActuatorMask,
    pub modes: [CircuitMode; 2],
    pub demand: DemandSignal,
    pub power: PowerSource,
    pub handshake: HandshakeResponse,
    pub counters: RunCounters,
}
