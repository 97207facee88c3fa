//! Port traits: the hexagonal boundary between control logic and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControlService (domain)
//! ```
//!
//! Driven adapters (sensor files, GPIO, counter file, log) implement these
//! traits.  The [`ControlService`](super::service::ControlService) consumes
//! them via generics, so the control core never touches hardware directly.

use crate::actuators::ActuatorMask;
use crate::config::SystemConfig;
use crate::control::demand::DemandLines;
use crate::control::handshake::HandshakeResponse;
use crate::error::{ConfigError, GpioError, StorageError};
use crate::sensors::RawReadings;

use super::events::AppEvent;
use super::state::RunCounters;

// ───────────────────────────────────────────────────────────────
// Sensor port (hardware → domain)
// ───────────────────────────────────────────────────────────────

pub trait SensorPort {
    /// One reading per channel, `None` where the probe could not be read.
    fn read_temperatures(&mut self) -> RawReadings;
}

// ───────────────────────────────────────────────────────────────
// GPIO port (domain ↔ hardware)
// ───────────────────────────────────────────────────────────────

pub trait GpioPort {
    /// Sample the inbound comms lines.
    fn read_demand(&mut self) -> Result<DemandLines, GpioError>;

    /// Drive all six actuator outputs.
    fn write_actuators(&mut self, mask: ActuatorMask) -> Result<(), GpioError>;

    /// Drive the two handshake lines.
    fn write_handshake(&mut self, response: HandshakeResponse) -> Result<(), GpioError>;

    /// Every output off.  Used on fatal faults and shutdown.
    fn all_off(&mut self) -> Result<(), GpioError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging / snapshot)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`]s through this port.  Adapters
/// decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}

/// Fan one event out to two sinks.
impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn emit(&mut self, event: &AppEvent) {
        self.0.emit(event);
        self.1.emit(event);
    }
}

// ───────────────────────────────────────────────────────────────
// Configuration port
// ───────────────────────────────────────────────────────────────

/// Loads configuration.
///
/// Implementations MUST run [`validate_config`](crate::config::validate_config)
/// and [`SystemConfig::normalize`] before returning a config.
pub trait ConfigPort {
    fn load(&self) -> Result<SystemConfig, ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Counter store port
// ───────────────────────────────────────────────────────────────

/// Persists the two run-cycle counters.  Writes must be atomic.
pub trait CounterStore {
    fn load(&mut self) -> Result<RunCounters, StorageError>;
    fn save(&mut self, counters: &RunCounters) -> Result<(), StorageError>;
}
