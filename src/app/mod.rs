//! Application core: pure domain logic, zero I/O.
//!
//! This module holds the cycle orchestration for the two-circuit
//! controller: telemetry filtering, demand arbitration, mode machines,
//! interlocked actuation and the handshake.  All interaction with hardware
//! happens through **port traits** defined in [`ports`], keeping this layer
//! fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
pub mod state;
