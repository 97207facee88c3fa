//! Heat-pump manager library.
//!
//! Exposes the pure control core (telemetry filter, interlocks, mode
//! machines, arbiter, handshake) and the Linux boundary adapters for
//! integration testing and for the `hpm` daemon binary.

#![deny(unused_must_use)]

pub mod actuators;
pub mod app;
pub mod config;
pub mod control;
pub mod error;
pub mod events;
pub mod fsm;
pub mod pins;
pub mod safety;
pub mod scheduler;
pub mod sensors;

pub mod adapters;
pub mod drivers;
