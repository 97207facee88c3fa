//! Pin-level drivers, generic over `embedded-hal` digital traits.
//!
//! Drivers are dumb: they put a mask or a handshake on the wire and read
//! the comms inputs.  Every rule about *when* an output may change lives
//! in the control core.

pub mod comms;
pub mod relay;
