//! Cross-circuit control: peer demand decoding, the demand arbiter and the
//! handshake encoder.

pub mod arbiter;
pub mod demand;
pub mod handshake;
