//! Handshake encoder.
//!
//! Tells the peer how much capacity is left to add or remove, on two
//! output lines:
//!
//! ```text
//!   b1 b0
//!    0  0   NoChangeAllowed
//!    0  1   CanAdd
//!    1  0   CanRemove
//!    1  1   FullySatisfied
//! ```

use core::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum HandshakeResponse {
    #[default]
    NoChangeAllowed = 0b00,
    CanAdd = 0b01,
    CanRemove = 0b10,
    FullySatisfied = 0b11,
}

impl HandshakeResponse {
    /// Encode from the number of circuits that could start and stop now.
    pub fn encode(enabled: bool, startable: usize, stoppable: usize) -> Self {
        if !enabled || (startable == 0 && stoppable == 0) {
            return Self::NoChangeAllowed;
        }
        match startable.cmp(&stoppable) {
            core::cmp::Ordering::Greater => Self::CanAdd,
            core::cmp::Ordering::Less => Self::CanRemove,
            core::cmp::Ordering::Equal => Self::FullySatisfied,
        }
    }

    pub const fn bits(self) -> u8 {
        self as u8
    }

    pub const fn bit0(self) -> bool {
        self.bits() & 0b01 != 0
    }

    pub const fn bit1(self) -> bool {
        self.bits() & 0b10 != 0
    }
}

impl fmt::Display for HandshakeResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoChangeAllowed => "no-change-allowed",
            Self::CanAdd => "can-add",
            Self::CanRemove => "can-remove",
            Self::FullySatisfied => "fully-satisfied",
        })
    }
}
