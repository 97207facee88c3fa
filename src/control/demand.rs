//! Peer demand signal.
//!
//! The peer controller raises up to two lines to ask for capacity, and may
//! carry a power-source line telling whether it runs on grid or battery.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Decoded request from the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DemandSignal {
    #[default]
    None,
    /// One unit.
    Low,
    /// Both units.
    High,
}

impl DemandSignal {
    /// High supersedes Low.
    pub fn decode(low: bool, high: bool) -> Self {
        match (low, high) {
            (_, true) => Self::High,
            (true, false) => Self::Low,
            (false, false) => Self::None,
        }
    }

    /// Number of circuits asked for.
    pub fn units(self) -> usize {
        match self {
            Self::None => 0,
            Self::Low => 1,
            Self::High => 2,
        }
    }
}

impl fmt::Display for DemandSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Low => "low",
            Self::High => "high",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PowerSource {
    #[default]
    Grid,
    Battery,
}

impl PowerSource {
    /// A missing power line means grid.
    pub fn from_line(line: Option<bool>) -> Self {
        match line {
            Some(true) => Self::Battery,
            _ => Self::Grid,
        }
    }
}

/// Raw levels of the inbound comms lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DemandLines {
    pub low: bool,
    pub high: bool,
    /// `None` when no power line is wired.
    pub power: Option<bool>,
}

impl DemandLines {
    pub fn decode(self) -> (DemandSignal, PowerSource) {
        (
            DemandSignal::decode(self.low, self.high),
            PowerSource::from_line(self.power),
        )
    }
}
