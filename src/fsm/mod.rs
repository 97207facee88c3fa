//! Function-pointer mode machine, one instance per compressor circuit.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  ModeTable                                                       │
//! │  ┌────────────────────┬──────────┬─────────┬────────────────────┐│
//! │  │ CircuitMode        │ on_enter │ on_exit │ on_update          ││
//! │  ├────────────────────┼──────────┼─────────┼────────────────────┤│
//! │  │ Off                │ fn(ctx)  │  -      │ fn(ctx)->Option<>  ││
//! │  │ Starting           │ fn(ctx)  │  -      │ fn(ctx)->Option<>  ││
//! │  │ Cooling            │ fn(ctx)  │  -      │ fn(ctx)->Option<>  ││
//! │  │ FinHeating         │ fn(ctx)  │  -      │ fn(ctx)->Option<>  ││
//! │  │ Defrost            │ fn(ctx)  │ fn(ctx) │ fn(ctx)->Option<>  ││
//! │  │ OverheatProtection │ fn(ctx)  │ fn(ctx) │ fn(ctx)->Option<>  ││
//! │  └────────────────────┴──────────┴─────────┴────────────────────┘│
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each cycle the engine calls `on_update` for the **current** mode.  If it
//! returns `Some(next)`, the engine runs `on_exit` for the current mode, then
//! `on_enter` for the next, and resets the mode dwell.  Handlers write the
//! circuit's desired actuator [`Intent`](crate::actuators::Intent) into the
//! [`CircuitContext`]; the service gates that intent through the interlocks
//! afterwards.

pub mod context;
pub mod defrost;
pub mod states;

use core::fmt;

use context::CircuitContext;
use log::{error, info};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Mode identity
// ---------------------------------------------------------------------------

/// Operating mode of one circuit.
/// Must stay in sync with the table built in [`states::build_mode_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CircuitMode {
    Off = 0,
    Starting = 1,
    Cooling = 2,
    FinHeating = 3,
    Defrost = 4,
    OverheatProtection = 5,
}

impl CircuitMode {
    /// Total number of modes, used to size the table array.
    pub const COUNT: usize = 6;

    /// Convert an index back to a mode.  Out-of-range falls back to `Off`.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Off,
            1 => Self::Starting,
            2 => Self::Cooling,
            3 => Self::FinHeating,
            4 => Self::Defrost,
            5 => Self::OverheatProtection,
            _ => {
                debug_assert!(false, "invalid mode index: {idx}");
                Self::Off
            }
        }
    }

    /// Modes in which the compressor is meant to be cycling.
    pub fn is_running(self) -> bool {
        matches!(
            self,
            Self::Starting | Self::Cooling | Self::FinHeating | Self::Defrost
        )
    }
}

impl fmt::Display for CircuitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Off => "Off",
            Self::Starting => "Starting",
            Self::Cooling => "Cooling",
            Self::FinHeating => "FinHeating",
            Self::Defrost => "Defrost",
            Self::OverheatProtection => "OverheatProtection",
        })
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
pub type ModeActionFn = fn(&mut CircuitContext);

/// Signature for the per-cycle update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type ModeUpdateFn = fn(&mut CircuitContext) -> Option<CircuitMode>;

// ---------------------------------------------------------------------------
// Mode descriptor (one row in the table)
// ---------------------------------------------------------------------------

pub struct ModeDescriptor {
    pub id: CircuitMode,
    pub name: &'static str,
    pub on_enter: Option<ModeActionFn>,
    pub on_exit: Option<ModeActionFn>,
    pub on_update: ModeUpdateFn,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct ModeMachine {
    /// Fixed-size table indexed by `CircuitMode as usize`.
    table: [ModeDescriptor; CircuitMode::COUNT],
    current: usize,
    /// Cycles run by this machine.
    tick_count: u64,
    /// Cycle at which the current mode was entered.
    mode_entry_tick: u64,
}

impl ModeMachine {
    pub fn new(table: [ModeDescriptor; CircuitMode::COUNT], initial: CircuitMode) -> Self {
        Self {
            table,
            current: initial as usize,
            tick_count: 0,
            mode_entry_tick: 0,
        }
    }

    /// Run the initial `on_enter`.  Call once before the first `tick()`.
    pub fn start(&mut self, ctx: &mut CircuitContext) {
        info!(
            "INFO: {} mode machine starting in {}",
            ctx.circuit, self.table[self.current].name
        );
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance by one control cycle.
    ///
    /// Returns the `(from, to)` pair when the mode changed.
    pub fn tick(&mut self, ctx: &mut CircuitContext) -> Option<(CircuitMode, CircuitMode)> {
        self.tick_count += 1;
        ctx.ticks_in_mode = self.tick_count - self.mode_entry_tick;
        ctx.total_ticks = self.tick_count;

        let from = self.current_mode();
        let next = (self.table[self.current].on_update)(ctx)?;
        if next == from {
            return None;
        }
        if !states::is_legal_transition(from, next) {
            error!("ALARM: {} refused illegal mode change {from} -> {next}", ctx.circuit);
            debug_assert!(false, "illegal mode change {from} -> {next}");
            return None;
        }
        self.transition(next, ctx);
        Some((from, next))
    }

    /// Jump straight into `next`, running exit and enter actions.
    /// Bypasses the transition list; used to restore state and in tests.
    pub fn force_transition(&mut self, next: CircuitMode, ctx: &mut CircuitContext) {
        if next as usize != self.current {
            self.transition(next, ctx);
        }
    }

    pub fn current_mode(&self) -> CircuitMode {
        CircuitMode::from_index(self.current)
    }

    /// Cycles spent in the current mode.
    pub fn ticks_in_current_mode(&self) -> u64 {
        self.tick_count - self.mode_entry_tick
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next: CircuitMode, ctx: &mut CircuitContext) {
        info!(
            "INFO: {} mode {} -> {}",
            ctx.circuit, self.table[self.current].name, self.table[next as usize].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next as usize;
        self.mode_entry_tick = self.tick_count;
        ctx.ticks_in_mode = 0;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
