//! Actuator interlocks.
//!
//! Pure `can_turn_*` predicates over actuator states and dwell counters.
//! Nothing here mutates state: the service consults the predicates while
//! applying an intent and silently skips any change they refuse.  A refused
//! change is simply retried next cycle.
//!
//! ## Ordering rules
//!
//! 1. The valve only moves while its compressor is off and has been off
//!    for at least `valve_settle` cycles.
//! 2. The compressor only starts once the valve sits in the required
//!    position and has settled there.
//! 3. The two compressors never start within `stagger_cycles` of each
//!    other.
//! 4. The fan outlasts its compressor by `fan_overrun` cycles.

use crate::actuators::{CircuitActuators, CircuitId};
use crate::config::ControlConfig;

/// Overrides that relax dwell minimums for one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Relax {
    /// Skip the compressor minimum off time (restart after defrost).
    pub skip_off_dwell: bool,
    /// Allow compressor and fan to stop immediately (battery, overheat,
    /// defrost windows).
    pub immediate_off: bool,
}

/// Everything a predicate may look at for one circuit.
#[derive(Debug, Clone, Copy)]
pub struct GuardInputs<'a> {
    pub circuit: CircuitId,
    pub own: &'a CircuitActuators,
    pub companion: &'a CircuitActuators,
    /// Filtered compressor temperature of this circuit.
    pub compressor_temp: f32,
    /// Config allows this circuit to run.
    pub enabled: bool,
    pub relax: Relax,
}

/// Guard parameters lifted out of [`ControlConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interlocks {
    compressor_min_off: u32,
    compressor_min_on: u32,
    stagger_cycles: u32,
    stagger_both_circuits: bool,
    fan_overrun: u32,
    valve_settle: u32,
    overheat_ceiling: f32,
}

impl Interlocks {
    pub fn new(cfg: &ControlConfig) -> Self {
        Self {
            compressor_min_off: cfg.compressor_min_off,
            compressor_min_on: cfg.compressor_min_on,
            stagger_cycles: cfg.stagger_cycles,
            stagger_both_circuits: cfg.stagger_both_circuits,
            fan_overrun: cfg.fan_overrun,
            valve_settle: cfg.valve_settle,
            overheat_ceiling: cfg.overheat_ceiling,
        }
    }

    // ── Compressor ────────────────────────────────────────────

    /// Every compressor-on condition except the valve position.
    pub fn compressor_ready(&self, g: &GuardInputs<'_>) -> bool {
        let c = &g.own.compressor;
        if c.is_on() || !g.enabled {
            return false;
        }
        if !g.relax.skip_off_dwell && c.dwell() <= self.compressor_min_off {
            return false;
        }
        if self.stagger_blocks(g) {
            return false;
        }
        g.compressor_temp < self.overheat_ceiling
    }

    /// Compressor may start with the valve required at `valve_on`.
    pub fn can_turn_compressor_on(&self, g: &GuardInputs<'_>, valve_on: bool) -> bool {
        let v = &g.own.valve;
        self.compressor_ready(g) && v.is_on() == valve_on && v.dwell() > self.valve_settle
    }

    pub fn can_turn_compressor_off(&self, g: &GuardInputs<'_>) -> bool {
        let c = &g.own.compressor;
        c.is_on() && (g.relax.immediate_off || c.dwell() > self.compressor_min_on)
    }

    fn stagger_blocks(&self, g: &GuardInputs<'_>) -> bool {
        if !self.stagger_both_circuits && g.circuit == CircuitId::One {
            return false;
        }
        let other = &g.companion.compressor;
        other.is_on() && other.dwell() <= self.stagger_cycles
    }

    // ── Fan ───────────────────────────────────────────────────

    pub fn can_turn_fan_on(&self, g: &GuardInputs<'_>) -> bool {
        !g.own.fan.is_on()
    }

    /// Fan stops once the compressor has been off for the overrun time.
    pub fn can_turn_fan_off(&self, g: &GuardInputs<'_>) -> bool {
        if !g.own.fan.is_on() {
            return false;
        }
        if g.relax.immediate_off {
            return true;
        }
        let c = &g.own.compressor;
        !c.is_on() && c.dwell() >= self.fan_overrun
    }

    // ── Valve ─────────────────────────────────────────────────

    pub fn can_turn_valve_on(&self, g: &GuardInputs<'_>) -> bool {
        !g.own.valve.is_on() && self.valve_free(g)
    }

    pub fn can_turn_valve_off(&self, g: &GuardInputs<'_>) -> bool {
        g.own.valve.is_on() && self.valve_free(g)
    }

    fn valve_free(&self, g: &GuardInputs<'_>) -> bool {
        let c = &g.own.compressor;
        !c.is_on() && c.dwell() > self.valve_settle
    }
}
