//! Per-circuit context threaded through every mode handler.
//!
//! `CircuitContext` is the blackboard a circuit's handlers read from and
//! write to.  The service fills in the inputs (temperatures, demand, guard
//! verdicts) before each tick and reads the outputs (intent, relaxations)
//! afterwards.

use crate::actuators::{CircuitId, Intent};
use crate::config::ControlConfig;
use crate::safety::Relax;
use crate::sensors::UNKNOWN_TEMP;

use super::defrost::DefrostCursor;

pub struct CircuitContext {
    pub circuit: CircuitId,

    // -- Timing --
    /// Cycles since the current mode was entered.
    pub ticks_in_mode: u64,
    /// Cycles run by this circuit's machine.
    pub total_ticks: u64,

    // -- Inputs --
    pub compressor_temp: f32,
    pub condenser_temp: f32,
    /// The arbiter wants this circuit's compressor running.
    pub desired: bool,
    /// The arbiter's full intent for this circuit.
    pub desired_intent: Intent,
    /// Compressor-on guard holds with the valve in the running position.
    pub can_start: bool,
    /// Compressor-off guard holds.
    pub can_stop: bool,
    pub compressor_on: bool,
    /// Cycles since the compressor last changed state.
    pub compressor_dwell: u32,
    pub on_battery: bool,

    // -- Configuration --
    pub config: ControlConfig,

    // -- Outputs --
    /// What the handlers want the actuators to do this cycle.
    pub intent: Intent,
    /// Guard relaxations for this cycle.
    pub relax: Relax,
    /// Compressor may restart without the minimum off time (set when
    /// defrost hands back to Starting, cleared once it runs again).
    pub rapid_restart: bool,

    // -- Defrost --
    pub defrost: DefrostCursor,
    pub cold_streak: ColdStreak,
}

/// Consecutive FinHeating cycles with the condenser below each defrost
/// trigger's threshold.  Cleared on FinHeating entry.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ColdStreak {
    pub deep: u32,
    pub mild: u32,
}

impl CircuitContext {
    pub fn new(circuit: CircuitId, config: ControlConfig) -> Self {
        Self {
            circuit,
            ticks_in_mode: 0,
            total_ticks: 0,
            compressor_temp: UNKNOWN_TEMP,
            condenser_temp: UNKNOWN_TEMP,
            desired: false,
            desired_intent: Intent::OFF,
            can_start: false,
            can_stop: false,
            compressor_on: false,
            compressor_dwell: 0,
            on_battery: false,
            config,
            intent: Intent::OFF,
            relax: Relax::default(),
            rapid_restart: false,
            defrost: DefrostCursor::default(),
            cold_streak: ColdStreak::default(),
        }
    }

    /// Intent while the compressor is meant to run.
    pub fn running_intent(&self) -> Intent {
        let run = Intent::running(self.config.run_valve_on);
        if self.on_battery { run.shed() } else { run }
    }

    pub fn overheated(&self) -> bool {
        self.compressor_temp > self.config.overheat_ceiling
    }

    /// The arbiter released the circuit and the off-guard lets it go.
    pub fn should_stop(&self) -> bool {
        !self.desired && (!self.compressor_on || self.can_stop)
    }
}
