//! Demand arbiter.
//!
//! Turns the peer's request into a desired [`ActuatorMask`] for both
//! circuits.  The mask is advisory: each circuit's mode machine may
//! override it, and the interlocks gate whatever is finally applied.
//!
//! ## Precedence (last wins)
//!
//! 1. Demand: None → nobody, Low → one circuit, High → both.
//! 2. Circuits disabled by config drop out.  Low demand also passes over
//!    a circuit cooling down in OverheatProtection.
//! 3. Defrost forces its circuit on.
//! 4. OverheatProtection forces its circuit off.
//! 5. Battery power forces everything off, valves held in place.

use log::debug;

use super::demand::{DemandSignal, PowerSource};
use crate::actuators::{ActuatorMask, CircuitId, Intent};
use crate::fsm::CircuitMode;

/// Per-circuit facts the arbiter weighs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircuitView {
    pub mode: CircuitMode,
    /// Config allows the circuit to run.
    pub enabled: bool,
    /// Compressor could be started this cycle.
    pub startable: bool,
    pub run_cycles: u64,
    /// Current valve output, held when the circuit is shed.
    pub valve_on: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArbiterInputs {
    pub demand: DemandSignal,
    pub power: PowerSource,
    pub circuits: [CircuitView; 2],
    pub run_valve_on: bool,
}

/// Which circuits should run, before overrides.
pub fn select(inputs: &ArbiterInputs) -> [bool; 2] {
    let [a, b] = inputs.circuits;
    match inputs.demand {
        DemandSignal::None => [false, false],
        DemandSignal::High => [a.enabled, b.enabled],
        DemandSignal::Low => {
            let pick = pick_one(&a, &b);
            [pick == Some(CircuitId::One), pick == Some(CircuitId::Two)]
        }
    }
}

impl CircuitView {
    /// Low demand may hand this circuit the load.
    fn eligible(&self) -> bool {
        self.enabled && self.mode != CircuitMode::OverheatProtection
    }
}

/// Low demand: keep a running circuit if there is one, else the one with
/// fewer run cycles, else the one that can start right now.
fn pick_one(a: &CircuitView, b: &CircuitView) -> Option<CircuitId> {
    match (a.eligible(), b.eligible()) {
        (false, false) => return None,
        (true, false) => return Some(CircuitId::One),
        (false, true) => return Some(CircuitId::Two),
        (true, true) => {}
    }
    let running = (a.mode.is_running(), b.mode.is_running());
    match running {
        (true, false) => return Some(CircuitId::One),
        (false, true) => return Some(CircuitId::Two),
        // Both running after High dropped to Low: keep the less worn one.
        _ => {}
    }
    if a.run_cycles != b.run_cycles {
        return Some(if a.run_cycles < b.run_cycles {
            CircuitId::One
        } else {
            CircuitId::Two
        });
    }
    if b.startable && !a.startable {
        return Some(CircuitId::Two);
    }
    Some(CircuitId::One)
}

/// Full desired mask after every override.
pub fn arbitrate(inputs: &ArbiterInputs) -> ActuatorMask {
    let wanted = select(inputs);
    let battery = inputs.power == PowerSource::Battery;

    CircuitId::ALL.iter().fold(ActuatorMask::NONE, |mask, &c| {
        let view = inputs.circuits[c.index()];
        let mut want = wanted[c.index()] && view.enabled;
        match view.mode {
            CircuitMode::Defrost => want = true,
            CircuitMode::OverheatProtection => want = false,
            _ => {}
        }

        let hold = Intent {
            valve: view.valve_on,
            ..Intent::OFF
        };
        let intent = if battery {
            hold
        } else if want {
            Intent::running(inputs.run_valve_on)
        } else if view.mode == CircuitMode::OverheatProtection {
            hold
        } else {
            Intent::OFF
        };
        debug!("arbiter: {c} {} -> {intent:?}", view.mode);
        mask.with_circuit(c, intent)
    })
}
