//! Defrost program walker.
//!
//! The program is an ordered list of `(cycles, intent)` windows taken from
//! [`ControlConfig::defrost_program`](crate::config::ControlConfig).  The
//! cursor only ever moves forward, one cycle per call, so the windows run
//! in their literal order whatever the demand does meanwhile.

use crate::actuators::Intent;
use crate::config::DefrostStep;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DefrostCursor {
    /// Index of the active window.
    pub step: usize,
    /// Cycles already spent in the active window.
    pub elapsed: u32,
}

impl DefrostCursor {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Intent of the active window, `None` once the program is done.
    pub fn intent(&self, program: &[DefrostStep]) -> Option<Intent> {
        program.get(self.step).map(|s| s.intent)
    }

    /// Count the current cycle and move to the next window when this one
    /// is used up.  Returns `false` once every window has run.
    pub fn advance(&mut self, program: &[DefrostStep]) -> bool {
        let Some(step) = program.get(self.step) else {
            return false;
        };
        self.elapsed += 1;
        if self.elapsed >= step.cycles {
            self.step += 1;
            self.elapsed = 0;
        }
        self.step < program.len()
    }

    /// Cycles the whole program takes.
    pub fn total_cycles(program: &[DefrostStep]) -> u32 {
        program.iter().map(|s| s.cycles).sum()
    }
}
