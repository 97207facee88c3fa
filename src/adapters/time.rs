//! System wall clock for the cycle pacer.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::scheduler::Clock;

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    /// Seconds since the epoch; negative if the clock is set before it.
    fn wall_secs(&self) -> f64 {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(d) => d.as_secs_f64(),
            Err(e) => -e.duration().as_secs_f64(),
        }
    }
}
