//! Telemetry filter.
//!
//! Runs first in every cycle.  Each channel's new reading is accepted,
//! clamped, or discarded against the previously accepted value:
//!
//! ```text
//!   |new - prev| > 2Δ   discard, reuse prev, count as a failure
//!   |new - prev| >  Δ   clamp to prev ± Δ
//!   otherwise           accept
//! ```
//!
//! During the grace window after start-up (or a config reload) readings
//! seed both values directly.  A channel whose failure counter climbs past
//! the limit yields a [`SensorFault`], the only fatal path in the core.

use log::{error, warn};

use super::{RawReadings, SensorChannel, SensorId, Temperatures, UNKNOWN_TEMP};
use crate::config::ControlConfig;
use crate::error::SensorFault;

pub struct TelemetryFilter {
    channels: [SensorChannel; SensorId::COUNT],
    max_delta: f32,
    failure_limit: u16,
    /// Cycles left in which readings bypass clamping.
    grace: u32,
}

impl TelemetryFilter {
    pub fn new(cfg: &ControlConfig) -> Self {
        Self {
            channels: SensorId::ALL.map(|id| SensorChannel::new(id, cfg.sensor_failure_seed)),
            max_delta: cfg.max_temp_diff,
            failure_limit: cfg.sensor_failure_limit,
            grace: cfg.startup_grace_cycles,
        }
    }

    /// Pick up new limits without losing channel history.
    pub fn reconfigure(&mut self, cfg: &ControlConfig) {
        self.max_delta = cfg.max_temp_diff;
        self.failure_limit = cfg.sensor_failure_limit;
    }

    /// Let the next `cycles` readings seed the channels unclamped.
    pub fn arm_grace(&mut self, cycles: u32) {
        self.grace = self.grace.max(cycles);
    }

    pub fn in_grace(&self) -> bool {
        self.grace > 0
    }

    /// Fold one cycle of raw readings into the channels.
    pub fn apply(&mut self, raw: &RawReadings) -> Result<(), SensorFault> {
        let seeding = self.grace > 0;
        for (ch, reading) in self.channels.iter_mut().zip(raw.iter()) {
            match *reading {
                Some(new) => accept(ch, new, self.max_delta, seeding),
                None => {
                    ch.failures = ch.failures.saturating_add(1);
                    warn!(
                        "WARNING: sensor {} read failed, error counter at {}",
                        ch.id, ch.failures
                    );
                }
            }
        }
        self.grace = self.grace.saturating_sub(1);

        if let Some(ch) = self.channels.iter().find(|c| c.failures > self.failure_limit) {
            error!("ALARM: too many sensor read errors on {}, stopping", ch.id);
            return Err(SensorFault {
                channel: ch.id,
                failures: ch.failures,
            });
        }
        Ok(())
    }

    pub fn channel(&self, id: SensorId) -> &SensorChannel {
        &self.channels[id.index()]
    }

    pub fn value(&self, id: SensorId) -> f32 {
        self.channels[id.index()].value
    }

    pub fn temperatures(&self) -> Temperatures {
        Temperatures(self.channels.map(|c| c.value))
    }
}

fn accept(ch: &mut SensorChannel, new: f32, delta: f32, seeding: bool) {
    ch.failures = ch.failures.saturating_sub(1);
    if seeding || ch.previous == UNKNOWN_TEMP {
        ch.previous = new;
        ch.value = new;
        return;
    }

    let prev = ch.previous;
    let mut v = new;
    if (v - prev).abs() > 2.0 * delta {
        warn!(
            "WARNING: counting {v:.3} for sensor {} as BAD and using {prev:.3}",
            ch.id
        );
        v = prev;
        ch.failures = ch.failures.saturating_add(1);
    }
    if v < prev - delta {
        warn!("WARNING: correcting LOW {v:.3} for sensor {} with {:.3}", ch.id, prev - delta);
        v = prev - delta;
    } else if v > prev + delta {
        warn!("WARNING: correcting HIGH {v:.3} for sensor {} with {:.3}", ch.id, prev + delta);
        v = prev + delta;
    }
    ch.previous = ch.value;
    ch.value = v;
}
