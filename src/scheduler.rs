//! Fixed-cadence cycle pacing.
//!
//! The main loop runs one control cycle, then asks the [`CyclePacer`] how
//! long to sleep so that cycle starts stay a fixed period apart.  The
//! measurement uses the wall clock, which can jump (NTP steps, manual
//! changes).  A negative or implausibly large delta is treated as a clock
//! anomaly and the pacer falls back to a fixed delay instead.
//!
//! ```text
//!  ├── work ──┤──────── sleep = period − work ────────┤
//!  ▲ cycle N starts                                    ▲ cycle N+1 starts
//! ```

use std::time::Duration;

use log::warn;

use crate::config::ControlConfig;

/// Wall-clock source.  May jump in either direction.
pub trait Clock {
    /// Seconds since the Unix epoch.
    fn wall_secs(&self) -> f64;
}

// ═══════════════════════════════════════════════════════════════
//  Pacer
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct CyclePacer {
    period: Duration,
    skew_limit: Duration,
    fallback: Duration,
    started_at: Option<f64>,
}

impl CyclePacer {
    pub fn new(cfg: &ControlConfig) -> Self {
        Self {
            period: Duration::from_secs(u64::from(cfg.cycle_period_secs)),
            skew_limit: Duration::from_secs(u64::from(cfg.skew_limit_secs)),
            fallback: Duration::from_secs(u64::from(cfg.fallback_delay_secs)),
            started_at: None,
        }
    }

    pub fn reconfigure(&mut self, cfg: &ControlConfig) {
        let started_at = self.started_at;
        *self = Self::new(cfg);
        self.started_at = started_at;
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Record the start of a cycle.
    pub fn mark_start(&mut self, clock: &impl Clock) {
        self.started_at = Some(clock.wall_secs());
    }

    /// Sleep to take after the cycle that began at the last
    /// [`mark_start`](Self::mark_start).
    pub fn delay(&self, clock: &impl Clock) -> Duration {
        match self.started_at {
            Some(start) => self.delay_for(clock.wall_secs() - start),
            None => self.period,
        }
    }

    /// Sleep for a cycle whose work took `elapsed` wall-clock seconds.
    pub fn delay_for(&self, elapsed: f64) -> Duration {
        if !elapsed.is_finite() || elapsed < 0.0 || elapsed > self.skew_limit.as_secs_f64() {
            warn!(
                "WARNING: wall clock skew ({elapsed:.3}s per cycle), sleeping {}s",
                self.fallback.as_secs()
            );
            return self.fallback;
        }
        self.period.saturating_sub(Duration::from_secs_f64(elapsed))
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
