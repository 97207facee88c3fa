//! System configuration parameters
//!
//! All tunable parameters for the heat-pump manager.  Every dwell is counted
//! in control cycles, never in seconds, so the same numbers hold whatever
//! `cycle_period_secs` is set to.  Values are loaded from a TOML file by
//! [`FileConfig`](crate::adapters::config_file::FileConfig); anything missing
//! falls back to the defaults below.

use heapless::Vec;
use serde::{Deserialize, Serialize};

use crate::actuators::Intent;
use crate::error::ConfigError;
use crate::pins::PinMap;
use crate::sensors::SensorId;

/// Upper bound on defrost program length.
pub const MAX_DEFROST_STEPS: usize = 8;

/// Highest accepted value for the top-level `mode` key.
pub const MAX_MODE: u8 = 8;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// 0 disables the controller; 1..=8 enable it.
    pub mode: u8,
    /// Circuit 1 may be started.
    pub use_ac1: bool,
    /// Circuit 2 may be started.
    pub use_ac2: bool,
    /// `error`, `warn`, `info`, `debug` or `trace`.
    pub log_level: String,

    pub control: ControlConfig,
    pub hardware: HardwareConfig,
    pub sensors: SensorPaths,
    pub paths: PathsConfig,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            mode: 1,
            use_ac1: true,
            use_ac2: true,
            log_level: "info".into(),
            control: ControlConfig::default(),
            hardware: HardwareConfig::default(),
            sensors: SensorPaths::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl SystemConfig {
    /// Mode 0 (or an out-of-range value, normalised to 0) disables control.
    pub fn enabled(&self) -> bool {
        self.mode != 0
    }

    /// Whether the given circuit is allowed to run by configuration.
    pub fn circuit_enabled(&self, circuit: crate::actuators::CircuitId) -> bool {
        self.enabled()
            && match circuit {
                crate::actuators::CircuitId::One => self.use_ac1,
                crate::actuators::CircuitId::Two => self.use_ac2,
            }
    }

    /// Bring loosely-typed keys into range.
    ///
    /// An out-of-range `mode` becomes 0 (disabled) and the pin map is
    /// clamped and checked for duplicates.
    pub fn normalize(&mut self) {
        if self.mode > MAX_MODE {
            log::warn!("WARNING: mode {} out of range, controller disabled", self.mode);
            self.mode = 0;
        }
        self.hardware.pins = self.hardware.pins.sanitize();
    }
}

/// Control-loop tuning.  Dwell values are in cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    // --- Cadence ---
    /// Nominal control period.
    pub cycle_period_secs: u32,
    /// Wall-clock delta above which the computed sleep is distrusted.
    pub skew_limit_secs: u32,
    /// Sleep used instead when the clock looks wrong.
    pub fallback_delay_secs: u32,

    // --- Telemetry ---
    /// Largest accepted change of a reading between two cycles.
    pub max_temp_diff: f32,
    /// Fatal once a channel's failure counter exceeds this.
    pub sensor_failure_limit: u16,
    /// Value every failure counter starts at.
    pub sensor_failure_seed: u16,
    /// Cycles after boot during which readings bypass clamping.
    pub startup_grace_cycles: u32,

    // --- Actuator guards ---
    pub compressor_min_off: u32,
    pub compressor_min_on: u32,
    /// Spacing between the two compressors starting.
    pub stagger_cycles: u32,
    /// When false only circuit 2 waits for circuit 1.
    pub stagger_both_circuits: bool,
    /// Fan keeps running this long after its compressor stops.
    pub fan_overrun: u32,
    pub valve_settle: u32,
    /// Valve position while heating (and the one defrost ends in).
    pub run_valve_on: bool,

    // --- Mode machine ---
    pub cooling_threshold: f32,
    pub overheat_ceiling: f32,
    /// Cycles in Starting before FinHeating is forced.
    pub starting_max: u32,
    /// Minimum dwell before Cooling and FinHeating may swap.
    pub mode_min_dwell: u32,
    pub overheat_cooldown: u32,
    pub defrost_deep: DefrostTrigger,
    pub defrost_mild: DefrostTrigger,
    pub defrost_program: Vec<DefrostStep, MAX_DEFROST_STEPS>,

    // --- Persistence ---
    pub counters_flush_cycles: u32,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            // Cadence
            cycle_period_secs: 10,
            skew_limit_secs: 12,
            fallback_delay_secs: 7,

            // Telemetry
            max_temp_diff: 7.0,
            sensor_failure_limit: 5,
            sensor_failure_seed: 0,
            startup_grace_cycles: 3,

            // Guards
            compressor_min_off: 30, // 5 min
            compressor_min_on: 30,
            stagger_cycles: 6, // 1 min
            stagger_both_circuits: true,
            fan_overrun: 2,
            valve_settle: 2,
            run_valve_on: true,

            // Modes
            cooling_threshold: 56.0,
            overheat_ceiling: 63.0,
            starting_max: 12, // 2 min
            mode_min_dwell: 2,
            overheat_cooldown: 30,
            defrost_deep: DefrostTrigger { below: -7.0, after: 60 },
            defrost_mild: DefrostTrigger { below: -3.0, after: 180 },
            defrost_program: default_defrost_program(),

            counters_flush_cycles: 360, // 1 h
        }
    }
}

/// Condenser temperature/dwell pair that sends FinHeating into Defrost.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DefrostTrigger {
    /// Condenser must read below this.
    pub below: f32,
    /// ...after at least this many cycles in FinHeating.
    pub after: u32,
}

/// One window of the defrost sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefrostStep {
    pub cycles: u32,
    pub intent: Intent,
}

impl DefrostStep {
    pub const fn new(cycles: u32, compressor: bool, fan: bool, valve: bool) -> Self {
        Self {
            cycles,
            intent: Intent { compressor, fan, valve },
        }
    }
}

/// Valve on, then rest, then hot gas through the outdoor coil, then rest,
/// then valve back to the running position.
pub fn default_defrost_program() -> Vec<DefrostStep, MAX_DEFROST_STEPS> {
    let steps = [
        DefrostStep::new(3, false, false, true),
        DefrostStep::new(3, false, false, false),
        DefrostStep::new(18, true, false, false),
        DefrostStep::new(3, false, false, false),
        DefrostStep::new(3, false, false, true),
    ];
    let mut program = Vec::new();
    for step in steps {
        // Capacity is larger than the literal list.
        let _ = program.push(step);
    }
    program
}

/// `[hardware]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HardwareConfig {
    /// Relay boards that switch on LOW.
    pub invert_output: bool,
    /// Root of the sysfs GPIO tree.
    pub gpio_root: String,
    pub pins: PinMap,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            invert_output: false,
            gpio_root: "/sys/class/gpio".into(),
            pins: PinMap::default(),
        }
    }
}

/// `[sensors]` section: one 1-Wire `w1_slave` file per channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorPaths {
    pub ac1_compressor: String,
    pub ac1_condenser: String,
    pub he1_in: String,
    pub he1_out: String,
    pub ac2_compressor: String,
    pub ac2_condenser: String,
    pub he2_in: String,
    pub he2_out: String,
    pub water_in: String,
    pub water_out: String,
    pub ambient: String,
}

impl Default for SensorPaths {
    fn default() -> Self {
        let p = |id: &str| format!("/sys/bus/w1/devices/28-{id}/w1_slave");
        Self {
            ac1_compressor: p("00000000ac1c"),
            ac1_condenser: p("00000000ac1d"),
            he1_in: p("00000000e1a0"),
            he1_out: p("00000000e1b0"),
            ac2_compressor: p("00000000ac2c"),
            ac2_condenser: p("00000000ac2d"),
            he2_in: p("00000000e2a0"),
            he2_out: p("00000000e2b0"),
            water_in: p("00000000a7e1"),
            water_out: p("00000000a7e0"),
            ambient: p("00000000e0e0"),
        }
    }
}

impl SensorPaths {
    pub fn path(&self, id: SensorId) -> &str {
        match id {
            SensorId::Ac1Compressor => &self.ac1_compressor,
            SensorId::Ac1Condenser => &self.ac1_condenser,
            SensorId::He1In => &self.he1_in,
            SensorId::He1Out => &self.he1_out,
            SensorId::Ac2Compressor => &self.ac2_compressor,
            SensorId::Ac2Condenser => &self.ac2_condenser,
            SensorId::He2In => &self.he2_in,
            SensorId::He2Out => &self.he2_out,
            SensorId::WaterIn => &self.water_in,
            SensorId::WaterOut => &self.water_out,
            SensorId::Ambient => &self.ambient,
        }
    }
}

/// `[paths]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub counters: String,
    pub snapshot: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            counters: "/var/lib/hpm/counters.json".into(),
            snapshot: "/run/hpm/snapshot.json".into(),
        }
    }
}

/// Range-check tuning values.
///
/// Called by every [`ConfigPort`](crate::app::ports::ConfigPort)
/// implementation before a config is handed to the service.
pub fn validate_config(cfg: &SystemConfig) -> Result<(), ConfigError> {
    let c = &cfg.control;
    if !(1..=60).contains(&c.cycle_period_secs) {
        return Err(ConfigError::ValidationFailed(
            "cycle_period_secs must be 1–60",
        ));
    }
    if c.skew_limit_secs <= c.cycle_period_secs {
        return Err(ConfigError::ValidationFailed(
            "skew_limit_secs must be > cycle_period_secs",
        ));
    }
    if c.fallback_delay_secs == 0 || c.fallback_delay_secs > c.skew_limit_secs {
        return Err(ConfigError::ValidationFailed(
            "fallback_delay_secs must be 1–skew_limit_secs",
        ));
    }
    if !(0.5..=20.0).contains(&c.max_temp_diff) {
        return Err(ConfigError::ValidationFailed(
            "max_temp_diff must be 0.5–20.0",
        ));
    }
    if !(1..=60).contains(&c.sensor_failure_limit) {
        return Err(ConfigError::ValidationFailed(
            "sensor_failure_limit must be 1–60",
        ));
    }
    if c.sensor_failure_seed > c.sensor_failure_limit {
        return Err(ConfigError::ValidationFailed(
            "sensor_failure_seed must not exceed sensor_failure_limit",
        ));
    }
    if c.compressor_min_off == 0 || c.compressor_min_on == 0 {
        return Err(ConfigError::ValidationFailed(
            "compressor dwell minimums must be non-zero",
        ));
    }
    if ![c.cooling_threshold, c.defrost_deep.below, c.defrost_mild.below]
        .iter()
        .all(|t| t.is_finite())
    {
        return Err(ConfigError::ValidationFailed(
            "temperature thresholds must be finite",
        ));
    }
    if c.cooling_threshold >= c.overheat_ceiling {
        return Err(ConfigError::ValidationFailed(
            "cooling_threshold must be < overheat_ceiling",
        ));
    }
    if !(30.0..=120.0).contains(&c.overheat_ceiling) {
        return Err(ConfigError::ValidationFailed(
            "overheat_ceiling must be 30.0–120.0",
        ));
    }
    if c.defrost_mild.after < c.defrost_deep.after || c.defrost_mild.below < c.defrost_deep.below {
        return Err(ConfigError::ValidationFailed(
            "defrost_mild must wait longer for a less extreme temperature than defrost_deep",
        ));
    }
    if c.defrost_program.is_empty() || c.defrost_program.iter().any(|s| s.cycles == 0) {
        return Err(ConfigError::ValidationFailed(
            "defrost_program needs at least one step, each lasting ≥1 cycle",
        ));
    }
    if c.counters_flush_cycles == 0 {
        return Err(ConfigError::ValidationFailed(
            "counters_flush_cycles must be non-zero",
        ));
    }
    if log_level_filter(&cfg.log_level).is_none() {
        return Err(ConfigError::ValidationFailed(
            "log_level must be error, warn, info, debug or trace",
        ));
    }
    Ok(())
}

/// Parse a `log_level` value.
pub fn log_level_filter(level: &str) -> Option<log::LevelFilter> {
    match level.trim().to_ascii_lowercase().as_str() {
        "off" => Some(log::LevelFilter::Off),
        "error" => Some(log::LevelFilter::Error),
        "warn" | "warning" => Some(log::LevelFilter::Warn),
        "info" => Some(log::LevelFilter::Info),
        "debug" => Some(log::LevelFilter::Debug),
        "trace" => Some(log::LevelFilter::Trace),
        _ => None,
    }
}
