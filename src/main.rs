//! Heat-pump manager daemon: main entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter    LogEventSink   FileConfig   SystemClock    │
//! │  (Sensor+Gpio)      JsonSnapshot   FileCounterStore            │
//! │                     (EventSink)    (Config, Counters)          │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            ControlService (pure logic)                 │    │
//! │  │  Filter · Arbiter · Mode FSM · Interlocks · Handshake  │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  CyclePacer (drift-corrected sleep) · SignalFlags (SIGTERM…)   │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Exit codes: 0 normal stop, 3 setup failure, 11 GPIO export failed,
//! 12 GPIO direction failed, 14 GPIO disable failed on stop, 55 sensor
//! fault, 66 sensor fault and GPIO disable failed.

#![deny(unused_must_use)]

use std::process::ExitCode;

use anyhow::{Context, Result};
use log::{error, info, warn};

use hpm::adapters::config_file::{self, FileConfig};
use hpm::adapters::counters::FileCounterStore;
use hpm::adapters::hardware::HardwareAdapter;
use hpm::adapters::log_sink::LogEventSink;
use hpm::adapters::logger;
use hpm::adapters::snapshot::JsonSnapshotSink;
use hpm::adapters::time::SystemClock;
use hpm::app::commands::AppCommand;
use hpm::app::ports::{ConfigPort, CounterStore, GpioPort};
use hpm::app::service::ControlService;
use hpm::config::SystemConfig;
use hpm::error::GpioError;
use hpm::events::SignalFlags;
use hpm::scheduler::CyclePacer;

const EXIT_SETUP: u8 = 3;
const EXIT_GPIO_ENABLE: u8 = 11;
const EXIT_GPIO_DIRECTION: u8 = 12;
const EXIT_GPIO_DISABLE: u8 = 14;
const EXIT_SENSOR_FAULT: u8 = 55;
const EXIT_SENSOR_AND_GPIO: u8 = 66;

/// Environment variable naming the config file.
const CONFIG_ENV: &str = "HPM_CONFIG";

fn main() -> ExitCode {
    match run() {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("hpm: {e:#}");
            ExitCode::from(EXIT_SETUP)
        }
    }
}

fn run() -> Result<u8> {
    // ── 1. Logging + config ───────────────────────────────────
    let env_level = std::env::var(logger::LEVEL_ENV).ok();
    logger::init(logger::resolve_level("info", env_level.as_deref()))
        .context("installing logger")?;

    info!("INFO: hpm v{} starting", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var(CONFIG_ENV).ok())
        .unwrap_or_else(|| config_file::DEFAULT_PATH.to_owned());
    let config_port = FileConfig::new(config_path);
    let mut config = config_port.load_or_default();
    logger::set_level(logger::resolve_level(&config.log_level, env_level.as_deref()));

    // ── 2. Signals ────────────────────────────────────────────
    let signals = SignalFlags::register().context("registering signal handlers")?;

    // ── 3. Persistent counters ────────────────────────────────
    let mut store = FileCounterStore::new(&config.paths.counters);
    let counters = store.load().unwrap_or_else(|e| {
        warn!("WARNING: run counters not loaded ({e}), starting from zero");
        Default::default()
    });

    // ── 4. GPIO ───────────────────────────────────────────────
    let mut hw = match HardwareAdapter::open(&config.hardware, config.sensors.clone()) {
        Ok(hw) => hw,
        Err(e @ GpioError::Export(_)) => {
            error!("ALARM: cannot enable GPIO ({e}), aborting run");
            return Ok(EXIT_GPIO_ENABLE);
        }
        Err(e) => {
            error!("ALARM: cannot set GPIO direction ({e}), aborting run");
            return Ok(EXIT_GPIO_DIRECTION);
        }
    };
    if let Err(e) = hw.all_off() {
        warn!("WARNING: initial output reset failed: {e}");
    }

    // ── 5. Service ────────────────────────────────────────────
    let mut sinks = (
        LogEventSink::new(),
        JsonSnapshotSink::new(&config.paths.snapshot),
    );
    let mut service = ControlService::new(config.clone(), counters);
    service.start(&mut sinks);

    let clock = SystemClock;
    let mut pacer = CyclePacer::new(&config.control);

    info!("INFO: system ready, entering control loop");

    // ── 6. Control loop ───────────────────────────────────────
    loop {
        let pending = signals.poll();
        if pending.terminate {
            break;
        }
        if pending.reload {
            reload(
                &config_port,
                &mut config,
                &mut service,
                &mut hw,
                &mut pacer,
                &mut sinks,
                &mut store,
                env_level.as_deref(),
            );
        }

        pacer.mark_start(&clock);
        if let Err(e) = service.cycle(&mut hw, &mut sinks) {
            error!("ALARM: {e}. Stopping.");
            let _ = service.flush_counters(&mut store, &mut sinks);
            return Ok(match hw.shutdown() {
                Ok(()) => EXIT_SENSOR_FAULT,
                Err(_) => {
                    error!("ALARM: GPIO disable failed on handling sensor read failures");
                    EXIT_SENSOR_AND_GPIO
                }
            });
        }
        service.flush_counters_if_due(&mut store, &mut sinks);

        signals.sleep(pacer.delay(&clock));
    }

    // ── 7. Shutdown ───────────────────────────────────────────
    info!("INFO: terminate signal caught, stopping");
    service.handle_command(AppCommand::FlushCounters, &mut store, &mut sinks);
    if hw.shutdown().is_err() {
        warn!("WARNING: errors disabling GPIO pins, quitting anyway");
        return Ok(EXIT_GPIO_DISABLE);
    }
    info!(
        "INFO: exiting normally after {} cycles",
        service.cycle_count()
    );
    Ok(0)
}

/// Re-read the config file and push it through the service.
///
/// GPIO pin numbers and file paths are bound at start-up; changes to them
/// are reported and take effect on the next restart.
#[allow(clippy::too_many_arguments)]
fn reload(
    port: &FileConfig,
    current: &mut SystemConfig,
    service: &mut ControlService,
    hw: &mut HardwareAdapter,
    pacer: &mut CyclePacer,
    sinks: &mut (LogEventSink, JsonSnapshotSink),
    store: &mut FileCounterStore,
    env_level: Option<&str>,
) {
    let new = match port.load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("WARNING: config reload failed ({e}), keeping current settings");
            return;
        }
    };
    if new.hardware != current.hardware || new.paths != current.paths {
        warn!("WARNING: GPIO and path changes apply after restart");
    }
    logger::set_level(logger::resolve_level(&new.log_level, env_level));
    hw.set_sensor_paths(new.sensors.clone());
    pacer.reconfigure(&new.control);
    *current = new.clone();
    service.handle_command(AppCommand::UpdateConfig(new), store, sinks);
}
