//! Integration tests for the ControlService → FSM → interlocks → GPIO
//! pipeline.
//!
//! These run on the host and drive whole control cycles through the port
//! traits against the mocks in `mock_hw`.

use hpm::actuators::{ActuatorMask, ActuatorState, CircuitActuators, CircuitId, Intent};
use hpm::app::commands::AppCommand;
use hpm::app::events::AppEvent;
use hpm::app::service::ControlService;
use hpm::app::state::{ControllerState, RunCounters};
use hpm::config::{ControlConfig, DefrostTrigger, SystemConfig};
use hpm::control::handshake::HandshakeResponse;
use hpm::error::{Error, SensorFault};
use hpm::fsm::CircuitMode;
use hpm::sensors::SensorId;

use crate::mock_hw::{MemCounterStore, MockHardware, RecordingSink};

use CircuitMode::{Cooling, Defrost, FinHeating, Off, OverheatProtection, Starting};

/// Idle circuit with long-settled actuators.
fn settled(valve_on: bool) -> CircuitActuators {
    CircuitActuators {
        compressor: ActuatorState::new(false, 1000),
        fan: ActuatorState::new(false, 1000),
        valve: ActuatorState::new(valve_on, 1000),
    }
}

fn make(config: SystemConfig, counters: RunCounters) -> (ControlService, MockHardware, RecordingSink) {
    let state = ControllerState::with_actuators(&config.control, counters, [settled(true); 2]);
    let mut svc = ControlService::from_state(config, state);
    let mut sink = RecordingSink::default();
    svc.start(&mut sink);
    (svc, MockHardware::new(20.0), sink)
}

fn make_default() -> (ControlService, MockHardware, RecordingSink) {
    make(SystemConfig::default(), RunCounters::default())
}

fn run(svc: &mut ControlService, hw: &mut MockHardware, sink: &mut RecordingSink, cycles: usize) {
    for _ in 0..cycles {
        svc.cycle(hw, sink).unwrap();
    }
}

// ── Mode sequence ─────────────────────────────────────────────

#[test]
fn compressor_temperature_drives_mode_sequence() {
    let (mut svc, mut hw, mut sink) = make_default();
    hw.demand_low();

    let mut modes = vec![svc.mode(CircuitId::One)];
    for t in [40.0, 57.0, 57.0, 50.0] {
        hw.set(SensorId::Ac1Compressor, Some(t));
        svc.cycle(&mut hw, &mut sink).unwrap();
        modes.push(svc.mode(CircuitId::One));
    }

    assert_eq!(modes, [Off, Starting, Cooling, Cooling, FinHeating]);
    assert_eq!(
        sink.mode_changes(CircuitId::One),
        [(Off, Starting), (Starting, Cooling), (Cooling, FinHeating)]
    );
    assert_eq!(svc.mode(CircuitId::Two), Off, "low demand runs one circuit");
}

#[test]
fn starting_falls_through_to_fin_heating() {
    let (mut svc, mut hw, mut sink) = make_default();
    hw.demand_low();
    let starting_max = svc.config().control.starting_max as usize;

    run(&mut svc, &mut hw, &mut sink, 1);
    assert_eq!(svc.mode(CircuitId::One), Starting);
    run(&mut svc, &mut hw, &mut sink, starting_max);
    assert_eq!(svc.mode(CircuitId::One), FinHeating);
}

// ── Telemetry failures ───────────────────────────────────────

#[test]
fn fifth_unknown_reading_is_fatal_with_limit_four() {
    let config = SystemConfig {
        control: ControlConfig {
            sensor_failure_limit: 4,
            ..ControlConfig::default()
        },
        ..SystemConfig::default()
    };
    let (mut svc, mut hw, mut sink) = make(config, RunCounters::default());
    hw.demand_high();
    hw.set(SensorId::He2Out, None);

    for n in 1..=4 {
        assert!(svc.cycle(&mut hw, &mut sink).is_ok(), "cycle {n} must survive");
    }
    let err = svc.cycle(&mut hw, &mut sink).unwrap_err();
    assert_eq!(
        err,
        Error::Sensor(SensorFault {
            channel: SensorId::He2Out,
            failures: 5
        })
    );
    assert_eq!(hw.all_off_calls, 1);
    assert_eq!(hw.outputs(), ActuatorMask::NONE);
    assert_eq!(svc.committed(), ActuatorMask::NONE);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::FatalFault(_))), 1);
}

#[test]
fn recovered_sensor_keeps_running() {
    let (mut svc, mut hw, mut sink) = make_default();
    hw.set(SensorId::Ambient, None);
    run(&mut svc, &mut hw, &mut sink, 4);
    hw.set(SensorId::Ambient, Some(5.0));
    run(&mut svc, &mut hw, &mut sink, 10);
    assert_eq!(svc.state().filter.channel(SensorId::Ambient).failures, 0);
}

// ── GPIO writes ───────────────────────────────────────────────

#[test]
fn unchanged_outputs_are_not_rewritten() {
    let (mut svc, mut hw, mut sink) = make_default();
    hw.demand_low();
    run(&mut svc, &mut hw, &mut sink, 40);
    let writes = hw.actuator_writes.len();
    run(&mut svc, &mut hw, &mut sink, 20);
    assert_eq!(hw.actuator_writes.len(), writes, "steady state, no chatter");
    assert_eq!(hw.outputs(), svc.committed());
}

#[test]
fn failed_write_is_retried_next_cycle() {
    let (mut svc, mut hw, mut sink) = make_default();
    hw.demand_low();
    hw.fail_actuator_writes = true;
    run(&mut svc, &mut hw, &mut sink, 1);
    assert!(svc.actuators(CircuitId::One).compressor.is_on());
    assert!(!svc.committed().compressor(CircuitId::One));

    hw.fail_actuator_writes = false;
    run(&mut svc, &mut hw, &mut sink, 1);
    assert!(svc.committed().compressor(CircuitId::One));
    assert_eq!(hw.outputs(), svc.committed());
}

#[test]
fn demand_read_failure_keeps_last_demand() {
    let (mut svc, mut hw, mut sink) = make_default();
    hw.demand_low();
    run(&mut svc, &mut hw, &mut sink, 1);
    assert_eq!(svc.mode(CircuitId::One), Starting);

    hw.demand_none();
    hw.fail_demand_reads = true;
    run(&mut svc, &mut hw, &mut sink, 5);
    assert_ne!(svc.mode(CircuitId::One), Off);
}

// ── Demand arbitration ───────────────────────────────────────

#[test]
fn low_demand_prefers_less_worn_circuit() {
    let (mut svc, mut hw, mut sink) = make(SystemConfig::default(), RunCounters { ac1: 900, ac2: 40 });
    hw.demand_low();
    run(&mut svc, &mut hw, &mut sink, 1);
    assert_eq!(svc.modes(), [Off, Starting]);
}

#[test]
fn high_demand_starts_both_staggered() {
    let (mut svc, mut hw, mut sink) = make_default();
    hw.demand_high();
    let stagger = svc.config().control.stagger_cycles as usize;

    run(&mut svc, &mut hw, &mut sink, 1);
    assert_eq!(svc.modes(), [Starting, Off]);
    run(&mut svc, &mut hw, &mut sink, stagger);
    assert_eq!(svc.mode(CircuitId::Two), Off);
    run(&mut svc, &mut hw, &mut sink, 1);
    assert_eq!(svc.mode(CircuitId::Two), Starting);
    assert!(hw.outputs().compressor(CircuitId::One));
    assert!(hw.outputs().compressor(CircuitId::Two));
}

#[test]
fn battery_sheds_compressor_and_fan_but_holds_valve() {
    let (mut svc, mut hw, mut sink) = make_default();
    hw.demand_low();
    hw.on_battery(false);
    run(&mut svc, &mut hw, &mut sink, 3);
    assert!(hw.outputs().compressor(CircuitId::One));

    hw.on_battery(true);
    run(&mut svc, &mut hw, &mut sink, 1);
    let out = hw.outputs().circuit(CircuitId::One);
    assert_eq!(
        out,
        Intent {
            compressor: false,
            fan: false,
            valve: true
        }
    );
    assert_eq!(svc.mode(CircuitId::One), Off);
}

#[test]
fn none_demand_winds_everything_down() {
    let (mut svc, mut hw, mut sink) = make_default();
    hw.demand_high();
    run(&mut svc, &mut hw, &mut sink, 20);
    assert!(hw.outputs().compressor(CircuitId::Two));

    hw.demand_none();
    let cfg = &svc.config().control;
    let wind_down = (cfg.compressor_min_on + cfg.fan_overrun + cfg.valve_settle + 3) as usize;
    run(&mut svc, &mut hw, &mut sink, wind_down);
    assert_eq!(hw.outputs(), ActuatorMask::NONE);
    assert_eq!(svc.modes(), [Off, Off]);
}

#[test]
fn minimum_on_time_holds_compressor() {
    let (mut svc, mut hw, mut sink) = make_default();
    hw.demand_low();
    run(&mut svc, &mut hw, &mut sink, 1);
    hw.demand_none();
    let min_on = svc.config().control.compressor_min_on as usize;
    run(&mut svc, &mut hw, &mut sink, min_on - 1);
    assert!(hw.outputs().compressor(CircuitId::One), "short cycle refused");
    run(&mut svc, &mut hw, &mut sink, 2);
    assert!(!hw.outputs().compressor(CircuitId::One));
}

// ── Protection modes ──────────────────────────────────────────

#[test]
fn overheat_sheds_and_cools_down() {
    let (mut svc, mut hw, mut sink) = make_default();
    hw.demand_low();
    hw.set(SensorId::Ac1Compressor, Some(55.0));
    run(&mut svc, &mut hw, &mut sink, 5);
    assert!(hw.outputs().compressor(CircuitId::One));

    hw.set(SensorId::Ac1Compressor, Some(61.0));
    run(&mut svc, &mut hw, &mut sink, 1);
    // Clamped against the reading two cycles back until it holds.
    hw.set(SensorId::Ac1Compressor, Some(66.0));
    run(&mut svc, &mut hw, &mut sink, 2);
    assert_eq!(svc.mode(CircuitId::One), OverheatProtection);
    let out = hw.outputs().circuit(CircuitId::One);
    assert!(!out.compressor && !out.fan);

    // Step down within the accepted delta so no reading is discarded.
    for t in [60.0, 54.0, 48.0, 42.0] {
        hw.set(SensorId::Ac1Compressor, Some(t));
        run(&mut svc, &mut hw, &mut sink, 1);
    }
    assert_eq!(svc.mode(CircuitId::One), OverheatProtection);
    let cooldown = svc.config().control.overheat_cooldown as usize;
    run(&mut svc, &mut hw, &mut sink, cooldown);
    assert_ne!(svc.mode(CircuitId::One), OverheatProtection);
    assert!(
        sink.mode_changes(CircuitId::One)
            .contains(&(OverheatProtection, Off))
    );
}

#[test]
fn low_demand_moves_to_healthy_circuit_during_overheat() {
    let (mut svc, mut hw, mut sink) = make(SystemConfig::default(), RunCounters { ac1: 10, ac2: 500 });
    hw.demand_low();
    hw.set(SensorId::Ac1Compressor, Some(55.0));
    run(&mut svc, &mut hw, &mut sink, 5);
    assert_eq!(svc.modes(), [Starting, Off]);

    hw.set(SensorId::Ac1Compressor, Some(61.0));
    run(&mut svc, &mut hw, &mut sink, 1);
    // Clamped against the reading two cycles back until it holds.
    hw.set(SensorId::Ac1Compressor, Some(66.0));
    run(&mut svc, &mut hw, &mut sink, 2);
    assert_eq!(svc.mode(CircuitId::One), OverheatProtection);

    // Circuit 2's valve went idle under low demand; it settles back first.
    let settle = svc.config().control.valve_settle as usize;
    run(&mut svc, &mut hw, &mut sink, settle + 2);
    assert_eq!(svc.modes(), [OverheatProtection, Starting]);
    assert!(!hw.outputs().compressor(CircuitId::One));
    assert!(hw.outputs().compressor(CircuitId::Two));
}

#[test]
fn cold_dip_after_long_fin_heating_does_not_defrost() {
    let (mut svc, mut hw, mut sink) = make_default();
    hw.demand_low();
    hw.set(SensorId::Ac1Condenser, Some(-2.0));
    run(&mut svc, &mut hw, &mut sink, 80);
    assert_eq!(svc.mode(CircuitId::One), FinHeating);

    // One reading within the accepted step, then straight back.
    hw.set(SensorId::Ac1Condenser, Some(-8.0));
    run(&mut svc, &mut hw, &mut sink, 1);
    assert_eq!(svc.state().filter.value(SensorId::Ac1Condenser), -8.0);
    hw.set(SensorId::Ac1Condenser, Some(-2.0));
    run(&mut svc, &mut hw, &mut sink, 5);
    assert_eq!(svc.mode(CircuitId::One), FinHeating);
    assert!(!sink.mode_changes(CircuitId::One).contains(&(FinHeating, Defrost)));
}

#[test]
fn defrost_runs_its_program_in_order_and_restarts() {
    let config = SystemConfig {
        control: ControlConfig {
            defrost_deep: DefrostTrigger {
                below: -7.0,
                after: 2,
            },
            ..ControlConfig::default()
        },
        ..SystemConfig::default()
    };
    let (mut svc, mut hw, mut sink) = make(config, RunCounters::default());
    hw.demand_low();
    hw.set(SensorId::Ac1Condenser, Some(-10.0));

    let mut windows: Vec<Intent> = Vec::new();
    let mut applied: Vec<Intent> = Vec::new();
    let mut entered = false;
    for n in 0..120 {
        // Demand changes mid-program must not disturb it.
        if n % 7 == 0 {
            hw.demand_none();
        } else {
            hw.demand_low();
        }
        svc.cycle(&mut hw, &mut sink).unwrap();
        let circuit = svc.state().circuit(CircuitId::One);
        if circuit.mode() == Defrost {
            entered = true;
            let intent = circuit.ctx.intent;
            if windows.last() != Some(&intent) {
                windows.push(intent);
            }
            let out = hw.outputs().circuit(CircuitId::One);
            if applied.last() != Some(&out) {
                applied.push(out);
            }
        } else if entered {
            break;
        }
    }

    let v = Intent { valve: true, ..Intent::OFF };
    let c = Intent { compressor: true, ..Intent::OFF };
    assert_eq!(windows, [v, Intent::OFF, c, Intent::OFF, v]);
    assert_eq!(applied, windows, "every window reaches the relays");
    assert!(
        sink.mode_changes(CircuitId::One)
            .contains(&(Defrost, Starting))
    );
}

// ── Handshake ─────────────────────────────────────────────────

#[test]
fn handshake_tracks_capacity() {
    let (mut svc, mut hw, mut sink) = make_default();
    run(&mut svc, &mut hw, &mut sink, 1);
    assert_eq!(svc.handshake(), HandshakeResponse::CanAdd);

    // Idle valves dropped on the first cycle, so each start waits for
    // the valve to settle back first.
    hw.demand_low();
    let min_on = svc.config().control.compressor_min_on as usize;
    run(&mut svc, &mut hw, &mut sink, min_on + 10);
    assert_eq!(svc.handshake(), HandshakeResponse::FullySatisfied);

    hw.demand_high();
    run(&mut svc, &mut hw, &mut sink, min_on + 10);
    assert_eq!(svc.modes().iter().filter(|m| m.is_running()).count(), 2);
    assert_eq!(svc.handshake(), HandshakeResponse::CanRemove);
    assert_eq!(hw.handshake_writes.last(), Some(&HandshakeResponse::CanRemove));
}

#[test]
fn disabled_controller_never_starts() {
    let config = SystemConfig {
        mode: 0,
        ..SystemConfig::default()
    };
    let (mut svc, mut hw, mut sink) = make(config, RunCounters::default());
    hw.demand_high();
    run(&mut svc, &mut hw, &mut sink, 10);
    assert_eq!(svc.modes(), [Off, Off]);
    assert!(!hw.outputs().compressor(CircuitId::One));
    assert_eq!(svc.handshake(), HandshakeResponse::NoChangeAllowed);
}

// ── Counters and commands ────────────────────────────────────

#[test]
fn run_counters_accumulate_and_flush() {
    let config = SystemConfig {
        control: ControlConfig {
            counters_flush_cycles: 5,
            ..ControlConfig::default()
        },
        ..SystemConfig::default()
    };
    let (mut svc, mut hw, mut sink) = make(config, RunCounters { ac1: 10, ac2: 0 });
    let mut store = MemCounterStore::default();
    hw.demand_low();

    for _ in 0..4 {
        svc.cycle(&mut hw, &mut sink).unwrap();
        assert!(!svc.flush_counters_if_due(&mut store, &mut sink));
    }
    svc.cycle(&mut hw, &mut sink).unwrap();
    assert!(svc.flush_counters_if_due(&mut store, &mut sink));
    // Circuit 2 had fewer run cycles, so it took the demand.
    assert_eq!(store.stored, Some(RunCounters { ac1: 10, ac2: 5 }));

    svc.handle_command(AppCommand::FlushCounters, &mut store, &mut sink);
    assert_eq!(store.saves, 2);
}

#[test]
fn failed_flush_is_retried() {
    let (mut svc, mut hw, mut sink) = make_default();
    let mut store = MemCounterStore {
        fail: true,
        ..MemCounterStore::default()
    };
    let period = svc.config().control.counters_flush_cycles as usize;
    run(&mut svc, &mut hw, &mut sink, period);
    assert!(!svc.flush_counters_if_due(&mut store, &mut sink));

    store.fail = false;
    run(&mut svc, &mut hw, &mut sink, 1);
    assert!(svc.flush_counters_if_due(&mut store, &mut sink));
}

#[test]
fn reload_applies_new_thresholds() {
    let (mut svc, mut hw, mut sink) = make_default();
    let mut store = MemCounterStore::default();
    hw.demand_low();
    hw.set(SensorId::Ac1Compressor, Some(50.0));
    run(&mut svc, &mut hw, &mut sink, 3);
    assert_eq!(svc.mode(CircuitId::One), Starting);

    let mut config = SystemConfig::default();
    config.control.cooling_threshold = 45.0;
    svc.handle_command(AppCommand::UpdateConfig(config), &mut store, &mut sink);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::ConfigReloaded)), 1);
    assert!(svc.state().filter.in_grace());

    run(&mut svc, &mut hw, &mut sink, 1);
    assert_eq!(svc.mode(CircuitId::One), Cooling);
}

#[test]
fn telemetry_emitted_every_cycle() {
    let (mut svc, mut hw, mut sink) = make_default();
    run(&mut svc, &mut hw, &mut sink, 3);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::Telemetry(_))), 3);
    let t = svc.build_telemetry();
    assert_eq!(t.cycle, 3);
    assert_eq!(t.temperatures.get(SensorId::WaterIn), 20.0);
}
