//! Control service: the hexagonal core.
//!
//! [`ControlService`] owns the [`ControllerState`], the interlocks and the
//! live configuration.  All I/O flows through port traits injected at call
//! sites, so the whole cycle is testable with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────────────┐ ──▶ EventSink
//!                 │          ControlService           │
//!   GpioPort ◀──▶ │ filter · arbiter · FSM · guards   │
//!                 │          · handshake              │
//!                 └──────────────────────────────────┘ ◀──▶ CounterStore
//! ```
//!
//! ## One cycle
//!
//! 1. Telemetry filter (a sustained sensor loss ends the cycle with an error)
//! 2. Decode peer demand
//! 3. Age every actuator's dwell by one cycle
//! 4. Demand arbiter → desired mask
//! 5. Per circuit: mode machine tick, then apply its intent through the
//!    interlocks (compressor off, fan, valve, compressor on)
//! 6. Write actuator GPIO if the committed mask changed
//! 7. Handshake encoder → write if changed
//! 8. Run-cycle counters, telemetry

use log::{error, info, warn};

use crate::actuators::{ActuatorMask, CircuitActuators, CircuitId, Intent};
use crate::config::SystemConfig;
use crate::control::arbiter::{self, ArbiterInputs, CircuitView};
use crate::control::demand::PowerSource;
use crate::control::handshake::HandshakeResponse;
use crate::error::{Error, StorageError};
use crate::fsm::CircuitMode;
use crate::safety::{GuardInputs, Interlocks, Relax};
use crate::sensors::Temperatures;

use super::commands::AppCommand;
use super::events::{AppEvent, TelemetryData};
use super::ports::{CounterStore, EventSink, GpioPort, SensorPort};
use super::state::{ControllerState, RunCounters};

// ───────────────────────────────────────────────────────────────
// ControlService
// ───────────────────────────────────────────────────────────────

pub struct ControlService {
    config: SystemConfig,
    interlocks: Interlocks,
    state: ControllerState,
}

impl ControlService {
    /// Construct from configuration and the persisted counters.
    ///
    /// Does **not** start the mode machines; call [`start`](Self::start) next.
    pub fn new(config: SystemConfig, counters: RunCounters) -> Self {
        let state = ControllerState::new(&config.control, counters);
        Self::from_state(config, state)
    }

    /// Construct around an existing state (tests, simulations).
    pub fn from_state(config: SystemConfig, state: ControllerState) -> Self {
        Self {
            interlocks: Interlocks::new(&config.control),
            config,
            state,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, sink: &mut impl EventSink) {
        for circuit in &mut self.state.circuits {
            circuit.machine.start(&mut circuit.ctx);
        }
        sink.emit(&AppEvent::Started(self.state.modes()));
        info!(
            "INFO: control service started, mode {}, AC1 {}, AC2 {}",
            self.config.mode,
            if self.config.use_ac1 { "on" } else { "off" },
            if self.config.use_ac2 { "on" } else { "off" },
        );
    }

    // ── Per-cycle orchestration ───────────────────────────────

    /// Run one full control cycle.
    ///
    /// `hw` satisfies both [`SensorPort`] and [`GpioPort`], which avoids a
    /// double mutable borrow while keeping the port boundary explicit.
    ///
    /// The only error is a sustained sensor loss; outputs have already been
    /// switched off when it is returned.
    pub fn cycle(
        &mut self,
        hw: &mut (impl SensorPort + GpioPort),
        sink: &mut impl EventSink,
    ) -> Result<(), Error> {
        // 1. Telemetry
        let raw = hw.read_temperatures();
        if let Err(fault) = self.state.filter.apply(&raw) {
            if let Err(e) = hw.all_off() {
                error!("ALARM: GPIO disable failed on handling sensor read failures: {e}");
            }
            self.state.committed = ActuatorMask::NONE;
            sink.emit(&AppEvent::FatalFault(fault));
            return Err(fault.into());
        }
        let temps = self.state.filter.temperatures();

        // 2. Demand
        match hw.read_demand() {
            Ok(lines) => {
                let (demand, power) = lines.decode();
                if (demand, power) != (self.state.demand, self.state.power) {
                    info!("INFO: peer demand {demand}, power {power:?}");
                    self.state.demand = demand;
                    self.state.power = power;
                    sink.emit(&AppEvent::DemandChanged { demand, power });
                }
            }
            Err(e) => warn!("WARNING: {e}, keeping last demand"),
        }

        // 3. Dwell
        for a in &mut self.state.actuators {
            a.tick();
        }

        // 4. Arbiter
        let desired = arbiter::arbitrate(&self.arbiter_inputs(&temps));

        // 5. Mode machines + guarded actuation
        for c in CircuitId::ALL {
            self.step_circuit(c, &temps, desired, sink);
        }

        // 6. Actuator GPIO
        let mask = ActuatorMask::from_actuators(&self.state.actuators);
        if mask != self.state.committed {
            match hw.write_actuators(mask) {
                Ok(()) => {
                    self.state.committed = mask;
                    sink.emit(&AppEvent::ActuatorsChanged(mask));
                }
                Err(e) => warn!("WARNING: actuator write failed ({e}), retrying next cycle"),
            }
        }

        // 7. Handshake
        let response = self.compute_handshake(&temps);
        if response != self.state.handshake {
            match hw.write_handshake(response) {
                Ok(()) => {
                    self.state.handshake = response;
                    sink.emit(&AppEvent::HandshakeChanged(response));
                }
                Err(e) => warn!("WARNING: handshake write failed ({e}), retrying next cycle"),
            }
        }

        // 8. Bookkeeping
        for c in CircuitId::ALL {
            if self.state.actuators[c.index()].compressor.is_on() {
                self.state.counters.bump(c);
            }
        }
        self.state.cycle += 1;
        sink.emit(&AppEvent::Telemetry(self.build_telemetry()));
        Ok(())
    }

    // ── Command handling ──────────────────────────────────────

    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        store: &mut impl CounterStore,
        sink: &mut impl EventSink,
    ) {
        match cmd {
            AppCommand::UpdateConfig(new_config) => self.apply_config(new_config, sink),
            AppCommand::FlushCounters => {
                // Failure is already logged.
                let _ = self.flush_counters(store, sink);
            }
        }
    }

    fn apply_config(&mut self, config: SystemConfig, sink: &mut impl EventSink) {
        self.interlocks = Interlocks::new(&config.control);
        self.state.filter.reconfigure(&config.control);
        self.state.filter.arm_grace(1);
        for circuit in &mut self.state.circuits {
            circuit.ctx.config = config.control.clone();
        }
        self.config = config;
        sink.emit(&AppEvent::ConfigReloaded);
        info!("INFO: configuration reloaded");
    }

    // ── Counter persistence ───────────────────────────────────

    /// Flush counters once every `counters_flush_cycles`.
    /// Returns `true` if a flush happened and succeeded.
    pub fn flush_counters_if_due(
        &mut self,
        store: &mut impl CounterStore,
        sink: &mut impl EventSink,
    ) -> bool {
        let since = self.state.cycle.saturating_sub(self.state.flushed_at);
        if since < u64::from(self.config.control.counters_flush_cycles) {
            return false;
        }
        self.flush_counters(store, sink).is_ok()
    }

    pub fn flush_counters(
        &mut self,
        store: &mut impl CounterStore,
        sink: &mut impl EventSink,
    ) -> Result<(), StorageError> {
        let counters = self.state.counters;
        match store.save(&counters) {
            Ok(()) => {
                self.state.flushed_at = self.state.cycle;
                sink.emit(&AppEvent::CountersFlushed(counters));
                Ok(())
            }
            Err(e) => {
                warn!("WARNING: run counter save failed: {e}");
                Err(e)
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn build_telemetry(&self) -> TelemetryData {
        TelemetryData {
            cycle: self.state.cycle,
            temperatures: self.state.filter.temperatures(),
            actuators: self.state.committed,
            modes: self.state.modes(),
            demand: self.state.demand,
            power: self.state.power,
            handshake: self.state.handshake,
            counters: self.state.counters,
        }
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn mode(&self, circuit: CircuitId) -> CircuitMode {
        self.state.circuit(circuit).mode()
    }

    pub fn modes(&self) -> [CircuitMode; 2] {
        self.state.modes()
    }

    pub fn actuators(&self, circuit: CircuitId) -> &CircuitActuators {
        &self.state.actuators[circuit.index()]
    }

    /// Outputs last written to GPIO.
    pub fn committed(&self) -> ActuatorMask {
        self.state.committed
    }

    pub fn handshake(&self) -> HandshakeResponse {
        self.state.handshake
    }

    pub fn counters(&self) -> RunCounters {
        self.state.counters
    }

    pub fn cycle_count(&self) -> u64 {
        self.state.cycle
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    // ── Internal ──────────────────────────────────────────────

    fn on_battery(&self) -> bool {
        self.state.power == PowerSource::Battery
    }

    /// Off, enabled, and every compressor-on condition bar the valve holds.
    fn startable(&self, c: CircuitId, temps: &Temperatures) -> bool {
        let enabled = self.config.circuit_enabled(c);
        let g = guards(c, &self.state.actuators, temps, enabled, Relax::default());
        self.state.circuit(c).mode() == CircuitMode::Off && self.interlocks.compressor_ready(&g)
    }

    fn stoppable(&self, c: CircuitId, temps: &Temperatures) -> bool {
        let enabled = self.config.circuit_enabled(c);
        let g = guards(c, &self.state.actuators, temps, enabled, Relax::default());
        let mode = self.state.circuit(c).mode();
        !matches!(mode, CircuitMode::Defrost | CircuitMode::OverheatProtection)
            && self.interlocks.can_turn_compressor_off(&g)
    }

    fn arbiter_inputs(&self, temps: &Temperatures) -> ArbiterInputs {
        let view = |c: CircuitId| CircuitView {
            mode: self.state.circuit(c).mode(),
            enabled: self.config.circuit_enabled(c),
            startable: self.startable(c, temps),
            run_cycles: self.state.counters.get(c),
            valve_on: self.state.actuators[c.index()].valve.is_on(),
        };
        ArbiterInputs {
            demand: self.state.demand,
            power: self.state.power,
            circuits: [view(CircuitId::One), view(CircuitId::Two)],
            run_valve_on: self.config.control.run_valve_on,
        }
    }

    fn compute_handshake(&self, temps: &Temperatures) -> HandshakeResponse {
        let startable = CircuitId::ALL
            .iter()
            .filter(|&&c| self.startable(c, temps))
            .count();
        let stoppable = CircuitId::ALL
            .iter()
            .filter(|&&c| self.stoppable(c, temps))
            .count();
        HandshakeResponse::encode(self.config.enabled(), startable, stoppable)
    }

    fn step_circuit(
        &mut self,
        c: CircuitId,
        temps: &Temperatures,
        desired: ActuatorMask,
        sink: &mut impl EventSink,
    ) {
        let i = c.index();
        let enabled = self.config.circuit_enabled(c);
        let battery = self.on_battery();
        let acts = self.state.actuators;

        let start_relax = Relax {
            skip_off_dwell: self.state.circuits[i].ctx.rapid_restart,
            immediate_off: battery,
        };
        let g = guards(c, &acts, temps, enabled, start_relax);
        let can_start = self
            .interlocks
            .can_turn_compressor_on(&g, self.config.control.run_valve_on);
        let can_stop = self.interlocks.can_turn_compressor_off(&g);

        let circuit = &mut self.state.circuits[i];
        let ctx = &mut circuit.ctx;
        ctx.compressor_temp = temps.compressor(c);
        ctx.condenser_temp = temps.condenser(c);
        ctx.desired = desired.compressor(c);
        ctx.desired_intent = desired.circuit(c);
        ctx.can_start = can_start;
        ctx.can_stop = can_stop;
        ctx.compressor_on = acts[i].compressor.is_on();
        ctx.compressor_dwell = acts[i].compressor.dwell();
        ctx.on_battery = battery;

        if let Some((from, to)) = circuit.machine.tick(&mut circuit.ctx) {
            sink.emit(&AppEvent::ModeChanged { circuit: c, from, to });
        }

        let intent = circuit.ctx.intent;
        let mut relax = circuit.ctx.relax;
        relax.immediate_off |= battery;
        self.apply_intent(c, intent, relax, temps, enabled);
    }

    /// Move actuators toward `intent` in the safe order: compressor off,
    /// fan, valve, compressor on.  Each step re-reads the guards, so a
    /// change made earlier in the sequence is seen by the later ones.
    fn apply_intent(
        &mut self,
        c: CircuitId,
        intent: Intent,
        relax: Relax,
        temps: &Temperatures,
        enabled: bool,
    ) {
        let i = c.index();
        let locks = self.interlocks;

        let snap = self.state.actuators;
        let g = guards(c, &snap, temps, enabled, relax);
        if !intent.compressor && locks.can_turn_compressor_off(&g) {
            self.state.actuators[i].compressor.set(false);
        }

        let snap = self.state.actuators;
        let g = guards(c, &snap, temps, enabled, relax);
        if intent.fan {
            if locks.can_turn_fan_on(&g) {
                self.state.actuators[i].fan.set(true);
            }
        } else if locks.can_turn_fan_off(&g) {
            self.state.actuators[i].fan.set(false);
        }

        let snap = self.state.actuators;
        let g = guards(c, &snap, temps, enabled, relax);
        let valve_ok = if intent.valve {
            locks.can_turn_valve_on(&g)
        } else {
            locks.can_turn_valve_off(&g)
        };
        if valve_ok {
            self.state.actuators[i].valve.set(intent.valve);
        }

        let snap = self.state.actuators;
        let g = guards(c, &snap, temps, enabled, relax);
        if intent.compressor && locks.can_turn_compressor_on(&g, intent.valve) {
            self.state.actuators[i].compressor.set(true);
        }
    }
}

fn guards<'a>(
    c: CircuitId,
    actuators: &'a [CircuitActuators; 2],
    temps: &Temperatures,
    enabled: bool,
    relax: Relax,
) -> GuardInputs<'a> {
    GuardInputs {
        circuit: c,
        own: &actuators[c.index()],
        companion: &actuators[c.other().index()],
        compressor_temp: temps.compressor(c),
        enabled,
        relax,
    }
}
