//! Mock adapters for integration tests.
//!
//! Records every GPIO write so tests can assert on the full output
//! history without touching real sysfs lines.

use hpm::actuators::ActuatorMask;
use hpm::app::events::AppEvent;
use hpm::app::ports::{CounterStore, EventSink, GpioPort, SensorPort};
use hpm::app::state::RunCounters;
use hpm::control::demand::DemandLines;
use hpm::control::handshake::HandshakeResponse;
use hpm::error::{GpioError, StorageError};
use hpm::fsm::CircuitMode;
use hpm::actuators::CircuitId;
use hpm::sensors::{RawReadings, SensorId};

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub temps: RawReadings,
    pub lines: DemandLines,
    pub actuator_writes: Vec<ActuatorMask>,
    pub handshake_writes: Vec<HandshakeResponse>,
    pub all_off_calls: usize,
    pub fail_demand_reads: bool,
    pub fail_actuator_writes: bool,
}

#[allow(dead_code)]
impl MockHardware {
    /// Every probe reads `temp`, no demand.
    pub fn new(temp: f32) -> Self {
        Self {
            temps: [Some(temp); SensorId::COUNT],
            lines: DemandLines::default(),
            actuator_writes: Vec::new(),
            handshake_writes: Vec::new(),
            all_off_calls: 0,
            fail_demand_reads: false,
            fail_actuator_writes: false,
        }
    }

    pub fn set(&mut self, id: SensorId, value: Option<f32>) {
        self.temps[id.index()] = value;
    }

    pub fn demand_low(&mut self) {
        self.lines.low = true;
        self.lines.high = false;
    }

    pub fn demand_high(&mut self) {
        self.lines.low = false;
        self.lines.high = true;
    }

    pub fn demand_none(&mut self) {
        self.lines.low = false;
        self.lines.high = false;
    }

    pub fn on_battery(&mut self, battery: bool) {
        self.lines.power = Some(battery);
    }

    /// Outputs as the relays currently see them.
    pub fn outputs(&self) -> ActuatorMask {
        self.actuator_writes.last().copied().unwrap_or(ActuatorMask::NONE)
    }
}

impl SensorPort for MockHardware {
    fn read_temperatures(&mut self) -> RawReadings {
        self.temps
    }
}

impl GpioPort for MockHardware {
    fn read_demand(&mut self) -> Result<DemandLines, GpioError> {
        if self.fail_demand_reads {
            return Err(GpioError::Read(17));
        }
        Ok(self.lines)
    }

    fn write_actuators(&mut self, mask: ActuatorMask) -> Result<(), GpioError> {
        if self.fail_actuator_writes {
            return Err(GpioError::Write(5));
        }
        self.actuator_writes.push(mask);
        Ok(())
    }

    fn write_handshake(&mut self, response: HandshakeResponse) -> Result<(), GpioError> {
        self.handshake_writes.push(response);
        Ok(())
    }

    fn all_off(&mut self) -> Result<(), GpioError> {
        self.all_off_calls += 1;
        self.actuator_writes.push(ActuatorMask::NONE);
        self.handshake_writes.push(HandshakeResponse::NoChangeAllowed);
        Ok(())
    }
}

// ── MemCounterStore ───────────────────────────────────────────

#[derive(Default)]
pub struct MemCounterStore {
    pub stored: Option<RunCounters>,
    pub saves: usize,
    pub fail: bool,
}

impl CounterStore for MemCounterStore {
    fn load(&mut self) -> Result<RunCounters, StorageError> {
        self.stored.ok_or(StorageError::NotFound)
    }

    fn save(&mut self, counters: &RunCounters) -> Result<(), StorageError> {
        if self.fail {
            return Err(StorageError::Io);
        }
        self.stored = Some(*counters);
        self.saves += 1;
        Ok(())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn mode_changes(&self, circuit: CircuitId) -> Vec<(CircuitMode, CircuitMode)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::ModeChanged { circuit: c, from, to } if *c == circuit => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
