//! The production adapters wired together on a scratch filesystem.
//!
//! A fake sysfs GPIO tree and fake `w1_slave` files stand in for the
//! kernel; the service runs real cycles through [`HardwareAdapter`].

use std::fs;
use std::path::{Path, PathBuf};

use hpm::actuators::{ActuatorState, CircuitActuators, CircuitId};
use hpm::adapters::config_file::FileConfig;
use hpm::adapters::counters::FileCounterStore;
use hpm::adapters::hardware::HardwareAdapter;
use hpm::app::ports::{ConfigPort, CounterStore};
use hpm::app::service::ControlService;
use hpm::app::state::{ControllerState, RunCounters};
use hpm::config::SystemConfig;
use hpm::fsm::CircuitMode;
use hpm::sensors::SensorId;

use crate::mock_hw::RecordingSink;

struct Scratch {
    root: PathBuf,
}

impl Scratch {
    fn new(name: &str) -> Self {
        let root = std::env::temp_dir().join(format!("hpm-it-{}-{name}", std::process::id()));
        let _ = fs::remove_dir_all(&root);
        fs::create_dir_all(&root).unwrap();
        Self { root }
    }

    fn gpio(&self) -> PathBuf {
        self.root.join("gpio")
    }

    fn probe(&self, id: SensorId) -> PathBuf {
        self.root.join("w1").join(id.label()).join("w1_slave")
    }

    fn set_probe(&self, id: SensorId, milli: i32) {
        let path = self.probe(id);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            path,
            format!("50 05 4b 46 7f ff 0c 10 1c : crc=1c YES\n50 05 4b 46 7f ff 0c 10 1c t={milli}\n"),
        )
        .unwrap();
    }

    fn line(&self, pin: u8) -> PathBuf {
        self.gpio().join(format!("gpio{pin}")).join("value")
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}

fn read_line(path: &Path) -> String {
    fs::read_to_string(path).unwrap().trim().to_owned()
}

fn write_config(s: &Scratch) -> FileConfig {
    let mut text = format!(
        "mode = 2\n\n[hardware]\ngpio_root = \"{}\"\n\n[paths]\ncounters = \"{}\"\nsnapshot = \"{}\"\n\n[sensors]\n",
        s.gpio().display(),
        s.root.join("state/counters.json").display(),
        s.root.join("run/snapshot.json").display(),
    );
    let keys = [
        "ac1_compressor",
        "ac1_condenser",
        "he1_in",
        "he1_out",
        "ac2_compressor",
        "ac2_condenser",
        "he2_in",
        "he2_out",
        "water_in",
        "water_out",
        "ambient",
    ];
    for (key, id) in keys.iter().zip(SensorId::ALL) {
        text.push_str(&format!("{key} = \"{}\"\n", s.probe(id).display()));
    }
    let path = s.root.join("hpm.toml");
    fs::write(&path, text).unwrap();
    FileConfig::new(path)
}

fn prepare_gpio(s: &Scratch, config: &SystemConfig) {
    for pin in config.hardware.pins.all() {
        fs::create_dir_all(s.gpio().join(format!("gpio{pin}"))).unwrap();
    }
}

fn settled() -> CircuitActuators {
    CircuitActuators {
        compressor: ActuatorState::new(false, 1000),
        fan: ActuatorState::new(false, 1000),
        valve: ActuatorState::new(true, 1000),
    }
}

#[test]
fn config_file_points_adapter_at_probes_and_lines() {
    let s = Scratch::new("wiring");
    for id in SensorId::ALL {
        s.set_probe(id, 21_500);
    }
    s.set_probe(SensorId::WaterOut, 34_250);
    let config = write_config(&s).load().unwrap();
    prepare_gpio(&s, &config);

    let mut hw = HardwareAdapter::open(&config.hardware, config.sensors.clone()).unwrap();
    let pins = config.hardware.pins;
    fs::write(s.line(pins.comms_demand_low), "1").unwrap();
    fs::write(s.line(pins.comms_demand_high), "0").unwrap();

    let state = ControllerState::with_actuators(
        &config.control,
        RunCounters::default(),
        [settled(); 2],
    );
    let mut svc = ControlService::from_state(config.clone(), state);
    let mut sink = RecordingSink::default();
    svc.start(&mut sink);
    svc.cycle(&mut hw, &mut sink).unwrap();

    assert_eq!(svc.state().filter.value(SensorId::WaterOut), 34.25);
    assert_eq!(svc.modes(), [CircuitMode::Starting, CircuitMode::Off]);
    assert_eq!(read_line(&s.line(pins.ac1_compressor)), "1");
    assert_eq!(read_line(&s.line(pins.ac1_fan)), "1");
    assert_eq!(read_line(&s.line(pins.ac1_valve)), "1");
    assert_eq!(read_line(&s.line(pins.ac2_compressor)), "0");
    assert_eq!(read_line(&s.line(pins.ac2_valve)), "0");

    hw.shutdown().unwrap();
    assert_eq!(read_line(&s.line(pins.ac1_compressor)), "0");
    assert_eq!(read_line(&s.line(pins.comms_handshake_bit0)), "0");
    assert_eq!(read_line(&s.line(pins.comms_handshake_bit1)), "0");
}

#[test]
fn lost_probe_file_ends_the_run_with_outputs_off() {
    let s = Scratch::new("lost");
    for id in SensorId::ALL {
        s.set_probe(id, 20_000);
    }
    let config = write_config(&s).load().unwrap();
    prepare_gpio(&s, &config);
    let mut hw = HardwareAdapter::open(&config.hardware, config.sensors.clone()).unwrap();
    let pins = config.hardware.pins;
    fs::write(s.line(pins.comms_demand_low), "0").unwrap();
    fs::write(s.line(pins.comms_demand_high), "1").unwrap();

    let state = ControllerState::with_actuators(
        &config.control,
        RunCounters::default(),
        [settled(); 2],
    );
    let mut svc = ControlService::from_state(config.clone(), state);
    let mut sink = RecordingSink::default();
    svc.start(&mut sink);
    svc.cycle(&mut hw, &mut sink).unwrap();
    assert_eq!(read_line(&s.line(pins.ac1_compressor)), "1");

    fs::remove_file(s.probe(SensorId::Ac2Condenser)).unwrap();
    let limit = usize::from(config.control.sensor_failure_limit);
    for _ in 0..limit {
        svc.cycle(&mut hw, &mut sink).unwrap();
    }
    assert!(svc.cycle(&mut hw, &mut sink).is_err());
    assert_eq!(read_line(&s.line(pins.ac1_compressor)), "0");
    assert_eq!(read_line(&s.line(pins.ac1_valve)), "0");
}

#[test]
fn run_counters_survive_a_restart() {
    let s = Scratch::new("counters");
    let path = s.root.join("state/counters.json");
    let mut store = FileCounterStore::new(&path);
    assert_eq!(store.load().unwrap(), RunCounters::default());
    assert!(path.exists());

    let config = SystemConfig::default();
    let state = ControllerState::with_actuators(
        &config.control,
        RunCounters { ac1: 7, ac2: 3 },
        [settled(); 2],
    );
    let mut svc = ControlService::from_state(config, state);
    let mut sink = RecordingSink::default();
    svc.start(&mut sink);
    svc.flush_counters(&mut store, &mut sink).unwrap();

    let mut reopened = FileCounterStore::new(&path);
    let restored = reopened.load().unwrap();
    assert_eq!(restored, RunCounters { ac1: 7, ac2: 3 });
    assert_eq!(restored.get(CircuitId::One), 7);

    let restarted = ControlService::new(SystemConfig::default(), restored);
    assert_eq!(restarted.counters(), RunCounters { ac1: 7, ac2: 3 });
}
